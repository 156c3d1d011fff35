use api_load_runner::prelude::{LoadTestResult, ScenarioRegistry};

mod accounts;
mod authorizations;
mod clusters;

/// Every scenario of the suite, in the order a full run executes them.
pub fn registry() -> LoadTestResult<ScenarioRegistry> {
    ScenarioRegistry::builder()
        .register(
            "self-access-token",
            "/api/accounts_mgmt/v1/access_token",
            accounts::self_access_token,
        )
        .register(
            "list-subscriptions",
            "/api/accounts_mgmt/v1/subscriptions",
            accounts::list_subscriptions,
        )
        .register(
            "access-review",
            "/api/authorizations/v1/access_review",
            authorizations::access_review,
        )
        .register(
            "self-terms-review",
            "/api/authorizations/v1/self_terms_review",
            authorizations::self_terms_review,
        )
        .register(
            "get-current-account",
            accounts::CURRENT_ACCOUNT_PATH,
            accounts::get_current_account,
        )
        .register(
            "quota-cost",
            "/api/accounts_mgmt/v1/organizations/{orgId}/quota_cost",
            accounts::quota_cost,
        )
        .register(
            "list-clusters",
            "/api/clusters_mgmt/v1/clusters",
            clusters::list_clusters,
        )
        .build()
}
