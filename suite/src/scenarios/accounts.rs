use anyhow::Context;
use api_load_runner::prelude::{Connection, HookResult, Method, ScenarioContext, Target};
use serde::Deserialize;

pub(crate) const CURRENT_ACCOUNT_PATH: &str = "/api/accounts_mgmt/v1/current_account";

const ORG_ID_PLACEHOLDER: &str = "{orgId}";

#[derive(Debug, Deserialize)]
pub(crate) struct CurrentAccount {
    pub username: String,
    pub organization: Organization,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Organization {
    pub id: String,
}

/// Look up the account the run is authenticated as.
pub(crate) async fn current_account(connection: &Connection) -> anyhow::Result<CurrentAccount> {
    let response = connection
        .request(Method::GET, CURRENT_ACCOUNT_PATH)
        .await?
        .send()
        .await
        .context("Current account request failed")?
        .error_for_status()
        .context("Current account request was rejected")?;

    response
        .json()
        .await
        .context("Failed to parse current account")
}

pub(crate) fn self_access_token(ctx: &mut ScenarioContext<'_>) -> HookResult {
    let target = Target::post(ctx.path());
    ctx.attack(&target)
}

pub(crate) fn list_subscriptions(ctx: &mut ScenarioContext<'_>) -> HookResult {
    let target = Target::get(ctx.path());
    ctx.attack(&target)
}

pub(crate) fn get_current_account(ctx: &mut ScenarioContext<'_>) -> HookResult {
    let target = Target::get(ctx.path());
    ctx.attack(&target)
}

/// Quota cost of the organization the current account belongs to.
pub(crate) fn quota_cost(ctx: &mut ScenarioContext<'_>) -> HookResult {
    let connection = ctx.connection().clone();
    let account = ctx
        .executor()
        .execute_in_place(async move { current_account(&connection).await })?;
    log::info!("Using organization {}", account.organization.id);

    let target = Target::get(&quota_cost_path(ctx.path(), &account.organization.id));
    ctx.attack(&target)
}

fn quota_cost_path(path: &str, organization_id: &str) -> String {
    path.replace(ORG_ID_PLACEHOLDER, organization_id)
}
