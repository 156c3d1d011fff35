use api_load_runner::prelude::{HookResult, ScenarioContext, Target};
use serde_json::json;

use super::accounts::current_account;

/// Asks whether the current account may read its own subscriptions.
pub(crate) fn access_review(ctx: &mut ScenarioContext<'_>) -> HookResult {
    let connection = ctx.connection().clone();
    let account = ctx
        .executor()
        .execute_in_place(async move { current_account(&connection).await })?;

    let target = Target::post(ctx.path()).with_json_body(&json!({
        "account_username": account.username,
        "action": "get",
        "resource_type": "Subscription",
    }))?;
    ctx.attack(&target)
}

pub(crate) fn self_terms_review(ctx: &mut ScenarioContext<'_>) -> HookResult {
    let target = Target::post(ctx.path()).with_json_body(&json!({
        "event_code": "register",
        "site_code": "OCM",
    }))?;
    ctx.attack(&target)
}
