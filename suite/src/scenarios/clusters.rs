use api_load_runner::prelude::{HookResult, ScenarioContext, Target};

pub(crate) fn list_clusters(ctx: &mut ScenarioContext<'_>) -> HookResult {
    let target = Target::get(ctx.path());
    ctx.attack(&target)
}
