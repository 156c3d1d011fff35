use std::collections::HashSet;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use anyhow::bail;

use crate::context::ScenarioContext;
use crate::selection::ALL_SCENARIOS;

pub type HookResult = anyhow::Result<()>;

/// The request generation logic of a scenario.
///
/// Called once per run with a fully populated [ScenarioContext]. The handler may borrow the
/// context for the duration of the call but must not keep anything from it afterwards.
pub type ScenarioHandler = Arc<dyn Fn(&mut ScenarioContext<'_>) -> HookResult + Send + Sync>;

/// A named scenario, the path it targets and the handler that generates its load.
#[derive(Clone)]
pub struct ScenarioDefinition {
    name: String,
    path: String,
    handler: ScenarioHandler,
}

impl ScenarioDefinition {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The request path on the API under test, relative to the gateway URL.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn invoke(&self, ctx: &mut ScenarioContext<'_>) -> HookResult {
        (self.handler)(ctx)
    }
}

impl Debug for ScenarioDefinition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioDefinition")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// The catalogue of scenarios a suite can run.
///
/// Scenarios are kept in registration order, which is also the order they are run in.
#[derive(Debug, Clone)]
pub struct ScenarioRegistry {
    scenarios: Vec<ScenarioDefinition>,
}

impl ScenarioRegistry {
    pub fn builder() -> ScenarioRegistryBuilder {
        ScenarioRegistryBuilder::default()
    }

    pub fn lookup(&self, name: &str) -> Option<&ScenarioDefinition> {
        self.scenarios.iter().find(|scenario| scenario.name == name)
    }

    pub fn all(&self) -> &[ScenarioDefinition] {
        &self.scenarios
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

/// The builder for a [ScenarioRegistry].
///
/// Register every scenario of the suite at start-up, then call [ScenarioRegistryBuilder::build].
#[derive(Default)]
pub struct ScenarioRegistryBuilder {
    scenarios: Vec<ScenarioDefinition>,
}

impl ScenarioRegistryBuilder {
    /// Add a scenario. The name must be unique within the suite and cannot be the reserved
    /// name `all`.
    pub fn register<F>(mut self, name: &str, path: &str, handler: F) -> Self
    where
        F: Fn(&mut ScenarioContext<'_>) -> HookResult + Send + Sync + 'static,
    {
        self.scenarios.push(ScenarioDefinition {
            name: name.to_string(),
            path: path.to_string(),
            handler: Arc::new(handler),
        });
        self
    }

    pub fn build(self) -> anyhow::Result<ScenarioRegistry> {
        let mut seen = HashSet::new();
        for scenario in &self.scenarios {
            if scenario.name.is_empty() {
                bail!("Scenario names cannot be empty");
            }
            if scenario.name == ALL_SCENARIOS {
                bail!("Scenario name [{ALL_SCENARIOS}] is reserved");
            }
            if !seen.insert(scenario.name.as_str()) {
                bail!("Scenario [{}] is already defined", scenario.name);
            }
        }

        Ok(ScenarioRegistry {
            scenarios: self.scenarios,
        })
    }
}
