use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use crate::config::ScenarioOverride;
use crate::definition::{ScenarioDefinition, ScenarioRegistry};

/// Reserved selection key meaning "run every registered scenario".
pub const ALL_SCENARIOS: &str = "all";

/// Which scenarios a run should execute, and any per-scenario overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    all: bool,
    scenarios: BTreeMap<String, ScenarioOverride>,
}

impl Selection {
    /// Select every registered scenario.
    pub fn all() -> Self {
        Self {
            all: true,
            scenarios: BTreeMap::new(),
        }
    }

    /// Select only the named scenarios.
    pub fn named<S: AsRef<str>>(names: impl IntoIterator<Item = S>) -> Self {
        Self::from_tests(
            names
                .into_iter()
                .map(|name| (name.as_ref().to_string(), ScenarioOverride::default())),
        )
    }

    /// Build a selection from a map of scenario name to override block, where the key
    /// [ALL_SCENARIOS] turns on the "all" sentinel.
    pub fn from_tests(tests: impl IntoIterator<Item = (String, ScenarioOverride)>) -> Self {
        let mut selection = Self::default();
        for (name, overrides) in tests {
            if name == ALL_SCENARIOS {
                selection.all = true;
            } else {
                selection.scenarios.insert(name, overrides);
            }
        }
        selection
    }

    /// Set the override block for a scenario, which also selects it explicitly.
    pub fn with_override(mut self, name: &str, overrides: ScenarioOverride) -> Self {
        self.scenarios.insert(name.to_string(), overrides);
        self
    }

    pub fn is_all(&self) -> bool {
        self.all
    }

    pub fn explicit_names(&self) -> impl Iterator<Item = &str> {
        self.scenarios.keys().map(String::as_str)
    }

    pub fn override_for(&self, name: &str) -> Option<&ScenarioOverride> {
        self.scenarios.get(name)
    }

    /// Whether `name` is in scope for this selection.
    ///
    /// With neither explicit names nor the "all" sentinel every scenario is in scope.
    pub fn includes(&self, name: &str) -> bool {
        self.all || self.scenarios.is_empty() || self.scenarios.contains_key(name)
    }
}

/// One or more explicitly selected scenarios are not registered.
#[derive(derive_more::Error, Debug, PartialEq)]
pub struct UnknownScenarioError {
    names: Vec<String>,
}

impl UnknownScenarioError {
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl Display for UnknownScenarioError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unknown scenario(s) selected: {}", self.names.join(", "))
    }
}

/// The scenarios in scope for `selection`, in registry order.
///
/// Fails without selecting anything if any explicitly named scenario is not in the registry.
pub fn select_scenarios<'r>(
    registry: &'r ScenarioRegistry,
    selection: &Selection,
) -> Result<Vec<&'r ScenarioDefinition>, UnknownScenarioError> {
    let unknown = selection
        .explicit_names()
        .filter(|name| registry.lookup(name).is_none())
        .map(str::to_string)
        .collect::<Vec<_>>();
    if !unknown.is_empty() {
        return Err(UnknownScenarioError { names: unknown });
    }

    Ok(registry
        .all()
        .iter()
        .filter(|scenario| selection.includes(scenario.name()))
        .collect())
}
