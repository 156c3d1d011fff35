use std::path::PathBuf;
use std::time::Duration;

use api_load_core::prelude::Rate;
use serde::{Deserialize, Deserializer};

use crate::selection::Selection;

/// Per-scenario settings that take precedence over the run-wide defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ScenarioOverride {
    /// A rate such as `10/s`. Falls back to the default rate if missing or malformed.
    #[serde(default, deserialize_with = "deserialize_raw_rate")]
    pub rate: Option<String>,
    /// Duration in minutes. Falls back to the default duration if missing or zero.
    #[serde(default)]
    pub duration: Option<u64>,
}

/// Keep whatever scalar was configured, so that `rate: 5` is reported as a malformed rate instead
/// of failing the whole config file.
fn deserialize_raw_rate<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawRate {
        Text(String),
        Whole(u64),
        Fraction(f64),
    }

    Ok(
        Option::<RawRate>::deserialize(deserializer)?.map(|raw| match raw {
            RawRate::Text(text) => text,
            RawRate::Whole(n) => n.to_string(),
            RawRate::Fraction(n) => n.to_string(),
        }),
    )
}

/// The settings for one run, merged from flags, environment and config file at start-up.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Shared by every result file written during the run.
    pub run_id: String,
    /// Must exist before the run starts.
    pub output_dir: PathBuf,
    pub default_rate: Rate,
    pub default_duration: Duration,
    pub selection: Selection,
    /// Show a progress bar while each scenario runs.
    pub show_progress: bool,
}

/// The rate and duration a scenario runs with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedScenarioConfig {
    pub rate: Rate,
    pub duration: Duration,
}

pub(crate) fn minutes(minutes: u64) -> Duration {
    Duration::from_secs(minutes.saturating_mul(60))
}

impl RunConfig {
    /// Resolve the rate and duration for the scenario called `name`.
    ///
    /// A malformed rate override is logged and replaced by the default rate, it never fails the
    /// run.
    pub fn resolve_scenario(&self, name: &str) -> ResolvedScenarioConfig {
        let overrides = self.selection.override_for(name);

        let rate = match overrides
            .and_then(|overrides| overrides.rate.as_deref())
            .filter(|rate| !rate.trim().is_empty())
        {
            None => {
                log::info!("No specific rate for test {name}. Using default");
                self.default_rate
            }
            Some(raw) => match raw.parse::<Rate>() {
                Ok(rate) => rate,
                Err(e) => {
                    log::warn!(
                        "Error parsing rate for test {name}: '{raw}'. Using default {}: {e}",
                        self.default_rate
                    );
                    self.default_rate
                }
            },
        };

        let duration = match overrides.and_then(|overrides| overrides.duration) {
            None | Some(0) => self.default_duration,
            Some(duration) => minutes(duration),
        };

        ResolvedScenarioConfig { rate, duration }
    }
}
