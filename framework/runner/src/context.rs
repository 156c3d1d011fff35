use std::time::Duration;

use api_load_client::prelude::{Attacker, Connection, Target};
use api_load_core::prelude::{DelegatedShutdownListener, Rate};
use api_load_instruments::{RecordEncoder, ResultSink};

use crate::config::ResolvedScenarioConfig;
use crate::definition::{HookResult, ScenarioDefinition};
use crate::executor::Executor;

/// Everything a scenario handler needs for one execution.
///
/// A new context is created for every scenario the run executes and is dropped as soon as the
/// handler returns. It carries a fresh [Attacker], so request sequence numbers start at zero for
/// each result file.
pub struct ScenarioContext<'a> {
    run_id: &'a str,
    scenario: &'a ScenarioDefinition,
    rate: Rate,
    duration: Duration,
    attacker: Attacker,
    connection: &'a Connection,
    sink: &'a mut ResultSink,
    executor: &'a Executor,
    shutdown_listener: DelegatedShutdownListener,
}

impl<'a> ScenarioContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        run_id: &'a str,
        scenario: &'a ScenarioDefinition,
        resolved: ResolvedScenarioConfig,
        attacker: Attacker,
        connection: &'a Connection,
        sink: &'a mut ResultSink,
        executor: &'a Executor,
        shutdown_listener: DelegatedShutdownListener,
    ) -> Self {
        Self {
            run_id,
            scenario,
            rate: resolved.rate,
            duration: resolved.duration,
            attacker,
            connection,
            sink,
            executor,
            shutdown_listener,
        }
    }

    pub fn run_id(&self) -> &str {
        self.run_id
    }

    pub fn scenario_name(&self) -> &str {
        self.scenario.name()
    }

    /// The path this scenario was registered with.
    pub fn path(&self) -> &str {
        self.scenario.path()
    }

    pub fn rate(&self) -> Rate {
        self.rate
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// The attack session for this scenario only.
    pub fn attacker(&self) -> &Attacker {
        &self.attacker
    }

    /// The shared, authenticated connection to the API under test.
    pub fn connection(&self) -> &Connection {
        self.connection
    }

    /// Writes records to this scenario's result file.
    pub fn encoder(&mut self) -> &mut impl RecordEncoder {
        &mut *self.sink
    }

    pub fn executor(&self) -> &Executor {
        self.executor
    }

    pub fn shutdown_listener(&mut self) -> &mut DelegatedShutdownListener {
        &mut self.shutdown_listener
    }

    /// Attack `target` with this scenario's rate and duration, writing every result to the
    /// scenario's result file.
    pub fn attack(&mut self, target: &Target) -> HookResult {
        let Self {
            scenario,
            rate,
            duration,
            attacker,
            sink,
            executor,
            shutdown_listener,
            ..
        } = self;

        let recorded = executor.execute_to_completion(attacker.attack(
            scenario.name(),
            target,
            *rate,
            *duration,
            shutdown_listener,
            |record| sink.encode(&record),
        ))?;

        log::debug!(
            "Recorded {recorded} results for {} {}",
            target.method(),
            target.path()
        );

        Ok(())
    }
}
