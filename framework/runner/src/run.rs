use std::path::PathBuf;

use api_load_client::prelude::Connection;
use api_load_core::prelude::ShutdownSignalError;
use api_load_instruments::{result_file_name, ResultSink};

use crate::config::RunConfig;
use crate::context::ScenarioContext;
use crate::definition::ScenarioRegistry;
use crate::executor::Executor;
use crate::progress::start_progress;
use crate::selection::select_scenarios;
use crate::session::AttackSessionFactory;
use crate::types::LoadTestResult;

/// Run every selected scenario of `registry`, one after another.
///
/// Each scenario gets its own result file `{run_id}_{scenario}.json` in the output directory,
/// which is closed before the next scenario starts. The first failure stops the run: result files
/// of scenarios that already finished are left in place and the error is returned.
///
/// Returns the paths of the result files written, in the order the scenarios ran.
pub fn run(
    registry: &ScenarioRegistry,
    config: &RunConfig,
    executor: &Executor,
    connection: &Connection,
) -> LoadTestResult<Vec<PathBuf>> {
    let scenarios = select_scenarios(registry, &config.selection)?;

    log::info!(
        "Starting run {} with {} of {} scenarios",
        config.run_id,
        scenarios.len(),
        registry.len()
    );

    let sessions = AttackSessionFactory::new(connection);
    let mut run_shutdown_listener = executor.shutdown_handle().new_listener();
    let mut written = Vec::with_capacity(scenarios.len());

    for scenario in scenarios {
        if run_shutdown_listener.should_shutdown() {
            log::warn!(
                "Run {} stopped before test {}",
                config.run_id,
                scenario.name()
            );
            return Err(ShutdownSignalError::default().into());
        }

        let resolved = config.resolve_scenario(scenario.name());

        let mut sink = ResultSink::create(
            &config.output_dir,
            &result_file_name(&config.run_id, scenario.name()),
        )?;

        log::info!("Executing Test: {}", scenario.name());
        log::info!("Rate: {}", resolved.rate);
        log::info!("Duration: {:?}", resolved.duration);
        log::info!("Endpoint: {}", scenario.path());

        let progress = config
            .show_progress
            .then(|| start_progress(scenario.name().to_string(), resolved.duration));

        let result = {
            let mut ctx = ScenarioContext::new(
                &config.run_id,
                scenario,
                resolved,
                sessions.new_session(),
                connection,
                &mut sink,
                executor,
                executor.shutdown_handle().new_listener(),
            );
            scenario.invoke(&mut ctx)
        };

        if let Some(progress) = progress {
            progress.finish();
        }

        // On error the sink is dropped here, which flushes what the handler managed to record.
        if let Err(e) = result {
            log::error!("Test {} failed: {:?}", scenario.name(), e);
            return Err(e);
        }

        let path = sink.close()?;
        log::info!("Results written to: {}", path.display());
        written.push(path);
    }

    log::info!("Run {} complete", config.run_id);

    Ok(written)
}
