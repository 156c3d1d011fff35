use api_load_runner::prelude::*;

mod scenarios;

fn main() -> LoadTestResult<()> {
    let setup = init()?;
    ensure_output_dir(&setup.run_config.output_dir)?;

    let registry = scenarios::registry()?;
    let executor = Executor::start()?;
    let connection = executor.execute_in_place(Connection::connect(setup.connection_options))?;

    run(&registry, &setup.run_config, &executor, &connection)?;

    Ok(())
}
