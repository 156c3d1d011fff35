use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use api_load_runner::prelude::{
    run, Connection, Executor, HookResult, RecordEncoder, ResultRecord, RunConfig,
    ScenarioContext, ScenarioOverride, ScenarioRegistry, Selection, Target, UnknownScenarioError,
};
use pretty_assertions::assert_eq;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

static CAPTURED: Mutex<Vec<(log::Level, String)>> = Mutex::new(Vec::new());
static INIT_LOGGER: Once = Once::new();

struct CapturingLogger;

impl log::Log for CapturingLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        CAPTURED
            .lock()
            .unwrap()
            .push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}

fn capture_logs() {
    INIT_LOGGER.call_once(|| {
        log::set_boxed_logger(Box::new(CapturingLogger)).unwrap();
        log::set_max_level(log::LevelFilter::Debug);
    });
}

fn captured_containing(needle: &str) -> Vec<(log::Level, String)> {
    CAPTURED
        .lock()
        .unwrap()
        .iter()
        .filter(|(_, message)| message.contains(needle))
        .cloned()
        .collect()
}

fn connection() -> Connection {
    // Nothing listens here, the handlers in these tests never issue requests.
    Connection::with_access_token("http://127.0.0.1:9", "token").unwrap()
}

fn run_config(run_id: &str, output_dir: &Path, selection: Selection) -> RunConfig {
    RunConfig {
        run_id: run_id.to_string(),
        output_dir: output_dir.to_path_buf(),
        default_rate: "1/s".parse().unwrap(),
        default_duration: Duration::from_secs(60),
        selection,
        show_progress: false,
    }
}

fn write_records(ctx: &mut ScenarioContext<'_>, count: u64) -> HookResult {
    let name = ctx.scenario_name().to_string();
    let path = ctx.path().to_string();
    for seq in 0..count {
        let mut record = ResultRecord::new(&name, seq, "GET", &path);
        record.code = 200;
        ctx.encoder().encode(&record)?;
    }
    Ok(())
}

fn read_records(path: &Path) -> Vec<ResultRecord> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn two_scenarios(invoked: Arc<Mutex<Vec<String>>>) -> ScenarioRegistry {
    let invoked_a = invoked.clone();
    ScenarioRegistry::builder()
        .register("a", "/a", move |ctx| {
            invoked_a.lock().unwrap().push("a".to_string());
            write_records(ctx, 3)
        })
        .register("b", "/b", move |ctx| {
            invoked.lock().unwrap().push("b".to_string());
            write_records(ctx, 2)
        })
        .build()
        .unwrap()
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect::<Vec<_>>();
    names.sort();
    names
}

#[test]
fn explicit_selection_runs_only_named_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let invoked = Arc::new(Mutex::new(Vec::new()));
    let registry = two_scenarios(invoked.clone());
    let executor = Executor::start().unwrap();

    let written = run(
        &registry,
        &run_config("explicit", dir.path(), Selection::named(["a"])),
        &executor,
        &connection(),
    )
    .unwrap();

    assert_eq!(vec![dir.path().join("explicit_a.json")], written);
    assert_eq!(vec!["explicit_a.json"], file_names(dir.path()));
    assert_eq!(vec!["a"], *invoked.lock().unwrap());
    assert_eq!(3, read_records(&written[0]).len());
}

#[test]
fn empty_selection_runs_every_scenario_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let invoked = Arc::new(Mutex::new(Vec::new()));
    let registry = two_scenarios(invoked.clone());
    let executor = Executor::start().unwrap();

    let written = run(
        &registry,
        &run_config("everything", dir.path(), Selection::default()),
        &executor,
        &connection(),
    )
    .unwrap();

    assert_eq!(
        vec![
            dir.path().join("everything_a.json"),
            dir.path().join("everything_b.json"),
        ],
        written
    );
    assert_eq!(vec!["a", "b"], *invoked.lock().unwrap());
}

#[test]
fn all_sentinel_runs_every_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let invoked = Arc::new(Mutex::new(Vec::new()));
    let registry = two_scenarios(invoked.clone());
    let executor = Executor::start().unwrap();

    run(
        &registry,
        &run_config("sentinel", dir.path(), Selection::all()),
        &executor,
        &connection(),
    )
    .unwrap();

    assert_eq!(
        vec!["sentinel_a.json", "sentinel_b.json"],
        file_names(dir.path())
    );
}

#[test]
fn malformed_rate_falls_back_to_default() {
    capture_logs();

    let dir = tempfile::tempdir().unwrap();
    let seen = Arc::new(Mutex::new(None));
    let seen_in_handler = seen.clone();
    let registry = ScenarioRegistry::builder()
        .register("malformed-rate", "/m", move |ctx| {
            *seen_in_handler.lock().unwrap() = Some(ctx.rate());
            Ok(())
        })
        .build()
        .unwrap();
    let executor = Executor::start().unwrap();

    let config = run_config(
        "fallback",
        dir.path(),
        Selection::default().with_override(
            "malformed-rate",
            ScenarioOverride {
                rate: Some("fast".to_string()),
                duration: None,
            },
        ),
    );
    run(&registry, &config, &executor, &connection()).unwrap();

    assert_eq!(Some(config.default_rate), *seen.lock().unwrap());
    let warnings = captured_containing("Error parsing rate for test malformed-rate");
    assert_eq!(1, warnings.len());
    assert_eq!(log::Level::Warn, warnings[0].0);
}

#[test]
fn duration_override_is_in_minutes() {
    let dir = tempfile::tempdir().unwrap();
    let seen = Arc::new(Mutex::new(None));
    let seen_in_handler = seen.clone();
    let registry = ScenarioRegistry::builder()
        .register("long", "/l", move |ctx| {
            *seen_in_handler.lock().unwrap() = Some(ctx.duration());
            Ok(())
        })
        .build()
        .unwrap();
    let executor = Executor::start().unwrap();

    run(
        &registry,
        &run_config(
            "minutes",
            dir.path(),
            Selection::default().with_override(
                "long",
                ScenarioOverride {
                    rate: None,
                    duration: Some(4),
                },
            ),
        ),
        &executor,
        &connection(),
    )
    .unwrap();

    assert_eq!(Some(Duration::from_secs(240)), *seen.lock().unwrap());
}

#[test]
fn first_failure_stops_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let invoked = Arc::new(Mutex::new(Vec::new()));
    let invoked_b = invoked.clone();
    let registry = ScenarioRegistry::builder()
        .register("a", "/a", |ctx| {
            write_records(ctx, 2)?;
            Err(anyhow::anyhow!("Scenario a broke"))
        })
        .register("b", "/b", move |_| {
            invoked_b.lock().unwrap().push("b".to_string());
            Ok(())
        })
        .build()
        .unwrap();
    let executor = Executor::start().unwrap();

    let result = run(
        &registry,
        &run_config("failfast", dir.path(), Selection::default()),
        &executor,
        &connection(),
    );

    assert_eq!("Scenario a broke", result.unwrap_err().to_string());
    assert!(invoked.lock().unwrap().is_empty());
    assert_eq!(vec!["failfast_a.json"], file_names(dir.path()));
    assert_eq!(2, read_records(&dir.path().join("failfast_a.json")).len());
}

#[test]
fn unknown_scenario_is_rejected_before_anything_runs() {
    let dir = tempfile::tempdir().unwrap();
    let invoked = Arc::new(Mutex::new(Vec::new()));
    let registry = two_scenarios(invoked.clone());
    let executor = Executor::start().unwrap();

    let err = run(
        &registry,
        &run_config("unknown", dir.path(), Selection::named(["a", "nope"])),
        &executor,
        &connection(),
    )
    .unwrap_err();

    let unknown = err.downcast_ref::<UnknownScenarioError>().unwrap();
    assert_eq!(&["nope".to_string()], unknown.names());
    assert!(invoked.lock().unwrap().is_empty());
    assert!(file_names(dir.path()).is_empty());
}

#[test]
fn every_scenario_gets_a_fresh_session() {
    fn record_session(
        sessions: &Mutex<Vec<(String, u64)>>,
        ctx: &mut ScenarioContext<'_>,
    ) -> HookResult {
        let attacker = ctx.attacker();
        sessions
            .lock()
            .unwrap()
            .push((attacker.session_id().to_string(), attacker.sequence()));
        Ok(())
    }

    let dir = tempfile::tempdir().unwrap();
    let sessions = Arc::new(Mutex::new(Vec::new()));
    let sessions_a = sessions.clone();
    let sessions_b = sessions.clone();
    let registry = ScenarioRegistry::builder()
        .register("a", "/a", move |ctx| record_session(&sessions_a, ctx))
        .register("b", "/b", move |ctx| record_session(&sessions_b, ctx))
        .build()
        .unwrap();
    let executor = Executor::start().unwrap();

    run(
        &registry,
        &run_config("sessions", dir.path(), Selection::default()),
        &executor,
        &connection(),
    )
    .unwrap();

    let sessions = sessions.lock().unwrap();
    assert_eq!(2, sessions.len());
    assert_ne!(sessions[0].0, sessions[1].0);
    assert_eq!(0, sessions[0].1);
    assert_eq!(0, sessions[1].1);
}

#[test]
fn result_file_is_complete_before_next_scenario_starts() {
    let dir = tempfile::tempdir().unwrap();
    let observed = Arc::new(Mutex::new(None));
    let observed_in_b = observed.clone();
    let previous_file = dir.path().join("handoff_a.json");
    let registry = ScenarioRegistry::builder()
        .register("a", "/a", |ctx| write_records(ctx, 50))
        .register("b", "/b", move |_| {
            *observed_in_b.lock().unwrap() = Some(read_records(&previous_file).len());
            Ok(())
        })
        .build()
        .unwrap();
    let executor = Executor::start().unwrap();

    run(
        &registry,
        &run_config("handoff", dir.path(), Selection::default()),
        &executor,
        &connection(),
    )
    .unwrap();

    assert_eq!(Some(50), *observed.lock().unwrap());
}

#[test]
fn missing_output_directory_aborts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let invoked = Arc::new(Mutex::new(Vec::new()));
    let registry = two_scenarios(invoked.clone());
    let executor = Executor::start().unwrap();
    let missing: PathBuf = dir.path().join("does-not-exist");

    let result = run(
        &registry,
        &run_config("missing", &missing, Selection::default()),
        &executor,
        &connection(),
    );

    assert!(result.is_err());
    assert!(invoked.lock().unwrap().is_empty());
    assert!(!missing.exists());
}

#[test]
fn handlers_see_the_run_identity() {
    let dir = tempfile::tempdir().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_in_handler = seen.clone();
    let registry = ScenarioRegistry::builder()
        .register("identity", "/api/identity", move |ctx| {
            seen_in_handler.lock().unwrap().push(format!(
                "{} {} {}",
                ctx.run_id(),
                ctx.scenario_name(),
                ctx.path()
            ));
            Ok(())
        })
        .build()
        .unwrap();
    let executor = Executor::start().unwrap();

    run(
        &registry,
        &run_config("ident-run", dir.path(), Selection::default()),
        &executor,
        &connection(),
    )
    .unwrap();

    assert_eq!(
        vec!["ident-run identity /api/identity"],
        *seen.lock().unwrap()
    );
}

#[test]
fn attacks_number_each_result_file_from_zero() {
    fn attack_own_path(ctx: &mut ScenarioContext<'_>) -> HookResult {
        let target = Target::get(ctx.path());
        ctx.attack(&target)
    }

    let server_runtime = tokio::runtime::Runtime::new().unwrap();
    let server = server_runtime.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&server)
            .await;
        server
    });

    let dir = tempfile::tempdir().unwrap();
    let registry = ScenarioRegistry::builder()
        .register("first", "/api/first", attack_own_path)
        .register("second", "/api/second", attack_own_path)
        .build()
        .unwrap();
    let executor = Executor::start().unwrap();
    let connection = Connection::with_access_token(&server.uri(), "token").unwrap();

    let config = RunConfig {
        default_rate: "20/s".parse().unwrap(),
        default_duration: Duration::from_millis(300),
        ..run_config("attacks", dir.path(), Selection::default())
    };
    let written = run(&registry, &config, &executor, &connection).unwrap();

    assert_eq!(2, written.len());
    for (path, name) in written.iter().zip(["first", "second"]) {
        let mut records = read_records(path);
        assert!(!records.is_empty(), "{name} recorded nothing");

        records.sort_by_key(|record| record.seq);
        assert_eq!(
            (0..records.len() as u64).collect::<Vec<_>>(),
            records.iter().map(|record| record.seq).collect::<Vec<_>>()
        );
        for record in &records {
            assert_eq!(name, record.attack);
            assert_eq!(200, record.code);
            assert!(record.url.ends_with(&format!("/api/{name}")));
        }
    }
}
