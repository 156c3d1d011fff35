use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use api_load_client::prelude::{
    ConnectionOptions, Credentials, DEFAULT_GATEWAY_URL, DEFAULT_TOKEN_URL,
};
use api_load_core::prelude::Rate;
use clap::Parser;
use serde::Deserialize;

use crate::cli::LoadTestCli;
use crate::config::{minutes, RunConfig, ScenarioOverride};
use crate::selection::Selection;
use crate::types::LoadTestResult;

const DEFAULT_OUTPUT_PATH: &str = "results";
const DEFAULT_DURATION_MINUTES: u64 = 1;
const DEFAULT_RATE: &str = "1/s";

/// The contents of the YAML config file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConfigFile {
    pub token: Option<String>,
    pub token_url: Option<String>,
    pub gateway_url: Option<String>,
    pub test_id: Option<String>,
    pub output_path: Option<PathBuf>,
    pub duration: Option<u64>,
    pub rate: Option<String>,
    /// Scenario name to override block, `all` selects every scenario.
    pub tests: Option<BTreeMap<String, Option<ScenarioOverride>>>,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub verbose: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ClientConfig {
    pub id: Option<String>,
    pub secret: Option<String>,
}

impl ConfigFile {
    /// Read the config file at `path`, or `None` if there is no such file.
    pub fn load(path: &Path) -> LoadTestResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
            .map(Some)
    }

    pub fn parse(content: &str) -> LoadTestResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        Ok(serde_yaml::from_str(content)?)
    }
}

/// Everything the suite needs to start a run.
#[derive(Debug, Clone)]
pub struct LoadTestSetup {
    pub run_config: RunConfig,
    pub connection_options: ConnectionOptions,
}

/// Initialise the CLI, config file and logging for a load test run.
pub fn init() -> LoadTestResult<LoadTestSetup> {
    let cli = LoadTestCli::parse();
    let config_file = ConfigFile::load(&cli.config_file)?;

    init_logging(cli.verbose || config_file.as_ref().is_some_and(|file| file.verbose));

    match &config_file {
        Some(_) => log::info!("Using config file {}", cli.config_file.display()),
        None => log::info!(
            "Config file {} not found, using flags, environment and defaults",
            cli.config_file.display()
        ),
    }

    build_setup(cli, config_file.unwrap_or_default())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

/// Merge flags and environment (already combined by the CLI parser) over the config file and
/// built-in defaults.
pub fn build_setup(cli: LoadTestCli, file: ConfigFile) -> LoadTestResult<LoadTestSetup> {
    let raw_rate = cli
        .rate
        .or(file.rate)
        .unwrap_or_else(|| DEFAULT_RATE.to_string());
    let default_rate = raw_rate
        .parse::<Rate>()
        .context("Invalid default rate")?;

    let duration = cli
        .duration
        .or(file.duration)
        .unwrap_or(DEFAULT_DURATION_MINUTES);
    if duration == 0 {
        bail!("The default duration must be at least one minute");
    }

    // Names given on the command line replace the file's selection, overrides included.
    let selection = if cli.test_names.is_empty() {
        Selection::from_tests(
            file.tests
                .unwrap_or_default()
                .into_iter()
                .map(|(name, overrides)| (name, overrides.unwrap_or_default())),
        )
    } else {
        Selection::named(&cli.test_names)
    };

    let client_id = cli.client_id.or(file.client.id);
    let client_secret = cli.client_secret.or(file.client.secret);
    let credentials = match (client_id, client_secret, cli.token.or(file.token)) {
        (Some(client_id), Some(client_secret), _) => Credentials::ClientCredentials {
            client_id,
            client_secret,
        },
        (_, _, Some(token)) if !token.is_empty() => Credentials::OfflineToken(token),
        _ => bail!(
            "A token (--token) or service account credentials (--client-id and --client-secret) are required"
        ),
    };

    Ok(LoadTestSetup {
        run_config: RunConfig {
            run_id: cli
                .test_id
                .or(file.test_id)
                .unwrap_or_else(|| nanoid::nanoid!()),
            output_dir: cli
                .output_path
                .or(file.output_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH)),
            default_rate,
            default_duration: minutes(duration),
            selection,
            show_progress: !cli.no_progress,
        },
        connection_options: ConnectionOptions {
            gateway_url: cli
                .gateway_url
                .or(file.gateway_url)
                .unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_string()),
            token_url: cli
                .token_url
                .or(file.token_url)
                .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            credentials,
        },
    })
}

/// Create the output directory if it does not exist yet.
pub fn ensure_output_dir(path: &Path) -> LoadTestResult<()> {
    std::fs::create_dir_all(path)
        .with_context(|| format!("Failed to create output directory {}", path.display()))?;
    log::info!("Using output directory: {}", path.display());

    Ok(())
}
