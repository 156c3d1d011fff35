use std::path::PathBuf;

use clap::Parser;

const LONG_ABOUT: &str = "\
Runs a suite of load test scenarios against an HTTP API, one after another.

Every scenario issues requests at a configured rate for a configured duration and writes one
result record per request to `<output-path>/<test-id>_<scenario>.json`.

For example:

  api-load-test --test-id=foo --token=$API_LOAD_TOKEN --duration=20 --rate=5/s --test-names=list-clusters

Or, with all settings in a config file:

  api-load-test --config-file=config.yaml";

#[derive(Parser, Debug, Clone)]
#[command(name = "api-load-test", version, about, long_about = LONG_ABOUT)]
pub struct LoadTestCli {
    /// A YAML config file. Flags and environment variables take precedence over its values.
    ///
    /// A missing file is not an error, the run then uses flags, environment and defaults only.
    #[clap(long, env = "API_LOAD_CONFIG_FILE", default_value = "config.yaml")]
    pub config_file: PathBuf,

    /// Offline token used to obtain access tokens for the API
    #[clap(long, env = "API_LOAD_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// The endpoint access tokens are requested from
    #[clap(long, env = "API_LOAD_TOKEN_URL")]
    pub token_url: Option<String>,

    /// Service account client id. Used instead of the token when given with a client secret
    #[clap(long, env = "API_LOAD_CLIENT_ID")]
    pub client_id: Option<String>,

    /// Service account client secret
    #[clap(long, env = "API_LOAD_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// The gateway URL of the API to test
    #[clap(long, env = "API_LOAD_GATEWAY_URL")]
    pub gateway_url: Option<String>,

    /// Unique ID to identify the run, used as the prefix of every result file
    #[clap(long, env = "API_LOAD_TEST_ID")]
    pub test_id: Option<String>,

    /// Output directory for result files. Created if it does not exist
    #[clap(long)]
    pub output_path: Option<PathBuf>,

    /// Duration of each scenario in minutes
    #[clap(long)]
    pub duration: Option<u64>,

    /// Default rate of each scenario, for example `5/s`. Available units are 'ns', 'us', 'ms',
    /// 's', 'm' and 'h'
    #[clap(long)]
    pub rate: Option<String>,

    /// Names of the scenarios to run, separated by commas. Replaces the selection from the
    /// config file. Runs every scenario when neither selects any
    #[clap(long, value_delimiter = ',')]
    pub test_names: Vec<String>,

    /// Enable verbose logging
    #[clap(short, long, default_value = "false")]
    pub verbose: bool,

    /// Do not show a progress bar on the CLI.
    ///
    /// This is recommended for CI/CD environments where the progress bar isn't being looked at by anyone and is just adding noise to the logs.
    #[clap(long, default_value = "false")]
    pub no_progress: bool,
}
