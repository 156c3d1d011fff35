mod cli;
mod config;
mod context;
mod definition;
mod executor;
mod init;
mod progress;
mod run;
mod selection;
mod session;
mod shutdown;
mod types;

pub mod prelude {
    pub use crate::cli::LoadTestCli;
    pub use crate::config::{ResolvedScenarioConfig, RunConfig, ScenarioOverride};
    pub use crate::context::ScenarioContext;
    pub use crate::definition::{
        HookResult, ScenarioDefinition, ScenarioHandler, ScenarioRegistry, ScenarioRegistryBuilder,
    };
    pub use crate::executor::Executor;
    pub use crate::init::{build_setup, ensure_output_dir, init, ConfigFile, LoadTestSetup};
    pub use crate::run::run;
    pub use crate::selection::{select_scenarios, Selection, UnknownScenarioError, ALL_SCENARIOS};
    pub use crate::session::AttackSessionFactory;
    pub use crate::types::LoadTestResult;

    // Re-export of the client, core and instruments so that suites only depend on the runner
    pub use api_load_client::prelude::*;
    pub use api_load_core::prelude::*;
    pub use api_load_instruments::{RecordEncoder, ResultRecord};
}
