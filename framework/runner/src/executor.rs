use std::future::Future;

use anyhow::Context;
use api_load_core::prelude::{ShutdownHandle, ShutdownSignalError};

use crate::shutdown::start_shutdown_listener;

/// Runs async work for the synchronous orchestrator and scenario handlers.
///
/// Owns the Tokio runtime and the cancellation context for a run. Ctrl-C triggers the shutdown
/// handle.
#[derive(Debug)]
pub struct Executor {
    runtime: tokio::runtime::Runtime,
    shutdown_handle: ShutdownHandle,
}

impl Executor {
    /// Create the runtime and start listening for Ctrl-C.
    pub fn start() -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
        let shutdown_handle = start_shutdown_listener(&runtime);

        Ok(Self {
            runtime,
            shutdown_handle,
        })
    }

    pub fn shutdown_handle(&self) -> &ShutdownHandle {
        &self.shutdown_handle
    }

    /// Run async code in place, blocking until it completes.
    ///
    /// Note that the future will be cancelled if the run is shut down. Submitting a future which
    /// does not support cancelling may prevent the run from shutting down.
    pub fn execute_in_place<T>(
        &self,
        fut: impl Future<Output = anyhow::Result<T>>,
    ) -> anyhow::Result<T> {
        let mut shutdown_listener = self.shutdown_handle.new_listener();
        self.runtime.block_on(async move {
            tokio::select! {
                result = fut => result,
                _ = shutdown_listener.wait_for_shutdown() => {
                    Err(anyhow::anyhow!(ShutdownSignalError::default()))
                },
            }
        })
    }

    /// Run async code in place and let it finish, even if the run is shut down in the meantime.
    ///
    /// Use this for futures that watch the shutdown signal themselves and need to clean up before
    /// returning, such as an attack draining its in-flight requests.
    pub fn execute_to_completion<T>(&self, fut: impl Future<Output = T>) -> T {
        self.runtime.block_on(fut)
    }
}
