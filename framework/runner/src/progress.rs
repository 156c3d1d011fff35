use std::cmp::min;
use std::fmt::Write;
use std::time::{Duration, Instant};

use api_load_core::prelude::ShutdownHandle;
use indicatif::{ProgressBar, ProgressState, ProgressStyle};

/// A running progress bar, see [start_progress].
pub(crate) struct ProgressHandle {
    shutdown_handle: ShutdownHandle,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl ProgressHandle {
    /// Stop the progress bar and wait until it has been cleared from the terminal.
    pub(crate) fn finish(self) {
        self.shutdown_handle.shutdown();
        if let Some(thread) = self.thread {
            if thread.join().is_err() {
                log::warn!("Progress thread panicked");
            }
        }
    }
}

/// Displays a progress bar while a scenario is running to show the user how long is left.
pub(crate) fn start_progress(scenario_name: String, planned_runtime: Duration) -> ProgressHandle {
    let shutdown_handle = ShutdownHandle::new();
    let mut shutdown_listener = shutdown_handle.new_listener();

    let spawned = std::thread::Builder::new()
        .name("progress".to_string())
        .spawn(move || {
            let start_time = Instant::now();
            let pb = ProgressBar::new(planned_runtime.as_secs());
            let style = match ProgressStyle::with_template(
                "{spinner:.green} {prefix} [{wide_bar:.cyan/blue}] [{elapsed_precise} / {planned_runtime}]",
            ) {
                Ok(style) => style,
                Err(e) => {
                    log::warn!("Failed to set progress style: {e:?}");
                    return;
                }
            };
            pb.set_style(
                style
                    .with_key("planned_runtime", {
                        let hours = planned_runtime.as_secs() / 3600;
                        let minutes = (planned_runtime.as_secs() % 3600) / 60;
                        let seconds = planned_runtime.as_secs() % 60;
                        move |_state: &ProgressState, w: &mut dyn Write| {
                            let _ = write!(w, "{:02}:{:02}:{:02}", hours, minutes, seconds);
                        }
                    })
                    .progress_chars("#>-"),
            );
            pb.set_prefix(scenario_name);

            loop {
                if shutdown_listener.should_shutdown() {
                    log::trace!("Progress thread shutting down");
                    pb.finish_and_clear();
                    break;
                }

                let new = min(start_time.elapsed().as_secs(), planned_runtime.as_secs());
                pb.set_position(new);
                std::thread::sleep(Duration::from_millis(250));
            }
        });

    let thread = match spawned {
        Ok(thread) => Some(thread),
        Err(e) => {
            log::warn!("Failed to start progress thread: {e:?}");
            None
        }
    };

    ProgressHandle {
        shutdown_handle,
        thread,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_waits_for_the_progress_thread() {
        let handle = start_progress("sample".to_string(), Duration::from_secs(3600));
        let thread = handle.thread.as_ref().unwrap();
        assert!(!thread.is_finished());

        let started = Instant::now();
        handle.finish();

        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
