use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use api_load_core::prelude::{DelegatedShutdownListener, Rate, ShutdownSignalError};
use api_load_instruments::ResultRecord;
use reqwest::header::CONTENT_TYPE;

use crate::connection::Connection;
use crate::target::Target;

/// An attack session, issuing requests at a fixed rate over a shared [Connection].
///
/// Every request is numbered from a counter that starts at zero when the attacker is created and
/// is never reset, so create a new attacker for every result stream that should be numbered from
/// zero.
#[derive(Debug)]
pub struct Attacker {
    connection: Connection,
    session_id: String,
    seq: AtomicU64,
}

impl Attacker {
    pub fn new(connection: Connection) -> Self {
        Self {
            connection,
            session_id: nanoid::nanoid!(),
            seq: AtomicU64::new(0),
        }
    }

    /// Unique identifier of this session.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// The sequence number the next request will be given, which is also the number of requests
    /// issued so far.
    pub fn sequence(&self) -> u64 {
        self.seq.load(Ordering::SeqCst)
    }

    /// Issue requests for `target` at `rate` until `duration` has elapsed.
    ///
    /// Each completed request is handed to `on_result`. Requests still in flight when the duration
    /// is up are waited for, so every issued request produces exactly one record. Failed requests
    /// and error responses are recorded, not returned.
    ///
    /// If the shutdown signal is received, no further requests are issued and a
    /// [ShutdownSignalError] is returned once the in-flight requests have been recorded.
    ///
    /// Returns the number of records produced.
    pub async fn attack<F>(
        &self,
        name: &str,
        target: &Target,
        rate: Rate,
        duration: Duration,
        shutdown_listener: &mut DelegatedShutdownListener,
        mut on_result: F,
    ) -> anyhow::Result<u64>
    where
        F: FnMut(ResultRecord) -> anyhow::Result<()>,
    {
        let name: Arc<str> = Arc::from(name);
        let target = Arc::new(target.clone());
        let (sender, mut receiver) = tokio::sync::mpsc::unbounded_channel();

        let mut ticker = tokio::time::interval(rate.interval());
        let deadline = tokio::time::sleep(duration);
        tokio::pin!(deadline);

        let mut cancelled = false;
        let mut recorded = 0;

        loop {
            tokio::select! {
                _ = &mut deadline => break,
                _ = shutdown_listener.wait_for_shutdown() => {
                    log::info!("Stopping attack {name} on shutdown signal");
                    cancelled = true;
                    break;
                }
                _ = ticker.tick() => {
                    let seq = self.seq.fetch_add(1, Ordering::SeqCst);
                    let connection = self.connection.clone();
                    let name = name.clone();
                    let target = target.clone();
                    let sender = sender.clone();
                    tokio::spawn(async move {
                        let record = hit(&connection, &name, seq, &target).await;
                        // The receiver is only gone if recording failed and the attack was abandoned.
                        let _ = sender.send(record);
                    });
                }
                Some(record) = receiver.recv() => {
                    on_result(record)?;
                    recorded += 1;
                }
            }
        }

        // Wait for in-flight requests, each holds a sender until its record is delivered.
        drop(sender);
        while let Some(record) = receiver.recv().await {
            on_result(record)?;
            recorded += 1;
        }

        log::debug!(
            "Attack {name} issued {} requests in session {}",
            self.sequence(),
            self.session_id
        );

        if cancelled {
            return Err(ShutdownSignalError::default().into());
        }

        Ok(recorded)
    }
}

async fn hit(connection: &Connection, name: &str, seq: u64, target: &Target) -> ResultRecord {
    let url = connection
        .url(target.path())
        .map(|url| url.to_string())
        .unwrap_or_else(|_| target.path().to_string());

    let mut record = ResultRecord::new(name, seq, target.method().as_str(), &url);
    let started = Instant::now();

    if let Err(e) = send(connection, target, &mut record).await {
        record.error = format!("{e:#}");
    }

    record.set_latency(started.elapsed());
    record
}

async fn send(
    connection: &Connection,
    target: &Target,
    record: &mut ResultRecord,
) -> anyhow::Result<()> {
    let mut request = connection
        .request(target.method().clone(), target.path())
        .await?;
    if let Some(body) = target.body() {
        request = request
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_vec());
        record.bytes_out = body.len() as u64;
    }

    let response = request.send().await?;
    let status = response.status();
    record.code = status.as_u16();

    let body = response.bytes().await?;
    record.bytes_in = body.len() as u64;

    if !status.is_success() {
        record.error = status.to_string();
    }

    Ok(())
}
