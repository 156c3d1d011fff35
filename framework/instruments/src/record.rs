use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One measurement of a single issued request.
///
/// The field names follow the line format consumed by the usual result tooling, so a result file
/// can be handed straight to a downstream report or plotting step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// The name of the attack (scenario) that issued the request.
    pub attack: String,
    /// Sequence number of the request within its attack session, starting at 0.
    pub seq: u64,
    /// HTTP status code, or 0 if no response was received.
    pub code: u16,
    /// When the request was issued.
    pub timestamp: DateTime<Utc>,
    /// Request latency in nanoseconds.
    pub latency: u64,
    pub bytes_out: u64,
    pub bytes_in: u64,
    /// Empty when the request succeeded.
    pub error: String,
    pub method: String,
    pub url: String,
}

impl ResultRecord {
    pub fn new(attack: &str, seq: u64, method: &str, url: &str) -> Self {
        Self {
            attack: attack.to_string(),
            seq,
            code: 0,
            timestamp: Utc::now(),
            latency: 0,
            bytes_out: 0,
            bytes_in: 0,
            error: String::new(),
            method: method.to_string(),
            url: url.to_string(),
        }
    }

    pub fn set_latency(&mut self, latency: Duration) {
        self.latency = u64::try_from(latency.as_nanos()).unwrap_or(u64::MAX);
    }

    pub fn is_success(&self) -> bool {
        self.error.is_empty() && (200..300).contains(&self.code)
    }
}
