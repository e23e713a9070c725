//! gz-logging: append-only NDJSON stats events for run post-mortems.
//!
//! The evaluation stack emits a handful of events per process (engine
//! startup, batching teardown), so the log is write-through: every append
//! reaches the file before the call returns, and a crash between events
//! never loses one that was recorded.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use thiserror::Error;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Milliseconds since the Unix epoch, for event timestamps.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Written once when an evaluation factory comes up.
#[derive(Debug, Clone, Serialize)]
pub struct EngineInitEventV1 {
    pub event: &'static str,
    pub ts_ms: u64,
    pub engine: String,
    pub model: String,
    pub batch_size: u64,
    pub num_devices: u64,
}

/// Written once on factory teardown: the batching occupancy summary.
#[derive(Debug, Clone, Serialize)]
pub struct BatchStatsEventV1 {
    pub event: &'static str,
    pub ts_ms: u64,
    pub model: String,
    /// Batches dispatched to the engine.
    pub runs: u64,
    /// Client features dispatched (padding excluded).
    pub features_dispatched: u64,
    /// Client features ever enqueued.
    pub features_queued: u64,
    /// Mean client features per dispatched batch.
    pub avg_batch: f64,
}

#[derive(Debug, Error)]
pub enum StatsLogError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Append-only NDJSON event log.
///
/// Contract: each append writes exactly one JSON object followed by a
/// newline, directly to the file.
pub struct StatsLog {
    file: File,
}

impl StatsLog {
    /// Opens the log for appending. Creates it if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<StatsLog, StatsLogError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(StatsLog { file })
    }

    pub fn append<T: Serialize>(&mut self, event: &T) -> Result<(), StatsLogError> {
        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');
        self.file.write_all(&line)?;
        Ok(())
    }
}
