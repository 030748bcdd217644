//! Per-run state captured once when a run starts.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Local;
use scout_common::OutputConfig;

/// Timestamp format shared by both output file names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Timestamp, output paths, and start instant for one run.
#[derive(Debug, Clone)]
pub struct RunContext {
    timestamp: String,
    csv_path: PathBuf,
    xlsx_path: PathBuf,
    started: Instant,
}

impl RunContext {
    /// Stamp a run with the current local time.
    pub fn new(output: &OutputConfig) -> Self {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        Self::with_timestamp(&output.dir, &output.prefix, timestamp)
    }

    pub fn with_timestamp(dir: &Path, prefix: &str, timestamp: impl Into<String>) -> Self {
        let timestamp = timestamp.into();
        let stem = format!("{prefix}_{timestamp}");
        Self {
            csv_path: dir.join(format!("{stem}.csv")),
            xlsx_path: dir.join(format!("{stem}.xlsx")),
            timestamp,
            started: Instant::now(),
        }
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }

    pub fn xlsx_path(&self) -> &Path {
        &self.xlsx_path
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
