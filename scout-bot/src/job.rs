//! Launching the scrape as a child process under a hard timeout.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use scout_common::{Error, Result};
use tokio::process::Command;

/// Something that produces a fresh result file when run.
#[async_trait]
pub trait ScrapeJob: Send + Sync {
    /// Run to completion. A non-successful run is an error.
    async fn run(&self) -> Result<()>;
}

/// Runs the `scout` binary with no arguments.
#[derive(Debug, Clone)]
pub struct ProcessJob {
    binary: PathBuf,
    timeout: Duration,
}

impl ProcessJob {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Locate `configured`: as given if it exists, otherwise next to the
    /// running executable.
    pub fn resolve_binary(configured: &Path) -> Option<PathBuf> {
        if configured.is_file() {
            return Some(configured.to_path_buf());
        }
        let file_name = configured.file_name()?;
        let sibling = std::env::current_exe().ok()?.with_file_name(file_name);
        if sibling.is_file() {
            return Some(sibling);
        }
        // Windows builds carry an extension the config usually omits.
        let with_ext = sibling.with_extension(std::env::consts::EXE_EXTENSION);
        with_ext.is_file().then_some(with_ext)
    }

    async fn spawn(&self) -> Result<ExitStatus> {
        let output = Command::new(&self.binary)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        // Dropping the pending output future kills the child.
        let output = tokio::time::timeout(self.timeout, output)
            .await
            .map_err(|_| Error::Timeout)??;

        if !output.stderr.is_empty() {
            tracing::debug!(
                stderr = %String::from_utf8_lossy(&output.stderr),
                "Scrape job stderr"
            );
        }
        Ok(output.status)
    }
}

#[async_trait]
impl ScrapeJob for ProcessJob {
    async fn run(&self) -> Result<()> {
        tracing::info!(binary = %self.binary.display(), timeout_secs = self.timeout.as_secs(), "Running scrape job");
        let started = std::time::Instant::now();

        let status = self.spawn().await.map_err(|e| {
            if e.is_timeout() {
                tracing::error!(timeout_secs = self.timeout.as_secs(), "Scrape job timed out");
            }
            e.with_context(format!("scrape job {}", self.binary.display()))
        })?;

        tracing::info!(
            status = %status,
            duration_ms = started.elapsed().as_millis() as u64,
            "Scrape job finished"
        );
        if status.success() {
            Ok(())
        } else {
            Err(Error::Job(format!("exited with {status}")))
        }
    }
}
