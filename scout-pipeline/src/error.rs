//! Error types for scout-pipeline.

use std::path::PathBuf;

use scout_browser::BrowserError;

use crate::orchestrator::RunState;

/// Pipeline errors.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    #[error("No instruments qualify for {target}x leverage")]
    NoQualifyingCodes { target: String },

    #[error("No complete gainer records were extracted")]
    NoGainers,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XLSX error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed output file {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("Run aborted during {stage}: {source}")]
    Aborted {
        stage: RunState,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    /// Wrap an error with the stage it ended the run in.
    pub fn aborted(stage: RunState, source: PipelineError) -> Self {
        Self::Aborted {
            stage,
            source: Box::new(source),
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Browser(e) => e.is_timeout(),
            Self::Aborted { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
