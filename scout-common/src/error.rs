//! Error types for the scout workspace.

use thiserror::Error;

/// Result type alias using the scout error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised around running and supervising the scrape job.
#[derive(Error, Debug)]
pub enum Error {
    /// The job ran but did not succeed
    #[error("Job failed: {0}")]
    Job(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Other error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create an error with additional context.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Check if this is a timeout, looking through context wrappers.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout => true,
            Self::WithContext { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_with_context() {
        let err = Error::Job("exit status: 1".into());
        let with_ctx = err.with_context("scrape job ./scout");
        assert!(matches!(with_ctx, Error::WithContext { .. }));
        assert_eq!(
            with_ctx.to_string(),
            "scrape job ./scout: Job failed: exit status: 1"
        );
    }

    #[test]
    fn test_is_timeout_through_context() {
        let err = Error::Timeout.with_context("scrape job");
        assert!(err.is_timeout());
        assert!(!Error::Job("bad".into()).is_timeout());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(err.to_string().starts_with("IO error"));
    }
}
