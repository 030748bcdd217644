//! Error types for scout-browser.

/// Browser automation errors.
#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    #[error("Browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("Navigation failed: {url} - {reason}")]
    NavigationFailed { url: String, reason: String },

    #[error("Timed out after {timeout_secs}s waiting for {condition}")]
    WaitTimeout { condition: String, timeout_secs: u64 },

    #[error("Element not found: {selector}")]
    ElementNotFound { selector: String },

    #[error("Tab not found: {0}")]
    TabNotFound(String),

    #[error("No active tab")]
    NoActiveTab,

    #[error("Script failed: {0}")]
    ScriptFailed(String),

    #[error("Unsupported locator: {0}")]
    Unsupported(String),

    #[error("CDP error: {0}")]
    Cdp(String),
}

impl BrowserError {
    /// Whether the error came from a bounded wait expiring.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::WaitTimeout { .. })
    }
}
