//! Browser-driven collectors.
//!
//! Each collector launches its own session, scrapes, and always quits the
//! session before returning, whatever the scrape produced.

pub mod gainers;
pub mod leverage;

pub use gainers::{parse_exchange_code, GainersCollector};
pub use leverage::LeverageCollector;

use std::time::Duration;

use scout_browser::BrowserDriver;

/// Fixed sleep letting a dynamic page finish rendering.
pub(crate) async fn settle(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

/// Quit the session, logging rather than raising teardown failures.
pub(crate) async fn close_session<D: BrowserDriver>(driver: &mut D, source: &str) {
    match driver.quit().await {
        Ok(()) => tracing::debug!(source, "Browser session closed"),
        Err(e) => tracing::warn!(source, error = %e, "Failed to close browser session"),
    }
}
