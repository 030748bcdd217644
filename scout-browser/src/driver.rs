//! Browser capability trait.
//!
//! Collectors talk to a [`BrowserDriver`] rather than to a concrete automation
//! library, so the Chrome-backed driver and the fixture driver used in tests
//! are interchangeable.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::error::BrowserError;

/// Poll interval for bounded waits.
pub const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Element lookup strategy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "query")]
pub enum Locator {
    Css(String),
    XPath(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Css(s) | Self::XPath(s) => s,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css={s}"),
            Self::XPath(s) => write!(f, "xpath={s}"),
        }
    }
}

/// Opaque handle for one tab within a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TabId(pub String);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One browser session: a set of tabs, one of which is current.
///
/// Element handles are only valid for the tab they were found in.
#[async_trait]
pub trait BrowserDriver: Send {
    type Element: Send + Sync;

    /// Load `url` in the current tab.
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;

    /// All elements in the current tab matching `locator`; empty when none.
    async fn find_elements(&mut self, locator: &Locator)
        -> Result<Vec<Self::Element>, BrowserError>;

    /// First descendant of `parent` matching `locator`.
    async fn find_child(
        &mut self,
        parent: &Self::Element,
        locator: &Locator,
    ) -> Result<Option<Self::Element>, BrowserError>;

    async fn attribute(
        &mut self,
        element: &Self::Element,
        name: &str,
    ) -> Result<Option<String>, BrowserError>;

    /// Rendered text of the element.
    async fn text(&mut self, element: &Self::Element) -> Result<Option<String>, BrowserError>;

    async fn click(&mut self, element: &Self::Element) -> Result<(), BrowserError>;

    async fn execute_script(&mut self, script: &str) -> Result<(), BrowserError>;

    /// Open `url` in a new tab. The current tab does not change.
    async fn open_tab(&mut self, url: &str) -> Result<TabId, BrowserError>;

    async fn current_tab(&mut self) -> Result<TabId, BrowserError>;

    /// Open tabs in creation order.
    async fn tabs(&mut self) -> Result<Vec<TabId>, BrowserError>;

    async fn switch_to(&mut self, tab: &TabId) -> Result<(), BrowserError>;

    /// Close the current tab. No tab is current until the next `switch_to`.
    async fn close_tab(&mut self) -> Result<(), BrowserError>;

    /// Tear the session down. Further calls are errors.
    async fn quit(&mut self) -> Result<(), BrowserError>;

    async fn find_first(
        &mut self,
        locator: &Locator,
    ) -> Result<Option<Self::Element>, BrowserError> {
        Ok(self.find_elements(locator).await?.into_iter().next())
    }

    /// Block until at least one element matches, or `timeout` elapses.
    async fn wait_for_elements(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Vec<Self::Element>, BrowserError> {
        let deadline = Instant::now() + timeout;
        loop {
            let found = self.find_elements(locator).await?;
            if !found.is_empty() {
                return Ok(found);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(BrowserError::WaitTimeout {
                    condition: locator.to_string(),
                    timeout_secs: timeout.as_secs(),
                });
            }
            tokio::time::sleep(WAIT_POLL_INTERVAL.min(deadline - now)).await;
        }
    }

    /// Block until exactly `count` tabs are open, or `timeout` elapses.
    async fn wait_for_tab_count(
        &mut self,
        count: usize,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.tabs().await?.len() == count {
                return Ok(());
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(BrowserError::WaitTimeout {
                    condition: format!("{count} open tabs"),
                    timeout_secs: timeout.as_secs(),
                });
            }
            tokio::time::sleep(WAIT_POLL_INTERVAL.min(deadline - now)).await;
        }
    }
}

/// Starts a fresh [`BrowserDriver`] session.
#[async_trait]
pub trait DriverLauncher: Send + Sync {
    type Driver: BrowserDriver;

    async fn launch(&self) -> Result<Self::Driver, BrowserError>;
}
