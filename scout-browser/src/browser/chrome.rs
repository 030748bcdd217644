//! Chrome-backed driver over the DevTools protocol.

use async_trait::async_trait;
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig as CdpBrowserConfig, Element, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;

use super::session::SessionConfig;
use crate::driver::{BrowserDriver, DriverLauncher, Locator, TabId};
use crate::error::BrowserError;

/// Selects `<option>` elements the way a user would (set + change event);
/// everything else gets a DOM click.
const CLICK_FN: &str = "function() { \
    if (this.tagName === 'OPTION') { \
        this.selected = true; \
        const select = this.closest('select'); \
        if (select) { select.dispatchEvent(new Event('change', { bubbles: true })); } \
    } else { this.click(); } \
}";

impl From<CdpError> for BrowserError {
    fn from(err: CdpError) -> Self {
        BrowserError::Cdp(err.to_string())
    }
}

/// A launched Chrome process with its tabs.
pub struct ChromeDriver {
    browser: Browser,
    handler: JoinHandle<()>,
    tabs: Vec<(TabId, Page)>,
    current: Option<usize>,
    next_tab: u64,
    closed: bool,
}

impl ChromeDriver {
    /// Launch Chrome and open one blank tab.
    pub async fn launch(config: &SessionConfig) -> Result<Self, BrowserError> {
        let mut builder = CdpBrowserConfig::builder()
            .no_sandbox()
            .window_size(config.viewport.width, config.viewport.height);
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(ref exe) = config.executable {
            builder = builder.chrome_executable(exe);
        }
        for arg in config.chrome_args() {
            builder = builder.arg(arg);
        }
        let cdp_config = builder.build().map_err(BrowserError::LaunchFailed)?;

        let (browser, mut handler) = Browser::launch(cdp_config)
            .await
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("CDP handler event error: {}", e);
                }
            }
        });

        let mut driver = Self {
            browser,
            handler,
            tabs: Vec::new(),
            current: None,
            next_tab: 0,
            closed: false,
        };
        let first = driver.open_tab("about:blank").await?;
        driver.switch_to(&first).await?;

        tracing::debug!(headless = config.headless, "Chrome session launched");
        Ok(driver)
    }

    fn current_page(&self) -> Result<&Page, BrowserError> {
        if self.closed {
            return Err(BrowserError::NoActiveTab);
        }
        self.current
            .and_then(|i| self.tabs.get(i))
            .map(|(_, page)| page)
            .ok_or(BrowserError::NoActiveTab)
    }
}

#[async_trait]
impl BrowserDriver for ChromeDriver {
    type Element = Element;

    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        let page = self.current_page()?;
        page.goto(url)
            .await
            .map_err(|e| BrowserError::NavigationFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn find_elements(&mut self, locator: &Locator) -> Result<Vec<Element>, BrowserError> {
        let page = self.current_page()?;
        let found = match locator {
            Locator::Css(selector) => page.find_elements(selector.as_str()).await?,
            Locator::XPath(expr) => page.find_xpaths(expr.as_str()).await?,
        };
        Ok(found)
    }

    async fn find_child(
        &mut self,
        parent: &Element,
        locator: &Locator,
    ) -> Result<Option<Element>, BrowserError> {
        match locator {
            Locator::Css(selector) => Ok(parent
                .find_elements(selector.as_str())
                .await?
                .into_iter()
                .next()),
            Locator::XPath(_) => Err(BrowserError::Unsupported(format!(
                "{locator} relative to an element"
            ))),
        }
    }

    async fn attribute(
        &mut self,
        element: &Element,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        Ok(element.attribute(name).await?)
    }

    async fn text(&mut self, element: &Element) -> Result<Option<String>, BrowserError> {
        Ok(element.inner_text().await?)
    }

    async fn click(&mut self, element: &Element) -> Result<(), BrowserError> {
        element.call_js_fn(CLICK_FN, false).await?;
        Ok(())
    }

    async fn execute_script(&mut self, script: &str) -> Result<(), BrowserError> {
        let page = self.current_page()?;
        page.evaluate(script)
            .await
            .map_err(|e| BrowserError::ScriptFailed(e.to_string()))?;
        Ok(())
    }

    async fn open_tab(&mut self, url: &str) -> Result<TabId, BrowserError> {
        if self.closed {
            return Err(BrowserError::NoActiveTab);
        }
        let page = self.browser.new_page(url).await?;
        self.next_tab += 1;
        let id = TabId(format!("tab-{}", self.next_tab));
        self.tabs.push((id.clone(), page));
        Ok(id)
    }

    async fn current_tab(&mut self) -> Result<TabId, BrowserError> {
        self.current
            .and_then(|i| self.tabs.get(i))
            .map(|(id, _)| id.clone())
            .ok_or(BrowserError::NoActiveTab)
    }

    async fn tabs(&mut self) -> Result<Vec<TabId>, BrowserError> {
        Ok(self.tabs.iter().map(|(id, _)| id.clone()).collect())
    }

    async fn switch_to(&mut self, tab: &TabId) -> Result<(), BrowserError> {
        let index = self
            .tabs
            .iter()
            .position(|(id, _)| id == tab)
            .ok_or_else(|| BrowserError::TabNotFound(tab.to_string()))?;
        self.tabs[index].1.bring_to_front().await?;
        self.current = Some(index);
        Ok(())
    }

    async fn close_tab(&mut self) -> Result<(), BrowserError> {
        let index = self.current.take().ok_or(BrowserError::NoActiveTab)?;
        let (_, page) = self.tabs.remove(index);
        page.close().await?;
        Ok(())
    }

    async fn quit(&mut self) -> Result<(), BrowserError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.tabs.clear();
        self.current = None;

        let close_result = self.browser.close().await;
        let wait_result = self.browser.wait().await;
        self.handler.abort();

        close_result?;
        wait_result.map_err(|e| BrowserError::Cdp(e.to_string()))?;
        tracing::debug!("Chrome session closed");
        Ok(())
    }
}

impl Drop for ChromeDriver {
    fn drop(&mut self) {
        // Browser's own Drop kills the child process.
        if !self.closed {
            self.handler.abort();
        }
    }
}

/// Launches one [`ChromeDriver`] per collector run.
#[derive(Debug, Clone, Default)]
pub struct ChromeLauncher {
    config: SessionConfig,
}

impl ChromeLauncher {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl DriverLauncher for ChromeLauncher {
    type Driver = ChromeDriver;

    async fn launch(&self) -> Result<ChromeDriver, BrowserError> {
        ChromeDriver::launch(&self.config).await
    }
}
