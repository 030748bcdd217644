//! In-memory driver that serves canned pages.
//!
//! Pages are keyed by URL. Each page maps locators to element trees; clicks
//! can reveal extra elements and any executed script materializes the page's
//! lazy rows, which is enough to exercise the collectors end to end.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::driver::{BrowserDriver, DriverLauncher, Locator, TabId};
use crate::error::BrowserError;

const BLANK: &str = "about:blank";

/// One element with its attributes, text and descendants.
#[derive(Debug, Clone, Default)]
pub struct FixtureNode {
    attributes: HashMap<String, String>,
    text: Option<String>,
    children: HashMap<Locator, Vec<FixtureNode>>,
    reveals: Vec<(Locator, FixtureNode)>,
    failing_attrs: HashSet<String>,
    failing_text: bool,
}

impl FixtureNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn child(mut self, locator: Locator, node: FixtureNode) -> Self {
        self.children.entry(locator).or_default().push(node);
        self
    }

    /// Reading attribute `name` fails.
    pub fn fail_attr(mut self, name: impl Into<String>) -> Self {
        self.failing_attrs.insert(name.into());
        self
    }

    /// Reading the text fails.
    pub fn fail_text(mut self) -> Self {
        self.failing_text = true;
        self
    }

    /// Clicking this node appends `node` to the page under `locator`.
    pub fn on_click_reveal(mut self, locator: Locator, node: FixtureNode) -> Self {
        self.reveals.push((locator, node));
        self
    }
}

/// A page's elements, plus rows that only appear once a script has run.
#[derive(Debug, Clone, Default)]
pub struct FixturePage {
    elements: HashMap<Locator, Vec<FixtureNode>>,
    lazy: Vec<(Locator, FixtureNode)>,
}

impl FixturePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, locator: Locator, node: FixtureNode) -> Self {
        self.elements.entry(locator).or_default().push(node);
        self
    }

    pub fn lazy(mut self, locator: Locator, node: FixtureNode) -> Self {
        self.lazy.push((locator, node));
        self
    }

    fn materialize(&mut self) {
        for (locator, node) in self.lazy.drain(..) {
            self.elements.entry(locator).or_default().push(node);
        }
    }
}

/// The set of pages a [`FixtureDriver`] can reach.
#[derive(Debug, Clone, Default)]
pub struct FixtureSite {
    pages: HashMap<String, FixturePage>,
    failing: HashSet<String>,
    stalled: HashSet<String>,
    fail_quit: bool,
}

impl FixtureSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: impl Into<String>, page: FixturePage) -> Self {
        self.pages.insert(url.into(), page);
        self
    }

    /// Navigating to `url` fails.
    pub fn fail_navigation(mut self, url: impl Into<String>) -> Self {
        self.failing.insert(url.into());
        self
    }

    /// Tabs opened on `url` never show up in the tab list.
    pub fn stall_tab(mut self, url: impl Into<String>) -> Self {
        self.stalled.insert(url.into());
        self
    }

    pub fn fail_quit(mut self) -> Self {
        self.fail_quit = true;
        self
    }

    fn load(&self, url: &str) -> FixturePage {
        self.pages.get(url).cloned().unwrap_or_default()
    }
}

#[derive(Debug, Default)]
struct Events {
    launches: usize,
    quits: usize,
    navigations: Vec<String>,
    opened_tabs: Vec<String>,
    scripts: usize,
    clicks: usize,
}

/// Shared record of what every driver from one launcher did.
#[derive(Debug, Clone, Default)]
pub struct FixtureLog {
    inner: Arc<Mutex<Events>>,
}

impl FixtureLog {
    fn lock(&self) -> MutexGuard<'_, Events> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn launches(&self) -> usize {
        self.lock().launches
    }

    pub fn quits(&self) -> usize {
        self.lock().quits
    }

    pub fn navigations(&self) -> Vec<String> {
        self.lock().navigations.clone()
    }

    pub fn opened_tabs(&self) -> Vec<String> {
        self.lock().opened_tabs.clone()
    }

    pub fn scripts(&self) -> usize {
        self.lock().scripts
    }

    pub fn clicks(&self) -> usize {
        self.lock().clicks
    }
}

/// Element handle returned by [`FixtureDriver`].
#[derive(Debug, Clone)]
pub struct FixtureElement {
    node: FixtureNode,
}

#[derive(Debug)]
struct Tab {
    id: TabId,
    page: FixturePage,
    visible: bool,
}

/// A session over a [`FixtureSite`].
#[derive(Debug)]
pub struct FixtureDriver {
    site: Arc<FixtureSite>,
    log: FixtureLog,
    tabs: Vec<Tab>,
    current: Option<usize>,
    next_tab: u64,
    quit: bool,
}

impl FixtureDriver {
    pub fn new(site: Arc<FixtureSite>, log: FixtureLog) -> Self {
        let mut driver = Self {
            site,
            log,
            tabs: Vec::new(),
            current: None,
            next_tab: 0,
            quit: false,
        };
        driver.push_tab(BLANK);
        driver.current = Some(0);
        driver
    }

    fn push_tab(&mut self, url: &str) -> TabId {
        self.next_tab += 1;
        let id = TabId(format!("fixture-{}", self.next_tab));
        self.tabs.push(Tab {
            id: id.clone(),
            page: self.site.load(url),
            visible: !self.site.stalled.contains(url),
        });
        id
    }

    fn ensure_live(&self) -> Result<(), BrowserError> {
        if self.quit {
            Err(BrowserError::Cdp("session already closed".to_string()))
        } else {
            Ok(())
        }
    }

    fn current_page(&mut self) -> Result<&mut FixturePage, BrowserError> {
        self.ensure_live()?;
        let index = self.current.ok_or(BrowserError::NoActiveTab)?;
        self.tabs
            .get_mut(index)
            .map(|tab| &mut tab.page)
            .ok_or(BrowserError::NoActiveTab)
    }
}

#[async_trait]
impl BrowserDriver for FixtureDriver {
    type Element = FixtureElement;

    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.ensure_live()?;
        self.log.lock().navigations.push(url.to_string());
        if self.site.failing.contains(url) {
            return Err(BrowserError::NavigationFailed {
                url: url.to_string(),
                reason: "fixture refused navigation".to_string(),
            });
        }
        let page = self.site.load(url);
        *self.current_page()? = page;
        Ok(())
    }

    async fn find_elements(
        &mut self,
        locator: &Locator,
    ) -> Result<Vec<FixtureElement>, BrowserError> {
        let page = self.current_page()?;
        Ok(page
            .elements
            .get(locator)
            .map(|nodes| {
                nodes
                    .iter()
                    .map(|node| FixtureElement { node: node.clone() })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find_child(
        &mut self,
        parent: &FixtureElement,
        locator: &Locator,
    ) -> Result<Option<FixtureElement>, BrowserError> {
        self.ensure_live()?;
        Ok(parent
            .node
            .children
            .get(locator)
            .and_then(|nodes| nodes.first())
            .map(|node| FixtureElement { node: node.clone() }))
    }

    async fn attribute(
        &mut self,
        element: &FixtureElement,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        self.ensure_live()?;
        if element.node.failing_attrs.contains(name) {
            return Err(BrowserError::ScriptFailed(format!(
                "fixture refused attribute {name}"
            )));
        }
        Ok(element.node.attributes.get(name).cloned())
    }

    async fn text(&mut self, element: &FixtureElement) -> Result<Option<String>, BrowserError> {
        self.ensure_live()?;
        if element.node.failing_text {
            return Err(BrowserError::ScriptFailed("fixture refused text".to_string()));
        }
        Ok(element.node.text.clone())
    }

    async fn click(&mut self, element: &FixtureElement) -> Result<(), BrowserError> {
        let page = self.current_page()?;
        for (locator, node) in &element.node.reveals {
            page.elements
                .entry(locator.clone())
                .or_default()
                .push(node.clone());
        }
        self.log.lock().clicks += 1;
        Ok(())
    }

    async fn execute_script(&mut self, _script: &str) -> Result<(), BrowserError> {
        self.current_page()?.materialize();
        self.log.lock().scripts += 1;
        Ok(())
    }

    async fn open_tab(&mut self, url: &str) -> Result<TabId, BrowserError> {
        self.ensure_live()?;
        self.log.lock().opened_tabs.push(url.to_string());
        Ok(self.push_tab(url))
    }

    async fn current_tab(&mut self) -> Result<TabId, BrowserError> {
        self.ensure_live()?;
        self.current
            .and_then(|i| self.tabs.get(i))
            .map(|tab| tab.id.clone())
            .ok_or(BrowserError::NoActiveTab)
    }

    async fn tabs(&mut self) -> Result<Vec<TabId>, BrowserError> {
        self.ensure_live()?;
        Ok(self
            .tabs
            .iter()
            .filter(|tab| tab.visible)
            .map(|tab| tab.id.clone())
            .collect())
    }

    async fn switch_to(&mut self, tab: &TabId) -> Result<(), BrowserError> {
        self.ensure_live()?;
        let index = self
            .tabs
            .iter()
            .position(|t| &t.id == tab && t.visible)
            .ok_or_else(|| BrowserError::TabNotFound(tab.to_string()))?;
        self.current = Some(index);
        Ok(())
    }

    async fn close_tab(&mut self) -> Result<(), BrowserError> {
        self.ensure_live()?;
        let index = self.current.take().ok_or(BrowserError::NoActiveTab)?;
        self.tabs.remove(index);
        Ok(())
    }

    async fn quit(&mut self) -> Result<(), BrowserError> {
        self.ensure_live()?;
        self.quit = true;
        self.tabs.clear();
        self.current = None;
        self.log.lock().quits += 1;
        if self.site.fail_quit {
            return Err(BrowserError::Cdp("fixture quit failure".to_string()));
        }
        Ok(())
    }
}

/// Hands out [`FixtureDriver`]s that share one [`FixtureLog`].
#[derive(Debug, Clone)]
pub struct FixtureLauncher {
    site: Arc<FixtureSite>,
    log: FixtureLog,
    fail_launch: bool,
}

impl FixtureLauncher {
    pub fn new(site: FixtureSite) -> Self {
        Self {
            site: Arc::new(site),
            log: FixtureLog::default(),
            fail_launch: false,
        }
    }

    /// A launcher whose every launch fails.
    pub fn failing() -> Self {
        Self {
            fail_launch: true,
            ..Self::new(FixtureSite::new())
        }
    }

    pub fn log(&self) -> FixtureLog {
        self.log.clone()
    }
}

#[async_trait]
impl DriverLauncher for FixtureLauncher {
    type Driver = FixtureDriver;

    async fn launch(&self) -> Result<FixtureDriver, BrowserError> {
        self.log.lock().launches += 1;
        if self.fail_launch {
            return Err(BrowserError::LaunchFailed("fixture launch failure".to_string()));
        }
        Ok(FixtureDriver::new(self.site.clone(), self.log.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn row(code: &str) -> FixtureNode {
        FixtureNode::new().attr("data-scrip", code)
    }

    #[tokio::test]
    async fn test_lazy_rows_appear_after_script() {
        let rows = Locator::css("tr");
        let site = FixtureSite::new().page(
            "https://lev",
            FixturePage::new()
                .with(rows.clone(), row("AAA"))
                .lazy(rows.clone(), row("BBB")),
        );
        let launcher = FixtureLauncher::new(site);
        let mut driver = launcher.launch().await.unwrap();

        driver.navigate("https://lev").await.unwrap();
        assert_eq!(driver.find_elements(&rows).await.unwrap().len(), 1);

        driver.execute_script("scroll").await.unwrap();
        let found = driver.find_elements(&rows).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(
            driver.attribute(&found[1], "data-scrip").await.unwrap(),
            Some("BBB".to_string())
        );
    }

    #[tokio::test]
    async fn test_click_reveals_elements() {
        let option = Locator::css("option");
        let rows = Locator::css("tr");
        let site = FixtureSite::new().page(
            "https://list",
            FixturePage::new().with(
                option.clone(),
                FixtureNode::new().on_click_reveal(rows.clone(), row("X")),
            ),
        );
        let launcher = FixtureLauncher::new(site);
        let mut driver = launcher.launch().await.unwrap();
        driver.navigate("https://list").await.unwrap();

        let opt = driver.find_first(&option).await.unwrap().unwrap();
        driver.click(&opt).await.unwrap();
        assert_eq!(driver.find_elements(&rows).await.unwrap().len(), 1);
        assert_eq!(launcher.log().clicks(), 1);
    }

    #[tokio::test]
    async fn test_failing_reads() {
        let cell = Locator::css("td");
        let site = FixtureSite::new().page(
            "https://list",
            FixturePage::new().with(
                cell.clone(),
                FixtureNode::new()
                    .attr("data-scrip", "INFY")
                    .attr("data-mis_multiplier", "5")
                    .fail_attr("data-mis_multiplier")
                    .text("Infosys")
                    .fail_text(),
            ),
        );
        let launcher = FixtureLauncher::new(site);
        let mut driver = launcher.launch().await.unwrap();
        driver.navigate("https://list").await.unwrap();

        let found = driver.find_first(&cell).await.unwrap().unwrap();
        assert_eq!(
            driver.attribute(&found, "data-scrip").await.unwrap(),
            Some("INFY".to_string())
        );
        assert!(matches!(
            driver.attribute(&found, "data-mis_multiplier").await,
            Err(BrowserError::ScriptFailed(_))
        ));
        assert!(driver.text(&found).await.is_err());
    }

    #[tokio::test]
    async fn test_tab_lifecycle() {
        let launcher = FixtureLauncher::new(FixtureSite::new());
        let mut driver = launcher.launch().await.unwrap();
        let main = driver.current_tab().await.unwrap();

        let detail = driver.open_tab("https://detail").await.unwrap();
        assert_eq!(driver.current_tab().await.unwrap(), main);
        driver.wait_for_tab_count(2, Duration::ZERO).await.unwrap();

        driver.switch_to(&detail).await.unwrap();
        driver.close_tab().await.unwrap();
        assert!(matches!(
            driver.current_tab().await,
            Err(BrowserError::NoActiveTab)
        ));

        driver.switch_to(&main).await.unwrap();
        assert_eq!(driver.tabs().await.unwrap(), vec![main]);
        assert_eq!(launcher.log().opened_tabs(), vec!["https://detail"]);
    }

    #[tokio::test]
    async fn test_stalled_tab_times_out() {
        let launcher = FixtureLauncher::new(FixtureSite::new().stall_tab("https://slow"));
        let mut driver = launcher.launch().await.unwrap();
        let tab = driver.open_tab("https://slow").await.unwrap();

        let err = driver
            .wait_for_tab_count(2, Duration::ZERO)
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(driver.switch_to(&tab).await.is_err());
    }

    #[tokio::test]
    async fn test_wait_for_elements_times_out() {
        let launcher = FixtureLauncher::new(FixtureSite::new());
        let mut driver = launcher.launch().await.unwrap();
        let err = driver
            .wait_for_elements(&Locator::css("tr"), Duration::ZERO)
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(err.to_string().contains("css=tr"));
    }

    #[tokio::test]
    async fn test_quit_closes_session() {
        let launcher = FixtureLauncher::new(FixtureSite::new());
        let mut driver = launcher.launch().await.unwrap();
        driver.quit().await.unwrap();

        assert!(driver.navigate("https://x").await.is_err());
        assert_eq!(launcher.log().launches(), 1);
        assert_eq!(launcher.log().quits(), 1);
    }

    #[tokio::test]
    async fn test_failing_navigation_and_launch() {
        let launcher = FixtureLauncher::new(FixtureSite::new().fail_navigation("https://down"));
        let mut driver = launcher.launch().await.unwrap();
        let err = driver.navigate("https://down").await.unwrap_err();
        assert!(matches!(err, BrowserError::NavigationFailed { .. }));

        assert!(FixtureLauncher::failing().launch().await.is_err());
    }
}
