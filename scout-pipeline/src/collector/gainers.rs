//! Top-gainers listing scrape with per-stock detail pages.

use std::time::Duration;

use scout_browser::{BrowserDriver, BrowserError, DriverLauncher, Locator, ScrollPlan};
use scout_common::GainersSourceConfig;
use tracing::{debug, error, info, warn};
use url::Url;

use super::{close_session, settle};
use crate::error::Result;
use crate::model::GainerRecord;

/// Exchange code from a details block such as `NSE: INFY | BSE: 500209`.
///
/// Takes the first line containing `label`, the text after it up to the
/// first `|`, trimmed. An empty code counts as absent.
pub fn parse_exchange_code(text: &str, label: &str) -> Option<String> {
    let line = text.lines().find(|line| line.contains(label))?;
    let (_, rest) = line.split_once(label)?;
    let code = rest.split_once('|').map_or(rest, |(head, _)| head).trim();
    (!code.is_empty()).then(|| code.to_string())
}

/// Collects ranked gainers with their display name and exchange code.
#[derive(Debug, Clone)]
pub struct GainersCollector {
    config: GainersSourceConfig,
}

impl GainersCollector {
    pub fn new(config: GainersSourceConfig) -> Self {
        Self { config }
    }

    /// Launch a session, scrape, and tear the session down.
    ///
    /// Returns whatever was assembled; per-item failures never fail the call.
    pub async fn collect<L: DriverLauncher>(&self, launcher: &L) -> Result<Vec<GainerRecord>> {
        let mut driver = launcher.launch().await?;
        let result = self.scrape(&mut driver).await;
        close_session(&mut driver, "gainers").await;
        result
    }

    pub async fn scrape<D: BrowserDriver>(&self, driver: &mut D) -> Result<Vec<GainerRecord>> {
        info!(url = %self.config.url, "Navigating to gainers listing");
        driver.navigate(&self.config.url).await?;
        settle(self.config.settle_ms).await;

        self.select_page_size(driver).await;
        ScrollPlan::from(self.config.scroll).run(driver).await?;

        let links = self.detail_links(driver).await?;
        info!(count = links.len(), "Extracted detail links");

        let mut records = Vec::new();
        for (index, link) in links.iter().enumerate() {
            let rank = index + 1;
            if let Err(e) = self.visit(driver, rank, link, &mut records).await {
                error!(rank, url = %link, error = %e, "Failed to process gainer");
                self.recover(driver).await;
            }
        }

        info!(count = records.len(), "Extracted top gainers");
        Ok(records)
    }

    /// Ask the listing for its largest page size. Absence is not an error.
    async fn select_page_size<D: BrowserDriver>(&self, driver: &mut D) {
        let option = Locator::css(&self.config.page_size_selector);
        let timeout = Duration::from_secs(self.config.page_size_timeout_secs);

        let result: std::result::Result<(), BrowserError> = async {
            let found = driver.wait_for_elements(&option, timeout).await?;
            let first = found.first().ok_or_else(|| BrowserError::ElementNotFound {
                selector: option.to_string(),
            })?;
            driver.click(first).await
        }
        .await;

        match result {
            Ok(()) => {
                info!("Selected full page size");
                settle(self.config.page_size_settle_ms).await;
            }
            Err(e) => warn!(error = %e, "Could not select page size, continuing with default"),
        }
    }

    /// Absolute detail-link URLs in listing order, capped at `row_cap`.
    async fn detail_links<D: BrowserDriver>(&self, driver: &mut D) -> Result<Vec<String>> {
        let rows = driver
            .find_elements(&Locator::css(&self.config.row_selector))
            .await?;
        info!(count = rows.len(), "Found listing rows");

        let base = Url::parse(&self.config.url).ok();
        let link_locator = Locator::css(&self.config.link_selector);
        let mut links = Vec::new();

        for row in &rows {
            if links.len() >= self.config.row_cap {
                break;
            }
            let href = match driver.find_child(row, &link_locator).await {
                Ok(Some(link)) => driver.attribute(&link, "href").await,
                Ok(None) => continue,
                Err(e) => Err(e),
            };
            match href {
                Ok(Some(href)) if !href.trim().is_empty() => {
                    links.push(resolve_link(base.as_ref(), href.trim()));
                }
                Ok(_) => {}
                Err(e) => debug!(error = %e, "Skipping unreadable listing row"),
            }
        }
        Ok(links)
    }

    /// Open one detail page in its own tab, extract, and return to the listing.
    async fn visit<D: BrowserDriver>(
        &self,
        driver: &mut D,
        rank: usize,
        link: &str,
        records: &mut Vec<GainerRecord>,
    ) -> std::result::Result<(), BrowserError> {
        let listing = driver.current_tab().await?;
        let detail = driver.open_tab(link).await?;
        settle(self.config.tab_open_pause_ms).await;
        driver
            .wait_for_tab_count(2, Duration::from_secs(self.config.tab_timeout_secs))
            .await?;
        driver.switch_to(&detail).await?;
        settle(self.config.tab_settle_ms).await;

        let display_name = self.display_name(driver).await?;
        let exchange_code = self.exchange_code(driver).await?;

        match GainerRecord::from_parts(display_name.clone(), exchange_code.clone()) {
            Some(record) => {
                info!(
                    rank,
                    name = %record.display_name,
                    code = %record.exchange_code,
                    "Extracted gainer"
                );
                records.push(record);
            }
            None => warn!(
                rank,
                name = ?display_name,
                code = ?exchange_code,
                "Incomplete gainer, dropping"
            ),
        }

        driver.close_tab().await?;
        driver.switch_to(&listing).await?;
        settle(self.config.tab_close_pause_ms).await;
        Ok(())
    }

    async fn display_name<D: BrowserDriver>(
        &self,
        driver: &mut D,
    ) -> std::result::Result<Option<String>, BrowserError> {
        for selector in [
            &self.config.heading_selector,
            &self.config.fallback_heading_selector,
        ] {
            if let Some(text) = first_text(driver, &Locator::css(selector)).await? {
                return Ok(Some(text));
            }
        }
        Ok(None)
    }

    async fn exchange_code<D: BrowserDriver>(
        &self,
        driver: &mut D,
    ) -> std::result::Result<Option<String>, BrowserError> {
        let block = first_text(driver, &Locator::css(&self.config.exchange_selector)).await?;
        Ok(block.and_then(|text| parse_exchange_code(&text, &self.config.exchange_label)))
    }

    /// Best-effort return to a single listing tab after a failed visit.
    async fn recover<D: BrowserDriver>(&self, driver: &mut D) {
        let open = match driver.tabs().await {
            Ok(tabs) => tabs,
            Err(e) => {
                debug!(error = %e, "Tab cleanup skipped");
                return;
            }
        };
        if open.len() > 1 {
            if let Err(e) = driver.close_tab().await {
                debug!(error = %e, "Tab cleanup: close failed");
            }
        }
        if driver.current_tab().await.is_err() {
            let first = driver.tabs().await.ok().and_then(|tabs| tabs.into_iter().next());
            if let Some(first) = first {
                if let Err(e) = driver.switch_to(&first).await {
                    debug!(error = %e, "Tab cleanup: switch failed");
                }
            }
        }
    }
}

/// Trimmed text of the first match, `None` when missing or blank.
async fn first_text<D: BrowserDriver>(
    driver: &mut D,
    locator: &Locator,
) -> std::result::Result<Option<String>, BrowserError> {
    let Some(element) = driver.find_first(locator).await? else {
        return Ok(None);
    };
    let text = driver.text(&element).await?;
    Ok(text
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty()))
}

fn resolve_link(base: Option<&Url>, href: &str) -> String {
    base.and_then(|base| base.join(href).ok())
        .map_or_else(|| href.to_string(), String::from)
}
