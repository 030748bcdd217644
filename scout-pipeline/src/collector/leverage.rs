//! Margin-calculator scrape.

use std::time::Duration;

use scout_browser::{BrowserDriver, DriverLauncher, Locator, ScrollPlan};
use scout_common::LeverageSourceConfig;
use tracing::{debug, info};

use super::{close_session, settle};
use crate::error::Result;
use crate::model::LeverageTable;

/// Collects instrument codes and their intraday multipliers.
#[derive(Debug, Clone)]
pub struct LeverageCollector {
    config: LeverageSourceConfig,
    target: String,
}

impl LeverageCollector {
    pub fn new(config: LeverageSourceConfig, target: impl Into<String>) -> Self {
        Self {
            config,
            target: target.into(),
        }
    }

    /// Launch a session, scrape the table, and tear the session down.
    pub async fn collect<L: DriverLauncher>(&self, launcher: &L) -> Result<LeverageTable> {
        let mut driver = launcher.launch().await?;
        let result = self.scrape(&mut driver).await;
        close_session(&mut driver, "leverage").await;
        result
    }

    /// Scrape with an already-open session.
    pub async fn scrape<D: BrowserDriver>(&self, driver: &mut D) -> Result<LeverageTable> {
        info!(url = %self.config.url, "Navigating to margin calculator");
        driver.navigate(&self.config.url).await?;

        let marker = Locator::css(&self.config.row_selector);
        driver
            .wait_for_elements(
                &marker,
                Duration::from_secs(self.config.ready_timeout_secs),
            )
            .await?;
        settle(self.config.settle_ms).await;

        ScrollPlan::from(self.config.scroll).run(driver).await?;

        let rows = driver.find_elements(&marker).await?;
        info!(count = rows.len(), "Found leverage rows");

        let mut table = LeverageTable::new(&self.target);
        for row in &rows {
            let code = match driver.attribute(row, &self.config.code_attribute).await {
                Ok(code) => code,
                Err(e) => {
                    debug!(error = %e, "Skipping unreadable leverage row");
                    continue;
                }
            };
            let multiplier = match driver
                .attribute(row, &self.config.multiplier_attribute)
                .await
            {
                Ok(multiplier) => multiplier,
                Err(e) => {
                    debug!(error = %e, "Skipping unreadable leverage row");
                    continue;
                }
            };
            table.insert(code.as_deref(), multiplier.as_deref());
        }

        info!(
            count = table.len(),
            qualifying = table.qualifying().len(),
            target = %self.target,
            "Extracted leverage table"
        );
        Ok(table)
    }
}
