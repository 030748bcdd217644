//! Lazy-row materialization.
//!
//! Listing pages render rows as the viewport approaches them. A fixed number
//! of scroll-to-bottom passes with a pause between each is a heuristic: rows
//! appended after the last pass are missed.

use std::time::Duration;

use scout_common::ScrollConfig;

use crate::driver::BrowserDriver;
use crate::error::BrowserError;

pub const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight);";

/// Scroll-to-bottom repeated `iterations` times, sleeping `pause` after each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollPlan {
    pub iterations: u32,
    pub pause: Duration,
}

impl ScrollPlan {
    pub fn new(iterations: u32, pause: Duration) -> Self {
        Self { iterations, pause }
    }

    pub async fn run<D>(&self, driver: &mut D) -> Result<(), BrowserError>
    where
        D: BrowserDriver + ?Sized,
    {
        for pass in 0..self.iterations {
            driver.execute_script(SCROLL_TO_BOTTOM).await?;
            tracing::trace!(pass = pass + 1, total = self.iterations, "Scrolled to bottom");
            if !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            }
        }
        Ok(())
    }
}

impl From<ScrollConfig> for ScrollPlan {
    fn from(config: ScrollConfig) -> Self {
        Self::new(config.iterations, config.pause())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DriverLauncher;
    use crate::fixture::{FixtureLauncher, FixtureSite};

    #[test]
    fn test_from_config() {
        let plan = ScrollPlan::from(ScrollConfig {
            iterations: 20,
            pause_ms: 500,
        });
        assert_eq!(plan.iterations, 20);
        assert_eq!(plan.pause, Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_run_scrolls_each_iteration() {
        let launcher = FixtureLauncher::new(FixtureSite::new());
        let mut driver = launcher.launch().await.unwrap();

        ScrollPlan::new(3, Duration::ZERO).run(&mut driver).await.unwrap();
        ScrollPlan::new(0, Duration::from_secs(5)).run(&mut driver).await.unwrap();
        assert_eq!(launcher.log().scripts(), 3);
    }
}
