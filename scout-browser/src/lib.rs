//! scout-browser - Browser automation capability for the scout collectors.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod browser;
pub mod driver;
pub mod error;
#[cfg(any(test, feature = "testing"))]
pub mod fixture;
pub mod materialize;

pub use browser::{ChromeDriver, ChromeLauncher, SessionConfig, Viewport};
pub use driver::{BrowserDriver, DriverLauncher, Locator, TabId, WAIT_POLL_INTERVAL};
pub use error::BrowserError;
pub use materialize::{ScrollPlan, SCROLL_TO_BOTTOM};
