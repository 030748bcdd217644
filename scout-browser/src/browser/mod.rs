//! Chrome session handling.

pub mod chrome;
pub mod session;

pub use chrome::{ChromeDriver, ChromeLauncher};
pub use session::{SessionConfig, Viewport};
