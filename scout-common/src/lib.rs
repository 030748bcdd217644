//! Scout Common - Shared types, utilities, and configuration for the scout workspace.
//!
//! This crate provides:
//! - Configuration types and loading
//! - Configuration validation
//! - Error types
//! - Logging setup

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod logging;
pub mod validation;

pub use config::{
    BotConfig, BrowserConfig, Config, GainersSourceConfig, LeverageSourceConfig,
    ObservabilityConfig, OutputConfig, ScrollConfig,
};
pub use error::{Error, Result};
pub use validation::{Validate, ValidationError, ValidationResult};
