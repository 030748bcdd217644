//! Configuration management for scout services.
//!
//! Both binaries share a single configuration file at `~/.scout/config.json`
//! (or the path in `SCOUT_CONFIG`). Every field has a default, so a missing
//! file is not an error.
//!
//! # Configuration Priority
//!
//! 1. Environment variables (SCOUT_* prefix)
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `SCOUT_LOG_LEVEL` → observability.log_level
//! - `SCOUT_LOG_FORMAT` → observability.log_format
//! - `SCOUT_HEADLESS` → browser.headless
//! - `SCOUT_LEVERAGE_URL` → leverage.url
//! - `SCOUT_GAINERS_URL` → gainers.url
//! - `SCOUT_OUTPUT_DIR` → output.dir
//! - `SCOUT_TARGET_MULTIPLIER` → output.target_multiplier
//! - `TELEGRAM_BOT_TOKEN` → bot.bot_token
//! - `SCOUT_JOB_TIMEOUT_SECS` → bot.job_timeout_secs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".scout"),
        |dirs| dirs.home_dir().join(".scout"),
    )
}

/// Get the configuration file path, honouring `SCOUT_CONFIG`.
pub fn config_path() -> PathBuf {
    std::env::var("SCOUT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| config_dir().join("config.json"))
}

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Browser launch options shared by both collectors
    #[serde(default)]
    pub browser: BrowserConfig,

    /// Margin calculator source
    #[serde(default)]
    pub leverage: LeverageSourceConfig,

    /// Top gainers source
    #[serde(default)]
    pub gainers: GainersSourceConfig,

    /// Result files
    #[serde(default)]
    pub output: OutputConfig,

    /// Telegram command layer
    #[serde(default)]
    pub bot: BotConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::info!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load configuration with environment variable overrides.
    pub fn load_with_env() -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("SCOUT_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Ok(format) = std::env::var("SCOUT_LOG_FORMAT") {
            self.observability.log_format = format;
        }

        if let Ok(headless) = std::env::var("SCOUT_HEADLESS") {
            if let Ok(h) = headless.parse() {
                self.browser.headless = h;
            }
        }

        if let Ok(url) = std::env::var("SCOUT_LEVERAGE_URL") {
            self.leverage.url = url;
        }
        if let Ok(url) = std::env::var("SCOUT_GAINERS_URL") {
            self.gainers.url = url;
        }

        if let Ok(dir) = std::env::var("SCOUT_OUTPUT_DIR") {
            self.output.dir = PathBuf::from(dir);
        }
        if let Ok(target) = std::env::var("SCOUT_TARGET_MULTIPLIER") {
            self.output.target_multiplier = target.trim().to_string();
        }

        if let Ok(token) = std::env::var("TELEGRAM_BOT_TOKEN") {
            self.bot.bot_token = Some(token);
        }
        if let Ok(timeout) = std::env::var("SCOUT_JOB_TIMEOUT_SECS") {
            if let Ok(t) = timeout.parse() {
                self.bot.job_timeout_secs = t;
            }
        }
    }
}

// ============================================================================
// Observability
// ============================================================================

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,

    /// Additional module targets to hold at `warn`.
    #[serde(default)]
    pub excluded_targets: Vec<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            excluded_targets: Vec::new(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

// ============================================================================
// Browser
// ============================================================================

/// Browser launch options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_true")]
    pub headless: bool,
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    #[serde(default = "default_window_height")]
    pub window_height: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Extra command line switches passed to Chrome.
    #[serde(default)]
    pub extra_args: Vec<String>,
    /// Explicit Chrome/Chromium executable; auto-detected when unset.
    #[serde(default)]
    pub executable: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: default_window_width(),
            window_height: default_window_height(),
            user_agent: default_user_agent(),
            extra_args: Vec::new(),
            executable: None,
        }
    }
}

fn default_window_width() -> u32 {
    1920
}

fn default_window_height() -> u32 {
    1080
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}

// ============================================================================
// Scroll plan
// ============================================================================

/// Fixed-count scroll-to-bottom plan used to force lazy rows to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollConfig {
    pub iterations: u32,
    pub pause_ms: u64,
}

impl ScrollConfig {
    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }
}

// ============================================================================
// Leverage source
// ============================================================================

/// Margin calculator page and its structural markers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeverageSourceConfig {
    #[serde(default = "default_leverage_url")]
    pub url: String,

    /// Rows carrying the instrument attributes; also the ready marker.
    #[serde(default = "default_leverage_row_selector")]
    pub row_selector: String,

    #[serde(default = "default_code_attribute")]
    pub code_attribute: String,

    #[serde(default = "default_multiplier_attribute")]
    pub multiplier_attribute: String,

    #[serde(default = "default_leverage_ready_timeout")]
    pub ready_timeout_secs: u64,

    #[serde(default = "default_leverage_settle_ms")]
    pub settle_ms: u64,

    #[serde(default = "default_leverage_scroll")]
    pub scroll: ScrollConfig,
}

impl Default for LeverageSourceConfig {
    fn default() -> Self {
        Self {
            url: default_leverage_url(),
            row_selector: default_leverage_row_selector(),
            code_attribute: default_code_attribute(),
            multiplier_attribute: default_multiplier_attribute(),
            ready_timeout_secs: default_leverage_ready_timeout(),
            settle_ms: default_leverage_settle_ms(),
            scroll: default_leverage_scroll(),
        }
    }
}

fn default_leverage_url() -> String {
    "https://zerodha.com/margin-calculator/Equity/".to_string()
}

fn default_leverage_row_selector() -> String {
    "tr[data-scrip]".to_string()
}

fn default_code_attribute() -> String {
    "data-scrip".to_string()
}

fn default_multiplier_attribute() -> String {
    "data-mis_multiplier".to_string()
}

fn default_leverage_ready_timeout() -> u64 {
    15
}

fn default_leverage_settle_ms() -> u64 {
    5000
}

fn default_leverage_scroll() -> ScrollConfig {
    ScrollConfig {
        iterations: 20,
        pause_ms: 500,
    }
}

// ============================================================================
// Gainers source
// ============================================================================

/// Top gainers listing and detail page selectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GainersSourceConfig {
    #[serde(default = "default_gainers_url")]
    pub url: String,

    /// Settle time after the listing loads (ms)
    #[serde(default = "default_gainers_settle_ms")]
    pub settle_ms: u64,

    /// "Show 100 rows" option; missing control is tolerated.
    #[serde(default = "default_page_size_selector")]
    pub page_size_selector: String,

    #[serde(default = "default_page_size_timeout")]
    pub page_size_timeout_secs: u64,

    #[serde(default = "default_page_size_settle_ms")]
    pub page_size_settle_ms: u64,

    #[serde(default = "default_gainers_scroll")]
    pub scroll: ScrollConfig,

    #[serde(default = "default_gainers_row_selector")]
    pub row_selector: String,

    /// Detail link inside a listing row.
    #[serde(default = "default_link_selector")]
    pub link_selector: String,

    #[serde(default = "default_heading_selector")]
    pub heading_selector: String,

    #[serde(default = "default_fallback_heading_selector")]
    pub fallback_heading_selector: String,

    #[serde(default = "default_exchange_selector")]
    pub exchange_selector: String,

    /// Label preceding the exchange code, e.g. `NSE:`.
    #[serde(default = "default_exchange_label")]
    pub exchange_label: String,

    /// Maximum detail pages visited (at most 100).
    #[serde(default = "default_row_cap")]
    pub row_cap: usize,

    #[serde(default = "default_tab_open_pause_ms")]
    pub tab_open_pause_ms: u64,

    #[serde(default = "default_tab_timeout")]
    pub tab_timeout_secs: u64,

    #[serde(default = "default_tab_settle_ms")]
    pub tab_settle_ms: u64,

    #[serde(default = "default_tab_close_pause_ms")]
    pub tab_close_pause_ms: u64,
}

impl Default for GainersSourceConfig {
    fn default() -> Self {
        Self {
            url: default_gainers_url(),
            settle_ms: default_gainers_settle_ms(),
            page_size_selector: default_page_size_selector(),
            page_size_timeout_secs: default_page_size_timeout(),
            page_size_settle_ms: default_page_size_settle_ms(),
            scroll: default_gainers_scroll(),
            row_selector: default_gainers_row_selector(),
            link_selector: default_link_selector(),
            heading_selector: default_heading_selector(),
            fallback_heading_selector: default_fallback_heading_selector(),
            exchange_selector: default_exchange_selector(),
            exchange_label: default_exchange_label(),
            row_cap: default_row_cap(),
            tab_open_pause_ms: default_tab_open_pause_ms(),
            tab_timeout_secs: default_tab_timeout(),
            tab_settle_ms: default_tab_settle_ms(),
            tab_close_pause_ms: default_tab_close_pause_ms(),
        }
    }
}

fn default_gainers_url() -> String {
    "https://trendlyne.com/stock-screeners/price-based/top-gainers/3-month/index/NIFTY500/nifty-500/"
        .to_string()
}

fn default_gainers_settle_ms() -> u64 {
    8000
}

fn default_page_size_selector() -> String {
    "option[value='100']".to_string()
}

fn default_page_size_timeout() -> u64 {
    10
}

fn default_page_size_settle_ms() -> u64 {
    5000
}

fn default_gainers_scroll() -> ScrollConfig {
    ScrollConfig {
        iterations: 30,
        pause_ms: 800,
    }
}

fn default_gainers_row_selector() -> String {
    "tbody > tr".to_string()
}

fn default_link_selector() -> String {
    "a[href*='/equity/']".to_string()
}

fn default_heading_selector() -> String {
    "span.stock_info_heading".to_string()
}

fn default_fallback_heading_selector() -> String {
    "h1".to_string()
}

fn default_exchange_selector() -> String {
    "span.stock_exchange_details".to_string()
}

fn default_exchange_label() -> String {
    "NSE:".to_string()
}

fn default_row_cap() -> usize {
    100
}

fn default_tab_open_pause_ms() -> u64 {
    1000
}

fn default_tab_timeout() -> u64 {
    10
}

fn default_tab_settle_ms() -> u64 {
    2000
}

fn default_tab_close_pause_ms() -> u64 {
    500
}

// ============================================================================
// Output
// ============================================================================

/// Result file configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving `<prefix>_<timestamp>.{csv,xlsx}`
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_output_prefix")]
    pub prefix: String,

    /// Multiplier that marks a stock as qualifying (raw attribute value).
    #[serde(default = "default_target_multiplier")]
    pub target_multiplier: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            prefix: default_output_prefix(),
            target_multiplier: default_target_multiplier(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_output_prefix() -> String {
    "Trendlyne_TopGainers_5x_Leverage".to_string()
}

fn default_target_multiplier() -> String {
    "5".to_string()
}

// ============================================================================
// Bot
// ============================================================================

/// Telegram command layer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Usernames or user ids allowed to issue commands; empty allows everyone.
    #[serde(default)]
    pub allowed_users: Vec<String>,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Scrape job launched per request, run with no arguments.
    #[serde(default = "default_job_binary")]
    pub job_binary: PathBuf,

    #[serde(default = "default_job_timeout")]
    pub job_timeout_secs: u64,

    /// Long-poll timeout passed to getUpdates.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            allowed_users: Vec::new(),
            api_base_url: default_api_base_url(),
            job_binary: default_job_binary(),
            job_timeout_secs: default_job_timeout(),
            poll_timeout_secs: default_poll_timeout(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_job_binary() -> PathBuf {
    PathBuf::from("scout")
}

fn default_job_timeout() -> u64 {
    600
}

fn default_poll_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_sources() {
        let config = Config::default();
        assert_eq!(config.output.target_multiplier, "5");
        assert_eq!(config.gainers.row_cap, 100);
        assert_eq!(config.leverage.ready_timeout_secs, 15);
        assert_eq!(config.leverage.scroll.iterations, 20);
        assert_eq!(config.gainers.scroll.iterations, 30);
        assert_eq!(config.bot.job_timeout_secs, 600);
        assert!(config.browser.headless);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{
            "output": { "target_multiplier": "4" },
            "gainers": { "row_cap": 25, "scroll": { "iterations": 2, "pause_ms": 0 } }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.output.target_multiplier, "4");
        assert_eq!(config.output.prefix, "Trendlyne_TopGainers_5x_Leverage");
        assert_eq!(config.gainers.row_cap, 25);
        assert_eq!(config.gainers.scroll.iterations, 2);
        assert_eq!(config.gainers.exchange_label, "NSE:");
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_observability_aliases() {
        let json = r#"{ "observability": { "level": "debug", "format": "json" } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.observability.log_level, "debug");
        assert_eq!(config.observability.log_format, "json");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "bot": { "job_timeout_secs": 120 } }"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.bot.job_timeout_secs, 120);
        assert_eq!(config.bot.poll_timeout_secs, 30);
    }

    #[test]
    fn test_load_from_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_scroll_pause_duration() {
        let scroll = ScrollConfig {
            iterations: 3,
            pause_ms: 250,
        };
        assert_eq!(scroll.pause(), Duration::from_millis(250));
    }
}
