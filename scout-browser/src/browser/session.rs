//! Browser session configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_headless")]
    pub headless: bool,
    #[serde(default = "default_viewport")]
    pub viewport: Viewport,
    pub user_agent: Option<String>,
    #[serde(default)]
    pub extra_args: Vec<String>,
    pub executable: Option<PathBuf>,
}

fn default_headless() -> bool {
    true
}

fn default_viewport() -> Viewport {
    Viewport {
        width: 1920,
        height: 1080,
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport: default_viewport(),
            user_agent: None,
            extra_args: Vec::new(),
            executable: None,
        }
    }
}

impl From<&scout_common::BrowserConfig> for SessionConfig {
    fn from(config: &scout_common::BrowserConfig) -> Self {
        Self {
            headless: config.headless,
            viewport: Viewport {
                width: config.window_width,
                height: config.window_height,
            },
            user_agent: Some(config.user_agent.clone()).filter(|ua| !ua.trim().is_empty()),
            extra_args: config.extra_args.clone(),
            executable: config.executable.clone(),
        }
    }
}

/// Viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl SessionConfig {
    /// Chrome switches beyond headless/sandbox/window handling.
    ///
    /// Sites behind bot detection refuse pages when the automation flag is set.
    pub fn chrome_args(&self) -> Vec<String> {
        let mut args = vec![
            "--disable-dev-shm-usage".to_string(),
            "--disable-blink-features=AutomationControlled".to_string(),
        ];
        if let Some(ref ua) = self.user_agent {
            args.push(format!("--user-agent={ua}"));
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }
}
