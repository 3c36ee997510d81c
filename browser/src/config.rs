use serde::Deserialize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_headless")]
    pub headless: bool,

    #[serde(default = "default_viewport")]
    pub viewport: ViewportConfig,

    /// Upper bound on navigation (initial load and reload), in milliseconds.
    #[serde(default = "default_nav_timeout_ms")]
    pub nav_timeout_ms: u64,

    /// Persistent profile directory. When unset, each session gets a fresh
    /// temporary profile that is removed on teardown.
    #[serde(default)]
    pub user_data_dir: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            viewport: default_viewport(),
            nav_timeout_ms: default_nav_timeout_ms(),
            user_data_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewportConfig {
    pub width: u32,
    pub height: u32,

    #[serde(default = "default_device_scale_factor")]
    pub device_scale_factor: f64,

    #[serde(default)]
    pub mobile: bool,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        default_viewport()
    }
}

fn default_headless() -> bool {
    true
}

fn default_viewport() -> ViewportConfig {
    ViewportConfig {
        width: 1280,
        height: 720,
        device_scale_factor: 1.0,
        mobile: false,
    }
}

fn default_nav_timeout_ms() -> u64 {
    30_000
}

fn default_device_scale_factor() -> f64 {
    1.0
}
