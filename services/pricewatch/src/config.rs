//! Configuration types for the price watch dashboard

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// Where the price watch backend lives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Dashboard behaviour knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_history_size")]
    pub history_size: usize,
    #[serde(default = "default_price_stagger_ms")]
    pub price_stagger_ms: u64,
    #[serde(default = "default_status_poll_seconds")]
    pub status_poll_seconds: u64,
    #[serde(default = "default_notice_ttl_ms")]
    pub notice_ttl_ms: u64,
}

impl DashboardConfig {
    pub fn price_stagger(&self) -> Duration {
        Duration::from_millis(self.price_stagger_ms)
    }

    pub fn status_poll(&self) -> Duration {
        Duration::from_secs(self.status_poll_seconds.max(1))
    }

    pub fn notice_ttl(&self) -> Duration {
        Duration::from_millis(self.notice_ttl_ms)
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            history_size: default_history_size(),
            price_stagger_ms: default_price_stagger_ms(),
            status_poll_seconds: default_status_poll_seconds(),
            notice_ttl_ms: default_notice_ttl_ms(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_history_size() -> usize {
    100
}

fn default_price_stagger_ms() -> u64 {
    1000
}

fn default_status_poll_seconds() -> u64 {
    5
}

fn default_notice_ttl_ms() -> u64 {
    3000
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::DashboardError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}
