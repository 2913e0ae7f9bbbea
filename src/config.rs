use serde::Deserialize;
use std::fs;
use std::time::Duration;

use crate::error::{Result, TurnosError};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub backend: BackendConfig,
    pub credentials: Credentials,
    #[serde(default)]
    pub alerts: AlertConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AlertConfig {
    #[serde(default = "default_notice_timeout_ms")]
    pub notice_timeout_ms: u64,
}

fn default_notice_timeout_ms() -> u64 {
    3000
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            notice_timeout_ms: default_notice_timeout_ms(),
        }
    }
}

impl AlertConfig {
    pub fn notice_timeout(&self) -> Duration {
        Duration::from_millis(self.notice_timeout_ms)
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            TurnosError::Config(format!("Failed to read config file '{}': {}", path, e))
        })?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
