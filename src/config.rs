use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;

use crate::dispatch::DEFAULT_WAIT_SECS;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollingConfig {
    /// Long-poll window passed to getUpdates, in seconds
    #[serde(default = "default_wait_secs")]
    pub wait_secs: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            wait_secs: default_wait_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,
    /// Fallback filter when RUST_LOG is not set
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            filter: default_log_filter(),
        }
    }
}

fn default_wait_secs() -> u32 {
    DEFAULT_WAIT_SECS
}

fn default_logging_enabled() -> bool {
    true
}

fn default_log_filter() -> String {
    "info,tgkit=debug".to_string()
}

/// Read a TOML file into any deserializable type.
///
/// Bots built on this crate can keep their own settings next to `[telegram]`
/// by defining a struct of their own and loading it here.
pub fn load_config<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let config: Config = load_config(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.trim().is_empty() {
            anyhow::bail!("telegram.bot_token must not be empty");
        }
        if self.polling.wait_secs == 0 {
            anyhow::bail!("polling.wait_secs must be greater than zero");
        }
        Ok(())
    }
}
