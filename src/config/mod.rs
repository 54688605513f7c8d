//! Configuration management for feedwatch.
//!
//! Configuration is read from `~/.config/feedwatch/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::notify::ItemComparison;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sync: SyncConfig,
    pub notifications: NotificationConfig,
}

/// Fetch fan-out and time budget settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Maximum concurrent outbound fetches
    pub workers: usize,
    /// Per-request HTTP timeout in seconds
    pub request_timeout_secs: u64,
    /// Time budget for one background sync cycle in seconds
    pub background_budget_secs: u64,
    pub user_agent: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            request_timeout_secs: 10,
            background_budget_secs: 25,
            user_agent: format!("feedwatch/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl SyncConfig {
    pub fn background_budget(&self) -> Duration {
        Duration::from_secs(self.background_budget_secs)
    }
}

/// How new-article notifications are worded and detected.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub body: String,
    pub delay_secs: u64,
    pub comparison: ItemComparison,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            body: "New articles are available".to_string(),
            delay_secs: 1,
            comparison: ItemComparison::Title,
        }
    }
}

impl NotificationConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &PathBuf) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            Self::create_default_config(config_path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: config_path.clone(),
            source: e,
        })?;

        if config.sync.workers == 0 {
            return Err(ConfigError::Invalid(
                "sync.workers must be at least 1".to_string(),
            ));
        }

        Ok(config)
    }

    /// Get the default config file path: `~/.config/feedwatch/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("feedwatch").join("config.toml"))
    }

    fn create_default_config(path: &PathBuf) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.clone(),
                source: e,
            })?;

        Ok(())
    }

    fn default_config_content() -> &'static str {
        r##"# feedwatch configuration

[sync]
# Maximum number of feeds fetched at the same time
workers = 8

# HTTP request timeout in seconds
request_timeout_secs = 10

# Background cycles give up on unfinished feeds after this many seconds
background_budget_secs = 25

[notifications]
# Body text of the per-feed "new articles" notification
body = "New articles are available"

# Delay before the notification is shown, in seconds
delay_secs = 1

# How items are compared to detect new ones: "title" or "identity"
comparison = "title"
"##
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
