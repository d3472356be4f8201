//! Process-wide configuration: exchange credentials and fetch settings.
//!
//! Loaded once at startup from a TOML file and passed explicitly to whatever
//! needs it. A missing file is a fatal startup error.
//!
//! ```toml
//! [binanceus]
//! api_key = "..."
//! secret = "..."
//!
//! [fetch]
//! page_size = 500
//! retry_delay_secs = 5
//! ```

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

pub const DEFAULT_BASE_URL: &str = "https://api.binance.us";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found at {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(String),
}

/// Top-level configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Credentials and connection settings for the BinanceUS REST API.
    pub binanceus: ExchangeConfig,

    #[serde(default)]
    pub fetch: FetchSettings,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Resolve and load the config file.
    ///
    /// Lookup order: the explicit path if given, then `config/config.toml`,
    /// then `<user config dir>/candlekit/config.toml`.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = Self::locate(explicit);
        let config = Self::from_file(&path)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Path the config would be loaded from. When no candidate exists this is
    /// the local default, so a `NotFound` error names `config/config.toml`.
    pub fn locate(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        let local = PathBuf::from(DEFAULT_CONFIG_PATH);
        if local.exists() {
            return local;
        }
        dirs::config_dir()
            .map(|dir| dir.join("candlekit").join("config.toml"))
            .filter(|p| p.exists())
            .unwrap_or(local)
    }
}

/// Exchange credentials and connection settings.
#[derive(Clone, Deserialize)]
pub struct ExchangeConfig {
    pub api_key: String,
    pub secret: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request HTTP timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Minimum interval between requests, as published by the exchange.
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,
}

impl ExchangeConfig {
    pub fn new(api_key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret: secret.into(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            rate_limit_ms: default_rate_limit_ms(),
        }
    }
}

impl fmt::Debug for ExchangeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeConfig")
            .field("api_key", &redact(&self.api_key))
            .field("secret", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("rate_limit_ms", &self.rate_limit_ms)
            .finish()
    }
}

/// Keep the first four characters of a key so logs can tell keys apart.
fn redact(key: &str) -> String {
    let prefix: String = key.chars().take(4).collect();
    format!("{prefix}…")
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_rate_limit_ms() -> u64 {
    50
}

/// Pagination settings for the batch fetcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Maximum candles requested per page.
    pub page_size: usize,
    /// Wait after a transient network error before retrying the same page.
    pub retry_delay_secs: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            page_size: 500,
            retry_delay_secs: 5,
        }
    }
}
