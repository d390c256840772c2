//! Sports analytics dashboards as plain functions
//!
//! Formula 1 "Super Time" season analysis, football league analytics and
//! match passing networks. Every page follows the same shape: fetch records
//! from a source, flatten them, aggregate, and hand tables to a renderer.

pub mod dashboard;
pub mod data;
pub mod features;
pub mod report;

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Environment variable consulted when the config file carries no API key
pub const API_KEY_ENV: &str = "APISPORTS_KEY";

/// Application-wide errors
#[derive(Debug, Error)]
pub enum SportsError {
    #[error("Source unavailable at {endpoint}: {message}")]
    SourceUnavailable { endpoint: String, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed record, field `{field}`: {message}")]
    MalformedRecord { field: String, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unknown selection: {0}")]
    UnknownSelection(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SportsError {
    pub fn malformed(field: &str, message: impl Into<String>) -> Self {
        SportsError::MalformedRecord {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// True for failures of the data source itself rather than of its data.
    ///
    /// The season loop skips a race on these and propagates everything else.
    pub fn is_source_failure(&self) -> bool {
        matches!(
            self,
            SportsError::SourceUnavailable { .. } | SportsError::Http(_) | SportsError::Json(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SportsError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "ApiSettings::formula1")]
    pub formula1: ApiSettings,
    #[serde(default = "ApiSettings::football")]
    pub football: ApiSettings,
    #[serde(default)]
    pub open_data: OpenDataConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Connection settings for one API-Sports product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Minimum gap between two network requests
    #[serde(default)]
    pub min_request_interval_ms: u64,
}

impl ApiSettings {
    /// Formula 1 API; the free plan allows 10 requests a minute
    pub fn formula1() -> Self {
        ApiSettings {
            base_url: "https://v1.formula-1.api-sports.io".to_string(),
            api_key: None,
            min_request_interval_ms: 6500,
        }
    }

    pub fn football() -> Self {
        ApiSettings {
            base_url: "https://v3.football.api-sports.io".to_string(),
            api_key: None,
            min_request_interval_ms: 0,
        }
    }

    /// Host header value derived from the base URL
    pub fn host(&self) -> &str {
        self.base_url
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/')
    }

    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }

    /// API key from the config file, falling back to an environment variable
    pub fn resolve_key(&self, env_var: &str) -> Result<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Ok(key.clone());
        }
        std::env::var(env_var)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                SportsError::Config(format!(
                    "No API key for {}: set api_key in the config or {}",
                    self.host(),
                    env_var
                ))
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenDataConfig {
    pub base_url: String,
    /// Directory holding downloaded event-data JSON files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<String>,
    /// Only read from the cache directory, never the network
    #[serde(default)]
    pub offline: bool,
}

impl Default for OpenDataConfig {
    fn default() -> Self {
        OpenDataConfig {
            base_url: "https://raw.githubusercontent.com/statsbomb/open-data/master/data"
                .to_string(),
            cache_dir: None,
            offline: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Lifetime of a cached API response, 0 keeps responses forever
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig { ttl_secs: 3600 }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Option<Duration> {
        (self.ttl_secs > 0).then(|| Duration::from_secs(self.ttl_secs))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            formula1: ApiSettings::formula1(),
            football: ApiSettings::football(),
            open_data: OpenDataConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SportsError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| SportsError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SportsError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
