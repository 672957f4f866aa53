//! Configuration management for newsdesk.
//!
//! Configuration is read from `~/.config/newsdesk/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.
//! The API base URL can be overridden with the `NEWSDESK_API_BASE_URL`
//! environment variable.

use crate::display::DisplayConfig;
use crate::fetcher::ApiConfig;
use crate::query::QueryConfig;
use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Environment variable that overrides `api.base_url`.
pub const API_BASE_URL_ENV: &str = "NEWSDESK_API_BASE_URL";

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub cache: QueryConfig,
    pub display: DisplayConfig,
}

impl Config {
    /// Load configuration from the default path, then apply environment overrides.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default().with_base_url_override(std::env::var(API_BASE_URL_ENV).ok()));
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, then apply environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(config.with_base_url_override(std::env::var(API_BASE_URL_ENV).ok()))
    }

    /// Replace the API base URL when an override is present and non-empty.
    pub fn with_base_url_override(mut self, base_url: Option<String>) -> Self {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.api.base_url = url.trim().to_string();
        }
        self
    }

    /// Get the default config file path: `~/.config/newsdesk/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("newsdesk").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# newsdesk configuration

[api]
# Base URL of the news REST API (overridden by NEWSDESK_API_BASE_URL)
base_url = "http://localhost:5000/api"

# Per-request timeout in seconds
timeout_secs = 10

user_agent = "newsdesk/0.1.0"

[cache]
# Seconds before a successful entry is refetched on the next subscription.
# Leave unset to keep data fresh for the whole session.
# stale_time_secs = 60

# Seconds an entry without subscribers is kept before eviction
gc_time_secs = 300

# Upper bound on cached entries
max_entries = 256

[display]
# "relative" (5 min ago, 3h ago, Yesterday) or "absolute" (2024-01-05 14:30)
date_style = "relative"

# Seconds each ad stays on screen before rotating
ad_rotation_secs = 5

# "leaderboard", "rectangle" or "sidebar"
ad_variant = "leaderboard"
"##
        .to_string()
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{AdVariant, DateStyle};
    use std::time::Duration;

    #[test]
    fn test_default_config_deserializes() {
        let content = Config::default_config_content();
        let config: Config = toml::from_str(&content).expect("Default config should be valid TOML");

        assert_eq!(config.api.base_url, "http://localhost:5000/api");
        assert_eq!(config.api.timeout(), Duration::from_secs(10));
        assert_eq!(config.cache.stale_time(), None);
        assert_eq!(config.cache.max_entries, 256);
        assert_eq!(config.display.date_style, DateStyle::Relative);
        assert_eq!(config.display.ad_variant, AdVariant::Leaderboard);
    }

    #[test]
    fn test_partial_config() {
        let content = r##"
[api]
base_url = "https://news.example.com/api"

[cache]
stale_time_secs = 30
"##;
        let config: Config = toml::from_str(content).expect("Partial config should work");

        assert_eq!(config.api.base_url, "https://news.example.com/api");
        assert_eq!(config.cache.stale_time(), Some(Duration::from_secs(30)));
        // Defaults for the rest
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.cache.gc_time(), Duration::from_secs(300));
    }

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").expect("Empty config should work");
        assert_eq!(config.api.base_url, ApiConfig::default().base_url);
        assert_eq!(config.display.ad_rotation_secs, 5);
    }

    #[test]
    fn test_base_url_override() {
        let config = Config::default().with_base_url_override(Some("http://api.test/v1".into()));
        assert_eq!(config.api.base_url, "http://api.test/v1");

        let config = Config::default().with_base_url_override(Some("   ".into()));
        assert_eq!(config.api.base_url, "http://localhost:5000/api");

        let config = Config::default().with_base_url_override(None);
        assert_eq!(config.api.base_url, "http://localhost:5000/api");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[display]\ndate_style = \"absolute\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.display.date_style, DateStyle::Absolute);
    }

    #[test]
    fn test_load_from_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[cache]\nmax_entries = \"lots\"\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
