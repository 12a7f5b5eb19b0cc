//! Configuration for the routing engine and CLI.

use crate::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Default identity provider API URL (can be overridden at compile time via COMMITTED_API_URL env var).
pub const DEFAULT_API_URL: &str = match option_env!("COMMITTED_API_URL") {
    Some(url) => url,
    None => "https://auth.committed.app",
};

/// Default publishable API key (can be overridden at compile time via COMMITTED_PUBLISHABLE_KEY env var).
pub const DEFAULT_PUBLISHABLE_KEY: &str = match option_env!("COMMITTED_PUBLISHABLE_KEY") {
    Some(key) => key,
    None => "committed-publishable-key",
};

/// Deep-link scheme registered by the mobile app.
pub const DEFAULT_APP_SCHEME: &str = "committed";

/// Web origin that serves auth-callback links.
pub const DEFAULT_WEB_ORIGIN: &str = "https://committed.app";

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Identity provider project URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Publishable API key (public, safe to expose).
    #[serde(default = "default_publishable_key")]
    pub publishable_key: String,
    /// Deep-link scheme the app intercepts.
    #[serde(default = "default_app_scheme")]
    pub app_scheme: String,
    /// Web origin that hosts the universal-link pages.
    #[serde(default = "default_web_origin")]
    pub web_origin: String,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_publishable_key() -> String {
    DEFAULT_PUBLISHABLE_KEY.to_string()
}

fn default_app_scheme() -> String {
    DEFAULT_APP_SCHEME.to_string()
}

fn default_web_origin() -> String {
    DEFAULT_WEB_ORIGIN.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            publishable_key: DEFAULT_PUBLISHABLE_KEY.to_string(),
            app_scheme: DEFAULT_APP_SCHEME.to_string(),
            web_origin: DEFAULT_WEB_ORIGIN.to_string(),
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from a specific file.
    /// Note: api_url and publishable_key are compile-time only and will
    /// always use the built-in defaults, regardless of what's in the file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = serde_json::from_str(&content)?;

        // Force compile-time values (never from config file)
        config.api_url = DEFAULT_API_URL.to_string();
        config.publishable_key = DEFAULT_PUBLISHABLE_KEY.to_string();

        config.load_from_env();
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save_to_file(&self, path: &Path) -> CoreResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Override configuration from environment variables.
    /// Only log_level can be overridden at runtime.
    fn load_from_env(&mut self) {
        if let Ok(log_level) = std::env::var("COMMITTED_LOG_LEVEL") {
            self.log_level = log_level;
        }
    }

    /// Validate that the configured endpoints are well-formed URLs.
    pub fn validate(&self) -> CoreResult<()> {
        Url::parse(&self.api_url)
            .map_err(|e| CoreError::Config(format!("invalid api_url: {e}")))?;
        Url::parse(&self.web_origin)
            .map_err(|e| CoreError::Config(format!("invalid web_origin: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.app_scheme, "committed");
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.log_level, config.log_level);
        assert_eq!(parsed.web_origin, config.web_origin);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: Config = serde_json::from_str(r#"{"log_level": "debug"}"#).unwrap();
        assert_eq!(parsed.log_level, "debug");
        assert_eq!(parsed.api_url, DEFAULT_API_URL);
        assert_eq!(parsed.publishable_key, DEFAULT_PUBLISHABLE_KEY);
    }

    #[test]
    fn test_validate() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.api_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }
}
