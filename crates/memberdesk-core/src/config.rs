//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which holds the backend base URL, the API token and display settings.
//!
//! Configuration is stored at `~/.config/memberdesk/config.json`; the
//! `BACKEND_API_URL` and `BACKEND_API_TOKEN` environment variables take
//! precedence over the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::changes::profile::DEFAULT_CURRENCY_SYMBOL;

/// Application name used for the config directory path
const APP_NAME: &str = "memberdesk";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable holding the backend base URL
pub const BACKEND_URL_ENV: &str = "BACKEND_API_URL";

/// Environment variable holding the backend bearer token
pub const BACKEND_TOKEN_ENV: &str = "BACKEND_API_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub backend_api_url: Option<String>,
    pub api_token: Option<String>,
    pub currency_symbol: Option<String>,
}

impl Config {
    /// Load the config file (if any), then apply environment overrides
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let config = Self::load_from(&path)?;
        Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Apply overrides from the environment; blank variables are ignored
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = non_blank(BACKEND_URL_ENV) {
            self.backend_api_url = Some(url);
        }
        if let Some(token) = non_blank(BACKEND_TOKEN_ENV) {
            self.api_token = Some(token);
        }
        self
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// The backend base URL without a trailing slash
    pub fn backend_url(&self) -> Result<&str> {
        self.backend_api_url
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/'))
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "{} is not set (export it or run `memberdesk config --backend-url <URL>`)",
                    BACKEND_URL_ENV
                )
            })
    }

    pub fn currency_symbol(&self) -> &str {
        self.currency_symbol.as_deref().unwrap_or(DEFAULT_CURRENCY_SYMBOL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_overrides_file_values() {
        let config = Config {
            backend_api_url: Some("http://file.example/api".to_string()),
            api_token: Some("file-token".to_string()),
            currency_symbol: None,
        };
        let config = config.with_env_overrides(|key| match key {
            BACKEND_URL_ENV => Some("https://env.example/api/".to_string()),
            BACKEND_TOKEN_ENV => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(config.backend_url().ok(), Some("https://env.example/api"));
        assert_eq!(config.api_token.as_deref(), Some("file-token"));
    }

    #[test]
    fn test_missing_backend_url_is_an_error() {
        let config = Config::default();
        let err = config.backend_url().expect_err("missing URL should fail");
        assert!(err.to_string().contains(BACKEND_URL_ENV));
    }

    #[test]
    fn test_currency_symbol_default() {
        assert_eq!(Config::default().currency_symbol(), "₹");
        let config = Config {
            currency_symbol: Some("$".to_string()),
            ..Default::default()
        };
        assert_eq!(config.currency_symbol(), "$");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = std::env::temp_dir().join(format!("memberdesk-config-test-{}", std::process::id()));
        let path = dir.join(CONFIG_FILE);
        let config = Config {
            backend_api_url: Some("http://localhost:8000/api".to_string()),
            api_token: None,
            currency_symbol: Some("₹".to_string()),
        };
        config.save_to(&path).expect("config should save");
        let loaded = Config::load_from(&path).expect("config should load");
        assert_eq!(loaded, config);
        let _ = std::fs::remove_dir_all(dir);
    }
}
