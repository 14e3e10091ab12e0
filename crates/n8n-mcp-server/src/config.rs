//! Connection settings for the n8n instance.
//!
//! The configuration is resolved once at startup and handed to the client
//! constructor as an immutable value.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Address used when neither the config file nor the environment names one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5678";

/// Environment variable holding the n8n base address.
pub const ENV_BASE_URL: &str = "N8N_URL";

/// Environment variable holding the n8n API key.
pub const ENV_API_KEY: &str = "N8N_API_KEY";

/// Path prefix of the n8n public REST API.
pub const API_PREFIX: &str = "/api/v1";

/// Base address and credential of one n8n instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct N8nConfig {
    /// Instance address without the `/api/v1` suffix (e.g. `https://acme.app.n8n.cloud`)
    pub base_url: String,
    /// Value sent in the `X-N8N-API-KEY` header
    pub api_key: String,
}

/// Partial settings as found in a YAML config file.
#[derive(Debug, Clone, Default, Deserialize)]
struct FileConfig {
    base_url: Option<String>,
    api_key: Option<String>,
}

impl Default for N8nConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
        }
    }
}

impl N8nConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into()),
            api_key: api_key.into(),
        }
    }

    /// Resolve the configuration from the process environment only.
    pub fn from_env() -> Self {
        Self::default().with_env(|key| std::env::var(key).ok())
    }

    /// Load configuration from a YAML file; missing keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let file: FileConfig =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        let defaults = Self::default();
        Ok(Self::new(
            file.base_url.unwrap_or(defaults.base_url),
            file.api_key.unwrap_or(defaults.api_key),
        ))
    }

    /// Overlay values found through `lookup` (normally `std::env::var`).
    ///
    /// Unset or empty variables leave the current value untouched.
    pub fn with_env<F>(self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(ENV_BASE_URL)
            .filter(|v| !v.is_empty())
            .unwrap_or(self.base_url);
        let api_key = lookup(ENV_API_KEY)
            .filter(|v| !v.is_empty())
            .unwrap_or(self.api_key);
        Self::new(base_url, api_key)
    }

    /// Overlay explicit values (command-line flags).
    pub fn with_overrides(self, base_url: Option<String>, api_key: Option<String>) -> Self {
        Self::new(
            base_url.unwrap_or(self.base_url),
            api_key.unwrap_or(self.api_key),
        )
    }

    /// Root of the REST API, e.g. `http://localhost:5678/api/v1`.
    pub fn api_url(&self) -> String {
        format!("{}{}", self.base_url, API_PREFIX)
    }

    /// True when no credential was configured anywhere.
    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Invalid API key: {0}")]
    InvalidApiKey(String),
    #[error("HTTP client error: {0}")]
    Client(String),
}
