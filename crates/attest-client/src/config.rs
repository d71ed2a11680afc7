//! Configuration file management for the Attest backend endpoint.
//!
//! Supports reading settings from `~/.config/attest/secret.json`.
//! Configuration priority: secret.json > environment variables.

use attest_core::error::{AttestError, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the intake backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the REST backend, without a trailing slash.
    pub base_url: String,
    /// Bearer token sent with every request, if the deployment needs one.
    pub api_key: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl BackendConfig {
    /// Creates a config pointing at the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Adds an API key to be sent as a bearer token.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Overrides the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Loads configuration from `~/.config/attest/secret.json` or
    /// environment variables.
    ///
    /// Priority:
    /// 1. ~/.config/attest/secret.json
    /// 2. Environment variables (ATTEST_BASE_URL, ATTEST_API_KEY)
    ///
    /// # Errors
    ///
    /// Returns a `Config` error when no base URL can be found in either
    /// source, or when the secret file exists but cannot be parsed.
    pub fn try_from_env() -> Result<Self> {
        if let Some(config) = load_secret_file()? {
            if let Some(base_url) = config.base_url {
                let mut loaded = Self::new(base_url);
                loaded.api_key = config.api_key;
                return Ok(loaded);
            }
        }

        let base_url = env::var("ATTEST_BASE_URL").map_err(|_| {
            AttestError::config(
                "ATTEST_BASE_URL not found in ~/.config/attest/secret.json or environment variables",
            )
        })?;

        let mut loaded = Self::new(base_url);
        loaded.api_key = env::var("ATTEST_API_KEY").ok();
        Ok(loaded)
    }
}

/// Root structure for secret.json
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecretFile {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    api_key: Option<String>,
}

/// Reads `~/.config/attest/secret.json` if it exists.
fn load_secret_file() -> Result<Option<SecretFile>> {
    let Some(path) = secret_path() else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path).map_err(|e| {
        AttestError::config(format!(
            "Failed to read configuration file at {}: {}",
            path.display(),
            e
        ))
    })?;

    let parsed = serde_json::from_str(&content).map_err(|e| {
        AttestError::config(format!(
            "Failed to parse configuration file at {}: {}",
            path.display(),
            e
        ))
    })?;
    Ok(Some(parsed))
}

/// Returns the path to the configuration file: ~/.config/attest/secret.json
fn secret_path() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    Some(home.join(".config").join("attest").join("secret.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slashes_are_stripped() {
        let config = BackendConfig::new("https://api.example.com/");
        assert_eq!(config.base_url, "https://api.example.com");
    }

    #[test]
    fn builder_methods_compose() {
        let config = BackendConfig::new("https://api.example.com")
            .with_api_key("secret")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
