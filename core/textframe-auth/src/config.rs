//! Client configuration.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable overriding [`ClientConfig::api_base_url`].
pub const ENV_API_URL: &str = "TEXTFRAME_API_URL";

/// Environment variable overriding [`ClientConfig::store_path`].
pub const ENV_STORE_PATH: &str = "TEXTFRAME_STORE_PATH";

/// Environment variable overriding [`ClientConfig::request_timeout_secs`].
pub const ENV_TIMEOUT_SECS: &str = "TEXTFRAME_TIMEOUT_SECS";

/// Configuration for the authentication client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the API server (e.g. `https://api.textframe.app`).
    pub api_base_url: String,
    /// Key store file. `None` uses the platform's local data directory.
    pub store_path: Option<PathBuf>,
    /// Per-request timeout applied by the HTTP transport.
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000".to_string(),
            store_path: None,
            request_timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    /// Creates a config pointing at the given server with default settings.
    pub fn with_api_base_url(url: impl Into<String>) -> Self {
        Self {
            api_base_url: url.into(),
            ..Default::default()
        }
    }

    /// Loads overrides from the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads overrides through a variable lookup function.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_API_URL) {
            config.api_base_url = url;
        }
        if let Some(path) = lookup(ENV_STORE_PATH).filter(|p| !p.trim().is_empty()) {
            config.store_path = Some(PathBuf::from(path));
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            config.request_timeout_secs =
                secs.trim()
                    .parse()
                    .map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
                        name: ENV_TIMEOUT_SECS,
                        reason: e.to_string(),
                    })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks that the config is usable.
    pub fn validate(&self) -> ConfigResult<()> {
        let url = self.api_base_url.trim();
        let Some(rest) = url
            .strip_prefix("http://")
            .or_else(|| url.strip_prefix("https://"))
        else {
            return Err(ConfigError::InvalidUrl(format!(
                "{url:?} must start with http:// or https://"
            )));
        };
        if rest.trim_matches('/').is_empty() {
            return Err(ConfigError::InvalidUrl(format!("{url:?} has no host")));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                name: "request_timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Builds the full URL of an endpoint path.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns the key store path, falling back to the platform default.
    pub fn resolved_store_path(&self) -> ConfigResult<PathBuf> {
        match &self.store_path {
            Some(path) => Ok(path.clone()),
            None => crate::store::FileKeyStore::default_path().ok_or(ConfigError::NoDataDir),
        }
    }
}
