//! Gateway configuration parsed from environment variables.

use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:3001";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid base URL: {0} (expected http:// or https://)")]
    InvalidBaseUrl(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for GatewayTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub base_url: String,
    pub timeouts: GatewayTimeouts,
}

impl GatewayConfig {
    /// Config for `base_url` with default timeouts. Trailing slashes are trimmed.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self { base_url: base_url.trim_end_matches('/').to_owned(), timeouts: GatewayTimeouts::default() }
    }

    /// Build typed gateway config from environment variables.
    ///
    /// Optional:
    /// - `RACENIGHT_API_URL`: default `http://localhost:3001`
    /// - `RACENIGHT_REQUEST_TIMEOUT_SECS`: default 30
    /// - `RACENIGHT_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] when the base URL is not http(s).
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var("RACENIGHT_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_owned());
        let timeouts = GatewayTimeouts {
            request_secs: env_parse_u64("RACENIGHT_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("RACENIGHT_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        Self::new(base_url).with_timeouts(timeouts).validated()
    }

    #[must_use]
    pub fn with_timeouts(mut self, timeouts: GatewayTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Check that the base URL has an http(s) scheme.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] otherwise.
    pub fn validated(self) -> Result<Self, ConfigError> {
        if self.base_url.starts_with("http://") || self.base_url.starts_with("https://") {
            Ok(self)
        } else {
            Err(ConfigError::InvalidBaseUrl(self.base_url))
        }
    }

    /// Join a relative endpoint path onto the base URL.
    #[must_use]
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') {
            format!("{}{endpoint}", self.base_url)
        } else {
            format!("{}/{endpoint}", self.base_url)
        }
    }
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
