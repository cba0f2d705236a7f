//! Caller-facing error taxonomy for gateway requests.
//!
//! ERROR HANDLING
//! ==============
//! Only an expired access token is recovered inside the gateway. Everything
//! else surfaces here with a human-readable message that callers render as-is,
//! so the server's `message` wording is passed through untouched.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use serde_json::Value;
use thiserror::Error;

use crate::storage::StorageError;
use crate::transport::TransportError;

/// Errors produced by [`crate::Gateway`] requests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// A 401 survived the refresh attempt. The caller should send the user
    /// back through login; the gateway never navigates on its own.
    #[error("session expired; please log in again")]
    AuthenticationExpired,

    /// The server answered with a non-2xx status.
    #[error("{message}")]
    RequestFailed { status: u16, message: String },

    /// The transport failed before any response arrived.
    #[error("network error: {0}")]
    Network(String),

    /// The request deadline elapsed.
    #[error("request timed out")]
    Timeout,

    /// A 2xx body did not match the expected response shape.
    #[error("response parse failed: {0}")]
    Decode(String),

    /// Reading or writing persisted tokens failed.
    #[error("token storage failed: {0}")]
    Storage(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl GatewayError {
    /// Stable machine-readable code for logs and CLI output.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AuthenticationExpired => "E_AUTH_EXPIRED",
            Self::RequestFailed { .. } => "E_REQUEST_FAILED",
            Self::Network(_) => "E_NETWORK",
            Self::Timeout => "E_TIMEOUT",
            Self::Decode(_) => "E_DECODE",
            Self::Storage(_) => "E_STORAGE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    /// Whether repeating the same call later could succeed.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout | Self::RequestFailed { status: 429 | 500..=599, .. })
    }

    /// HTTP status, when the server answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status, .. } => Some(*status),
            Self::AuthenticationExpired => Some(401),
            _ => None,
        }
    }
}

impl From<TransportError> for GatewayError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Network(message) => Self::Network(message),
            TransportError::Timeout => Self::Timeout,
        }
    }
}

impl From<StorageError> for GatewayError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err.to_string())
    }
}

pub(crate) fn request_failed_message(status: u16) -> String {
    format!("request failed with status {status}")
}

/// Best-effort message from a non-2xx body.
///
/// Uses the `message` field verbatim when present (joining string arrays as
/// validation errors arrive), then `error`, then a generic status message.
/// Never fails, even on bodies that are not JSON.
#[must_use]
pub fn error_message_from_body(status: u16, body: &str) -> String {
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) else {
        return request_failed_message(status);
    };

    for key in ["message", "error"] {
        match map.get(key) {
            Some(Value::String(text)) if !text.is_empty() => return text.clone(),
            Some(Value::Array(items)) => {
                let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
                if !parts.is_empty() {
                    return parts.join(", ");
                }
            }
            _ => {}
        }
    }
    request_failed_message(status)
}
