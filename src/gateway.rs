//! The single entry point for every backend call.
//!
//! ARCHITECTURE
//! ============
//! `request` runs a two-state attempt policy per logical request:
//!
//! ```text
//! First --2xx--------------------------------------------> Ok
//! First --401, non-auth endpoint--> refresh --ok--> Retry --2xx--> Ok
//!                                           \--fail--> AuthenticationExpired
//! Retry --401--------------------------------------------> AuthenticationExpired
//! any   --other non-2xx--------------------------------> RequestFailed(message)
//! ```
//!
//! The access token is re-read from the session before every attempt, so a
//! retry (or an unrelated request) always sends the newest token.

#[cfg(test)]
#[path = "gateway_test.rs"]
mod gateway_test;

use std::sync::Arc;

use futures::FutureExt;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::config::GatewayConfig;
use crate::error::{GatewayError, error_message_from_body};
use crate::refresh::{REFRESH_ENDPOINT, RefreshOutcome, run_refresh};
use crate::session::Session;
use crate::storage::KeyValueStore;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, Transport};

/// Endpoints whose 401 means "bad credentials", never "token expired".
pub const AUTH_ENDPOINTS: [&str; 3] = ["/api/auth/login", "/api/auth/register", REFRESH_ENDPOINT];

const JSON_CONTENT_TYPE: &str = "application/json";

/// Which attempt of a logical request is being sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    First,
    Retry,
}

impl Attempt {
    /// The attempt after this one, if the policy allows another.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::First => Some(Self::Retry),
            Self::Retry => None,
        }
    }
}

/// Method, optional JSON body and extra headers for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    #[must_use]
    pub fn get() -> Self {
        Self::new(Method::GET, None)
    }

    #[must_use]
    pub fn delete() -> Self {
        Self::new(Method::DELETE, None)
    }

    #[must_use]
    pub fn post_empty() -> Self {
        Self::new(Method::POST, None)
    }

    /// # Errors
    ///
    /// Returns [`GatewayError::Decode`] if `body` cannot be serialized.
    pub fn post<B: Serialize>(body: &B) -> Result<Self, GatewayError> {
        Ok(Self::new(Method::POST, Some(to_json(body)?)))
    }

    /// # Errors
    ///
    /// Returns [`GatewayError::Decode`] if `body` cannot be serialized.
    pub fn patch<B: Serialize>(body: &B) -> Result<Self, GatewayError> {
        Ok(Self::new(Method::PATCH, Some(to_json(body)?)))
    }

    #[must_use]
    pub fn patch_empty() -> Self {
        Self::new(Method::PATCH, None)
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    fn new(method: Method, body: Option<Value>) -> Self {
        Self { method, body, headers: Vec::new() }
    }

    fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(key, _)| key.eq_ignore_ascii_case(name))
    }
}

fn to_json<B: Serialize>(body: &B) -> Result<Value, GatewayError> {
    serde_json::to_value(body).map_err(|e| GatewayError::Decode(e.to_string()))
}

/// Whether `endpoint` is login, register or refresh.
///
/// Matches the same paths `endpoint_url` would build: leading and trailing
/// slashes and the query string are ignored.
#[must_use]
pub fn is_auth_endpoint(endpoint: &str) -> bool {
    let path = endpoint.split(['?', '#']).next().unwrap_or(endpoint);
    let path = path.trim_matches('/');
    AUTH_ENDPOINTS.iter().any(|auth| auth.trim_start_matches('/') == path)
}

// =============================================================================
// GATEWAY
// =============================================================================

pub struct Gateway {
    config: GatewayConfig,
    transport: Arc<dyn Transport>,
    session: Arc<Session>,
}

impl Gateway {
    #[must_use]
    pub fn new(config: GatewayConfig, transport: Arc<dyn Transport>, session: Arc<Session>) -> Self {
        Self { config, transport, session }
    }

    /// Build a gateway over reqwest, restoring any session found in `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the store cannot
    /// be read.
    pub fn from_config(config: GatewayConfig, store: Arc<dyn KeyValueStore>) -> Result<Self, GatewayError> {
        let transport = HttpTransport::new(config.timeouts)?;
        let session = Session::new(store);
        session.load()?;
        Ok(Self::new(config, Arc::new(transport), Arc::new(session)))
    }

    #[must_use]
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Send a request and decode the 2xx body as `T`.
    ///
    /// An empty 2xx body decodes as JSON `null`, so `()` and `Option<_>`
    /// targets succeed on `204 No Content`.
    ///
    /// # Errors
    ///
    /// See [`GatewayError`] for the taxonomy.
    pub async fn request<T: DeserializeOwned>(&self, endpoint: &str, options: RequestOptions) -> Result<T, GatewayError> {
        let response = self.execute(endpoint, &options).await?;
        decode_body(&response.body)
    }

    /// Send a request and discard the 2xx body.
    ///
    /// # Errors
    ///
    /// See [`GatewayError`] for the taxonomy.
    pub async fn request_unit(&self, endpoint: &str, options: RequestOptions) -> Result<(), GatewayError> {
        self.execute(endpoint, &options).await.map(|_| ())
    }

    async fn execute(&self, endpoint: &str, options: &RequestOptions) -> Result<HttpResponse, GatewayError> {
        let request_id = Uuid::new_v4();
        let mut attempt = Attempt::First;

        loop {
            let response = self.send_attempt(endpoint, options, attempt, request_id).await?;
            if response.is_success() {
                return Ok(response);
            }

            if response.status == 401 && !is_auth_endpoint(endpoint) {
                let Some(next) = attempt.next() else {
                    tracing::debug!(%request_id, endpoint, "401 on retry; giving up");
                    return Err(GatewayError::AuthenticationExpired);
                };
                let outcome = self.refresh_tokens().await;
                if !outcome.is_refreshed() {
                    return Err(GatewayError::AuthenticationExpired);
                }
                attempt = next;
                continue;
            }

            let message = error_message_from_body(response.status, &response.body);
            tracing::debug!(%request_id, endpoint, status = response.status, %message, "request failed");
            return Err(GatewayError::RequestFailed { status: response.status, message });
        }
    }

    async fn send_attempt(
        &self,
        endpoint: &str,
        options: &RequestOptions,
        attempt: Attempt,
        request_id: Uuid,
    ) -> Result<HttpResponse, GatewayError> {
        let mut headers = Vec::with_capacity(options.headers.len() + 3);
        if !options.has_header("content-type") {
            headers.push(("Content-Type".to_owned(), JSON_CONTENT_TYPE.to_owned()));
        }
        if let Some(token) = self.session.access_token()? {
            headers.push(("Authorization".to_owned(), format!("Bearer {token}")));
        }
        headers.push(("X-Request-Id".to_owned(), request_id.to_string()));
        headers.extend(options.headers.iter().cloned());

        let request = HttpRequest {
            method: options.method.clone(),
            url: self.config.endpoint_url(endpoint),
            headers,
            body: options.body.clone(),
        };
        tracing::debug!(%request_id, method = %request.method, endpoint, ?attempt, "sending request");

        let response = self.transport.send(request).await?;
        tracing::debug!(%request_id, endpoint, status = response.status, "response received");
        Ok(response)
    }

    /// Run or join the single in-flight refresh.
    pub async fn refresh_tokens(&self) -> RefreshOutcome {
        let transport = Arc::clone(&self.transport);
        let session = Arc::clone(&self.session);
        let url = self.config.endpoint_url(REFRESH_ENDPOINT);

        let pending = self.session.refresh_guard().join_or_start(move || {
            async move {
                let outcome = run_refresh(transport.as_ref(), &session, url).await;
                session.refresh_guard().finish();
                outcome
            }
            .boxed()
        });
        pending.await
    }
}

fn decode_body<T: DeserializeOwned>(body: &str) -> Result<T, GatewayError> {
    let raw = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(raw).map_err(|e| GatewayError::Decode(e.to_string()))
}
