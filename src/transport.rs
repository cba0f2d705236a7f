//! HTTP transport seam.
//!
//! The gateway only needs "send this request, give me status and body".
//! Keeping that behind a trait lets tests script responses and hold them open
//! to create real concurrency without a network.

#[cfg(test)]
#[path = "transport_test.rs"]
mod transport_test;

use std::time::Duration;

use reqwest::Method;
use serde_json::Value;
use thiserror::Error;

use crate::config::GatewayTimeouts;
use crate::error::GatewayError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl HttpRequest {
    /// First header value matching `name`, case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Send one request and return whatever status the server answered with.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] only when no response was received.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

// =============================================================================
// REQWEST
// =============================================================================

pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    /// # Errors
    ///
    /// Returns [`GatewayError::HttpClientBuild`] if the reqwest client cannot be built.
    pub fn new(timeouts: GatewayTimeouts) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| GatewayError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http })
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.http.request(request.method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            let raw = serde_json::to_vec(body).map_err(|e| TransportError::Network(e.to_string()))?;
            builder = builder.body(raw);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_reqwest_error)?;
        Ok(HttpResponse { status, body })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Network(err.to_string())
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub(crate) mod test_helpers {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub const TEST_BASE_URL: &str = "http://api.test";

    type Handler = Box<dyn Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync>;

    /// Scripted transport that records every request.
    pub struct MockTransport {
        handler: Handler,
        requests: Mutex<Vec<HttpRequest>>,
        unauthorized_served: AtomicUsize,
        hold_refresh_until: Option<usize>,
    }

    impl MockTransport {
        pub fn new<F>(handler: F) -> Self
        where
            F: Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
        {
            Self {
                handler: Box::new(handler),
                requests: Mutex::new(Vec::new()),
                unauthorized_served: AtomicUsize::new(0),
                hold_refresh_until: None,
            }
        }

        /// Keep refresh calls pending until `count` 401s have been handed out.
        pub fn holding_refresh_until(mut self, count: usize) -> Self {
            self.hold_refresh_until = Some(count);
            self
        }

        pub fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn calls_to(&self, path: &str) -> usize {
            self.requests().iter().filter(|r| path_of(r) == path).count()
        }
    }

    #[async_trait::async_trait]
    impl Transport for MockTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.requests.lock().unwrap().push(request.clone());
            if path_of(&request) == crate::refresh::REFRESH_ENDPOINT {
                if let Some(count) = self.hold_refresh_until {
                    while self.unauthorized_served.load(Ordering::SeqCst) < count {
                        tokio::time::sleep(Duration::from_millis(1)).await;
                    }
                }
            }
            let response = (self.handler)(&request)?;
            if response.status == 401 {
                self.unauthorized_served.fetch_add(1, Ordering::SeqCst);
            }
            Ok(response)
        }
    }

    pub fn path_of(request: &HttpRequest) -> &str {
        request.url.strip_prefix(TEST_BASE_URL).unwrap_or(&request.url)
    }

    pub fn json_response(status: u16, body: &serde_json::Value) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse::new(status, body.to_string()))
    }
}
