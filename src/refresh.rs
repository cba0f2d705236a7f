//! Single-flight access-token refresh.
//!
//! DESIGN
//! ======
//! The guard holds at most one pending refresh as a `Shared` future. A caller
//! that needs a refresh either clones the pending one or installs a new one;
//! every clone resolves to the same [`RefreshOutcome`], so N requests that see
//! the same expired token cause one network call and one shared verdict.
//!
//! The slot lock is a plain mutex held only for check-and-install, never
//! across an await. The refresh future empties the slot itself when it
//! finishes, so the next 401 after that starts a fresh attempt.

#[cfg(test)]
#[path = "refresh_test.rs"]
mod refresh_test;

use std::sync::{Mutex, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::Method;
use serde_json::json;

use crate::session::Session;
use crate::transport::{HttpRequest, Transport};
use crate::types::TokenPair;

pub const REFRESH_ENDPOINT: &str = "/api/auth/refresh";

/// Result of one refresh attempt, shared by every waiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New tokens are in storage.
    Refreshed,
    /// No refresh token was stored.
    Unavailable,
    /// The refresh call failed (transport, non-2xx, bad body, or storage).
    Failed(String),
}

impl RefreshOutcome {
    #[must_use]
    pub fn is_refreshed(&self) -> bool {
        matches!(self, Self::Refreshed)
    }
}

pub type PendingRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

#[derive(Default)]
pub struct RefreshGuard {
    pending: Mutex<Option<PendingRefresh>>,
}

impl RefreshGuard {
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Join the pending refresh, or install the one built by `start`.
    ///
    /// `start` runs under the slot lock and must only construct the future.
    pub fn join_or_start<F>(&self, start: F) -> PendingRefresh
    where
        F: FnOnce() -> BoxFuture<'static, RefreshOutcome>,
    {
        let mut slot = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pending) = slot.as_ref() {
            tracing::debug!("joining in-flight token refresh");
            return pending.clone();
        }
        let pending = start().shared();
        *slot = Some(pending.clone());
        pending
    }

    pub(crate) fn finish(&self) {
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Exchange the stored refresh token for a new pair.
///
/// Never returns an error: every failure becomes [`RefreshOutcome::Failed`]
/// or [`RefreshOutcome::Unavailable`] so the request path decides what to
/// surface. Tokens are cleared on anything but success.
pub async fn run_refresh(transport: &dyn Transport, session: &Session, url: String) -> RefreshOutcome {
    let outcome = exchange_refresh_token(transport, session, url).await;
    match &outcome {
        RefreshOutcome::Refreshed => tracing::info!("access token refreshed"),
        RefreshOutcome::Unavailable => tracing::warn!("no refresh token stored; clearing session"),
        RefreshOutcome::Failed(reason) => tracing::warn!(%reason, "token refresh failed; clearing session"),
    }
    if !outcome.is_refreshed() {
        if let Err(e) = session.clear() {
            tracing::warn!(error = %e, "failed to clear session after refresh failure");
        }
    }
    outcome
}

async fn exchange_refresh_token(transport: &dyn Transport, session: &Session, url: String) -> RefreshOutcome {
    let refresh_token = match session.refresh_token() {
        Ok(Some(token)) => token,
        Ok(None) => return RefreshOutcome::Unavailable,
        Err(e) => return RefreshOutcome::Failed(e.to_string()),
    };

    let request = HttpRequest {
        method: Method::POST,
        url,
        headers: vec![("Content-Type".to_owned(), "application/json".to_owned())],
        body: Some(json!({ "refreshToken": refresh_token })),
    };
    let response = match transport.send(request).await {
        Ok(response) => response,
        Err(e) => return RefreshOutcome::Failed(e.to_string()),
    };
    if !response.is_success() {
        return RefreshOutcome::Failed(format!("refresh endpoint returned {}", response.status));
    }

    let tokens: TokenPair = match serde_json::from_str(&response.body) {
        Ok(tokens) => tokens,
        Err(e) => return RefreshOutcome::Failed(format!("unreadable refresh response: {e}")),
    };
    match session.store_tokens(&tokens) {
        Ok(()) => RefreshOutcome::Refreshed,
        Err(e) => RefreshOutcome::Failed(e.to_string()),
    }
}
