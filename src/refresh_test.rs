use super::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::session::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use crate::storage::{KeyValueStore, MemoryStore};
use crate::transport::test_helpers::{MockTransport, json_response};
use crate::transport::{HttpResponse, TransportError};

fn session_with(access: &str, refresh: Option<&str>) -> (Session, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let session = Session::new(store.clone());
    session
        .store_tokens(&TokenPair { access_token: access.into(), refresh_token: refresh.map(Into::into) })
        .unwrap();
    (session, store)
}

const URL: &str = "http://api.test/api/auth/refresh";

// =============================================================
// RefreshGuard
// =============================================================

#[tokio::test]
async fn guard_joins_pending_refresh() {
    let guard = RefreshGuard::default();
    let started = AtomicUsize::new(0);

    let first = guard.join_or_start(|| {
        started.fetch_add(1, Ordering::SeqCst);
        async { RefreshOutcome::Refreshed }.boxed()
    });
    let second = guard.join_or_start(|| {
        started.fetch_add(1, Ordering::SeqCst);
        async { RefreshOutcome::Failed("should not run".into()) }.boxed()
    });

    assert!(guard.is_refreshing());
    assert_eq!(started.load(Ordering::SeqCst), 1);
    assert_eq!(first.await, RefreshOutcome::Refreshed);
    assert_eq!(second.await, RefreshOutcome::Refreshed);
}

#[tokio::test]
async fn guard_starts_fresh_after_finish() {
    let guard = RefreshGuard::default();
    let first = guard.join_or_start(|| async { RefreshOutcome::Unavailable }.boxed());
    assert_eq!(first.await, RefreshOutcome::Unavailable);

    guard.finish();
    assert!(!guard.is_refreshing());

    let second = guard.join_or_start(|| async { RefreshOutcome::Refreshed }.boxed());
    assert_eq!(second.await, RefreshOutcome::Refreshed);
}

// =============================================================
// run_refresh
// =============================================================

#[tokio::test]
async fn successful_refresh_stores_new_pair() {
    let (session, store) = session_with("stale", Some("r1"));
    let transport = MockTransport::new(|_| json_response(200, &json!({ "accessToken": "a2", "refreshToken": "r2" })));

    let outcome = run_refresh(&transport, &session, URL.into()).await;

    assert_eq!(outcome, RefreshOutcome::Refreshed);
    assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("a2"));
    assert_eq!(store.get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("r2"));
}

#[tokio::test]
async fn refresh_without_new_refresh_token_keeps_old_one() {
    let (session, store) = session_with("stale", Some("r1"));
    let transport = MockTransport::new(|_| json_response(200, &json!({ "accessToken": "a2" })));

    assert!(run_refresh(&transport, &session, URL.into()).await.is_refreshed());
    assert_eq!(store.get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("r1"));
}

#[tokio::test]
async fn absent_refresh_token_is_unavailable_and_clears() {
    let (session, store) = session_with("stale", None);
    let transport = MockTransport::new(|_| json_response(200, &json!({ "accessToken": "a2" })));

    let outcome = run_refresh(&transport, &session, URL.into()).await;

    assert_eq!(outcome, RefreshOutcome::Unavailable);
    assert!(transport.requests().is_empty());
    assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap(), None);
}

#[tokio::test]
async fn non_success_refresh_fails_and_clears() {
    let (session, store) = session_with("stale", Some("r1"));
    let transport = MockTransport::new(|_| json_response(403, &json!({ "message": "revoked" })));

    let outcome = run_refresh(&transport, &session, URL.into()).await;

    assert_eq!(outcome, RefreshOutcome::Failed("refresh endpoint returned 403".into()));
    assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap(), None);
    assert_eq!(store.get(REFRESH_TOKEN_KEY).unwrap(), None);
}

#[tokio::test]
async fn unreadable_refresh_body_fails() {
    let (session, _store) = session_with("stale", Some("r1"));
    let transport = MockTransport::new(|_| Ok(HttpResponse::new(200, "ok")));

    let outcome = run_refresh(&transport, &session, URL.into()).await;
    assert!(matches!(outcome, RefreshOutcome::Failed(reason) if reason.starts_with("unreadable refresh response")));
}

#[tokio::test]
async fn transport_error_fails_without_panicking() {
    let (session, _store) = session_with("stale", Some("r1"));
    let transport = MockTransport::new(|_| Err(TransportError::Timeout));

    let outcome = run_refresh(&transport, &session, URL.into()).await;
    assert_eq!(outcome, RefreshOutcome::Failed("request timed out".into()));
    assert!(!session.is_authenticated().unwrap());
}
