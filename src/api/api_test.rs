use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use reqwest::Method;
use serde_json::json;

use super::commentary::{PollPolicy, commentary_path};
use super::credits::credits_path;
use super::events::{event_action_path, event_path};
use super::horses::horse_action_path;
use super::races::{RaceAction, race_action_path};
use super::tickets::event_tickets_path;
use super::{admin, auth, bets, commentary, credits, events, horses, races, tickets};
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::session::Session;
use crate::storage::MemoryStore;
use crate::transport::test_helpers::{MockTransport, TEST_BASE_URL, json_response, path_of};
use crate::types::{CommentaryStatus, EventUpdate, HorseStatus, NewBet, NewEvent, TokenPair, TopUp, UserRole};

fn gateway_with(transport: MockTransport, access: Option<&str>) -> (Gateway, Arc<MockTransport>) {
    let session = Arc::new(Session::new(Arc::new(MemoryStore::new())));
    if let Some(token) = access {
        session.store_tokens(&TokenPair { access_token: token.into(), refresh_token: Some("r1".into()) }).unwrap();
    }
    let transport = Arc::new(transport);
    let gateway = Gateway::new(GatewayConfig::new(TEST_BASE_URL), transport.clone(), session);
    (gateway, transport)
}

fn user_json() -> serde_json::Value {
    json!({ "id": "u1", "email": "host@example.com", "name": "Host", "role": "HOST" })
}

// =============================================================
// Paths
// =============================================================

#[test]
fn event_paths() {
    assert_eq!(event_path("e1"), "/api/events/e1");
    assert_eq!(event_action_path("e1", "generate-races"), "/api/events/e1/generate-races");
    assert_eq!(event_tickets_path("e1"), "/api/events/e1/tickets");
}

#[test]
fn horse_and_race_paths() {
    assert_eq!(horse_action_path("h1", "approve"), "/api/horses/h1/approve");
    assert_eq!(race_action_path("r1", RaceAction::OpenBetting), "/api/races/r1/open-betting");
    assert_eq!(race_action_path("r1", RaceAction::CloseBetting), "/api/races/r1/close-betting");
    assert_eq!(race_action_path("r1", RaceAction::Start), "/api/races/r1/start");
    assert_eq!(race_action_path("r1", RaceAction::Complete), "/api/races/r1/complete");
}

#[test]
fn credits_and_commentary_paths() {
    assert_eq!(credits_path("leaderboard", "e1"), "/api/credits/leaderboard/e1");
    assert_eq!(commentary_path("r1", "status"), "/api/commentary/race/r1/status");
}

// =============================================================
// Auth
// =============================================================

#[tokio::test]
async fn login_stores_tokens_and_user() {
    let (gateway, transport) = gateway_with(
        MockTransport::new(|_| {
            json_response(200, &json!({ "user": user_json(), "accessToken": "a1", "refreshToken": "r1" }))
        }),
        None,
    );

    let user = auth::login(&gateway, "host@example.com", "pw").await.unwrap();

    assert_eq!(user.role, UserRole::Host);
    let session = gateway.session();
    assert_eq!(session.access_token().unwrap().as_deref(), Some("a1"));
    assert_eq!(session.refresh_token().unwrap().as_deref(), Some("r1"));
    assert_eq!(session.user().map(|u| u.id), Some("u1".to_string()));

    let sent = &transport.requests()[0];
    assert_eq!(sent.method, Method::POST);
    assert_eq!(sent.body, Some(json!({ "email": "host@example.com", "password": "pw" })));
}

#[tokio::test]
async fn rejected_login_surfaces_server_message_without_refresh() {
    let (gateway, transport) = gateway_with(
        MockTransport::new(|_| json_response(401, &json!({ "message": "Invalid credentials" }))),
        Some("stale"),
    );

    let err = auth::login(&gateway, "host@example.com", "bad").await.unwrap_err();

    assert_eq!(err, GatewayError::RequestFailed { status: 401, message: "Invalid credentials".into() });
    assert_eq!(transport.calls_to("/api/auth/refresh"), 0);
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn register_sends_name() {
    let (gateway, transport) = gateway_with(
        MockTransport::new(|_| json_response(201, &json!({ "user": user_json(), "accessToken": "a1" }))),
        None,
    );

    auth::register(&gateway, "host@example.com", "pw", "Host").await.unwrap();

    let sent = &transport.requests()[0];
    assert_eq!(path_of(sent), "/api/auth/register");
    assert_eq!(sent.body.as_ref().and_then(|b| b.get("name")), Some(&json!("Host")));
    assert_eq!(gateway.session().refresh_token().unwrap(), None);
}

#[tokio::test]
async fn logout_clears_session_even_when_server_fails() {
    let (gateway, transport) = gateway_with(
        MockTransport::new(|_| json_response(500, &json!({ "message": "boom" }))),
        Some("a1"),
    );

    auth::logout(&gateway).await.unwrap();

    assert!(!gateway.session().is_authenticated().unwrap());
    assert_eq!(transport.requests()[0].body, Some(json!({ "refreshToken": "r1" })));
}

#[tokio::test]
async fn me_caches_user_on_session() {
    let (gateway, _) = gateway_with(MockTransport::new(|_| json_response(200, &user_json())), Some("a1"));

    let user = auth::me(&gateway).await.unwrap();

    assert_eq!(gateway.session().user(), Some(user));
}

// =============================================================
// Wrappers
// =============================================================

#[tokio::test]
async fn race_transitions_use_patch() {
    let (gateway, transport) = gateway_with(
        MockTransport::new(|_| {
            json_response(200, &json!({ "id": "r1", "eventId": "e1", "name": "Race 1", "status": "BETTING_OPEN" }))
        }),
        Some("a1"),
    );

    let race = races::open_betting(&gateway, "r1").await.unwrap();

    assert!(race.status.accepts_bets());
    let sent = &transport.requests()[0];
    assert_eq!(sent.method, Method::PATCH);
    assert_eq!(path_of(sent), "/api/races/r1/open-betting");
    assert_eq!(sent.body, None);
}

#[tokio::test]
async fn placing_a_bet_posts_camel_case_body() {
    let (gateway, transport) = gateway_with(
        MockTransport::new(|_| json_response(400, &json!({ "message": "Insufficient credits" }))),
        Some("a1"),
    );
    let bet = NewBet { race_id: "r1".into(), horse_id: "h2".into(), amount: 500 };

    let err = bets::place(&gateway, &bet).await.unwrap_err();

    assert_eq!(err.to_string(), "Insufficient credits");
    assert_eq!(
        transport.requests()[0].body,
        Some(json!({ "raceId": "r1", "horseId": "h2", "amount": 500 }))
    );
}

#[tokio::test]
async fn admin_reset_and_status() {
    let (gateway, transport) = gateway_with(
        MockTransport::new(|request| match path_of(request) {
            "/api/admin/reset-test-data" => json_response(200, &json!({ "success": true })),
            _ => json_response(200, &json!({ "testMode": true, "users": 12, "races": 3 })),
        }),
        Some("a1"),
    );

    let ack = admin::reset_test_data(&gateway).await.unwrap();
    let status = admin::test_status(&gateway).await.unwrap();

    assert!(ack.success);
    assert!(status.test_mode);
    assert_eq!(status.users, 12);
    assert_eq!(status.bets, 0);
    assert_eq!(transport.requests()[0].method, Method::POST);
    assert_eq!(transport.requests()[1].method, Method::GET);
}

fn event_json() -> serde_json::Value {
    json!({ "id": "e1", "name": "Derby Night", "status": "DRAFT" })
}

fn horse_json(status: &str) -> serde_json::Value {
    json!({ "id": "h1", "eventId": "e1", "name": "Neigh Sayer", "status": status })
}

#[tokio::test]
async fn creating_an_event_posts_only_set_fields() {
    let (gateway, transport) = gateway_with(MockTransport::new(|_| json_response(201, &event_json())), Some("a1"));
    let event = NewEvent { name: "Derby Night".into(), starting_credits: Some(1000), ..NewEvent::default() };

    events::create(&gateway, &event).await.unwrap();

    let sent = &transport.requests()[0];
    assert_eq!(sent.method, Method::POST);
    assert_eq!(path_of(sent), "/api/events");
    assert_eq!(sent.body, Some(json!({ "name": "Derby Night", "startingCredits": 1000 })));
}

#[tokio::test]
async fn updating_an_event_patches_partial_body() {
    let (gateway, transport) = gateway_with(MockTransport::new(|_| json_response(200, &event_json())), Some("a1"));
    let update = EventUpdate { venue: Some("Town Hall".into()), ..EventUpdate::default() };

    events::update(&gateway, "e1", &update).await.unwrap();

    let sent = &transport.requests()[0];
    assert_eq!(sent.method, Method::PATCH);
    assert_eq!(path_of(sent), "/api/events/e1");
    assert_eq!(sent.body, Some(json!({ "venue": "Town Hall" })));
}

#[tokio::test]
async fn purchasing_a_ticket_posts_without_body() {
    let (gateway, transport) = gateway_with(
        MockTransport::new(|_| json_response(201, &json!({ "id": "t1", "eventId": "e1", "userId": "u1" }))),
        Some("a1"),
    );

    let ticket = tickets::purchase(&gateway, "e1").await.unwrap();

    assert_eq!(ticket.user_id, "u1");
    let sent = &transport.requests()[0];
    assert_eq!(sent.method, Method::POST);
    assert_eq!(path_of(sent), "/api/events/e1/tickets");
    assert_eq!(sent.body, None);
}

#[tokio::test]
async fn top_up_posts_camel_case_body() {
    let (gateway, transport) = gateway_with(
        MockTransport::new(|_| json_response(200, &json!({ "eventId": "e1", "balance": 1500 }))),
        Some("a1"),
    );
    let top_up = TopUp { event_id: "e1".into(), amount: 500, user_id: Some("u2".into()) };

    let balance = credits::top_up(&gateway, &top_up).await.unwrap();

    assert_eq!(balance.balance, 1500);
    let sent = &transport.requests()[0];
    assert_eq!(sent.method, Method::POST);
    assert_eq!(path_of(sent), "/api/credits/top-up");
    assert_eq!(sent.body, Some(json!({ "eventId": "e1", "amount": 500, "userId": "u2" })));
}

#[tokio::test]
async fn rejecting_a_horse_patches_reason() {
    let (gateway, transport) =
        gateway_with(MockTransport::new(|_| json_response(200, &horse_json("REJECTED"))), Some("a1"));

    let horse = horses::reject(&gateway, "h1", Some("Too fast")).await.unwrap();
    horses::reject(&gateway, "h1", None).await.unwrap();

    assert_eq!(horse.status, HorseStatus::Rejected);
    let sent = transport.requests();
    assert_eq!(sent[0].method, Method::PATCH);
    assert_eq!(path_of(&sent[0]), "/api/horses/h1/reject");
    assert_eq!(sent[0].body, Some(json!({ "reason": "Too fast" })));
    assert_eq!(sent[1].body, Some(json!({ "reason": null })));
}

#[tokio::test]
async fn assigning_a_horse_patches_race_id() {
    let (gateway, transport) =
        gateway_with(MockTransport::new(|_| json_response(200, &horse_json("APPROVED"))), Some("a1"));

    horses::assign_to_race(&gateway, "h1", "r3").await.unwrap();

    let sent = &transport.requests()[0];
    assert_eq!(sent.method, Method::PATCH);
    assert_eq!(path_of(sent), "/api/horses/h1/assign");
    assert_eq!(sent.body, Some(json!({ "raceId": "r3" })));
}

// =============================================================
// Commentary polling
// =============================================================

fn fast_policy(max_polls: u32) -> PollPolicy {
    PollPolicy { interval: Duration::from_millis(1), max_polls }
}

#[tokio::test]
async fn commentary_polling_stops_on_completion() {
    let polls = Arc::new(AtomicUsize::new(0));
    let seen = polls.clone();
    let (gateway, transport) = gateway_with(
        MockTransport::new(move |_| {
            if seen.fetch_add(1, Ordering::SeqCst) < 2 {
                json_response(200, &json!({ "status": "GENERATING" }))
            } else {
                json_response(200, &json!({ "status": "COMPLETED", "text": "And they're off!" }))
            }
        }),
        Some("a1"),
    );

    let status = commentary::wait_for_completion(&gateway, "r1", fast_policy(10)).await.unwrap();

    assert_eq!(status, CommentaryStatus::Completed { text: "And they're off!".into(), audio_url: None });
    assert_eq!(transport.calls_to("/api/commentary/race/r1/status"), 3);
}

#[tokio::test]
async fn commentary_polling_gives_up_after_budget() {
    let (gateway, transport) = gateway_with(
        MockTransport::new(|_| json_response(200, &json!({ "status": "PENDING" }))),
        Some("a1"),
    );

    let status = commentary::wait_for_completion(&gateway, "r1", fast_policy(4)).await.unwrap();

    assert_eq!(status, CommentaryStatus::Pending);
    assert_eq!(transport.requests().len(), 4);
}

#[tokio::test]
async fn commentary_polling_propagates_errors() {
    let (gateway, _) = gateway_with(
        MockTransport::new(|_| json_response(404, &json!({ "message": "Race not found" }))),
        Some("a1"),
    );

    let err = commentary::wait_for_completion(&gateway, "missing", fast_policy(4)).await.unwrap_err();

    assert_eq!(err, GatewayError::RequestFailed { status: 404, message: "Race not found".into() });
}
