use super::*;
use serde_json::json;

// =============================================================
// Status enums
// =============================================================

#[test]
fn race_status_parses_wire_names() {
    let race: Race = serde_json::from_value(json!({
        "id": "r1",
        "eventId": "e1",
        "name": "The Gold Cup",
        "raceNumber": 3,
        "status": "BETTING_OPEN",
        "videoUrl": "https://cdn.test/r1.mp4"
    }))
    .unwrap();
    assert_eq!(race.status, RaceStatus::BettingOpen);
    assert_eq!(race.race_number, Some(3));
    assert!(race.horses.is_empty());
    assert!(race.status.accepts_bets());
    assert_eq!(race.status.label(), "Betting Open");
}

#[test]
fn unknown_statuses_degrade_instead_of_failing() {
    let race_status: RaceStatus = serde_json::from_value(json!("PHOTO_FINISH")).unwrap();
    assert_eq!(race_status, RaceStatus::Unknown);
    assert_eq!(race_status.label(), "Unknown");

    let horse_status: HorseStatus = serde_json::from_value(json!("UNDER_REVIEW")).unwrap();
    assert_eq!(horse_status, HorseStatus::Unknown);

    let role: UserRole = serde_json::from_value(json!("SUPERUSER")).unwrap();
    assert_eq!(role, UserRole::Unknown);
}

#[test]
fn race_status_final_states() {
    assert!(RaceStatus::Completed.is_final());
    assert!(RaceStatus::Cancelled.is_final());
    assert!(!RaceStatus::Running.is_final());
    assert!(!RaceStatus::BettingClosed.accepts_bets());
}

// =============================================================
// Auth
// =============================================================

#[test]
fn auth_response_parses_and_exposes_tokens() {
    let resp: AuthResponse = serde_json::from_value(json!({
        "user": { "id": "u1", "email": "host@example.com", "name": "Host", "role": "HOST" },
        "accessToken": "a1",
        "refreshToken": "r1"
    }))
    .unwrap();
    assert_eq!(resp.user.role, UserRole::Host);
    assert_eq!(
        resp.tokens(),
        TokenPair { access_token: "a1".into(), refresh_token: Some("r1".into()) }
    );
}

#[test]
fn user_role_defaults_to_attendee() {
    let user: User = serde_json::from_value(json!({ "id": "u2", "email": "guest@example.com" })).unwrap();
    assert_eq!(user.role, UserRole::Attendee);
    assert_eq!(user.name, None);
}

#[test]
fn token_pair_refresh_token_optional() {
    let pair: TokenPair = serde_json::from_value(json!({ "accessToken": "a2" })).unwrap();
    assert_eq!(pair.refresh_token, None);
}

// =============================================================
// Commentary
// =============================================================

#[test]
fn commentary_completed_carries_text() {
    let status: CommentaryStatus = serde_json::from_value(json!({
        "status": "COMPLETED",
        "text": "And they're off!",
        "audioUrl": "https://cdn.test/c.mp3"
    }))
    .unwrap();
    assert_eq!(
        status,
        CommentaryStatus::Completed {
            text: "And they're off!".into(),
            audio_url: Some("https://cdn.test/c.mp3".into())
        }
    );
    assert!(status.is_terminal());
}

#[test]
fn commentary_in_progress_is_not_terminal() {
    let status: CommentaryStatus = serde_json::from_value(json!({ "status": "GENERATING" })).unwrap();
    assert_eq!(status, CommentaryStatus::Generating);
    assert!(!status.is_terminal());
}

#[test]
fn commentary_failed_error_optional() {
    let status: CommentaryStatus = serde_json::from_value(json!({ "status": "FAILED" })).unwrap();
    assert_eq!(status, CommentaryStatus::Failed { error: None });
    assert!(status.is_terminal());
}

#[test]
fn commentary_unknown_status() {
    let status: CommentaryStatus = serde_json::from_value(json!({ "status": "QUEUED_FOR_REVIEW" })).unwrap();
    assert_eq!(status, CommentaryStatus::Unknown);
    assert!(!status.is_terminal());
}

// =============================================================
// Request bodies
// =============================================================

#[test]
fn event_update_sends_only_set_fields() {
    let update = EventUpdate { name: Some("Spring Derby".into()), ..EventUpdate::default() };
    assert_eq!(serde_json::to_value(&update).unwrap(), json!({ "name": "Spring Derby" }));
}

#[test]
fn new_bet_serializes_camel_case() {
    let bet = NewBet { race_id: "r1".into(), horse_id: "h1".into(), amount: 50 };
    assert_eq!(
        serde_json::to_value(&bet).unwrap(),
        json!({ "raceId": "r1", "horseId": "h1", "amount": 50 })
    );
}

#[test]
fn summary_tolerates_missing_fields() {
    let summary: EventSummary = serde_json::from_value(json!({ "eventId": "e1", "ticketsSold": 12 })).unwrap();
    assert_eq!(summary.tickets_sold, 12);
    assert_eq!(summary.bets_placed, 0);
}
