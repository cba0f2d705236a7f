//! Horse submission and the host approval workflow.

use serde_json::json;

use crate::error::GatewayError;
use crate::gateway::{Gateway, RequestOptions};
use crate::types::{Horse, NewHorse};

pub(crate) fn horse_action_path(horse_id: &str, action: &str) -> String {
    format!("/api/horses/{horse_id}/{action}")
}

/// # Errors
///
/// See [`GatewayError`].
pub async fn submit(gateway: &Gateway, horse: &NewHorse) -> Result<Horse, GatewayError> {
    gateway.request("/api/horses", RequestOptions::post(horse)?).await
}

/// # Errors
///
/// See [`GatewayError`].
pub async fn list_for_event(gateway: &Gateway, event_id: &str) -> Result<Vec<Horse>, GatewayError> {
    gateway.request(&format!("/api/horses/event/{event_id}"), RequestOptions::get()).await
}

/// # Errors
///
/// See [`GatewayError`].
pub async fn approve(gateway: &Gateway, horse_id: &str) -> Result<Horse, GatewayError> {
    gateway.request(&horse_action_path(horse_id, "approve"), RequestOptions::patch_empty()).await
}

/// Reject a submission, optionally telling the owner why.
///
/// # Errors
///
/// See [`GatewayError`].
pub async fn reject(gateway: &Gateway, horse_id: &str, reason: Option<&str>) -> Result<Horse, GatewayError> {
    let options = RequestOptions::patch(&json!({ "reason": reason }))?;
    gateway.request(&horse_action_path(horse_id, "reject"), options).await
}

/// # Errors
///
/// See [`GatewayError`].
pub async fn assign_to_race(gateway: &Gateway, horse_id: &str, race_id: &str) -> Result<Horse, GatewayError> {
    let options = RequestOptions::patch(&json!({ "raceId": race_id }))?;
    gateway.request(&horse_action_path(horse_id, "assign"), options).await
}
