//! Event CRUD plus the host workflow actions.

use crate::error::GatewayError;
use crate::gateway::{Gateway, RequestOptions};
use crate::types::{Event, EventSummary, EventUpdate, NewEvent, Race};

pub(crate) fn event_path(event_id: &str) -> String {
    format!("/api/events/{event_id}")
}

pub(crate) fn event_action_path(event_id: &str, action: &str) -> String {
    format!("/api/events/{event_id}/{action}")
}

/// # Errors
///
/// See [`GatewayError`].
pub async fn list(gateway: &Gateway) -> Result<Vec<Event>, GatewayError> {
    gateway.request("/api/events", RequestOptions::get()).await
}

/// # Errors
///
/// See [`GatewayError`].
pub async fn get(gateway: &Gateway, event_id: &str) -> Result<Event, GatewayError> {
    gateway.request(&event_path(event_id), RequestOptions::get()).await
}

/// # Errors
///
/// See [`GatewayError`].
pub async fn create(gateway: &Gateway, event: &NewEvent) -> Result<Event, GatewayError> {
    gateway.request("/api/events", RequestOptions::post(event)?).await
}

/// # Errors
///
/// See [`GatewayError`].
pub async fn update(gateway: &Gateway, event_id: &str, update: &EventUpdate) -> Result<Event, GatewayError> {
    gateway.request(&event_path(event_id), RequestOptions::patch(update)?).await
}

/// Move a draft event to published so attendees can buy tickets.
///
/// # Errors
///
/// See [`GatewayError`].
pub async fn publish(gateway: &Gateway, event_id: &str) -> Result<Event, GatewayError> {
    gateway.request(&event_action_path(event_id, "publish"), RequestOptions::post_empty()).await
}

/// Ask the server to build the race card from approved horses.
///
/// # Errors
///
/// See [`GatewayError`].
pub async fn generate_races(gateway: &Gateway, event_id: &str) -> Result<Vec<Race>, GatewayError> {
    gateway.request(&event_action_path(event_id, "generate-races"), RequestOptions::post_empty()).await
}

/// Copy an event's settings into a new draft.
///
/// # Errors
///
/// See [`GatewayError`].
pub async fn duplicate(gateway: &Gateway, event_id: &str) -> Result<Event, GatewayError> {
    gateway.request(&event_action_path(event_id, "duplicate"), RequestOptions::post_empty()).await
}

/// # Errors
///
/// See [`GatewayError`].
pub async fn summary(gateway: &Gateway, event_id: &str) -> Result<EventSummary, GatewayError> {
    gateway.request(&event_action_path(event_id, "summary"), RequestOptions::get()).await
}
