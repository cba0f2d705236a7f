//! Race lifecycle driven by the host during the live session.
//!
//! The server owns the state machine; these calls only request transitions
//! and return the race as the server now sees it.

use crate::error::GatewayError;
use crate::gateway::{Gateway, RequestOptions};
use crate::types::Race;

/// Host-driven race transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceAction {
    OpenBetting,
    CloseBetting,
    Start,
    Complete,
}

impl RaceAction {
    #[must_use]
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::OpenBetting => "open-betting",
            Self::CloseBetting => "close-betting",
            Self::Start => "start",
            Self::Complete => "complete",
        }
    }
}

pub(crate) fn race_action_path(race_id: &str, action: RaceAction) -> String {
    format!("/api/races/{race_id}/{}", action.path_segment())
}

/// # Errors
///
/// See [`GatewayError`].
pub async fn list_for_event(gateway: &Gateway, event_id: &str) -> Result<Vec<Race>, GatewayError> {
    gateway.request(&format!("/api/races/event/{event_id}"), RequestOptions::get()).await
}

/// # Errors
///
/// See [`GatewayError`].
pub async fn get(gateway: &Gateway, race_id: &str) -> Result<Race, GatewayError> {
    gateway.request(&format!("/api/races/{race_id}"), RequestOptions::get()).await
}

/// # Errors
///
/// See [`GatewayError`].
pub async fn transition(gateway: &Gateway, race_id: &str, action: RaceAction) -> Result<Race, GatewayError> {
    gateway.request(&race_action_path(race_id, action), RequestOptions::patch_empty()).await
}

/// # Errors
///
/// See [`GatewayError`].
pub async fn open_betting(gateway: &Gateway, race_id: &str) -> Result<Race, GatewayError> {
    transition(gateway, race_id, RaceAction::OpenBetting).await
}

/// # Errors
///
/// See [`GatewayError`].
pub async fn close_betting(gateway: &Gateway, race_id: &str) -> Result<Race, GatewayError> {
    transition(gateway, race_id, RaceAction::CloseBetting).await
}

/// # Errors
///
/// See [`GatewayError`].
pub async fn start(gateway: &Gateway, race_id: &str) -> Result<Race, GatewayError> {
    transition(gateway, race_id, RaceAction::Start).await
}

/// # Errors
///
/// See [`GatewayError`].
pub async fn complete(gateway: &Gateway, race_id: &str) -> Result<Race, GatewayError> {
    transition(gateway, race_id, RaceAction::Complete).await
}
