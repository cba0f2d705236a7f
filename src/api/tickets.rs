//! Ticket purchase and listing.

use crate::error::GatewayError;
use crate::gateway::{Gateway, RequestOptions};
use crate::types::Ticket;

pub(crate) fn event_tickets_path(event_id: &str) -> String {
    format!("/api/events/{event_id}/tickets")
}

/// Buy a ticket for the current user.
///
/// # Errors
///
/// See [`GatewayError`].
pub async fn purchase(gateway: &Gateway, event_id: &str) -> Result<Ticket, GatewayError> {
    gateway.request(&event_tickets_path(event_id), RequestOptions::post_empty()).await
}

/// # Errors
///
/// See [`GatewayError`].
pub async fn list_mine(gateway: &Gateway) -> Result<Vec<Ticket>, GatewayError> {
    gateway.request("/api/tickets/me", RequestOptions::get()).await
}

/// Host view of every ticket sold for an event.
///
/// # Errors
///
/// See [`GatewayError`].
pub async fn list_for_event(gateway: &Gateway, event_id: &str) -> Result<Vec<Ticket>, GatewayError> {
    gateway.request(&event_tickets_path(event_id), RequestOptions::get()).await
}
