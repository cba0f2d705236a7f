//! Bet placement. Credit checks and settlement happen server-side; an
//! overdraft comes back as the server's message (e.g. "Insufficient credits").

use crate::error::GatewayError;
use crate::gateway::{Gateway, RequestOptions};
use crate::types::{Bet, NewBet};

/// # Errors
///
/// See [`GatewayError`].
pub async fn place(gateway: &Gateway, bet: &NewBet) -> Result<Bet, GatewayError> {
    gateway.request("/api/bets", RequestOptions::post(bet)?).await
}

/// The current user's bets on one race.
///
/// # Errors
///
/// See [`GatewayError`].
pub async fn list_for_race(gateway: &Gateway, race_id: &str) -> Result<Vec<Bet>, GatewayError> {
    gateway.request(&format!("/api/bets/race/{race_id}"), RequestOptions::get()).await
}
