//! Virtual credit balances, leaderboard, ledger and host top-ups.

use crate::error::GatewayError;
use crate::gateway::{Gateway, RequestOptions};
use crate::types::{CreditBalance, LeaderboardEntry, LedgerEntry, TopUp};

pub(crate) fn credits_path(view: &str, event_id: &str) -> String {
    format!("/api/credits/{view}/{event_id}")
}

/// # Errors
///
/// See [`GatewayError`].
pub async fn balance(gateway: &Gateway, event_id: &str) -> Result<CreditBalance, GatewayError> {
    gateway.request(&credits_path("balance", event_id), RequestOptions::get()).await
}

/// # Errors
///
/// See [`GatewayError`].
pub async fn leaderboard(gateway: &Gateway, event_id: &str) -> Result<Vec<LeaderboardEntry>, GatewayError> {
    gateway.request(&credits_path("leaderboard", event_id), RequestOptions::get()).await
}

/// # Errors
///
/// See [`GatewayError`].
pub async fn ledger(gateway: &Gateway, event_id: &str) -> Result<Vec<LedgerEntry>, GatewayError> {
    gateway.request(&credits_path("ledger", event_id), RequestOptions::get()).await
}

/// # Errors
///
/// See [`GatewayError`].
pub async fn top_up(gateway: &Gateway, top_up: &TopUp) -> Result<CreditBalance, GatewayError> {
    gateway.request("/api/credits/top-up", RequestOptions::post(top_up)?).await
}
