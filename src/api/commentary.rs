//! AI race commentary: trigger generation, then poll until it settles.
//!
//! Generation runs server-side and can take a while, so callers either poll
//! `status` themselves or use [`wait_for_completion`].

use std::time::Duration;

use crate::error::GatewayError;
use crate::gateway::{Gateway, RequestOptions};
use crate::types::CommentaryStatus;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_POLLS: u32 = 60;

pub(crate) fn commentary_path(race_id: &str, action: &str) -> String {
    format!("/api/commentary/race/{race_id}/{action}")
}

/// How [`wait_for_completion`] polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_polls: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self { interval: DEFAULT_POLL_INTERVAL, max_polls: DEFAULT_MAX_POLLS }
    }
}

/// # Errors
///
/// See [`GatewayError`].
pub async fn generate(gateway: &Gateway, race_id: &str) -> Result<CommentaryStatus, GatewayError> {
    gateway.request(&commentary_path(race_id, "generate"), RequestOptions::post_empty()).await
}

/// # Errors
///
/// See [`GatewayError`].
pub async fn status(gateway: &Gateway, race_id: &str) -> Result<CommentaryStatus, GatewayError> {
    gateway.request(&commentary_path(race_id, "status"), RequestOptions::get()).await
}

/// Poll `status` until it is terminal or the poll budget runs out.
///
/// Returns the last status seen; a non-terminal result means the budget was
/// exhausted.
///
/// # Errors
///
/// Returns the first [`GatewayError`] from a status call.
pub async fn wait_for_completion(
    gateway: &Gateway,
    race_id: &str,
    policy: PollPolicy,
) -> Result<CommentaryStatus, GatewayError> {
    let mut last = status(gateway, race_id).await?;
    let mut polls = 1;
    while !last.is_terminal() && polls < policy.max_polls {
        tokio::time::sleep(policy.interval).await;
        last = status(gateway, race_id).await?;
        polls += 1;
        tracing::debug!(race_id, polls, ?last, "commentary status polled");
    }
    Ok(last)
}
