//! Privileged test-data operations for rehearsing an event.

use crate::error::GatewayError;
use crate::gateway::{Gateway, RequestOptions};
use crate::types::{Ack, AdminTestStatus};

/// Wipe and reseed test data.
///
/// # Errors
///
/// See [`GatewayError`].
pub async fn reset_test_data(gateway: &Gateway) -> Result<Ack, GatewayError> {
    gateway.request("/api/admin/reset-test-data", RequestOptions::post_empty()).await
}

/// # Errors
///
/// See [`GatewayError`].
pub async fn test_status(gateway: &Gateway) -> Result<AdminTestStatus, GatewayError> {
    gateway.request("/api/admin/test-status", RequestOptions::get()).await
}
