//! Account endpoints. Login and registration establish the session; logout
//! always tears it down locally, even when the server call fails.

use serde_json::json;

use crate::error::GatewayError;
use crate::gateway::{Gateway, RequestOptions};
use crate::types::{AuthResponse, Credentials, Registration, User};

/// Create an account and start a session for it.
///
/// # Errors
///
/// Returns the server's message (e.g. email already registered) as
/// [`GatewayError::RequestFailed`].
pub async fn register(gateway: &Gateway, email: &str, password: &str, name: &str) -> Result<User, GatewayError> {
    let body = Registration { email, password, name };
    let response: AuthResponse = gateway.request("/api/auth/register", RequestOptions::post(&body)?).await?;
    establish(gateway, response)
}

/// Authenticate and start a session.
///
/// # Errors
///
/// Bad credentials surface as [`GatewayError::RequestFailed`] with the
/// server's message; they never trigger a token refresh.
pub async fn login(gateway: &Gateway, email: &str, password: &str) -> Result<User, GatewayError> {
    let body = Credentials { email, password };
    let response: AuthResponse = gateway.request("/api/auth/login", RequestOptions::post(&body)?).await?;
    establish(gateway, response)
}

/// Invalidate the session server-side (best effort) and clear it locally.
///
/// # Errors
///
/// Returns [`GatewayError::Storage`] only if local tokens cannot be cleared.
pub async fn logout(gateway: &Gateway) -> Result<(), GatewayError> {
    let session = gateway.session();
    let refresh_token = session.refresh_token()?;
    let options = RequestOptions::post(&json!({ "refreshToken": refresh_token }))?;
    if let Err(e) = gateway.request_unit("/api/auth/logout", options).await {
        tracing::warn!(error = %e, "server logout failed; clearing local session anyway");
    }
    session.clear()?;
    Ok(())
}

/// Fetch the current account and cache it on the session.
///
/// # Errors
///
/// Returns [`GatewayError::AuthenticationExpired`] when no session can be
/// recovered.
pub async fn me(gateway: &Gateway) -> Result<User, GatewayError> {
    let user: User = gateway.request("/api/auth/me", RequestOptions::get()).await?;
    gateway.session().set_user(user.clone())?;
    Ok(user)
}

fn establish(gateway: &Gateway, response: AuthResponse) -> Result<User, GatewayError> {
    let session = gateway.session();
    session.clear()?;
    session.store_tokens(&response.tokens())?;
    session.set_user(response.user.clone())?;
    tracing::info!(user_id = %response.user.id, "session established");
    Ok(response.user)
}
