//! Injectable session manager: token pair, current user, refresh guard.
//!
//! SYSTEM CONTEXT
//! ==============
//! One `Session` is shared (via `Arc`) by the gateway and anything that needs
//! to know who is logged in. Tokens live only in the backing store; they are
//! read fresh on every call so a refresh performed through one request is
//! seen by the next request's headers.
//!
//! Three representations are kept in sync on every change: the
//! `accessToken` key, the `refreshToken` key, and the `auth-storage` blob
//! that the web UI's persisted state store reads.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::refresh::RefreshGuard;
use crate::storage::{KeyValueStore, StorageError};
use crate::types::{TokenPair, User};

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const AUTH_STORAGE_KEY: &str = "auth-storage";

/// `auth-storage` envelope: `{ "state": {...}, "version": 0 }`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedAuth {
    pub state: PersistedAuthState,
    #[serde(default)]
    pub version: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedAuthState {
    pub user: Option<User>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub is_authenticated: bool,
}

pub struct Session {
    store: Arc<dyn KeyValueStore>,
    user: RwLock<Option<User>>,
    refresh: RefreshGuard,
}

impl Session {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store, user: RwLock::new(None), refresh: RefreshGuard::default() }
    }

    /// Restore session state from storage at startup.
    ///
    /// The individual token keys win over the blob; a blob-only session (keys
    /// lost) is written back to the keys so all three agree again.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the store cannot be read or resynced.
    pub fn load(&self) -> Result<bool, StorageError> {
        let persisted = self.read_blob()?;
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = persisted.state.user.clone();

        if self.access_token()?.is_none() {
            if let Some(access_token) = persisted.state.access_token {
                let refresh_token = match self.refresh_token()? {
                    Some(existing) => Some(existing),
                    None => persisted.state.refresh_token,
                };
                self.store_tokens(&TokenPair { access_token, refresh_token })?;
            }
        }
        let authenticated = self.is_authenticated()?;
        tracing::debug!(authenticated, "session loaded");
        Ok(authenticated)
    }

    /// Current access token, read from storage.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the store cannot be read.
    pub fn access_token(&self) -> Result<Option<String>, StorageError> {
        Ok(self.store.get(ACCESS_TOKEN_KEY)?.filter(|t| !t.is_empty()))
    }

    /// Current refresh token, read from storage.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the store cannot be read.
    pub fn refresh_token(&self) -> Result<Option<String>, StorageError> {
        Ok(self.store.get(REFRESH_TOKEN_KEY)?.filter(|t| !t.is_empty()))
    }

    /// # Errors
    ///
    /// Returns a [`StorageError`] if the store cannot be read.
    pub fn is_authenticated(&self) -> Result<bool, StorageError> {
        Ok(self.access_token()?.is_some())
    }

    /// Replace the access token, and the refresh token when one is supplied.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if any key cannot be written.
    pub fn store_tokens(&self, tokens: &TokenPair) -> Result<(), StorageError> {
        self.store.set(ACCESS_TOKEN_KEY, &tokens.access_token)?;
        if let Some(refresh_token) = &tokens.refresh_token {
            self.store.set(REFRESH_TOKEN_KEY, refresh_token)?;
        }
        self.write_blob()
    }

    /// # Errors
    ///
    /// Returns a [`StorageError`] if the blob cannot be written.
    pub fn set_user(&self, user: User) -> Result<(), StorageError> {
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = Some(user);
        self.write_blob()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.user.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Drop both tokens and the user. Used by logout and terminal refresh failure.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if any key cannot be written.
    pub fn clear(&self) -> Result<(), StorageError> {
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.store.remove(ACCESS_TOKEN_KEY)?;
        self.store.remove(REFRESH_TOKEN_KEY)?;
        self.write_blob()
    }

    pub(crate) fn refresh_guard(&self) -> &RefreshGuard {
        &self.refresh
    }

    /// Whether a token refresh is currently pending.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.refresh.is_refreshing()
    }

    fn read_blob(&self) -> Result<PersistedAuth, StorageError> {
        match self.store.get(AUTH_STORAGE_KEY)? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(persisted) => Ok(persisted),
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring unreadable auth-storage blob");
                    Ok(PersistedAuth::default())
                }
            },
            None => Ok(PersistedAuth::default()),
        }
    }

    fn write_blob(&self) -> Result<(), StorageError> {
        let access_token = self.access_token()?;
        let persisted = PersistedAuth {
            state: PersistedAuthState {
                user: self.user(),
                is_authenticated: access_token.is_some(),
                access_token,
                refresh_token: self.refresh_token()?,
            },
            version: 0,
        };
        let raw = serde_json::to_string(&persisted)?;
        self.store.set(AUTH_STORAGE_KEY, &raw)
    }
}
