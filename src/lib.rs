//! Typed client for the Race Night backend API.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every outbound call goes through [`gateway::Gateway`], which attaches the
//! bearer token held by [`session::Session`] and recovers from an expired
//! access token with exactly one refresh-and-retry cycle. The `api` modules
//! are thin wrappers that only supply a path, a verb and a body.
//!
//! ```no_run
//! # async fn demo() -> Result<(), racenight::GatewayError> {
//! use std::sync::Arc;
//! use racenight::{Gateway, GatewayConfig, storage::MemoryStore};
//!
//! let gateway = Gateway::from_config(GatewayConfig::new("http://localhost:3001"), Arc::new(MemoryStore::new()))?;
//! racenight::api::auth::login(&gateway, "host@example.com", "hunter2").await?;
//! let events = racenight::api::events::list(&gateway).await?;
//! # let _ = events;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod gateway;
pub mod refresh;
pub mod session;
pub mod storage;
pub mod transport;
pub mod types;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use gateway::{Attempt, Gateway, RequestOptions};
pub use session::Session;
