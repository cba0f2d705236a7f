//! Typed wrappers over the backend REST surface.
//!
//! SYSTEM CONTEXT
//! ==============
//! Each function supplies a path, a verb and a body, then trusts
//! [`crate::Gateway`] for auth, retry and error mapping. None of them inspect
//! status codes themselves.

pub mod admin;
pub mod auth;
pub mod bets;
pub mod commentary;
pub mod credits;
pub mod events;
pub mod horses;
pub mod races;
pub mod tickets;

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;
