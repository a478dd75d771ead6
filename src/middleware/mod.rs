//! Middleware for the bike-share API
//!
//! Request tracing and the authentication extractors.

pub mod auth;
mod tracing;

pub use auth::{AdminScope, AuthenticatedUser, UserScope};
pub use tracing::{request_tracing, REQUEST_ID_HEADER};
