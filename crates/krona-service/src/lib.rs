//! Krona HTTP API service.
//!
//! This crate provides the HTTP API for the krona account service, including:
//!
//! - Signup, login, and logout with JWT sessions
//! - Email verification with short-lived one-time codes
//! - Profile management
//! - Funds transfers between users and paginated transaction history
//!
//! # Authentication
//!
//! Authenticated routes take a bearer access token. An expired access token
//! is silently renewed once against the user's persisted refresh token; the
//! replacement token rides back on the `x-access-token` response header.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)]

pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod handlers;
pub mod ledger;
pub mod password;
pub mod routes;
pub mod state;
pub mod verification;

pub use auth::tokens::{TokenManager, TokenPair};
pub use config::ServiceConfig;
pub use error::ApiError;
pub use ledger::Ledger;
pub use routes::create_router;
pub use state::AppState;
