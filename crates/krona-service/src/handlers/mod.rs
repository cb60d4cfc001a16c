//! API handlers.

// Allow precision loss in handlers - formatted amounts are well within f64 precision
#![allow(clippy::cast_precision_loss)]

pub mod account;
pub mod auth;
pub mod health;
pub mod profile;
pub mod transfers;
pub mod verification;
