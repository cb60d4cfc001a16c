//! Core types for the krona account service.
//!
//! This crate provides the foundational types used throughout the platform:
//!
//! - **Identifiers**: `UserId`, `AccountId`, `TransactionId`
//! - **Accounts**: `Account`, `AccountStatus`
//! - **Transactions**: `Transaction`
//! - **Users**: `User`, `UserUpdate`
//!
//! # Balance unit
//!
//! Balances and transfer amounts are stored as `i64` minor units (cents) to
//! avoid floating point precision issues. A transfer of $12.50 moves 1250
//! cents.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod account;
pub mod error;
pub mod ids;
pub mod transaction;
pub mod user;

pub use account::{Account, AccountStatus};
pub use error::{BankError, Result};
pub use ids::{AccountId, IdError, TransactionId, UserId};
pub use transaction::Transaction;
pub use user::{normalize_email, User, UserUpdate};
