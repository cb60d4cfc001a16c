//! Storage layer for krona.
//!
//! This crate provides persistence for users, accounts, and transactions
//! behind the uniform [`Store`] trait, with two conforming implementations:
//!
//! - [`MemoryStore`] — process-local maps, used for tests and the `memory`
//!   backend.
//! - [`RocksStore`] — `RocksDB` with column families and CBOR values, behind
//!   the `rocksdb-backend` feature.
//!
//! # Concurrency
//!
//! The check-balance-then-debit sequence of a funds transfer is a classic
//! read-check-write race when the two steps are independent. Both backends
//! therefore expose [`Store::transfer`] as a single serialized operation:
//! `MemoryStore` holds its write lock across the whole step, `RocksStore`
//! holds a transfer mutex across the read-check-write and commits with one
//! `WriteBatch`. A transfer either fully applies (debit + credit + record) or
//! not at all.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod memory;
#[cfg(feature = "rocksdb-backend")]
pub mod keys;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
#[cfg(feature = "rocksdb-backend")]
pub mod schema;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksStore;

use krona_core::{Account, AccountId, Transaction, TransactionId, User, UserId, UserUpdate};

/// Balances after a successful transfer.
#[derive(Debug, Clone, Copy)]
pub struct TransferOutcome {
    /// Sender balance after the debit, in cents.
    pub sender_balance_cents: i64,

    /// Recipient balance after the credit, in cents.
    pub recipient_balance_cents: i64,
}

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer so the rest of the system is
/// storage-agnostic; the backend is selected once at startup. Lookups return
/// `Ok(None)` when the entity is absent; only infrastructure failures are
/// errors.
pub trait Store: Send + Sync {
    // =========================================================================
    // User Operations
    // =========================================================================

    /// Insert a new user record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateEmail` if a user with the same
    /// (lowercased) email already exists.
    fn create_user(&self, user: &User) -> Result<()>;

    /// Get a user by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_user(&self, user_id: &UserId) -> Result<Option<User>>;

    /// Find a user by email (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Apply a partial update to a user, returning the updated record.
    ///
    /// Returns `Ok(None)` if the user does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn update_user(&self, user_id: &UserId, update: UserUpdate) -> Result<Option<User>>;

    // =========================================================================
    // Account Operations
    // =========================================================================

    /// Insert a new account record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn create_account(&self, account: &Account) -> Result<()>;

    /// Get an account by its derived id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_account(&self, account_id: &AccountId) -> Result<Option<Account>>;

    // =========================================================================
    // Transaction Operations
    // =========================================================================

    /// Get a transaction by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<Transaction>>;

    /// List all transactions where the user is sender or recipient, newest
    /// first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn transactions_for_user(&self, user_id: &UserId) -> Result<Vec<Transaction>>;

    // =========================================================================
    // Compound Operations
    // =========================================================================

    /// Execute a funds transfer: check the sender balance, debit the sender,
    /// credit the recipient, and append the transaction record as one
    /// serialized step.
    ///
    /// The `transaction` record carries the amount; `sender` and `recipient`
    /// must match its participants.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if either account doesn't exist.
    /// - `StoreError::AccountFrozen` if either account is frozen.
    /// - `StoreError::InsufficientFunds` if the sender balance is too low; no
    ///   partial write occurs.
    fn transfer(
        &self,
        sender: &UserId,
        recipient: &UserId,
        transaction: &Transaction,
    ) -> Result<TransferOutcome>;
}
