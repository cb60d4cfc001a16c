//! Error types for krona storage.

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
///
/// Absent entities are reported through `Ok(None)` on lookups; `NotFound` is
/// reserved for operations that require the entity to exist (e.g. a transfer
/// against a missing account). Only `Database` and `Serialization` represent
/// infrastructure failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity ("user", "account", "transaction").
        entity: &'static str,
        /// The id that was looked up.
        id: String,
    },

    /// The account is frozen; balance mutation refused.
    #[error("account frozen: {id}")]
    AccountFrozen {
        /// The owning user's id.
        id: String,
    },

    /// Insufficient funds for a transfer debit.
    #[error("insufficient funds: balance={balance}, required={required}")]
    InsufficientFunds {
        /// Current balance in cents.
        balance: i64,
        /// Required amount in cents.
        required: i64,
    },

    /// A user with this email already exists.
    #[error("duplicate email: {email}")]
    DuplicateEmail {
        /// The email that collided.
        email: String,
    },
}
