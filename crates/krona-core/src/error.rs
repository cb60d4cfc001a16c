//! Error types for the krona account service.

use crate::ids::IdError;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, BankError>;

/// Errors that can occur in krona domain operations.
///
/// Every variant is a terminal domain error except `Infrastructure`, which is
/// the only kind a caller may retry.
#[derive(Debug, thiserror::Error)]
pub enum BankError {
    /// Account not found.
    #[error("account not found: {user_id}")]
    AccountNotFound {
        /// The user whose account was looked up.
        user_id: String,
    },

    /// Recipient (user or their account) not found.
    #[error("recipient not found: {email}")]
    RecipientNotFound {
        /// The email that did not resolve.
        email: String,
    },

    /// Transaction not found.
    #[error("transaction not found: {transaction_id}")]
    TransactionNotFound {
        /// The transaction id that was not found.
        transaction_id: String,
    },

    /// Insufficient funds for the transfer.
    #[error("insufficient funds: balance={balance}, required={required}")]
    InsufficientFunds {
        /// Current balance in cents.
        balance: i64,
        /// Required amount in cents.
        required: i64,
    },

    /// Transfer amount outside the configured bounds, or a message too long.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// The recipient is not a valid transfer target (e.g. self-transfer).
    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),

    /// Email already associated with an existing account.
    #[error("email already registered")]
    AlreadyExists,

    /// Login blocked until the email address is verified.
    #[error("email not verified")]
    Unverified,

    /// Wrong email or password.
    #[error("wrong email and/or password")]
    InvalidCredential,

    /// Either side of the transfer is frozen.
    #[error("account is frozen")]
    AccountFrozen,

    /// The caller is not a participant of the transaction.
    #[error("not a participant of this transaction")]
    NotParticipant,

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),

    /// Storage or transport failure; the only retryable kind.
    #[error("infrastructure failure: {0}")]
    Infrastructure(String),
}
