//! Transaction records.
//!
//! Every successful transfer creates exactly one transaction record. Records
//! are append-only: they are never mutated or deleted, and only the ledger
//! engine creates them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{TransactionId, UserId};

/// An immutable record of a completed funds transfer.
///
/// Transactions use ULIDs for time-ordered ids. A record is readable by both
/// participants and nobody else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction id (ULID for time-ordering).
    pub id: TransactionId,

    /// The user who sent the funds.
    pub sender: UserId,

    /// The user who received the funds.
    pub recipient: UserId,

    /// Transferred amount in minor units (always positive).
    pub amount_cents: i64,

    /// Optional message attached by the sender (length-capped).
    pub message: Option<String>,

    /// When the transaction was created.
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new transfer record.
    #[must_use]
    pub fn new(
        sender: UserId,
        recipient: UserId,
        amount_cents: i64,
        message: Option<String>,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            sender,
            recipient,
            amount_cents,
            message,
            created_at: Utc::now(),
        }
    }

    /// Check whether a user participated in this transaction.
    #[must_use]
    pub fn involves(&self, user_id: &UserId) -> bool {
        self.sender == *user_id || self.recipient == *user_id
    }

    /// Whether this transaction is incoming from `user_id`'s point of view.
    #[must_use]
    pub fn is_incoming_for(&self, user_id: &UserId) -> bool {
        self.recipient == *user_id
    }
}
