//! Account types for the krona account service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, UserId};

/// A bank account.
///
/// Exactly one account exists per user, created at signup. The account id is
/// derived from the user id with a one-way hash, so the record itself carries
/// no reversible link to its owner. Balances are mutated only by the ledger
/// engine and never go negative through a transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Derived account identifier.
    pub account_id: AccountId,

    /// Current balance in minor units (cents).
    pub balance_cents: i64,

    /// Account status.
    pub status: AccountStatus,

    /// When the account was created.
    pub created_at: DateTime<Utc>,

    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new active account for a user with the given opening balance.
    #[must_use]
    pub fn open(user_id: &UserId, opening_balance_cents: i64) -> Self {
        let now = Utc::now();
        Self {
            account_id: AccountId::for_user(user_id),
            balance_cents: opening_balance_cents,
            status: AccountStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check whether the account can cover a debit of `amount_cents`.
    #[must_use]
    pub fn has_sufficient_funds(&self, amount_cents: i64) -> bool {
        self.balance_cents >= amount_cents
    }
}

/// Status of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// Account is active and may send and receive funds.
    Active,

    /// Account is frozen; transfers are rejected.
    Frozen,
}
