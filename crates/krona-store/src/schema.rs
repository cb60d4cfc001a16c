//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// User records, keyed by `user_id` (UUID bytes).
    pub const USERS: &str = "users";

    /// Index: lowercased email -> `user_id` bytes.
    pub const USERS_BY_EMAIL: &str = "users_by_email";

    /// Account records, keyed by the derived account id (hex string bytes).
    pub const ACCOUNTS: &str = "accounts";

    /// Transaction records, keyed by `transaction_id` (ULID bytes).
    pub const TRANSACTIONS: &str = "transactions";

    /// Index: transactions by participant, keyed by
    /// `user_id || transaction_id`. Value is empty (index only). Both the
    /// sender and the recipient get an entry.
    pub const TRANSACTIONS_BY_USER: &str = "transactions_by_user";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::USERS,
        cf::USERS_BY_EMAIL,
        cf::ACCOUNTS,
        cf::TRANSACTIONS,
        cf::TRANSACTIONS_BY_USER,
    ]
}
