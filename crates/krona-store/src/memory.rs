//! In-memory storage implementation.
//!
//! `MemoryStore` keeps all records in process-local maps behind a single
//! `RwLock`. It backs the `memory` backend and the test suites. Holding the
//! write lock across the whole of [`Store::transfer`] serializes balance
//! mutation, so the insufficient-funds check and the debit cannot interleave
//! with a concurrent transfer from the same account.

use std::collections::HashMap;
use std::sync::RwLock;

use krona_core::{
    normalize_email, Account, AccountId, AccountStatus, Transaction, TransactionId, User, UserId,
    UserUpdate,
};

use crate::error::{Result, StoreError};
use crate::{Store, TransferOutcome};

#[derive(Default)]
struct Inner {
    users: HashMap<UserId, User>,
    users_by_email: HashMap<String, UserId>,
    accounts: HashMap<AccountId, Account>,
    transactions: HashMap<TransactionId, Transaction>,
}

/// In-memory, process-local storage.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        // A poisoned lock means a writer panicked; the data itself is still
        // a consistent snapshot, so recover rather than propagate the panic.
        self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Store for MemoryStore {
    fn create_user(&self, user: &User) -> Result<()> {
        let mut inner = self.write();
        let email = normalize_email(&user.email);

        if inner.users_by_email.contains_key(&email) {
            return Err(StoreError::DuplicateEmail { email });
        }

        inner.users_by_email.insert(email, user.id);
        inner.users.insert(user.id, user.clone());
        Ok(())
    }

    fn get_user(&self, user_id: &UserId) -> Result<Option<User>> {
        Ok(self.read().users.get(user_id).cloned())
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let inner = self.read();
        Ok(inner
            .users_by_email
            .get(&normalize_email(email))
            .and_then(|id| inner.users.get(id))
            .cloned())
    }

    fn update_user(&self, user_id: &UserId, update: UserUpdate) -> Result<Option<User>> {
        let mut inner = self.write();
        let Some(user) = inner.users.get_mut(user_id) else {
            return Ok(None);
        };
        update.apply(user);
        Ok(Some(user.clone()))
    }

    fn create_account(&self, account: &Account) -> Result<()> {
        self.write()
            .accounts
            .insert(account.account_id.clone(), account.clone());
        Ok(())
    }

    fn get_account(&self, account_id: &AccountId) -> Result<Option<Account>> {
        Ok(self.read().accounts.get(account_id).cloned())
    }

    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<Transaction>> {
        Ok(self.read().transactions.get(transaction_id).cloned())
    }

    fn transactions_for_user(&self, user_id: &UserId) -> Result<Vec<Transaction>> {
        let inner = self.read();
        let mut transactions: Vec<Transaction> = inner
            .transactions
            .values()
            .filter(|tx| tx.involves(user_id))
            .cloned()
            .collect();

        // Newest first; ULIDs disambiguate records created in the same instant.
        transactions.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.to_string().cmp(&a.id.to_string()))
        });

        Ok(transactions)
    }

    fn transfer(
        &self,
        sender: &UserId,
        recipient: &UserId,
        transaction: &Transaction,
    ) -> Result<TransferOutcome> {
        let amount = transaction.amount_cents;
        let sender_account_id = AccountId::for_user(sender);
        let recipient_account_id = AccountId::for_user(recipient);

        // Write lock held for the full check-debit-credit-append sequence.
        let mut inner = self.write();

        let sender_account = inner
            .accounts
            .get(&sender_account_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "account",
                id: sender.to_string(),
            })?;

        if sender_account.status == AccountStatus::Frozen {
            return Err(StoreError::AccountFrozen {
                id: sender.to_string(),
            });
        }

        if !sender_account.has_sufficient_funds(amount) {
            return Err(StoreError::InsufficientFunds {
                balance: sender_account.balance_cents,
                required: amount,
            });
        }

        let recipient_account = inner
            .accounts
            .get(&recipient_account_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "account",
                id: recipient.to_string(),
            })?;

        if recipient_account.status == AccountStatus::Frozen {
            return Err(StoreError::AccountFrozen {
                id: recipient.to_string(),
            });
        }

        let now = chrono::Utc::now();

        let sender_balance_cents = {
            let account = inner
                .accounts
                .get_mut(&sender_account_id)
                .ok_or_else(|| StoreError::NotFound {
                    entity: "account",
                    id: sender.to_string(),
                })?;
            account.balance_cents -= amount;
            account.updated_at = now;
            account.balance_cents
        };

        let recipient_balance_cents = {
            let account = inner
                .accounts
                .get_mut(&recipient_account_id)
                .ok_or_else(|| StoreError::NotFound {
                    entity: "account",
                    id: recipient.to_string(),
                })?;
            account.balance_cents += amount;
            account.updated_at = now;
            account.balance_cents
        };

        inner
            .transactions
            .insert(transaction.id, transaction.clone());

        Ok(TransferOutcome {
            sender_balance_cents,
            recipient_balance_cents,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn test_user(email: &str) -> User {
        User::new(
            email,
            "$argon2id$stub".into(),
            "Test".into(),
            "User".into(),
            NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            "+4670000000".into(),
        )
    }

    fn seed_user_with_balance(store: &MemoryStore, email: &str, balance: i64) -> UserId {
        let user = test_user(email);
        store.create_user(&user).unwrap();
        store.create_account(&Account::open(&user.id, balance)).unwrap();
        user.id
    }

    #[test]
    fn duplicate_email_rejected_case_insensitively() {
        let store = MemoryStore::new();
        store.create_user(&test_user("a@x.com")).unwrap();

        let result = store.create_user(&test_user("A@X.COM"));
        assert!(matches!(result, Err(StoreError::DuplicateEmail { .. })));
    }

    #[test]
    fn find_user_by_email_is_case_insensitive() {
        let store = MemoryStore::new();
        let user = test_user("a@x.com");
        store.create_user(&user).unwrap();

        let found = store.find_user_by_email("A@x.Com").unwrap().unwrap();
        assert_eq!(found.id, user.id);
    }

    #[test]
    fn update_user_missing_returns_none() {
        let store = MemoryStore::new();
        let result = store
            .update_user(&UserId::generate(), UserUpdate::mark_verified())
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn transfer_conserves_funds_and_records_once() {
        let store = MemoryStore::new();
        let sender = seed_user_with_balance(&store, "s@x.com", 10_000);
        let recipient = seed_user_with_balance(&store, "r@x.com", 500);

        let tx = Transaction::new(sender, recipient, 2_500, None);
        let outcome = store.transfer(&sender, &recipient, &tx).unwrap();

        assert_eq!(outcome.sender_balance_cents, 7_500);
        assert_eq!(outcome.recipient_balance_cents, 3_000);

        assert_eq!(store.transactions_for_user(&sender).unwrap().len(), 1);
        assert_eq!(store.transactions_for_user(&recipient).unwrap().len(), 1);
    }

    #[test]
    fn transfer_insufficient_funds_leaves_no_trace() {
        let store = MemoryStore::new();
        let sender = seed_user_with_balance(&store, "s@x.com", 100);
        let recipient = seed_user_with_balance(&store, "r@x.com", 0);

        let tx = Transaction::new(sender, recipient, 101, None);
        let result = store.transfer(&sender, &recipient, &tx);

        assert!(matches!(
            result,
            Err(StoreError::InsufficientFunds {
                balance: 100,
                required: 101
            })
        ));

        let account = store.get_account(&AccountId::for_user(&sender)).unwrap().unwrap();
        assert_eq!(account.balance_cents, 100);
        assert!(store.transactions_for_user(&sender).unwrap().is_empty());
    }

    #[test]
    fn transfer_to_missing_recipient_account_fails() {
        let store = MemoryStore::new();
        let sender = seed_user_with_balance(&store, "s@x.com", 100);
        let ghost = UserId::generate();

        let tx = Transaction::new(sender, ghost, 50, None);
        let result = store.transfer(&sender, &ghost, &tx);
        assert!(matches!(result, Err(StoreError::NotFound { .. })));

        let account = store.get_account(&AccountId::for_user(&sender)).unwrap().unwrap();
        assert_eq!(account.balance_cents, 100);
    }

    #[test]
    fn transfer_involving_frozen_account_is_rejected() {
        let store = MemoryStore::new();
        let sender = seed_user_with_balance(&store, "s@x.com", 10_000);
        let recipient = test_user("r@x.com");
        store.create_user(&recipient).unwrap();

        let mut frozen = Account::open(&recipient.id, 0);
        frozen.status = AccountStatus::Frozen;
        store.create_account(&frozen).unwrap();

        let tx = Transaction::new(sender, recipient.id, 50, None);
        let result = store.transfer(&sender, &recipient.id, &tx);
        assert!(matches!(result, Err(StoreError::AccountFrozen { .. })));

        // And in the other direction, from the frozen side.
        let tx = Transaction::new(recipient.id, sender, 50, None);
        let result = store.transfer(&recipient.id, &sender, &tx);
        assert!(matches!(result, Err(StoreError::AccountFrozen { .. })));

        let account = store.get_account(&AccountId::for_user(&sender)).unwrap().unwrap();
        assert_eq!(account.balance_cents, 10_000);
        assert!(store.transactions_for_user(&sender).unwrap().is_empty());
    }

    #[test]
    fn history_is_newest_first() {
        let store = MemoryStore::new();
        let sender = seed_user_with_balance(&store, "s@x.com", 10_000);
        let recipient = seed_user_with_balance(&store, "r@x.com", 0);

        for amount in [100, 200, 300] {
            let tx = Transaction::new(sender, recipient, amount, None);
            store.transfer(&sender, &recipient, &tx).unwrap();
            std::thread::sleep(std::time::Duration::from_millis(2));
        }

        let history = store.transactions_for_user(&sender).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].amount_cents, 300);
        assert_eq!(history[2].amount_cents, 100);
    }

    #[test]
    fn concurrent_transfers_cannot_overdraw() {
        let store = Arc::new(MemoryStore::new());
        let sender = seed_user_with_balance(&store, "s@x.com", 100);
        let recipient = seed_user_with_balance(&store, "r@x.com", 0);

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let tx = Transaction::new(sender, recipient, 60, None);
                    store.transfer(&sender, &recipient, &tx)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let successes = results.iter().filter(|r| r.is_ok()).count();
        let insufficient = results
            .iter()
            .filter(|r| matches!(r, Err(StoreError::InsufficientFunds { .. })))
            .count();

        assert_eq!(successes, 1);
        assert_eq!(insufficient, 1);

        let account = store.get_account(&AccountId::for_user(&sender)).unwrap().unwrap();
        assert_eq!(account.balance_cents, 40);
    }
}
