//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.
//! Values are CBOR-encoded; see [`crate::schema`] for the column family
//! layout.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};

use krona_core::{
    Account, AccountId, AccountStatus, Transaction, TransactionId, User, UserId, UserUpdate,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::{Store, TransferOutcome};

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,

    /// Serializes read-check-write sequences (transfers, user updates,
    /// signup uniqueness checks). RocksDB batches are atomic but the reads
    /// feeding them are not, so compound operations take this lock.
    write_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn load_account(&self, account_id: &AccountId) -> Result<Option<Account>> {
        let cf = self.cf(cf::ACCOUNTS)?;
        self.db
            .get_cf(&cf, keys::account_key(account_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn lock_writes(&self) -> std::sync::MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Store for RocksStore {
    // =========================================================================
    // User Operations
    // =========================================================================

    fn create_user(&self, user: &User) -> Result<()> {
        let cf_users = self.cf(cf::USERS)?;
        let cf_email = self.cf(cf::USERS_BY_EMAIL)?;

        let email_key = keys::email_key(&user.email);

        // Uniqueness check and insert must not interleave with another signup
        // for the same address.
        let _guard = self.lock_writes();

        let exists = self
            .db
            .get_cf(&cf_email, &email_key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .is_some();
        if exists {
            return Err(StoreError::DuplicateEmail {
                email: user.email.clone(),
            });
        }

        let value = Self::serialize(user)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_users, keys::user_key(&user.id), &value);
        batch.put_cf(&cf_email, &email_key, user.id.as_bytes());

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_user(&self, user_id: &UserId) -> Result<Option<User>> {
        let cf = self.cf(cf::USERS)?;
        self.db
            .get_cf(&cf, keys::user_key(user_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let cf_email = self.cf(cf::USERS_BY_EMAIL)?;

        let Some(id_bytes) = self
            .db
            .get_cf(&cf_email, keys::email_key(email))
            .map_err(|e| StoreError::Database(e.to_string()))?
        else {
            return Ok(None);
        };

        let bytes: [u8; 16] = id_bytes
            .as_slice()
            .try_into()
            .map_err(|_| StoreError::Serialization("malformed email index entry".into()))?;
        let user_id = UserId::from_uuid(uuid::Uuid::from_bytes(bytes));

        self.get_user(&user_id)
    }

    fn update_user(&self, user_id: &UserId, update: UserUpdate) -> Result<Option<User>> {
        let cf = self.cf(cf::USERS)?;

        let _guard = self.lock_writes();

        let Some(mut user) = self.get_user(user_id)? else {
            return Ok(None);
        };

        update.apply(&mut user);

        let value = Self::serialize(&user)?;
        self.db
            .put_cf(&cf, keys::user_key(user_id), value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Some(user))
    }

    // =========================================================================
    // Account Operations
    // =========================================================================

    fn create_account(&self, account: &Account) -> Result<()> {
        let cf = self.cf(cf::ACCOUNTS)?;
        let value = Self::serialize(account)?;

        self.db
            .put_cf(&cf, keys::account_key(&account.account_id), value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_account(&self, account_id: &AccountId) -> Result<Option<Account>> {
        self.load_account(account_id)
    }

    // =========================================================================
    // Transaction Operations
    // =========================================================================

    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<Transaction>> {
        let cf = self.cf(cf::TRANSACTIONS)?;
        self.db
            .get_cf(&cf, keys::transaction_key(transaction_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn transactions_for_user(&self, user_id: &UserId) -> Result<Vec<Transaction>> {
        let cf_by_user = self.cf(cf::TRANSACTIONS_BY_USER)?;
        let prefix = keys::user_transactions_prefix(user_id);

        let iter = self.db.iterator_cf(
            &cf_by_user,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        // ULID keys are time-ordered, so the prefix scan yields oldest first.
        let mut all_keys: Vec<Vec<u8>> = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            all_keys.push(key.to_vec());
        }
        all_keys.reverse();

        let mut transactions = Vec::with_capacity(all_keys.len());
        for key in all_keys {
            let tx_id = keys::extract_transaction_id_from_user_key(&key);
            if let Some(tx) = self.get_transaction(&tx_id)? {
                transactions.push(tx);
            }
        }

        Ok(transactions)
    }

    // =========================================================================
    // Compound Operations
    // =========================================================================

    fn transfer(
        &self,
        sender: &UserId,
        recipient: &UserId,
        transaction: &Transaction,
    ) -> Result<TransferOutcome> {
        let amount = transaction.amount_cents;
        let sender_account_id = AccountId::for_user(sender);
        let recipient_account_id = AccountId::for_user(recipient);

        // Serialize the read-check-write; the batch below makes the writes
        // atomic, the lock makes the balance check trustworthy.
        let _guard = self.lock_writes();

        let mut sender_account =
            self.load_account(&sender_account_id)?
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

        let mut recipient_account =
            self.load_account(&recipient_account_id)?
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
        sender_account.balance_cents -= amount;
        sender_account.updated_at = now;
        recipient_account.balance_cents += amount;
        recipient_account.updated_at = now;

        let cf_accounts = self.cf(cf::ACCOUNTS)?;
        let cf_tx = self.cf(cf::TRANSACTIONS)?;
        let cf_tx_by_user = self.cf(cf::TRANSACTIONS_BY_USER)?;

        let sender_value = Self::serialize(&sender_account)?;
        let recipient_value = Self::serialize(&recipient_account)?;
        let tx_value = Self::serialize(transaction)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_accounts, keys::account_key(&sender_account_id), &sender_value);
        batch.put_cf(
            &cf_accounts,
            keys::account_key(&recipient_account_id),
            &recipient_value,
        );
        batch.put_cf(&cf_tx, keys::transaction_key(&transaction.id), &tx_value);
        batch.put_cf(
            &cf_tx_by_user,
            keys::user_transaction_key(sender, &transaction.id),
            [],
        );
        batch.put_cf(
            &cf_tx_by_user,
            keys::user_transaction_key(recipient, &transaction.id),
            [],
        );

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(TransferOutcome {
            sender_balance_cents: sender_account.balance_cents,
            recipient_balance_cents: recipient_account.balance_cents,
        })
    }
}
