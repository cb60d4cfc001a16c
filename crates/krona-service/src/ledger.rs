//! Ledger engine.
//!
//! All balance-touching logic lives here: validation of transfer parameters,
//! recipient resolution, and delegation to the store's serialized transfer
//! step. Handlers never touch balances directly; they convert the domain
//! errors raised here into API responses.

use std::sync::Arc;

use krona_core::{Account, AccountId, BankError, Transaction, TransactionId, UserId};
use krona_store::{Store, StoreError};

use crate::config::BankingConfig;

/// Result of a completed transfer.
#[derive(Debug, Clone)]
pub struct TransferReceipt {
    /// The recorded transaction.
    pub transaction: Transaction,
    /// Sender balance after the debit, in cents.
    pub sender_balance_cents: i64,
}

/// One page of a user's transaction history.
#[derive(Debug, Clone)]
pub struct HistoryPage {
    /// Transactions on this page, newest first.
    pub transactions: Vec<Transaction>,
    /// 1-based page number.
    pub page: usize,
    /// Page size used.
    pub limit: usize,
    /// Total number of transactions involving the user.
    pub total: usize,
    /// Total number of pages at this page size.
    pub total_pages: usize,
}

/// Account overview: current balance plus the most recent activity.
#[derive(Debug, Clone)]
pub struct Overview {
    /// The user's account.
    pub account: Account,
    /// Most recent transactions, newest first.
    pub recent: Vec<Transaction>,
    /// Total number of transactions involving the user.
    pub transaction_count: usize,
}

/// The ledger engine.
pub struct Ledger {
    store: Arc<dyn Store>,
    config: BankingConfig,
}

fn store_err(err: StoreError) -> BankError {
    match err {
        StoreError::InsufficientFunds { balance, required } => {
            BankError::InsufficientFunds { balance, required }
        }
        StoreError::NotFound { id, .. } => BankError::AccountNotFound { user_id: id },
        StoreError::AccountFrozen { .. } => BankError::AccountFrozen,
        StoreError::DuplicateEmail { .. } => BankError::AlreadyExists,
        StoreError::Database(msg) | StoreError::Serialization(msg) => {
            BankError::Infrastructure(msg)
        }
    }
}

impl Ledger {
    /// Build a ledger over `store` with the configured limits.
    pub fn new(store: Arc<dyn Store>, config: BankingConfig) -> Self {
        Self { store, config }
    }

    /// Open an account for a new user with the configured opening balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub fn open_account(&self, user_id: &UserId) -> Result<Account, BankError> {
        let account = Account::open(user_id, self.config.opening_balance_cents);
        self.store.create_account(&account).map_err(store_err)?;
        tracing::info!(account_id = %account.account_id, "Opened account");
        Ok(account)
    }

    /// Fetch the account owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `BankError::AccountNotFound` if no account exists.
    pub fn account(&self, user_id: &UserId) -> Result<Account, BankError> {
        self.store
            .get_account(&AccountId::for_user(user_id))
            .map_err(store_err)?
            .ok_or_else(|| BankError::AccountNotFound {
                user_id: user_id.to_string(),
            })
    }

    /// Move funds from `sender` to the user owning `recipient_email`.
    ///
    /// Validates amount bounds and message length, resolves the recipient,
    /// rejects self-transfers, then hands the debit-credit-record step to the
    /// store as one serialized operation.
    ///
    /// # Errors
    ///
    /// - `BankError::InvalidAmount` for out-of-bounds amounts or messages.
    /// - `BankError::RecipientNotFound` if the email resolves to no user.
    /// - `BankError::InvalidRecipient` for self-transfers.
    /// - `BankError::InsufficientFunds` if the sender balance is too low.
    pub fn transfer(
        &self,
        sender: &UserId,
        recipient_email: &str,
        amount_cents: i64,
        message: Option<String>,
    ) -> Result<TransferReceipt, BankError> {
        if amount_cents < self.config.min_transfer_cents {
            return Err(BankError::InvalidAmount(format!(
                "amount must be at least {} cents",
                self.config.min_transfer_cents
            )));
        }
        if amount_cents > self.config.max_transfer_cents {
            return Err(BankError::InvalidAmount(format!(
                "amount must be at most {} cents",
                self.config.max_transfer_cents
            )));
        }
        if let Some(msg) = &message {
            if msg.chars().count() > self.config.message_max_chars {
                return Err(BankError::InvalidAmount(format!(
                    "message must be at most {} characters",
                    self.config.message_max_chars
                )));
            }
        }

        let recipient = self
            .store
            .find_user_by_email(recipient_email)
            .map_err(store_err)?
            .ok_or_else(|| BankError::RecipientNotFound {
                email: recipient_email.to_string(),
            })?;
        if recipient.id == *sender {
            return Err(BankError::InvalidRecipient(
                "cannot transfer funds to yourself".into(),
            ));
        }

        let transaction = Transaction::new(*sender, recipient.id, amount_cents, message);
        let outcome = self
            .store
            .transfer(sender, &recipient.id, &transaction)
            .map_err(store_err)?;

        tracing::info!(
            transaction_id = %transaction.id,
            amount_cents,
            "Transfer completed"
        );
        Ok(TransferReceipt {
            transaction,
            sender_balance_cents: outcome.sender_balance_cents,
        })
    }

    /// Fetch one page of the user's history, newest first.
    ///
    /// Pages are 1-based; a page past the end yields an empty list with the
    /// correct totals.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub fn history(
        &self,
        user_id: &UserId,
        page: usize,
        limit: Option<usize>,
    ) -> Result<HistoryPage, BankError> {
        let limit = limit.unwrap_or(self.config.transactions_per_page).max(1);
        let page = page.max(1);

        let all = self.store.transactions_for_user(user_id).map_err(store_err)?;
        let total = all.len();
        let total_pages = total.div_ceil(limit);
        // Saturate: an absurd page number is just an empty page, not a panic.
        let start = page.saturating_sub(1).saturating_mul(limit);
        let transactions = all.into_iter().skip(start).take(limit).collect();

        Ok(HistoryPage {
            transactions,
            page,
            limit,
            total,
            total_pages,
        })
    }

    /// Fetch a single transaction, visible only to its participants.
    ///
    /// # Errors
    ///
    /// - `BankError::TransactionNotFound` if no such record exists.
    /// - `BankError::NotParticipant` if the caller is neither side of it.
    pub fn transaction(
        &self,
        user_id: &UserId,
        transaction_id: &TransactionId,
    ) -> Result<Transaction, BankError> {
        let transaction = self
            .store
            .get_transaction(transaction_id)
            .map_err(store_err)?
            .ok_or_else(|| BankError::TransactionNotFound {
                transaction_id: transaction_id.to_string(),
            })?;
        if !transaction.involves(user_id) {
            return Err(BankError::NotParticipant);
        }
        Ok(transaction)
    }

    /// Balance plus the most recent activity, for the account landing view.
    ///
    /// # Errors
    ///
    /// Returns `BankError::AccountNotFound` if no account exists.
    pub fn overview(&self, user_id: &UserId) -> Result<Overview, BankError> {
        let account = self.account(user_id)?;
        let all = self.store.transactions_for_user(user_id).map_err(store_err)?;
        let transaction_count = all.len();
        let recent = all
            .into_iter()
            .take(self.config.transactions_per_page)
            .collect();
        Ok(Overview {
            account,
            recent,
            transaction_count,
        })
    }
}
