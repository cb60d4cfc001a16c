//! Funds transfer and history handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use krona_core::{Transaction, TransactionId, UserId};

use crate::auth::Session;
use crate::error::ApiError;
use crate::state::AppState;

/// Transfer request.
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    /// Recipient's email address.
    pub recipient_email: String,
    /// Amount in cents.
    pub amount_cents: i64,
    /// Optional message for the recipient.
    pub message: Option<String>,
}

/// Transaction as seen by one of its participants.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction id.
    pub id: String,
    /// Amount in cents.
    pub amount_cents: i64,
    /// Whether the viewer received the funds.
    pub is_incoming: bool,
    /// Sender user id.
    pub sender: String,
    /// Recipient user id.
    pub recipient: String,
    /// Optional message.
    pub message: Option<String>,
    /// Timestamp (RFC 3339).
    pub created_at: String,
}

impl TransactionResponse {
    /// Shape a transaction for the given viewer.
    #[must_use]
    pub fn for_viewer(tx: &Transaction, viewer: &UserId) -> Self {
        Self {
            id: tx.id.to_string(),
            amount_cents: tx.amount_cents,
            is_incoming: tx.is_incoming_for(viewer),
            sender: tx.sender.to_string(),
            recipient: tx.recipient.to_string(),
            message: tx.message.clone(),
            created_at: tx.created_at.to_rfc3339(),
        }
    }
}

/// Transfer response.
#[derive(Debug, Serialize)]
pub struct TransferResponse {
    /// The recorded transaction.
    pub transaction: TransactionResponse,
    /// Sender balance after the debit, in cents.
    pub balance_after_cents: i64,
}

/// Execute a funds transfer to another user.
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(req): Json<TransferRequest>,
) -> Result<(StatusCode, Json<TransferResponse>), ApiError> {
    let receipt = state.ledger.transfer(
        &session.user_id,
        &req.recipient_email,
        req.amount_cents,
        req.message,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(TransferResponse {
            transaction: TransactionResponse::for_viewer(&receipt.transaction, &session.user_id),
            balance_after_cents: receipt.sender_balance_cents,
        }),
    ))
}

/// History query parameters.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// 1-based page number (default: 1).
    #[serde(default = "default_page")]
    pub page: usize,
    /// Page size (default: configured per-page size).
    pub limit: Option<usize>,
}

fn default_page() -> usize {
    1
}

/// History response.
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    /// Transactions on this page, newest first.
    pub transactions: Vec<TransactionResponse>,
    /// 1-based page number.
    pub page: usize,
    /// Page size used.
    pub limit: usize,
    /// Total number of transactions involving the caller.
    pub total: usize,
    /// Total number of pages at this page size.
    pub total_pages: usize,
}

/// List the caller's transaction history, newest first.
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let limit = query.limit.map(|l| l.min(100));
    let page = state.ledger.history(&session.user_id, query.page, limit)?;

    Ok(Json(HistoryResponse {
        transactions: page
            .transactions
            .iter()
            .map(|tx| TransactionResponse::for_viewer(tx, &session.user_id))
            .collect(),
        page: page.page,
        limit: page.limit,
        total: page.total,
        total_pages: page.total_pages,
    }))
}

/// Get a single transaction by id. Participants only.
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let transaction_id: TransactionId = id
        .parse()
        .map_err(|_| ApiError::NotFound("Transaction not found".into()))?;
    let transaction = state.ledger.transaction(&session.user_id, &transaction_id)?;
    Ok(Json(TransactionResponse::for_viewer(
        &transaction,
        &session.user_id,
    )))
}
