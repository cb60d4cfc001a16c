//! Account overview handler.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::auth::Session;
use crate::error::ApiError;
use crate::handlers::transfers::TransactionResponse;
use crate::state::AppState;

/// Account overview response.
#[derive(Debug, Serialize)]
pub struct OverviewResponse {
    /// Derived account id.
    pub account_id: String,
    /// Balance in cents.
    pub balance_cents: i64,
    /// Balance formatted as a decimal amount.
    pub balance_formatted: String,
    /// Account status.
    pub status: String,
    /// Total number of transactions involving the caller.
    pub transaction_count: usize,
    /// Most recent transactions, newest first.
    pub recent_transactions: Vec<TransactionResponse>,
}

/// Get the caller's balance and recent activity.
pub async fn get_overview(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<OverviewResponse>, ApiError> {
    let overview = state.ledger.overview(&session.user_id)?;

    Ok(Json(OverviewResponse {
        account_id: overview.account.account_id.to_string(),
        balance_cents: overview.account.balance_cents,
        balance_formatted: format!("{:.2}", overview.account.balance_cents as f64 / 100.0),
        status: format!("{:?}", overview.account.status).to_lowercase(),
        transaction_count: overview.transaction_count,
        recent_transactions: overview
            .recent
            .iter()
            .map(|tx| TransactionResponse::for_viewer(tx, &session.user_id))
            .collect(),
    }))
}
