//! Email verification handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use krona_core::{User, UserUpdate};

use crate::error::ApiError;
use crate::state::AppState;
use crate::verification::VerifyOutcome;

/// Request carrying just an email address.
#[derive(Debug, Deserialize)]
pub struct SendCodeRequest {
    /// Email address to verify.
    pub email: String,
}

/// Response after a code was sent.
#[derive(Debug, Serialize)]
pub struct SendCodeResponse {
    /// Always "sent".
    pub status: String,
}

/// Send a verification code to an unverified user.
///
/// Every issuance passes the cooldown gate, including the first request
/// after signup (signup itself already sent a code).
pub async fn send_code(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendCodeRequest>,
) -> Result<Json<SendCodeResponse>, ApiError> {
    issue_gated(&state, &req.email).await
}

/// Re-send a verification code, honoring the cooldown.
pub async fn resend_code(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendCodeRequest>,
) -> Result<Json<SendCodeResponse>, ApiError> {
    issue_gated(&state, &req.email).await
}

async fn issue_gated(state: &AppState, email: &str) -> Result<Json<SendCodeResponse>, ApiError> {
    let user = lookup_unverified(state, email)?;
    let code = state
        .verification
        .reissue(&user.email)
        .ok_or(ApiError::ResendThrottled)?;
    state.mailer.send_verification_code(&user.email, &code).await?;
    Ok(Json(SendCodeResponse {
        status: "sent".into(),
    }))
}

/// Code submission request.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    /// Email address being verified.
    pub email: String,
    /// The submitted code.
    pub code: String,
}

/// Response after successful verification.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    /// Always "verified".
    pub status: String,
}

/// Check a submitted code and mark the user verified on a match.
pub async fn verify_code(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let user = lookup_unverified(&state, &req.email)?;

    match state.verification.verify(&user.email, &req.code) {
        VerifyOutcome::Verified => {
            state
                .store
                .update_user(&user.id, UserUpdate::mark_verified())?
                .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
            tracing::info!(user_id = %user.id, "Email verified");
            Ok(Json(VerifyResponse {
                status: "verified".into(),
            }))
        }
        VerifyOutcome::Expired => Err(ApiError::CodeExpired),
        VerifyOutcome::Mismatch | VerifyOutcome::NoCode => Err(ApiError::CodeMismatch),
    }
}

/// Status query parameters.
#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    /// Email address to look up.
    pub email: String,
}

/// Verification status of an address.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Normalized email address.
    pub email: String,
    /// Whether the address has been verified.
    pub verified: bool,
}

/// Report whether an email address has been verified.
///
/// Clients poll this after signup to learn when the code was accepted.
pub async fn verification_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<StatusResponse>, ApiError> {
    let user = state
        .store
        .find_user_by_email(&query.email)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(StatusResponse {
        email: user.email,
        verified: user.verified,
    }))
}

fn lookup_unverified(state: &AppState, email: &str) -> Result<User, ApiError> {
    let user = state
        .store
        .find_user_by_email(email)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    if user.verified {
        return Err(ApiError::BadRequest("email is already verified".into()));
    }
    Ok(user)
}
