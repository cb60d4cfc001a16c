//! Signup, login, and logout handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use krona_core::{normalize_email, User, UserUpdate};

use crate::auth::Session;
use crate::error::ApiError;
use crate::password::{hash_password, verify_password};
use crate::state::AppState;

const MIN_PASSWORD_CHARS: usize = 8;

/// Signup request.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    /// Email address.
    pub email: String,
    /// Plaintext password.
    pub password: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Date of birth (ISO 8601).
    pub birthdate: NaiveDate,
    /// Phone number.
    pub phone: String,
}

/// Signup response.
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    /// Assigned user id.
    pub user_id: String,
    /// Derived account id.
    pub account_id: String,
    /// Normalized email the verification code was sent to.
    pub email: String,
}

/// Register a new user.
///
/// Creates the user record and its account with the configured opening
/// balance, then sends a verification code. Login stays blocked until the
/// email is verified.
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), ApiError> {
    let email = normalize_email(&req.email);
    if !email.contains('@') {
        return Err(ApiError::BadRequest("invalid email address".into()));
    }
    if req.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ApiError::BadRequest(format!(
            "password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }
    if req.first_name.trim().is_empty() || req.last_name.trim().is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".into()));
    }

    let password_hash = hash_password(&req.password)?;
    let user = User::new(
        &email,
        password_hash,
        req.first_name.trim().to_string(),
        req.last_name.trim().to_string(),
        req.birthdate,
        req.phone.trim().to_string(),
    );

    state.store.create_user(&user)?;
    let account = state.ledger.open_account(&user.id)?;

    let code = state.verification.issue(&user.email);
    state.mailer.send_verification_code(&user.email, &code).await?;

    tracing::info!(user_id = %user.id, "User signed up");
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            user_id: user.id.to_string(),
            account_id: account.account_id.to_string(),
            email: user.email,
        }),
    ))
}

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email address.
    pub email: String,
    /// Plaintext password.
    pub password: String,
}

/// Login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Short-lived access token.
    pub access_token: String,
    /// Long-lived refresh token.
    pub refresh_token: String,
    /// The authenticated user.
    pub user: UserSummary,
}

/// Public subset of a user record.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    /// User id.
    pub user_id: String,
    /// Email address.
    pub email: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
}

/// Authenticate and open a session.
///
/// Wrong email and wrong password are indistinguishable to the caller. An
/// unverified user gets a distinct error so the client can prompt for the
/// code. The refresh token is persisted, overwriting any previous session.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .store
        .find_user_by_email(&req.email)?
        .ok_or(ApiError::InvalidCredential)?;

    if !verify_password(&req.password, &user.password_hash)? {
        return Err(ApiError::InvalidCredential);
    }
    if !user.verified {
        return Err(ApiError::Unverified);
    }

    let pair = state.tokens.issue_pair(&user)?;
    state
        .store
        .update_user(&user.id, UserUpdate::set_refresh_token(pair.refresh_token.clone()))?
        .ok_or(ApiError::InvalidCredential)?;

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Json(LoginResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        user: UserSummary {
            user_id: user.id.to_string(),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
        },
    }))
}

/// Logout response.
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    /// Always "ok".
    pub status: String,
}

/// Close the session by clearing the persisted refresh token.
///
/// Outstanding access tokens keep working until their natural expiry, but no
/// further silent renewal is possible.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<LogoutResponse>, ApiError> {
    state
        .store
        .update_user(&session.user_id, UserUpdate::clear_refresh_token())?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    tracing::info!(user_id = %session.user_id, "User logged out");
    Ok(Json(LogoutResponse {
        status: "ok".into(),
    }))
}
