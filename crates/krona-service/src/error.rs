//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use krona_core::BankError;
use krona_store::StoreError;

use crate::auth::tokens::TokenError;

/// API error type.
///
/// Every variant maps to a stable, machine-checkable error code; domain errors
/// are terminal for the request and never retried. `Internal` is the only
/// retryable kind and hides its detail from the client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Insufficient funds for the transfer.
    #[error("insufficient funds: balance={balance}, required={required}")]
    InsufficientFunds {
        /// Current balance.
        balance: i64,
        /// Required amount.
        required: i64,
    },

    /// Transfer amount or message outside the configured bounds.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Invalid transfer target.
    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),

    /// Duplicate email at signup.
    #[error("conflict: {0}")]
    AlreadyExists(String),

    /// Login blocked pending email verification.
    #[error("email not verified")]
    Unverified,

    /// Wrong email or password.
    #[error("wrong email and/or password")]
    InvalidCredential,

    /// Access token past its expiry.
    #[error("token expired")]
    TokenExpired,

    /// Missing, malformed, or badly signed token.
    #[error("invalid token")]
    TokenInvalid,

    /// No persisted refresh token; the caller must re-authenticate.
    #[error("no refresh token")]
    NoRefreshToken,

    /// Verification code past its expiry.
    #[error("verification code expired")]
    CodeExpired,

    /// Verification code absent or mismatched.
    #[error("invalid verification code")]
    CodeMismatch,

    /// Resend requested inside the cooldown window.
    #[error("please wait before requesting another code")]
    ResendThrottled,

    /// Either side of the transfer is frozen.
    #[error("account is frozen")]
    AccountFrozen,

    /// Valid credentials but not a participant of the resource.
    #[error("forbidden")]
    Forbidden,

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Internal server error (storage/transport failure).
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::InsufficientFunds { balance, required } => (
                StatusCode::BAD_REQUEST,
                "insufficient_funds",
                self.to_string(),
                Some(serde_json::json!({
                    "balance": balance,
                    "required": required
                })),
            ),
            Self::InvalidAmount(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_amount", msg.clone(), None)
            }
            Self::InvalidRecipient(msg) => (
                StatusCode::BAD_REQUEST,
                "invalid_recipient",
                msg.clone(),
                None,
            ),
            Self::AlreadyExists(msg) => (StatusCode::CONFLICT, "already_exists", msg.clone(), None),
            Self::Unverified => (StatusCode::FORBIDDEN, "unverified", self.to_string(), None),
            Self::InvalidCredential => (
                StatusCode::UNAUTHORIZED,
                "invalid_credential",
                self.to_string(),
                None,
            ),
            Self::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "token_expired",
                self.to_string(),
                None,
            ),
            Self::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                "token_invalid",
                self.to_string(),
                None,
            ),
            Self::NoRefreshToken => (
                StatusCode::UNAUTHORIZED,
                "no_refresh_token",
                self.to_string(),
                None,
            ),
            Self::CodeExpired => (
                StatusCode::BAD_REQUEST,
                "code_expired",
                self.to_string(),
                None,
            ),
            Self::CodeMismatch => (
                StatusCode::BAD_REQUEST,
                "code_mismatch",
                self.to_string(),
                None,
            ),
            Self::ResendThrottled => (
                StatusCode::TOO_MANY_REQUESTS,
                "resend_throttled",
                self.to_string(),
                None,
            ),
            Self::AccountFrozen => (
                StatusCode::FORBIDDEN,
                "account_frozen",
                self.to_string(),
                None,
            ),
            Self::Forbidden => (StatusCode::FORBIDDEN, "forbidden", self.to_string(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound(format!("{entity} not found: {id}")),
            StoreError::InsufficientFunds { balance, required } => {
                Self::InsufficientFunds { balance, required }
            }
            StoreError::AccountFrozen { .. } => Self::AccountFrozen,
            StoreError::DuplicateEmail { .. } => {
                Self::AlreadyExists("Email already associated with an existing account".into())
            }
            StoreError::Database(msg) | StoreError::Serialization(msg) => Self::Internal(msg),
        }
    }
}

impl From<BankError> for ApiError {
    fn from(err: BankError) -> Self {
        match err {
            BankError::AccountNotFound { user_id } => {
                Self::NotFound(format!("account not found: {user_id}"))
            }
            BankError::RecipientNotFound { .. } => Self::NotFound("Recipient not found".into()),
            BankError::TransactionNotFound { transaction_id } => {
                Self::NotFound(format!("transaction not found: {transaction_id}"))
            }
            BankError::InsufficientFunds { balance, required } => {
                Self::InsufficientFunds { balance, required }
            }
            BankError::InvalidAmount(msg) => Self::InvalidAmount(msg),
            BankError::InvalidRecipient(msg) => Self::InvalidRecipient(msg),
            BankError::AlreadyExists => {
                Self::AlreadyExists("Email already associated with an existing account".into())
            }
            BankError::Unverified => Self::Unverified,
            BankError::InvalidCredential => Self::InvalidCredential,
            BankError::AccountFrozen => Self::AccountFrozen,
            BankError::NotParticipant => Self::Forbidden,
            BankError::InvalidId(err) => Self::BadRequest(err.to_string()),
            BankError::Infrastructure(msg) => Self::Internal(msg),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => Self::TokenExpired,
            TokenError::Invalid => Self::TokenInvalid,
            TokenError::NoRefreshToken => Self::NoRefreshToken,
        }
    }
}
