//! Profile handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use krona_core::{User, UserUpdate};

use crate::auth::Session;
use crate::error::ApiError;
use crate::password::{hash_password, verify_password};
use crate::state::AppState;

/// Profile response.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    /// User id.
    pub user_id: String,
    /// Email address.
    pub email: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Date of birth.
    pub birthdate: NaiveDate,
    /// Phone number.
    pub phone: String,
    /// Whether the email is verified.
    pub verified: bool,
    /// Registration timestamp (RFC 3339).
    pub created_at: String,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id.to_string(),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            birthdate: user.birthdate,
            phone: user.phone,
            verified: user.verified,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Get the caller's profile.
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = state
        .store
        .get_user(&session.user_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(user.into()))
}

/// Profile update request. Absent fields are left untouched.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    /// New first name.
    pub first_name: Option<String>,
    /// New last name.
    pub last_name: Option<String>,
    /// New date of birth.
    pub birthdate: Option<NaiveDate>,
    /// New phone number.
    pub phone: Option<String>,
}

/// Update the caller's profile fields.
///
/// Email is not editable: it anchors the verification state and the account
/// lookup for incoming transfers.
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    if matches!(&req.first_name, Some(name) if name.trim().is_empty())
        || matches!(&req.last_name, Some(name) if name.trim().is_empty())
    {
        return Err(ApiError::BadRequest("name must not be empty".into()));
    }

    let update = UserUpdate {
        first_name: req.first_name,
        last_name: req.last_name,
        birthdate: req.birthdate,
        phone: req.phone,
        ..UserUpdate::default()
    };
    let user = state
        .store
        .update_user(&session.user_id, update)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(user.into()))
}

/// Password change request.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    /// Current password, re-checked before the change.
    pub current_password: String,
    /// New password.
    pub new_password: String,
}

/// Password change response.
#[derive(Debug, Serialize)]
pub struct ChangePasswordResponse {
    /// Always "ok".
    pub status: String,
}

/// Change the caller's password.
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<ChangePasswordResponse>, ApiError> {
    let user = state
        .store
        .get_user(&session.user_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    if !verify_password(&req.current_password, &user.password_hash)? {
        return Err(ApiError::InvalidCredential);
    }
    if req.new_password.chars().count() < 8 {
        return Err(ApiError::BadRequest(
            "password must be at least 8 characters".into(),
        ));
    }

    let update = UserUpdate {
        password_hash: Some(hash_password(&req.new_password)?),
        ..UserUpdate::default()
    };
    state
        .store
        .update_user(&session.user_id, update)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    tracing::info!(user_id = %session.user_id, "Password changed");
    Ok(Json(ChangePasswordResponse {
        status: "ok".into(),
    }))
}
