//! Authentication middleware and session extraction.
//!
//! Guarded routes run behind [`require_session`], which validates the bearer
//! access token and, when it has merely expired, attempts a single silent
//! renewal backed by the user's persisted refresh token. A renewed access
//! token is handed back to the client in the `x-access-token` response header.

pub mod tokens;

use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;

use krona_core::UserId;

use crate::auth::tokens::TokenError;
use crate::error::ApiError;
use crate::state::AppState;

/// Response header carrying a silently renewed access token.
pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";

/// The authenticated caller, inserted into request extensions by
/// [`require_session`].
#[derive(Debug, Clone)]
pub struct Session {
    /// The caller's user ID.
    pub user_id: UserId,
    /// Email from the token claims.
    pub email: String,
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(ApiError::TokenInvalid)
    }
}

/// Middleware guarding authenticated routes.
///
/// An expired access token triggers exactly one renewal attempt; any other
/// failure is terminal for the request.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&request)?.to_string();

    match state.tokens.verify(&token) {
        Ok(claims) => {
            let session = Session {
                user_id: claims.user_id()?,
                email: claims.email,
            };
            request.extensions_mut().insert(session);
            Ok(next.run(request).await)
        }
        Err(TokenError::Expired) => {
            let claims = state.tokens.decode_expired(&token)?;
            let user_id = claims.user_id()?;
            let user = state
                .store
                .get_user(&user_id)
                .map_err(ApiError::from)?
                .ok_or(ApiError::TokenInvalid)?;
            let renewed = state.tokens.renew_access_token(&user)?;
            tracing::debug!(user_id = %user_id, "Renewed expired access token");

            let session = Session {
                user_id,
                email: user.email,
            };
            request.extensions_mut().insert(session);
            let mut response = next.run(request).await;
            if let Ok(value) = HeaderValue::from_str(&renewed) {
                response.headers_mut().insert(ACCESS_TOKEN_HEADER, value);
            }
            Ok(response)
        }
        Err(err) => Err(err.into()),
    }
}

fn bearer_token(request: &Request) -> Result<&str, ApiError> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::TokenInvalid)
}
