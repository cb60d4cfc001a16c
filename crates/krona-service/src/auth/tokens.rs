//! JWT issuance and verification.
//!
//! Two token kinds share one HMAC secret and are distinguished by lifetime:
//! short-lived access tokens carried on every request, and long-lived refresh
//! tokens persisted server-side on the user record. Renewal re-checks the
//! persisted refresh token so a logout invalidates outstanding sessions.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use krona_core::{User, UserId};

use crate::config::JwtConfig;

/// Token verification failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Signature valid but the token is past its expiry.
    #[error("token expired")]
    Expired,

    /// Malformed token, bad signature, or wrong issuer/audience.
    #[error("invalid token")]
    Invalid,

    /// The user has no persisted refresh token (logged out or never issued).
    #[error("no refresh token")]
    NoRefreshToken,
}

/// Claims carried by both access and refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: String,
    /// User email at issuance time.
    pub email: String,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expiration time (unix seconds).
    pub exp: i64,
    /// Issuer.
    pub iss: String,
    /// Audience.
    pub aud: String,
}

impl Claims {
    /// Parse the subject claim back into a [`UserId`].
    pub fn user_id(&self) -> Result<UserId, TokenError> {
        self.sub.parse().map_err(|_| TokenError::Invalid)
    }
}

/// An access/refresh token pair as returned at login.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    /// Short-lived access token.
    pub access_token: String,
    /// Long-lived refresh token, also persisted on the user record.
    pub refresh_token: String,
}

/// Signs and verifies JWTs for the service.
pub struct TokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    config: JwtConfig,
}

impl TokenManager {
    /// Build a manager from the JWT section of the service config.
    #[must_use]
    pub fn new(config: JwtConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            config,
        }
    }

    /// Issue a fresh access/refresh pair for `user`.
    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.sign(user, self.config.access_ttl_secs)?,
            refresh_token: self.sign(user, self.config.refresh_ttl_secs)?,
        })
    }

    /// Issue a standalone access token for `user`.
    pub fn issue_access_token(&self, user: &User) -> Result<String, TokenError> {
        self.sign(user, self.config.access_ttl_secs)
    }

    fn sign(&self, user: &User, ttl_secs: i64) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            iat: now,
            exp: now + ttl_secs,
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|_| TokenError::Invalid)
    }

    /// Verify a token's signature, expiry, issuer, and audience.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation(true))
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })?;
        Ok(data.claims)
    }

    /// Verify everything about a token except its expiry.
    ///
    /// Used during silent renewal: the expired access token must still carry a
    /// valid signature before the refresh path is consulted.
    pub fn decode_expired(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation(false))
            .map_err(|_| TokenError::Invalid)?;
        Ok(data.claims)
    }

    /// Mint a replacement access token for a user whose access token expired.
    ///
    /// Requires a persisted refresh token that still verifies. The refresh
    /// token itself is not rotated here.
    pub fn renew_access_token(&self, user: &User) -> Result<String, TokenError> {
        let refresh = user
            .refresh_token
            .as_deref()
            .ok_or(TokenError::NoRefreshToken)?;
        let claims = self.verify(refresh)?;
        if claims.sub != user.id.to_string() {
            return Err(TokenError::Invalid);
        }
        self.issue_access_token(user)
    }

    fn validation(&self, check_exp: bool) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);
        validation.validate_exp = check_exp;
        validation.leeway = 0;
        validation
    }
}
