//! User identity records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// Normalize an email address for storage and lookup.
///
/// Emails are unique case-insensitively; every store operation works on the
/// lowercased form.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A registered user.
///
/// Users are created unverified at signup. The `verified` flag flips from
/// false to true exactly once. The refresh-token slot is set at login, cleared
/// at logout, and overwritten by re-login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user id.
    pub id: UserId,

    /// Email address (stored lowercased, unique).
    pub email: String,

    /// Argon2 password hash in PHC string format.
    pub password_hash: String,

    /// First name.
    pub first_name: String,

    /// Last name.
    pub last_name: String,

    /// Date of birth.
    pub birthdate: NaiveDate,

    /// Phone number.
    pub phone: String,

    /// Whether the email address has been verified.
    pub verified: bool,

    /// Currently persisted refresh token, if the user has an open session.
    pub refresh_token: Option<String>,

    /// When the user was created.
    pub created_at: DateTime<Utc>,

    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new, unverified user.
    #[must_use]
    pub fn new(
        email: &str,
        password_hash: String,
        first_name: String,
        last_name: String,
        birthdate: NaiveDate,
        phone: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::generate(),
            email: normalize_email(email),
            password_hash,
            first_name,
            last_name,
            birthdate,
            phone,
            verified: false,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A partial update to a user record.
///
/// Only the populated fields are written; `refresh_token` uses a double
/// `Option` so that `Some(None)` clears the slot (logout) while `None` leaves
/// it untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    /// New first name.
    pub first_name: Option<String>,

    /// New last name.
    pub last_name: Option<String>,

    /// New date of birth.
    pub birthdate: Option<NaiveDate>,

    /// New phone number.
    pub phone: Option<String>,

    /// New password hash.
    pub password_hash: Option<String>,

    /// Set the verified flag.
    pub verified: Option<bool>,

    /// Set (`Some(Some(_))`) or clear (`Some(None)`) the refresh token.
    pub refresh_token: Option<Option<String>>,
}

impl UserUpdate {
    /// An update that persists a refresh token.
    #[must_use]
    pub fn set_refresh_token(token: String) -> Self {
        Self {
            refresh_token: Some(Some(token)),
            ..Self::default()
        }
    }

    /// An update that clears the refresh token (logout).
    #[must_use]
    pub fn clear_refresh_token() -> Self {
        Self {
            refresh_token: Some(None),
            ..Self::default()
        }
    }

    /// An update that marks the user as verified.
    #[must_use]
    pub fn mark_verified() -> Self {
        Self {
            verified: Some(true),
            ..Self::default()
        }
    }

    /// Apply this update to a user record, bumping `updated_at`.
    pub fn apply(self, user: &mut User) {
        if let Some(first_name) = self.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            user.last_name = last_name;
        }
        if let Some(birthdate) = self.birthdate {
            user.birthdate = birthdate;
        }
        if let Some(phone) = self.phone {
            user.phone = phone;
        }
        if let Some(password_hash) = self.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(verified) = self.verified {
            user.verified = verified;
        }
        if let Some(refresh_token) = self.refresh_token {
            user.refresh_token = refresh_token;
        }
        user.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User::new(
            "Alice@Example.com",
            "$argon2id$stub".into(),
            "Alice".into(),
            "Smith".into(),
            NaiveDate::from_ymd_opt(1990, 4, 2).unwrap(),
            "+4670000000".into(),
        )
    }

    #[test]
    fn new_user_is_unverified_with_normalized_email() {
        let user = sample_user();
        assert!(!user.verified);
        assert!(user.refresh_token.is_none());
        assert_eq!(user.email, "alice@example.com");
    }

    #[test]
    fn update_sets_and_clears_refresh_token() {
        let mut user = sample_user();

        UserUpdate::set_refresh_token("tok".into()).apply(&mut user);
        assert_eq!(user.refresh_token.as_deref(), Some("tok"));

        UserUpdate::clear_refresh_token().apply(&mut user);
        assert!(user.refresh_token.is_none());
    }

    #[test]
    fn update_leaves_untouched_fields_alone() {
        let mut user = sample_user();
        UserUpdate {
            phone: Some("+4671111111".into()),
            ..UserUpdate::default()
        }
        .apply(&mut user);

        assert_eq!(user.phone, "+4671111111");
        assert_eq!(user.first_name, "Alice");
        assert!(!user.verified);
    }

    #[test]
    fn mark_verified_flips_flag() {
        let mut user = sample_user();
        UserUpdate::mark_verified().apply(&mut user);
        assert!(user.verified);
    }
}
