//! Email verification codes.
//!
//! Codes are short-lived, single-use, and live only in process memory: a
//! restart simply forces the user to request a new one. One entry exists per
//! email address; issuing a new code replaces the previous one.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use krona_core::normalize_email;

use crate::config::VerificationConfig;

/// Result of checking a submitted code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Code matched; the entry has been consumed.
    Verified,
    /// Code matched an expired entry; the entry has been purged.
    Expired,
    /// Code did not match the stored one.
    Mismatch,
    /// No code has been issued for this address.
    NoCode,
}

#[derive(Debug, Clone)]
struct CodeEntry {
    code: String,
    issued_at: DateTime<Utc>,
    attempts: u32,
}

/// In-memory verification-code registry.
pub struct VerificationCodes {
    entries: Mutex<HashMap<String, CodeEntry>>,
    config: VerificationConfig,
}

impl VerificationCodes {
    /// Create an empty registry with the given parameters.
    #[must_use]
    pub fn new(config: VerificationConfig) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Issue a fresh code for `email`, replacing any previous entry.
    pub fn issue(&self, email: &str) -> String {
        let email = normalize_email(email);
        let code = self.generate_code();
        let mut entries = self.lock();
        entries.insert(
            email,
            CodeEntry {
                code: code.clone(),
                issued_at: Utc::now(),
                attempts: 0,
            },
        );
        code
    }

    /// Re-issue a code for `email`, honoring the resend cooldown.
    ///
    /// Returns `None` when the previous code was issued too recently.
    pub fn reissue(&self, email: &str) -> Option<String> {
        let email = normalize_email(email);
        let cooldown = Duration::seconds(self.config.resend_cooldown_secs);
        let code = self.generate_code();
        let mut entries = self.lock();

        if let Some(entry) = entries.get(&email) {
            if Utc::now() - entry.issued_at < cooldown {
                return None;
            }
        }
        entries.insert(
            email,
            CodeEntry {
                code: code.clone(),
                issued_at: Utc::now(),
                attempts: 0,
            },
        );
        Some(code)
    }

    /// Check a submitted code for `email`.
    ///
    /// A match consumes the entry; so does expiry. A mismatch counts against
    /// the attempt budget, and exhausting it purges the entry so a stale code
    /// cannot be brute-forced.
    pub fn verify(&self, email: &str, submitted: &str) -> VerifyOutcome {
        let email = normalize_email(email);
        let ttl = Duration::seconds(self.config.code_ttl_secs);
        let mut entries = self.lock();

        let Some(entry) = entries.get_mut(&email) else {
            return VerifyOutcome::NoCode;
        };

        if Utc::now() - entry.issued_at > ttl {
            entries.remove(&email);
            return VerifyOutcome::Expired;
        }

        if entry.code != submitted {
            entry.attempts += 1;
            if entry.attempts >= self.config.max_attempts {
                entries.remove(&email);
            }
            return VerifyOutcome::Mismatch;
        }

        entries.remove(&email);
        VerifyOutcome::Verified
    }

    fn generate_code(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..self.config.code_length)
            .map(|_| char::from(b'0' + rng.gen_range(0..10)))
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CodeEntry>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> VerificationConfig {
        VerificationConfig {
            code_length: 6,
            code_ttl_secs: 600,
            resend_cooldown_secs: 60,
            max_attempts: 5,
        }
    }

    #[test]
    fn issued_code_verifies_once() {
        let codes = VerificationCodes::new(test_config());
        let code = codes.issue("alice@example.com");
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));

        assert_eq!(codes.verify("alice@example.com", &code), VerifyOutcome::Verified);
        // Consumed, a second attempt finds nothing.
        assert_eq!(codes.verify("alice@example.com", &code), VerifyOutcome::NoCode);
    }

    #[test]
    fn verification_is_email_case_insensitive() {
        let codes = VerificationCodes::new(test_config());
        let code = codes.issue("Alice@Example.COM");
        assert_eq!(codes.verify("alice@example.com", &code), VerifyOutcome::Verified);
    }

    #[test]
    fn mismatch_does_not_consume_until_attempts_exhausted() {
        let mut config = test_config();
        config.max_attempts = 3;
        let codes = VerificationCodes::new(config);
        let code = codes.issue("bob@example.com");

        assert_eq!(codes.verify("bob@example.com", "000000"), VerifyOutcome::Mismatch);
        assert_eq!(codes.verify("bob@example.com", "111111"), VerifyOutcome::Mismatch);
        // The real code still works before the budget runs out.
        let fresh = codes.issue("bob@example.com");
        assert_eq!(codes.verify("bob@example.com", &fresh), VerifyOutcome::Verified);

        let code2 = codes.issue("bob@example.com");
        for _ in 0..3 {
            assert_eq!(codes.verify("bob@example.com", "999999"), VerifyOutcome::Mismatch);
        }
        // Entry purged after the third wrong attempt.
        assert_eq!(codes.verify("bob@example.com", &code2), VerifyOutcome::NoCode);
        drop(code);
    }

    #[test]
    fn expired_entry_is_purged_on_check() {
        let mut config = test_config();
        config.code_ttl_secs = -1;
        let codes = VerificationCodes::new(config);
        let code = codes.issue("carol@example.com");

        assert_eq!(codes.verify("carol@example.com", &code), VerifyOutcome::Expired);
        assert_eq!(codes.verify("carol@example.com", &code), VerifyOutcome::NoCode);
    }

    #[test]
    fn reissue_respects_cooldown() {
        let codes = VerificationCodes::new(test_config());
        codes.issue("dave@example.com");
        assert!(codes.reissue("dave@example.com").is_none());

        let mut config = test_config();
        config.resend_cooldown_secs = 0;
        let codes = VerificationCodes::new(config);
        codes.issue("dave@example.com");
        let fresh = codes.reissue("dave@example.com");
        assert!(fresh.is_some());
        assert_eq!(
            codes.verify("dave@example.com", &fresh.unwrap()),
            VerifyOutcome::Verified
        );
    }

    #[test]
    fn reissue_without_prior_entry_issues_immediately() {
        let codes = VerificationCodes::new(test_config());
        let code = codes.reissue("erin@example.com");
        assert!(code.is_some());
    }

    #[test]
    fn new_issue_replaces_previous_code() {
        let mut config = test_config();
        config.resend_cooldown_secs = 0;
        let codes = VerificationCodes::new(config);
        let old = codes.issue("frank@example.com");
        let new = codes.issue("frank@example.com");

        if old != new {
            assert_eq!(codes.verify("frank@example.com", &old), VerifyOutcome::Mismatch);
        }
        assert_eq!(codes.verify("frank@example.com", &new), VerifyOutcome::Verified);
    }
}
