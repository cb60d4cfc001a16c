//! Outbound email delivery.

use async_trait::async_trait;

use crate::error::ApiError;

/// Delivery seam for verification emails.
///
/// The service only ever sends one kind of message. Swapping in a real
/// provider means implementing this trait and wiring it into `AppState`.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a verification code to `email`.
    async fn send_verification_code(&self, email: &str, code: &str) -> Result<(), ApiError>;
}

/// A mailer that writes codes to the log instead of sending email.
///
/// Default in development and tests; the code is picked up from the log (or,
/// in tests, from the handler response).
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_verification_code(&self, email: &str, code: &str) -> Result<(), ApiError> {
        tracing::info!(email = %email, code = %code, "Verification code issued");
        Ok(())
    }
}
