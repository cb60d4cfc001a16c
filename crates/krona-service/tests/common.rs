//! Common test utilities for krona integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum_test::TestServer;
use serde_json::json;

use krona_service::email::Mailer;
use krona_service::{create_router, ApiError, AppState, ServiceConfig};
use krona_store::MemoryStore;

/// A mailer that records the last code sent to each address.
pub struct CaptureMailer {
    codes: Mutex<HashMap<String, String>>,
}

impl CaptureMailer {
    pub fn new() -> Self {
        Self {
            codes: Mutex::new(HashMap::new()),
        }
    }

    /// The most recent code sent to `email`, if any.
    pub fn last_code(&self, email: &str) -> Option<String> {
        self.codes.lock().unwrap().get(email).cloned()
    }
}

#[async_trait]
impl Mailer for CaptureMailer {
    async fn send_verification_code(&self, email: &str, code: &str) -> Result<(), ApiError> {
        self.codes
            .lock()
            .unwrap()
            .insert(email.to_string(), code.to_string());
        Ok(())
    }
}

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Captured verification codes.
    pub mailer: Arc<CaptureMailer>,
}

impl TestHarness {
    /// Create a new harness over a fresh in-memory store.
    pub fn new() -> Self {
        Self::with_config(Self::test_config())
    }

    /// Create a harness with a customized config.
    pub fn with_config(config: ServiceConfig) -> Self {
        let mailer = Arc::new(CaptureMailer::new());
        let state = AppState::with_store(
            config,
            Arc::new(MemoryStore::new()),
            Arc::clone(&mailer) as Arc<dyn Mailer>,
        );
        let router: Router = create_router(state);
        let server = TestServer::new(router).expect("Failed to create test server");

        Self { server, mailer }
    }

    /// Baseline config for tests: memory backend, fixed secret, no cooldown
    /// on resends so tests don't have to sleep.
    pub fn test_config() -> ServiceConfig {
        let mut config = ServiceConfig::default();
        config.jwt.secret = "integration-test-secret".into();
        config.verification.resend_cooldown_secs = 0;
        config
    }

    /// Sign up a user with standard profile fields.
    pub async fn signup(&self, email: &str, password: &str) {
        let response = self
            .server
            .post("/v1/auth/signup")
            .json(&json!({
                "email": email,
                "password": password,
                "first_name": "Test",
                "last_name": "User",
                "birthdate": "1990-01-01",
                "phone": "+46700000000",
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
    }

    /// Verify the user's email using the captured code.
    pub async fn verify(&self, email: &str) {
        let code = self
            .mailer
            .last_code(email)
            .expect("no verification code was captured");
        let response = self
            .server
            .post("/v1/verification/verify")
            .json(&json!({ "email": email, "code": code }))
            .await;
        response.assert_status_ok();
    }

    /// Log in, returning (access token, refresh token).
    pub async fn login(&self, email: &str, password: &str) -> (String, String) {
        let response = self
            .server
            .post("/v1/auth/login")
            .json(&json!({ "email": email, "password": password }))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        (
            body["access_token"].as_str().unwrap().to_string(),
            body["refresh_token"].as_str().unwrap().to_string(),
        )
    }

    /// Sign up, verify, and log in a user, returning the access token.
    pub async fn onboard(&self, email: &str) -> String {
        self.signup(email, "correct-horse-battery").await;
        self.verify(email).await;
        let (access, _) = self.login(email, "correct-horse-battery").await;
        access
    }

    /// Bearer header value for a token.
    pub fn bearer(token: &str) -> String {
        format!("Bearer {token}")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
