//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::auth::require_session;
use crate::handlers::{account, auth, health, profile, transfers, verification};
use crate::state::AppState;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - `POST /v1/auth/signup` - Register a new user
/// - `POST /v1/auth/login` - Authenticate and open a session
/// - `POST /v1/verification/send` - Send a verification code (cooldown applies)
/// - `POST /v1/verification/resend` - Re-send a code (cooldown applies)
/// - `POST /v1/verification/verify` - Submit a code
/// - `GET /v1/verification/status` - Verification state of an address
///
/// ## Authenticated (bearer access token)
/// - `POST /v1/auth/logout` - Close the session
/// - `GET /v1/account` - Balance and recent activity
/// - `GET /v1/account/info` - Profile
/// - `PUT /v1/account/info` - Update profile
/// - `PUT /v1/account/password` - Change password
/// - `POST /v1/transactions` - Execute a transfer
/// - `GET /v1/transactions` - Paginated history
/// - `GET /v1/transactions/:id` - Single transaction
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout = state.config.request_timeout();
    let max_concurrency = state.config.max_concurrency;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let guarded = Router::new()
        .route("/v1/auth/logout", post(auth::logout))
        .route("/v1/account", get(account::get_overview))
        .route(
            "/v1/account/info",
            get(profile::get_profile).put(profile::update_profile),
        )
        .route("/v1/account/password", put(profile::change_password))
        .route(
            "/v1/transactions",
            post(transfers::create_transfer).get(transfers::list_transactions),
        )
        .route("/v1/transactions/:id", get(transfers::get_transaction))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            require_session,
        ));

    Router::new()
        // Health (public)
        .route("/health", get(health::health))
        // Auth
        .route("/v1/auth/signup", post(auth::signup))
        .route("/v1/auth/login", post(auth::login))
        // Verification
        .route("/v1/verification/send", post(verification::send_code))
        .route("/v1/verification/resend", post(verification::resend_code))
        .route("/v1/verification/verify", post(verification::verify_code))
        .route(
            "/v1/verification/status",
            get(verification::verification_status),
        )
        .merge(guarded)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(ConcurrencyLimitLayer::new(max_concurrency))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
