//! Router configuration module
//!
//! Configures all routes, middleware layers, and creates the application router.

use std::time::Duration;

use axum::{
    http::{header, Method, StatusCode},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::handlers::{
    attest_handler, authenticate_handler, commit_handler, data_digest_handler, events_handler,
    fulfill_handler, get_commitment_handler, get_request_handler, health, latest_request_handler,
    open_request_handler, ready, registry_info_handler, withdraw_handler,
};
use crate::state::AppState;

/// Create the application router with default config (for testing)
pub fn create_router(state: AppState) -> Router {
    create_router_with_config(state, &Config::default())
}

/// Create the application router with custom configuration
pub fn create_router_with_config(state: AppState, config: &Config) -> Router {
    // Configure CORS based on allowed_origins
    let cors = match &config.allowed_origins {
        Some(origins) if !origins.is_empty() => {
            let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            tracing::info!("CORS: Restricting to {} origin(s)", origins.len());
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        }
        _ => {
            tracing::warn!("CORS: Allowing all origins (dev mode)");
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    };

    // Request body limit
    let body_limit = RequestBodyLimitLayer::new(config.body_limit_bytes());

    // Request timeout
    let timeout = TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        Duration::from_secs(config.timeout_secs),
    );

    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/registry", get(registry_info_handler))
        .route("/requests", post(open_request_handler))
        .route("/requests/latest/{address}", get(latest_request_handler))
        .route("/requests/{id}", get(get_request_handler))
        .route("/requests/{id}/fulfill", post(fulfill_handler))
        .route("/requests/{id}/attest", post(attest_handler))
        .route("/commitments", post(commit_handler))
        .route("/commitments/{digest}", get(get_commitment_handler))
        .route("/authenticate", post(authenticate_handler))
        .route("/data-digest", post(data_digest_handler))
        .route("/withdraw", post(withdraw_handler))
        .route("/events", get(events_handler))
        .with_state(state)
        .layer(cors)
        .layer(body_limit)
        .layer(timeout)
        .layer(TraceLayer::new_for_http())
}
