//! Health check handlers
//!
//! Provides health and readiness endpoints for monitoring and orchestration.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status: "healthy" or "degraded"
    pub status: &'static str,
    /// Server version from Cargo.toml
    pub version: &'static str,
    /// Whether an attestation client is configured
    pub attestation_available: bool,
    /// Which attestor verdicts come from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attestation_source: Option<String>,
    /// Service name
    pub service: &'static str,
}

/// GET /health - Health check endpoint
///
/// Reports "degraded" when no attestation client is configured: the registry
/// still serves reads, commits and direct callback fulfillment.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let attestation_source = state
        .attestation
        .as_ref()
        .map(|client| client.source_id().to_string());
    let attestation_available = attestation_source.is_some();

    Json(HealthResponse {
        status: if attestation_available {
            "healthy"
        } else {
            "degraded"
        },
        version: env!("CARGO_PKG_VERSION"),
        attestation_available,
        attestation_source,
        service: "authentichain-server",
    })
}

/// Readiness response for Kubernetes
#[derive(Serialize)]
pub struct ReadyResponse {
    /// Whether the service is ready to accept traffic
    pub ready: bool,
    /// Optional message explaining status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

/// GET /ready - Kubernetes readiness check
///
/// Returns 200 if the service is ready to accept traffic.
/// Unlike /health, this is a simple yes/no check.
pub async fn ready() -> Json<ReadyResponse> {
    Json(ReadyResponse {
        ready: true,
        message: None,
    })
}
