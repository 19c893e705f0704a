//! AuthentiChain Server - REST API for the commitment registry
//!
//! Exposes authentichain-core over HTTP:
//! - POST /requests - Open a verification request
//! - POST /requests/{id}/fulfill - Deliver a verdict (authorized callback)
//! - POST /commitments - Commit data under metadata
//! - POST /authenticate - Check data against a commitment
//!
//! State-changing routes require `Authorization: Bearer <token>` signed
//! with JWT_SECRET, whose subject is the caller's address.

use std::sync::Arc;

use authentichain_core::{
    AttestationClient, GatewayAttestationClient, MockAttestation, Registry, RegistryConfig,
};
use authentichain_server::{create_router_with_config, AppState, CallerAuth, Config};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("authentichain_server=info,authentichain_core=info,tower_http=info")
            }),
        )
        .with_target(true)
        .init();

    let config = Config::from_env();
    let registry_config = RegistryConfig::from_env()?;

    let attestation: Option<Arc<dyn AttestationClient>> = if config.allow_mock_attestation {
        tracing::warn!("Using MOCK attestation: verdicts are not real");
        Some(Arc::new(MockAttestation::accepting()))
    } else {
        match GatewayAttestationClient::from_env() {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                tracing::warn!(error = %e, "Attestation gateway not configured; /attest disabled");
                None
            }
        }
    };

    let mut state = AppState::new(Registry::new(registry_config), attestation);
    match &config.jwt_secret {
        Some(secret) => state = state.with_caller_auth(CallerAuth::new(secret.as_bytes())),
        None => tracing::warn!("JWT_SECRET not set; state-changing routes are disabled"),
    }
    let app = create_router_with_config(state, &config);

    let addr = config.socket_addr();
    tracing::info!(%addr, "AuthentiChain server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}
