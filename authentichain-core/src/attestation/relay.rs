//! Bridges an attestation client and a shared registry.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use super::{AttestationClient, AttestationRequest, SecretsRef};
use crate::error::{RegistryError, Result};
use crate::ledger::Verdict;
use crate::primitives::CallContext;
use crate::registry::Registry;

/// A registry shared between the caller-facing surface and the relay.
/// The mutex keeps every operation serialized.
pub type SharedRegistry = Arc<Mutex<Registry>>;

/// Submits a request to the attestation network, waits for its verdict and
/// delivers it into the registry as the authorized callback identity.
#[derive(Clone)]
pub struct AttestationRelay {
    client: Arc<dyn AttestationClient>,
    registry: SharedRegistry,
}

impl AttestationRelay {
    pub fn new(client: Arc<dyn AttestationClient>, registry: SharedRegistry) -> Self {
        Self { client, registry }
    }

    /// Run one request to completion and return the delivered verdict.
    #[instrument(
        level = "info",
        skip_all,
        fields(request_id = %request.request_id, source = %self.client.source_id())
    )]
    pub async fn relay(&self, request: &AttestationRequest, secrets: &SecretsRef) -> Result<Verdict> {
        let acknowledged = self.client.submit_request(request, secrets).await?;
        if acknowledged != request.request_id {
            warn!(acknowledged = %acknowledged, "Attestation network acknowledged a different request");
            return Err(RegistryError::Attestation(format!(
                "Submitted request {} but network acknowledged {acknowledged}",
                request.request_id
            )));
        }

        let verdict = self.client.await_fulfillment(acknowledged).await?;

        let mut registry = self.registry.lock().await;
        let ctx = CallContext::now(registry.authorized_callback());
        registry.fulfill(&ctx, acknowledged, verdict)?;

        info!(verdict = %verdict, "Attestation verdict delivered");
        Ok(verdict)
    }

    /// Run [`relay`](Self::relay) on a background task.
    pub fn spawn(&self, request: AttestationRequest, secrets: SecretsRef) -> JoinHandle<Result<Verdict>> {
        let relay = self.clone();
        tokio::spawn(async move {
            let result = relay.relay(&request, &secrets).await;
            if let Err(e) = &result {
                warn!(request_id = %request.request_id, error = %e, "Attestation relay failed");
            }
            result
        })
    }
}

impl std::fmt::Debug for AttestationRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttestationRelay")
            .field("source", &self.client.source_id())
            .finish_non_exhaustive()
    }
}
