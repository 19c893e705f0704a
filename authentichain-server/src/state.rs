//! Application state module
//!
//! Defines shared state accessible across all request handlers.

use std::sync::Arc;

use authentichain_core::{
    AttestationClient, AttestationRelay, Registry, RequestId, RequestState, SharedRegistry,
    Verdict,
};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::ApiError;
use crate::identity::CallerAuth;

/// Progress of a relay started through `POST /requests/{id}/attest`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum AttestationStatus {
    Submitted,
    Delivered { verdict: Verdict },
    Failed { error: String },
}

/// Application state containing shared resources.
#[derive(Clone)]
pub struct AppState {
    /// The registry; every operation runs under its lock
    pub registry: SharedRegistry,
    /// Attestation client used by the relay (None when not configured)
    pub attestation: Option<Arc<dyn AttestationClient>>,
    /// Relay progress per request id
    pub attestations: Arc<DashMap<RequestId, AttestationStatus>>,
    /// Caller token validation (None when JWT_SECRET is not set)
    pub caller_auth: Option<Arc<CallerAuth>>,
}

impl AppState {
    pub fn new(registry: Registry, attestation: Option<Arc<dyn AttestationClient>>) -> Self {
        Self {
            registry: Arc::new(Mutex::new(registry)),
            attestation,
            attestations: Arc::new(DashMap::new()),
            caller_auth: None,
        }
    }

    /// Require bearer tokens signed by `auth` on state-changing routes.
    pub fn with_caller_auth(mut self, auth: CallerAuth) -> Self {
        self.caller_auth = Some(Arc::new(auth));
        self
    }

    /// A relay bound to this state's registry and attestation client.
    pub fn relay(&self) -> Result<AttestationRelay, ApiError> {
        let client = self
            .attestation
            .clone()
            .ok_or_else(|| ApiError::service_unavailable("Attestation client not configured"))?;
        Ok(AttestationRelay::new(client, self.registry.clone()))
    }

    pub fn attestation_status(&self, request_id: RequestId) -> Option<AttestationStatus> {
        self.attestations
            .get(&request_id)
            .map(|entry| entry.value().clone())
    }

    /// Drop relay progress for a request once it is consumed or expired.
    pub fn settle_attestation(&self, registry: &Registry, request_id: RequestId, now: u64) {
        if !is_live(registry, request_id, now) {
            self.attestations.remove(&request_id);
        }
    }

    /// Drop relay progress for every consumed or expired request.
    pub fn prune_attestations(&self, registry: &Registry, now: u64) {
        let before = self.attestations.len();
        self.attestations
            .retain(|request_id, _| is_live(registry, *request_id, now));
        let pruned = before.saturating_sub(self.attestations.len());
        if pruned > 0 {
            tracing::debug!(pruned, "Pruned settled attestation entries");
        }
    }
}

fn is_live(registry: &Registry, request_id: RequestId, now: u64) -> bool {
    matches!(
        registry.request_state(request_id, now),
        Ok(RequestState::Pending | RequestState::Fulfilled { .. })
    )
}
