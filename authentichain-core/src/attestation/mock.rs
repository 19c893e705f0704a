//! Deterministic attestor for tests and local simulation.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use super::{AttestationClient, AttestationRequest, AttestationSource, SecretsRef};
use crate::error::{RegistryError, Result};
use crate::ledger::{RequestId, Verdict};

/// Mock attestation network.
/// WARNING: verdicts are configured, not computed. Never use in production.
#[derive(Debug)]
pub struct MockAttestation {
    default_verdict: Verdict,
    overrides: DashMap<RequestId, Verdict>,
    submitted: DashMap<RequestId, AttestationRequest>,
}

impl MockAttestation {
    pub fn new(default_verdict: Verdict) -> Self {
        Self {
            default_verdict,
            overrides: DashMap::new(),
            submitted: DashMap::new(),
        }
    }

    /// Every request is judged to be at its claimed location.
    pub fn accepting() -> Self {
        Self::new(Verdict::ACCEPTED)
    }

    /// Every request is rejected with `code`.
    pub fn rejecting(code: u64) -> Self {
        Self::new(Verdict::rejected(code))
    }

    /// Override the verdict for a single request.
    pub fn set_verdict(&self, request_id: RequestId, verdict: Verdict) {
        self.overrides.insert(request_id, verdict);
    }

    /// The request as it was submitted, if any.
    pub fn submitted(&self, request_id: RequestId) -> Option<AttestationRequest> {
        self.submitted.get(&request_id).map(|entry| entry.clone())
    }

    pub fn submission_count(&self) -> usize {
        self.submitted.len()
    }
}

impl Default for MockAttestation {
    fn default() -> Self {
        Self::accepting()
    }
}

#[async_trait]
impl AttestationClient for MockAttestation {
    async fn submit_request(
        &self,
        request: &AttestationRequest,
        _secrets: &SecretsRef,
    ) -> Result<RequestId> {
        request.args()?;
        debug!(request_id = %request.request_id, "Mock attestation submitted");
        self.submitted.insert(request.request_id, request.clone());
        Ok(request.request_id)
    }

    async fn await_fulfillment(&self, request_id: RequestId) -> Result<Verdict> {
        if !self.submitted.contains_key(&request_id) {
            return Err(RegistryError::Attestation(format!(
                "Request {request_id} was never submitted"
            )));
        }

        Ok(self
            .overrides
            .get(&request_id)
            .map(|entry| *entry)
            .unwrap_or(self.default_verdict))
    }

    fn source_id(&self) -> AttestationSource {
        AttestationSource::Mock
    }
}
