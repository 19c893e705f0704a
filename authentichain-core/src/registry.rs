//! The public face of the commitment registry.
//!
//! Composes the request ledger, the commitment store and the treasury into
//! "commit only with a valid, matching, unconsumed, favorable fulfillment".
//! Each mutating operation either applies completely or returns an error
//! with no state written, with one deliberate exception: an unfavorable
//! verdict still consumes its request.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::commitment::CommitmentStore;
use crate::config::{RegistryConfig, RequestGate};
use crate::error::{RegistryError, Result};
use crate::events::RegistryEvent;
use crate::hasher::DataEncoding;
use crate::ledger::{RequestId, RequestLedger, RequestState, Verdict, VerificationRequest};
use crate::metadata::Metadata;
use crate::primitives::{Address, CallContext, Digest, U256};
use crate::treasury::{Treasury, Withdrawal};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registry {
    gate: RequestGate,
    ledger: RequestLedger,
    commitments: CommitmentStore,
    treasury: Treasury,
    #[serde(default)]
    events: Vec<RegistryEvent>,
}

impl Registry {
    pub fn new(config: RegistryConfig) -> Self {
        info!(
            owner = %config.owner,
            callback = %config.authorized_callback,
            fee = %config.fee,
            gate = ?config.gate,
            "Registry created"
        );

        Self {
            gate: config.gate,
            ledger: RequestLedger::new(config.authorized_callback, config.request_ttl_secs),
            commitments: CommitmentStore::new(config.data_encoding),
            treasury: Treasury::new(config.owner, config.fee),
            events: Vec::new(),
        }
    }

    // ==================== Verification requests ====================

    /// Pay the fee and open a verification request for the caller.
    #[instrument(level = "debug", skip(self), fields(caller = %ctx.caller))]
    pub fn request_verification(&mut self, ctx: &CallContext) -> Result<RequestId> {
        self.treasury.collect(ctx.value)?;
        let request_id = self.ledger.open(ctx.caller, ctx.timestamp);

        self.events.push(RegistryEvent::VerificationRequested {
            request_id,
            requester: ctx.caller,
        });
        Ok(request_id)
    }

    /// Deliver a verdict. Only the authorized callback identity may call this.
    #[instrument(level = "debug", skip(self), fields(caller = %ctx.caller))]
    pub fn fulfill(&mut self, ctx: &CallContext, request_id: RequestId, verdict: Verdict) -> Result<()> {
        self.ledger
            .fulfill(ctx.caller, request_id, verdict, ctx.timestamp)?;

        self.events.push(RegistryEvent::VerificationFulfilled {
            request_id,
            verdict,
        });
        Ok(())
    }

    /// Deliver a verdict in its wire form: one 32-byte big-endian word.
    pub fn fulfill_encoded(
        &mut self,
        ctx: &CallContext,
        request_id: RequestId,
        word: &[u8],
    ) -> Result<()> {
        if ctx.caller != self.ledger.authorized_callback() {
            return Err(RegistryError::UnauthorizedCallback(ctx.caller));
        }
        let verdict = Verdict::from_word(word)?;
        self.fulfill(ctx, request_id, verdict)
    }

    // ==================== Commitments ====================

    /// Commit `data` under `metadata`.
    ///
    /// With the request gate enabled, `request_id` must name a fulfilled
    /// request opened by the caller. A favorable verdict is consumed together
    /// with the insert; an unfavorable one is consumed and the commit fails
    /// with [`RegistryError::LocationNotVerified`].
    #[instrument(level = "debug", skip(self, metadata, data), fields(caller = %ctx.caller))]
    pub fn commit(
        &mut self,
        ctx: &CallContext,
        metadata: Metadata,
        data: &[u8],
        request_id: Option<RequestId>,
    ) -> Result<Digest> {
        let metadata_digest = metadata.digest();

        match self.gate {
            RequestGate::Required => {
                let request_id = request_id.ok_or(RegistryError::RequestRequired)?;
                let verdict =
                    self.ledger
                        .check_consumable(request_id, ctx.caller, ctx.timestamp)?;

                if !verdict.is_accepted() {
                    self.ledger
                        .consume(request_id, ctx.caller, ctx.timestamp)?;
                    warn!(
                        request_id = %request_id,
                        verdict = %verdict,
                        "Commit refused: location not verified"
                    );
                    return Err(RegistryError::LocationNotVerified {
                        request_id,
                        verdict,
                    });
                }

                if self.commitments.contains(&metadata_digest) {
                    return Err(RegistryError::AlreadyCommitted(metadata_digest));
                }

                self.ledger
                    .consume(request_id, ctx.caller, ctx.timestamp)?;
            }
            RequestGate::Disabled => {
                if let Some(request_id) = request_id {
                    debug!(request_id = %request_id, "Request gate disabled; ignoring request id");
                }
            }
        }

        let saved = self
            .commitments
            .insert(ctx.caller, metadata, data)?;
        self.events.push(saved.into());
        Ok(metadata_digest)
    }

    /// Whether `candidate` is the data committed under `metadata`.
    pub fn authenticate(&self, metadata: &Metadata, candidate: &[u8]) -> bool {
        self.commitments.authenticate(metadata, candidate)
    }

    pub fn get_metadata(&self, metadata_digest: &Digest) -> Result<&Metadata> {
        self.commitments
            .lookup(metadata_digest)
            .map(|record| &record.metadata)
    }

    pub fn get_data_digest(&self, metadata: &Metadata) -> Result<Digest> {
        self.commitments.data_digest_for(metadata)
    }

    // ==================== Treasury ====================

    /// Send the whole balance to the owner.
    #[instrument(level = "debug", skip(self), fields(caller = %ctx.caller))]
    pub fn withdraw(&mut self, ctx: &CallContext) -> Result<Withdrawal> {
        let withdrawal = self.treasury.withdraw(ctx.caller, ctx.timestamp)?;
        self.events.push(withdrawal.into());
        Ok(withdrawal)
    }

    // ==================== Accessors ====================

    pub fn latest_request(&self, requester: &Address) -> Result<RequestId> {
        self.ledger.latest(requester)
    }

    pub fn request(&self, request_id: RequestId) -> Result<&VerificationRequest> {
        self.ledger.get(request_id)
    }

    /// Request state at `now`, with expiry applied.
    pub fn request_state(&self, request_id: RequestId, now: u64) -> Result<RequestState> {
        self.ledger.state_of(request_id, now)
    }

    pub fn fee(&self) -> U256 {
        self.treasury.fee()
    }

    pub fn owner(&self) -> Address {
        self.treasury.owner()
    }

    pub fn balance(&self) -> U256 {
        self.treasury.balance()
    }

    pub fn authorized_callback(&self) -> Address {
        self.ledger.authorized_callback()
    }

    pub fn gate(&self) -> RequestGate {
        self.gate
    }

    pub fn data_encoding(&self) -> DataEncoding {
        self.commitments.encoding()
    }

    pub fn request_ttl_secs(&self) -> Option<u64> {
        self.ledger.ttl_secs()
    }

    pub fn commitment_count(&self) -> usize {
        self.commitments.len()
    }

    pub fn events(&self) -> &[RegistryEvent] {
        &self.events
    }

    /// Drain the event log.
    pub fn take_events(&mut self) -> Vec<RegistryEvent> {
        std::mem::take(&mut self.events)
    }

    // ==================== Persistence ====================

    /// Serialize the full registry state to CBOR.
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        ciborium::into_writer(self, &mut bytes)
            .map_err(|e| RegistryError::Serialization(e.to_string()))?;
        Ok(bytes)
    }

    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| RegistryError::Serialization(e.to_string()))
    }
}
