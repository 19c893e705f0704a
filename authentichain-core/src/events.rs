//! Notifications emitted by the registry for external audit and indexing.

use serde::{Deserialize, Serialize};

use crate::commitment::CommitmentSaved;
use crate::ledger::{RequestId, Verdict};
use crate::primitives::Address;
use crate::treasury::Withdrawal;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum RegistryEvent {
    #[serde(rename_all = "camelCase")]
    VerificationRequested {
        request_id: RequestId,
        requester: Address,
    },
    #[serde(rename_all = "camelCase")]
    VerificationFulfilled {
        request_id: RequestId,
        verdict: Verdict,
    },
    CommitmentSaved(CommitmentSaved),
    Withdrawal(Withdrawal),
}

impl From<CommitmentSaved> for RegistryEvent {
    fn from(event: CommitmentSaved) -> Self {
        Self::CommitmentSaved(event)
    }
}

impl From<Withdrawal> for RegistryEvent {
    fn from(event: Withdrawal) -> Self {
        Self::Withdrawal(event)
    }
}
