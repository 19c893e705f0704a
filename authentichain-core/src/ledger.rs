//! Verification request lifecycle.
//!
//! ```text
//! open ──► Pending ──fulfill──► Fulfilled ──consume──► Consumed
//!             │                     │
//!             └──────── ttl ────────┴──► Expired
//! ```
//!
//! Only the authorized callback identity may move a request from `Pending`
//! to `Fulfilled`, and only the original requester may consume it. Expiry
//! is evaluated lazily against the caller-supplied timestamp; nothing is
//! evicted in the background.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{RegistryError, Result};
use crate::primitives::{u256_serde, Address, U256};

/// Identifier of a verification request. Allocated sequentially from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RequestId {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse()
            .map(Self)
            .map_err(|e| RegistryError::InvalidInput(format!("Invalid request id '{s}': {e}")))
    }
}

/// Outcome of the external location check, as a 256-bit word.
/// Zero means the claimed location was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Verdict(pub U256);

impl Verdict {
    pub const ACCEPTED: Self = Self(U256([0, 0, 0, 0]));

    pub fn rejected(code: u64) -> Self {
        Self(U256::from(code.max(1)))
    }

    pub fn is_accepted(&self) -> bool {
        self.0.is_zero()
    }

    /// Decode the fixed-width big-endian word delivered by the callback.
    pub fn from_word(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 32 {
            return Err(RegistryError::MalformedVerdict(bytes.len()));
        }
        Ok(Self(U256::from_big_endian(bytes)))
    }

    pub fn to_word(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        self.0.to_big_endian(&mut word);
        word
    }
}

impl From<u64> for Verdict {
    fn from(code: u64) -> Self {
        Self(U256::from(code))
    }
}

impl Serialize for Verdict {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        u256_serde::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Verdict {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        u256_serde::deserialize(deserializer).map(Self)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum RequestState {
    Pending,
    Fulfilled { verdict: Verdict },
    /// Used by exactly one commit attempt; the verdict is kept for audit.
    Consumed { verdict: Verdict },
    Expired,
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Fulfilled { verdict } => write!(f, "fulfilled (verdict {verdict})"),
            Self::Consumed { verdict } => write!(f, "consumed (verdict {verdict})"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    pub id: RequestId,
    pub requester: Address,
    pub state: RequestState,
    /// Ledger timestamp (Unix seconds) at which the request was opened.
    pub created_at: u64,
    pub fulfilled_at: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestLedger {
    authorized_callback: Address,
    ttl_secs: Option<u64>,
    next_id: u64,
    requests: BTreeMap<RequestId, VerificationRequest>,
    latest: HashMap<Address, RequestId>,
}

impl RequestLedger {
    pub fn new(authorized_callback: Address, ttl_secs: Option<u64>) -> Self {
        Self {
            authorized_callback,
            ttl_secs,
            next_id: 1,
            requests: BTreeMap::new(),
            latest: HashMap::new(),
        }
    }

    pub fn authorized_callback(&self) -> Address {
        self.authorized_callback
    }

    pub fn ttl_secs(&self) -> Option<u64> {
        self.ttl_secs
    }

    fn is_expired(&self, request: &VerificationRequest, now: u64) -> bool {
        let live = matches!(
            request.state,
            RequestState::Pending | RequestState::Fulfilled { .. }
        );
        match self.ttl_secs {
            Some(ttl) if live => now.saturating_sub(request.created_at) > ttl,
            _ => false,
        }
    }

    /// Open a new request for `requester` and make it their latest.
    pub fn open(&mut self, requester: Address, now: u64) -> RequestId {
        let id = RequestId(self.next_id);
        self.next_id += 1;

        self.requests.insert(
            id,
            VerificationRequest {
                id,
                requester,
                state: RequestState::Pending,
                created_at: now,
                fulfilled_at: None,
            },
        );
        self.latest.insert(requester, id);

        info!(request_id = %id, requester = %requester, "Verification request opened");
        id
    }

    /// Record the verdict for a pending request. Callable only by the
    /// authorized callback identity.
    pub fn fulfill(
        &mut self,
        caller: Address,
        id: RequestId,
        verdict: Verdict,
        now: u64,
    ) -> Result<()> {
        if caller != self.authorized_callback {
            warn!(caller = %caller, request_id = %id, "Rejected fulfillment from unauthorized caller");
            return Err(RegistryError::UnauthorizedCallback(caller));
        }

        let expired = {
            let request = self.get(id)?;
            if !matches!(request.state, RequestState::Pending) {
                return Err(RegistryError::AlreadyFulfilled(id));
            }
            self.is_expired(request, now)
        };
        if expired {
            return Err(RegistryError::Expired(id));
        }

        let request = self
            .requests
            .get_mut(&id)
            .ok_or(RegistryError::UnknownRequest(id))?;
        request.state = RequestState::Fulfilled { verdict };
        request.fulfilled_at = Some(now);

        info!(request_id = %id, verdict = %verdict, "Verification request fulfilled");
        Ok(())
    }

    /// Validate that `requester` may consume `id` right now and return the
    /// stored verdict. Does not modify the ledger.
    pub fn check_consumable(&self, id: RequestId, requester: Address, now: u64) -> Result<Verdict> {
        let request = self.get(id)?;

        if request.requester != requester {
            return Err(RegistryError::NotRequester {
                id,
                caller: requester,
            });
        }
        if self.is_expired(request, now) {
            return Err(RegistryError::Expired(id));
        }

        match request.state {
            RequestState::Fulfilled { verdict } => Ok(verdict),
            state => Err(RegistryError::NotFulfilled { id, state }),
        }
    }

    /// Spend a fulfilled request. Each request can be consumed once,
    /// whatever its verdict.
    pub fn consume(&mut self, id: RequestId, requester: Address, now: u64) -> Result<Verdict> {
        let verdict = self.check_consumable(id, requester, now)?;

        let request = self
            .requests
            .get_mut(&id)
            .ok_or(RegistryError::UnknownRequest(id))?;
        request.state = RequestState::Consumed { verdict };

        info!(request_id = %id, requester = %requester, "Verification request consumed");
        Ok(verdict)
    }

    /// The most recent request opened by `requester`.
    pub fn latest(&self, requester: &Address) -> Result<RequestId> {
        self.latest
            .get(requester)
            .copied()
            .ok_or(RegistryError::NoRequestFor(*requester))
    }

    pub fn get(&self, id: RequestId) -> Result<&VerificationRequest> {
        self.requests
            .get(&id)
            .ok_or(RegistryError::UnknownRequest(id))
    }

    /// The state of `id` as seen at `now`, with lazy expiry applied.
    pub fn state_of(&self, id: RequestId, now: u64) -> Result<RequestState> {
        let request = self.get(id)?;
        if self.is_expired(request, now) {
            Ok(RequestState::Expired)
        } else {
            Ok(request.state)
        }
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}
