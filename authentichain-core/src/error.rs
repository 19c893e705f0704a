use thiserror::Error;

use crate::ledger::{RequestId, RequestState, Verdict};
use crate::primitives::{Address, Digest, U256};

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Metadata {0} has already been committed")]
    AlreadyCommitted(Digest),

    #[error("No commitment recorded for metadata {0}")]
    NotCommitted(Digest),

    #[error("Unknown verification request: {0}")]
    UnknownRequest(RequestId),

    #[error("Verification request {0} has already been fulfilled")]
    AlreadyFulfilled(RequestId),

    #[error("Verification request {id} is not fulfilled (state: {state})")]
    NotFulfilled { id: RequestId, state: RequestState },

    #[error("Verification request {id} belongs to another requester (caller: {caller})")]
    NotRequester { id: RequestId, caller: Address },

    #[error("Verification request {0} has expired")]
    Expired(RequestId),

    #[error("Location not verified for request {request_id} (verdict: {verdict})")]
    LocationNotVerified {
        request_id: RequestId,
        verdict: Verdict,
    },

    #[error("You aren't the owner")]
    NotOwner,

    #[error("Caller {0} is not the authorized attestation callback")]
    UnauthorizedCallback(Address),

    #[error("Insufficient fee: required {required}, provided {provided}")]
    InsufficientFee { required: U256, provided: U256 },

    #[error("Payment {payment} would overflow the treasury balance {balance}")]
    BalanceOverflow { balance: U256, payment: U256 },

    #[error("A verification request id is required to commit")]
    RequestRequired,

    #[error("No verification request recorded for {0}")]
    NoRequestFor(Address),

    #[error("Malformed verdict: expected a 32-byte word, got {0} bytes")]
    MalformedVerdict(usize),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Attestation error: {0}")]
    Attestation(String),

    #[cfg(feature = "network")]
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, RegistryError>;
