//! AuthentiChain Core - commit-then-verify provenance registry
//!
//! This crate binds a piece of data to metadata describing where and when it
//! was captured, without storing the data itself. A commitment is accepted
//! only after an external attestation network has judged the claimed
//! location, and anyone can later check candidate data against it.
//!
//! # Features
//!
//! - Bit-exact Keccak-256 commitments over Solidity `abi.encode` metadata
//! - Single-use, requester-bound verification requests with optional expiry
//! - Fee collection with owner-only withdrawal
//! - Audit event log and CBOR state snapshots
//! - Pluggable attestation clients (deterministic mock, HTTPS gateway)
//!
//! # Example
//!
//! ```
//! use authentichain_core::{
//!     Address, CallContext, Metadata, Registry, RegistryConfig, Verdict, U256,
//! };
//!
//! # fn example() -> authentichain_core::Result<()> {
//! let owner: Address = "0x000000000000000000000000000000000000000a".parse()?;
//! let oracle: Address = "0x00000000000000000000000000000000000000aa".parse()?;
//! let alice: Address = "0x0000000000000000000000000000000000000001".parse()?;
//!
//! let mut registry = Registry::new(RegistryConfig::new(owner, oracle));
//!
//! // Open a request, let the oracle accept it, then commit.
//! let request_id = registry.request_verification(&CallContext::new(alice, 100))?;
//! registry.fulfill(&CallContext::new(oracle, 110), request_id, Verdict::ACCEPTED)?;
//!
//! let metadata = Metadata {
//!     gps_longitude: "-97.081776".into(),
//!     gps_latitude: "15.873072".into(),
//!     gps_longitude_ref: "W".into(),
//!     gps_latitude_ref: "N".into(),
//!     timestamp: U256::from(1_700_000_000u64),
//!     size: U256::from(2_048_576u64),
//!     format: "jpeg".into(),
//! };
//! let digest = registry.commit(&CallContext::new(alice, 120), metadata.clone(), b"photo", Some(request_id))?;
//!
//! assert!(registry.authenticate(&metadata, b"photo"));
//! assert!(!registry.authenticate(&metadata, b"edited photo"));
//! assert_eq!(registry.get_metadata(&digest)?, &metadata);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod attestation;
pub mod commitment;
pub mod config;
pub mod error;
pub mod events;
pub mod hasher;
pub mod ledger;
pub mod metadata;
pub mod primitives;
pub mod registry;
pub mod treasury;

// Re-export main types for convenience
pub use attestation::{
    AttestationClient, AttestationRelay, AttestationRequest, AttestationSource, Coordinates,
    MockAttestation, SecretsRef, SharedRegistry,
};
pub use commitment::{CommitmentRecord, CommitmentSaved, CommitmentStore};
pub use config::{RegistryConfig, RequestGate};
pub use error::{RegistryError, Result};
pub use events::RegistryEvent;
pub use hasher::{data_digest, keccak256, metadata_digest, DataEncoding};
pub use ledger::{RequestId, RequestLedger, RequestState, Verdict, VerificationRequest};
pub use metadata::Metadata;
pub use primitives::{parse_u256, unix_now, Address, CallContext, Digest, U256};
pub use registry::Registry;
pub use treasury::{Treasury, Withdrawal};

// Network-dependent exports
#[cfg(feature = "network")]
pub use attestation::{GatewayAttestationClient, GatewayConfig};
