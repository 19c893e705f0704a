//! Boundary to the external location-attestation network.
//!
//! The registry never talks to the attestation network itself. A client
//! submits the off-chain check for a request id, waits for the verdict, and
//! the [`AttestationRelay`] delivers that verdict back into the registry as
//! the authorized callback identity.
//!
//! ## Clients
//!
//! - [`MockAttestation`] - deterministic verdicts for tests and local runs
//! - [`GatewayAttestationClient`] - HTTPS JSON gateway (`network` feature)
//!
//! ## Example
//!
//! ```
//! use authentichain_core::attestation::{
//!     AttestationClient, AttestationRequest, Coordinates, MockAttestation, SecretsRef,
//! };
//! use authentichain_core::{RequestId, Verdict};
//!
//! # async fn example() -> authentichain_core::Result<()> {
//! let client = MockAttestation::accepting();
//! let request = AttestationRequest {
//!     request_id: RequestId(1),
//!     cell_towers: serde_json::json!({ "radioType": "lte", "cellTowers": [] }),
//!     reported: Coordinates::new(15.8713, -97.080058),
//!     claimed: Coordinates::new(15.871978, -97.078703),
//! };
//!
//! let id = client.submit_request(&request, &SecretsRef::default()).await?;
//! assert_eq!(client.await_fulfillment(id).await?, Verdict::ACCEPTED);
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "network")]
mod gateway;
mod mock;
mod relay;

#[cfg(feature = "network")]
pub use gateway::{GatewayAttestationClient, GatewayConfig};
pub use mock::MockAttestation;
pub use relay::{AttestationRelay, SharedRegistry};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};
use crate::ledger::{RequestId, Verdict};

/// A GPS position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Everything the off-chain script needs to judge one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationRequest {
    pub request_id: RequestId,
    /// Cell-tower lookup payload, passed through to the geolocation API as is.
    pub cell_towers: serde_json::Value,
    /// Where the device says it is right now.
    pub reported: Coordinates,
    /// Where the metadata says the data was captured.
    pub claimed: Coordinates,
}

impl AttestationRequest {
    /// The script arguments, each JSON-encoded: cell-tower payload, reported
    /// coordinates, claimed coordinates.
    pub fn args(&self) -> Result<[String; 3]> {
        Ok([
            to_arg(&self.cell_towers)?,
            to_arg(&self.reported)?,
            to_arg(&self.claimed)?,
        ])
    }
}

fn to_arg<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|e| RegistryError::Serialization(format!("Invalid attestation argument: {e}")))
}

/// Reference to secrets already provisioned with the attestation network.
/// Never carries the secret itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretsRef {
    pub slot_id: u8,
    pub version: u64,
}

/// Identifies which attestor produced a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttestationSource {
    Gateway { url: String },
    /// Deterministic verdicts. Never use outside tests and simulations.
    Mock,
}

impl std::fmt::Display for AttestationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gateway { url } => write!(f, "Gateway: {url}"),
            Self::Mock => write!(f, "Mock (NOT A REAL ATTESTATION)"),
        }
    }
}

/// Client for the external attestation network.
///
/// Implementations must be thread-safe (`Send + Sync`) and handle their own
/// transport retries.
#[async_trait]
pub trait AttestationClient: Send + Sync {
    /// Submit the off-chain check for `request.request_id`. Returns the id the
    /// network acknowledged.
    async fn submit_request(
        &self,
        request: &AttestationRequest,
        secrets: &SecretsRef,
    ) -> Result<RequestId>;

    /// Wait until the network has produced a verdict for `request_id`.
    async fn await_fulfillment(&self, request_id: RequestId) -> Result<Verdict>;

    fn source_id(&self) -> AttestationSource;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_are_json_encoded_in_order() {
        let request = AttestationRequest {
            request_id: RequestId(1),
            cell_towers: serde_json::json!({ "radioType": "lte" }),
            reported: Coordinates::new(15.8713, -97.080058),
            claimed: Coordinates::new(15.871978, -97.078703),
        };

        let [towers, reported, claimed] = request.args().unwrap();
        assert_eq!(towers, r#"{"radioType":"lte"}"#);
        assert_eq!(reported, r#"{"lat":15.8713,"lng":-97.080058}"#);
        assert_eq!(claimed, r#"{"lat":15.871978,"lng":-97.078703}"#);
    }

    #[test]
    fn test_secrets_ref_wire_names() {
        let json = serde_json::to_value(SecretsRef {
            slot_id: 0,
            version: 1_712_000_000,
        })
        .unwrap();
        assert_eq!(json["slotId"], 0);
        assert_eq!(json["version"], 1_712_000_000u64);
    }

    #[test]
    fn test_source_display() {
        assert!(AttestationSource::Mock.to_string().contains("Mock"));
        let gateway = AttestationSource::Gateway {
            url: "https://attest.example".into(),
        };
        assert_eq!(gateway.to_string(), "Gateway: https://attest.example");
    }
}
