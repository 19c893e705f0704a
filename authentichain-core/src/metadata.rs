use serde::{Deserialize, Serialize};

use crate::hasher;
use crate::primitives::{u256_serde, Digest, U256};

/// Capture metadata describing a piece of data's provenance.
///
/// Field order is part of the commitment encoding; see
/// [`hasher::encode_metadata`]. Values are opaque and are not validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub gps_longitude: String,
    pub gps_latitude: String,
    pub gps_longitude_ref: String,
    pub gps_latitude_ref: String,
    #[serde(with = "u256_serde")]
    pub timestamp: U256,
    #[serde(with = "u256_serde")]
    pub size: U256,
    pub format: String,
}

impl Metadata {
    /// The commitment key for this metadata.
    pub fn digest(&self) -> Digest {
        hasher::metadata_digest(self)
    }
}
