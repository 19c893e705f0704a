//! Canonical encoding and Keccak-256 digests.
//!
//! Metadata is encoded exactly as Solidity's `abi.encode` encodes a
//! `tuple(string,string,string,string,uint256,uint256,string)` argument, so
//! digests computed here match digests already stored by EVM deployments.
//! Any change to this module breaks every existing commitment.

use alloy_primitives::U256 as AbiUint;
use alloy_sol_types::{sol, sol_data, SolType};
use serde::{Deserialize, Serialize};
use sha3::{Digest as _, Keccak256};
use tracing::debug;

use crate::metadata::Metadata;
use crate::primitives::{Digest, U256};

/// ABI word size in bytes.
pub const WORD: usize = 32;

/// How a data payload is turned into the pre-image of its digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataEncoding {
    /// The payload bytes are hashed as-is.
    #[default]
    Raw,
    /// The payload is hashed as `abi.encode(string)`, matching records made
    /// by the deployed contract.
    AbiString,
}

impl std::str::FromStr for DataEncoding {
    type Err = crate::error::RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "raw" => Ok(Self::Raw),
            "abi-string" | "abi_string" => Ok(Self::AbiString),
            other => Err(crate::error::RegistryError::InvalidInput(format!(
                "Unknown data encoding '{other}' (expected 'raw' or 'abi-string')"
            ))),
        }
    }
}

sol! {
    /// Solidity layout of capture metadata.
    struct MetadataTuple {
        string gpsLongitude;
        string gpsLatitude;
        string gpsLongitudeRef;
        string gpsLatitudeRef;
        uint256 timestamp;
        uint256 size;
        string format;
    }
}

fn abi_uint(value: U256) -> AbiUint {
    let mut word = [0u8; WORD];
    value.to_big_endian(&mut word);
    AbiUint::from_be_bytes(word)
}

impl From<&Metadata> for MetadataTuple {
    fn from(metadata: &Metadata) -> Self {
        Self {
            gpsLongitude: metadata.gps_longitude.clone(),
            gpsLatitude: metadata.gps_latitude.clone(),
            gpsLongitudeRef: metadata.gps_longitude_ref.clone(),
            gpsLatitudeRef: metadata.gps_latitude_ref.clone(),
            timestamp: abi_uint(metadata.timestamp),
            size: abi_uint(metadata.size),
            format: metadata.format.clone(),
        }
    }
}

/// Canonical encoding of metadata: `abi.encode(metadata)`.
pub fn encode_metadata(metadata: &Metadata) -> Vec<u8> {
    MetadataTuple::abi_encode(&MetadataTuple::from(metadata))
}

/// `abi.encode(string)` of an arbitrary payload. `string` and `bytes`
/// share one encoding, so payloads need not be UTF-8.
pub fn encode_abi_string(data: &[u8]) -> Vec<u8> {
    sol_data::Bytes::abi_encode(data)
}

/// Keccak-256 of raw bytes.
pub fn keccak256(bytes: &[u8]) -> Digest {
    let mut hasher = Keccak256::new();
    hasher.update(bytes);
    let result = hasher.finalize();

    let mut digest = [0u8; 32];
    digest.copy_from_slice(&result);
    Digest(digest)
}

/// The commitment key for a metadata tuple.
pub fn metadata_digest(metadata: &Metadata) -> Digest {
    let digest = keccak256(&encode_metadata(metadata));
    debug!(digest = %digest, "Computed metadata digest");
    digest
}

/// Digest of a data payload under the given encoding.
pub fn data_digest(data: &[u8], encoding: DataEncoding) -> Digest {
    match encoding {
        DataEncoding::Raw => keccak256(data),
        DataEncoding::AbiString => keccak256(&encode_abi_string(data)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_metadata() -> Metadata {
        Metadata {
            gps_longitude: "a".into(),
            gps_latitude: "b".into(),
            gps_longitude_ref: "c".into(),
            gps_latitude_ref: "d".into(),
            timestamp: U256::from(1000),
            size: U256::from(100),
            format: "f".into(),
        }
    }

    fn digest(hex: &str) -> Digest {
        Digest::from_hex(hex).unwrap()
    }

    #[test]
    fn test_keccak256_empty_input() {
        assert_eq!(
            keccak256(b""),
            digest("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470")
        );
    }

    #[test]
    fn test_metadata_encoding_layout() {
        let encoded = encode_metadata(&sample_metadata());

        // offset word + 7 head words + 5 one-character string tails (2 words each)
        assert_eq!(encoded.len(), WORD * (1 + 7 + 5 * 2));

        // Leading offset to the dynamic tuple
        assert_eq!(encoded[WORD - 1], 0x20);
        // First string offset inside the tuple is past the 7 head words
        assert_eq!(encoded[2 * WORD - 1], 0xe0);
        // timestamp = 1000 = 0x03e8 in head slot 5
        assert_eq!(&encoded[6 * WORD - 2..6 * WORD], &[0x03, 0xe8]);
        // size = 100 in head slot 6
        assert_eq!(encoded[7 * WORD - 1], 100);
        // first tail: length 1, then 'a' left-aligned
        assert_eq!(encoded[9 * WORD - 1], 1);
        assert_eq!(encoded[9 * WORD], b'a');
    }

    #[test]
    fn test_metadata_digest_matches_evm_vector() {
        assert_eq!(
            metadata_digest(&sample_metadata()),
            digest("b589cf2c80e4485a650e55cfb45b20dc3409cd2d6c81323187e4179e93a0a860")
        );
    }

    #[test]
    fn test_realistic_metadata_digest() {
        let metadata = Metadata {
            gps_longitude: "-97.081776".into(),
            gps_latitude: "15.873072".into(),
            gps_longitude_ref: "W".into(),
            gps_latitude_ref: "N".into(),
            timestamp: U256::from(1_700_000_000u64),
            size: U256::from(2_048_576u64),
            format: "jpeg".into(),
        };
        assert_eq!(
            metadata_digest(&metadata),
            digest("fd70e9bef18c98d5692147e99a06ee5d1fbe591c6ecabe49a7bb05009a4c3bad")
        );
    }

    #[test]
    fn test_raw_data_digest() {
        assert_eq!(
            data_digest(b"data", DataEncoding::Raw),
            digest("8f54f1c2d0eb5771cd5bf67a6689fcd6eed9444d91a39e5ef32a9b4ae5ca14ff")
        );
        assert_eq!(
            data_digest(b"date", DataEncoding::Raw),
            digest("816fbd62d10bb078748e1c1c480e35bf3a21a082425819c9bb1c192fe1c2ee00")
        );
    }

    #[test]
    fn test_abi_string_data_digest() {
        let encoded = encode_abi_string(b"data");
        assert_eq!(encoded.len(), 3 * WORD);
        assert_eq!(encoded[WORD - 1], 0x20);
        assert_eq!(encoded[2 * WORD - 1], 4);
        assert_eq!(&encoded[2 * WORD..2 * WORD + 4], b"data");

        assert_eq!(
            data_digest(b"data", DataEncoding::AbiString),
            digest("85097f3ed4c88af0be2ace84efa0d453f032be00f07e16e63d135ae20c093eb4")
        );
    }

    #[test]
    fn test_empty_string_has_no_padding_words() {
        assert_eq!(encode_abi_string(b"").len(), 2 * WORD);
    }

    #[test]
    fn test_field_boundaries_are_unambiguous() {
        let mut shifted = sample_metadata();
        shifted.gps_longitude = "ab".into();
        shifted.gps_latitude = "".into();

        let mut original = sample_metadata();
        original.gps_latitude = "b".into();

        assert_ne!(metadata_digest(&original), metadata_digest(&shifted));
    }

    #[test]
    fn test_data_encoding_from_str() {
        assert_eq!("raw".parse::<DataEncoding>().unwrap(), DataEncoding::Raw);
        assert_eq!(
            "abi-string".parse::<DataEncoding>().unwrap(),
            DataEncoding::AbiString
        );
        assert!("base64".parse::<DataEncoding>().is_err());
    }
}
