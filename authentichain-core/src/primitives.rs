//! Value types shared by every registry component.
//!
//! Addresses and digests travel as `0x`-prefixed hex strings in every
//! serialized form (JSON bodies, CBOR state files) so they stay readable and
//! can be used as map keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::RegistryError;

pub use primitive_types::U256;

/// Decode a `0x`-prefixed (or bare) hex string into exactly `N` bytes.
fn decode_fixed<const N: usize>(s: &str, what: &str) -> Result<[u8; N], RegistryError> {
    let trimmed = s.trim();
    let hex_part = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    hex::decode(hex_part)
        .map_err(|e| RegistryError::InvalidInput(format!("Invalid {what} hex '{s}': {e}")))?
        .try_into()
        .map_err(|v: Vec<u8>| {
            RegistryError::InvalidInput(format!("{what} must be {N} bytes, got {}", v.len()))
        })
}

/// A 20-byte account identifier (the requester, owner, or callback identity).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address (0x0000...0000).
    pub const ZERO: Self = Self([0u8; 20]);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for Address {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed::<20>(s, "address").map(Self)
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A 32-byte Keccak-256 digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Digest(pub [u8; 32]);

impl Digest {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parse a digest from hex, with or without the `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, RegistryError> {
        decode_fixed::<32>(s, "digest").map(Self)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({self})")
    }
}

impl FromStr for Digest {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Parse a 256-bit integer from decimal or `0x`-prefixed hex.
pub fn parse_u256(s: &str) -> Result<U256, RegistryError> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex_part) => U256::from_str_radix(hex_part, 16).map_err(|e| e.to_string()),
        None => U256::from_dec_str(s).map_err(|e| format!("{e:?}")),
    };
    parsed.map_err(|e| RegistryError::InvalidInput(format!("Invalid 256-bit integer '{s}': {e}")))
}

/// Serde adapter for `U256`: written as a decimal string, read from a
/// number, a decimal string, or a `0x` hex string.
pub mod u256_serde {
    use super::{parse_u256, U256};
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(n) => Ok(U256::from(n)),
            Repr::Text(s) => parse_u256(&s).map_err(serde::de::Error::custom),
        }
    }

    /// Same encoding for optional fields.
    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &Option<U256>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => serializer.collect_str(v),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<U256>, D::Error> {
            match Option::<Repr>::deserialize(deserializer)? {
                None => Ok(None),
                Some(Repr::Number(n)) => Ok(Some(U256::from(n))),
                Some(Repr::Text(s)) => parse_u256(&s).map(Some).map_err(serde::de::Error::custom),
            }
        }
    }
}

/// Current wall-clock time in Unix seconds.
pub fn unix_now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// The host-ledger view of a single call: who sent it, what payment it
/// carried, and the ledger timestamp (Unix seconds) it executes at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Address,
    pub value: U256,
    pub timestamp: u64,
}

impl CallContext {
    pub fn new(caller: Address, timestamp: u64) -> Self {
        Self {
            caller,
            value: U256::zero(),
            timestamp,
        }
    }

    /// A call stamped with the current wall-clock time.
    pub fn now(caller: Address) -> Self {
        Self::new(caller, unix_now())
    }

    /// Attach a payment to the call.
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}
