//! Registry construction parameters.
//!
//! Everything here is fixed when the registry is created.

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};
use crate::hasher::DataEncoding;
use crate::primitives::{parse_u256, Address, U256};

/// Whether commits must present a fulfilled verification request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestGate {
    /// Commit only with a fulfilled, favorable, unconsumed request owned by
    /// the caller.
    #[default]
    Required,
    /// Commit without any request check.
    Disabled,
}

impl std::str::FromStr for RequestGate {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "required" | "gated" => Ok(Self::Required),
            "disabled" | "ungated" => Ok(Self::Disabled),
            other => Err(RegistryError::InvalidInput(format!(
                "Unknown request gate '{other}' (expected 'required' or 'disabled')"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Sole identity allowed to withdraw collected fees.
    pub owner: Address,
    /// Sole identity allowed to deliver verdicts.
    pub authorized_callback: Address,
    /// Payment required to open a verification request.
    pub fee: U256,
    /// Requests older than this many seconds can no longer be fulfilled or
    /// consumed. `None` means requests never expire.
    pub request_ttl_secs: Option<u64>,
    pub gate: RequestGate,
    pub data_encoding: DataEncoding,
}

impl RegistryConfig {
    /// A gated registry with no fee and no expiry.
    pub fn new(owner: Address, authorized_callback: Address) -> Self {
        Self {
            owner,
            authorized_callback,
            fee: U256::zero(),
            request_ttl_secs: None,
            gate: RequestGate::Required,
            data_encoding: DataEncoding::Raw,
        }
    }

    /// The commitment-only configuration: no fee, no request check.
    pub fn ungated(owner: Address) -> Self {
        Self {
            gate: RequestGate::Disabled,
            ..Self::new(owner, owner)
        }
    }

    pub fn with_fee(mut self, fee: U256) -> Self {
        self.fee = fee;
        self
    }

    pub fn with_request_ttl(mut self, secs: u64) -> Self {
        self.request_ttl_secs = Some(secs);
        self
    }

    pub fn with_data_encoding(mut self, encoding: DataEncoding) -> Self {
        self.data_encoding = encoding;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Required: `AUTHENTICHAIN_OWNER`, `AUTHENTICHAIN_CALLBACK`
    /// Optional: `AUTHENTICHAIN_FEE` (default 0), `AUTHENTICHAIN_REQUEST_TTL_SECS`,
    /// `AUTHENTICHAIN_GATE` (default `required`), `AUTHENTICHAIN_DATA_ENCODING`
    /// (default `raw`)
    pub fn from_env() -> Result<Self> {
        let owner: Address = required_env("AUTHENTICHAIN_OWNER")?.parse()?;
        let authorized_callback: Address = required_env("AUTHENTICHAIN_CALLBACK")?.parse()?;

        let fee = std::env::var("AUTHENTICHAIN_FEE")
            .ok()
            .map(|v| parse_u256(&v))
            .transpose()?
            .unwrap_or_default();

        let request_ttl_secs = std::env::var("AUTHENTICHAIN_REQUEST_TTL_SECS")
            .ok()
            .map(|v| parse_ttl(&v))
            .transpose()?;

        let gate = std::env::var("AUTHENTICHAIN_GATE")
            .ok()
            .map(|v| v.parse::<RequestGate>())
            .transpose()?
            .unwrap_or_default();

        let data_encoding = std::env::var("AUTHENTICHAIN_DATA_ENCODING")
            .ok()
            .map(|v| v.parse::<DataEncoding>())
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            owner,
            authorized_callback,
            fee,
            request_ttl_secs,
            gate,
            data_encoding,
        })
    }
}

fn parse_ttl(value: &str) -> Result<u64> {
    value.trim().parse().map_err(|_| {
        RegistryError::InvalidInput(format!(
            "Invalid request TTL '{value}' (expected whole seconds)"
        ))
    })
}

fn required_env(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| RegistryError::InvalidInput(format!("{name} environment variable not set")))
}
