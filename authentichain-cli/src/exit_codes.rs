//! Exit codes following sysexits.h conventions.
//!
//! Scripts can tell a rejected commit or a failed authentication apart from
//! a missing file or an unreachable attestor.

use authentichain_core::RegistryError;

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 1;

/// Invalid argument values.
/// Maps to EX_USAGE from sysexits.h.
pub const USAGE_ERROR: i32 = 64;

/// Data not authentic, or the location verdict was unfavorable.
/// Maps to EX_DATAERR from sysexits.h.
pub const NOT_AUTHENTIC: i32 = 65;

/// Cannot open input file.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: i32 = 66;

/// Attestation network unreachable or failed.
/// Maps to EX_UNAVAILABLE from sysexits.h.
pub const ATTESTATION_UNAVAILABLE: i32 = 69;

/// Cannot write output (state file).
/// Maps to EX_IOERR from sysexits.h.
pub const IO_ERROR: i32 = 74;

/// Marker error for a candidate that does not match its commitment.
#[derive(Debug)]
pub struct NotAuthentic;

impl std::fmt::Display for NotAuthentic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "data is NOT authentic")
    }
}

impl std::error::Error for NotAuthentic {}

/// Represents an exit code with optional error context.
pub struct ExitCode {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitCode {
    pub const fn success() -> Self {
        Self {
            code: SUCCESS,
            message: None,
        }
    }

    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");
        Self {
            code: classify(err, &message),
            message: Some(message),
        }
    }
}

fn classify(err: &anyhow::Error, message: &str) -> i32 {
    for cause in err.chain() {
        if cause.is::<NotAuthentic>() {
            return NOT_AUTHENTIC;
        }
        if let Some(registry_err) = cause.downcast_ref::<RegistryError>() {
            return match registry_err {
                RegistryError::LocationNotVerified { .. } => NOT_AUTHENTIC,
                RegistryError::Attestation(_) | RegistryError::Http(_) => {
                    ATTESTATION_UNAVAILABLE
                }
                RegistryError::InvalidInput(_) | RegistryError::MalformedVerdict(_) => USAGE_ERROR,
                _ => GENERAL_ERROR,
            };
        }
    }

    if message.contains("Failed to read") {
        INPUT_ERROR
    } else if message.contains("Failed to write") {
        IO_ERROR
    } else {
        GENERAL_ERROR
    }
}
