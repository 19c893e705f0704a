//! Input validation module
//!
//! Decodes and checks path and body values before they reach the registry.

use authentichain_core::{Address, Digest, RequestId};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::error::ApiError;

/// Default max decoded payload size in bytes (25 MB)
pub const DEFAULT_MAX_DATA_SIZE: usize = 25 * 1024 * 1024;

/// Decodes a base64 data payload and checks its size.
pub fn decode_data(encoded: &str) -> Result<Vec<u8>, ApiError> {
    let data = BASE64
        .decode(encoded.trim())
        .map_err(|e| ApiError::bad_request(format!("Invalid base64 in data: {e}")))?;
    validate_data_size(data.len(), DEFAULT_MAX_DATA_SIZE)?;
    Ok(data)
}

/// Validates the size of a decoded payload
///
/// Returns an error if the payload exceeds the maximum size.
pub fn validate_data_size(size: usize, max_size: usize) -> Result<(), ApiError> {
    if size > max_size {
        let max_mb = max_size / (1024 * 1024);
        let actual_mb = size / (1024 * 1024);
        Err(ApiError::bad_request(format!(
            "Data too large: {actual_mb} MB exceeds maximum of {max_mb} MB"
        )))
    } else {
        Ok(())
    }
}

pub fn parse_address(value: &str) -> Result<Address, ApiError> {
    value
        .parse()
        .map_err(|e| ApiError::bad_request(format!("Invalid address '{value}': {e}")))
}

pub fn parse_digest(value: &str) -> Result<Digest, ApiError> {
    value
        .parse()
        .map_err(|e| ApiError::bad_request(format!("Invalid digest '{value}': {e}")))
}

pub fn parse_request_id(value: &str) -> Result<RequestId, ApiError> {
    value
        .parse()
        .map_err(|e| ApiError::bad_request(format!("Invalid request id '{value}': {e}")))
}

/// Decodes a `0x`-prefixed hex verdict word. The length is checked by the registry.
pub fn decode_verdict_word(value: &str) -> Result<Vec<u8>, ApiError> {
    let hex_str = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    hex::decode(hex_str).map_err(|e| ApiError::bad_request(format!("Invalid verdict hex: {e}")))
}
