//! Common utility functions shared across CLI commands.

use std::path::Path;

use anyhow::{Context, Result};
use authentichain_core::{Metadata, Registry};
use chrono::{TimeZone, Utc};
use tracing::debug;

/// Load the registry from its CBOR state file.
pub fn load_registry(path: &Path) -> Result<Registry> {
    let bytes = std::fs::read(path).with_context(|| {
        format!(
            "Failed to read state file: {} (run `authentichain init` first)",
            path.display()
        )
    })?;
    let registry = Registry::from_cbor(&bytes)
        .with_context(|| format!("Failed to parse state file: {}", path.display()))?;
    debug!(path = %path.display(), bytes = bytes.len(), "Loaded registry state");
    Ok(registry)
}

/// Persist the registry to its CBOR state file.
pub fn save_registry(path: &Path, registry: &Registry) -> Result<()> {
    let bytes = registry
        .to_cbor()
        .context("Failed to serialize registry state")?;
    std::fs::write(path, &bytes)
        .with_context(|| format!("Failed to write state file: {}", path.display()))?;
    debug!(path = %path.display(), bytes = bytes.len(), "Saved registry state");
    Ok(())
}

/// Read capture metadata from a JSON file.
pub fn read_metadata(path: &Path) -> Result<Metadata> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read metadata file: {}", path.display()))?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("Invalid metadata JSON in {}", path.display()))
}

pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Format a Unix timestamp (seconds) as a human-readable UTC string.
pub fn format_timestamp(timestamp: u64) -> String {
    match Utc.timestamp_opt(timestamp as i64, 0) {
        chrono::LocalResult::Single(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        _ => format!("{timestamp}s"),
    }
}

/// Signed decimal degrees from a metadata coordinate and its hemisphere
/// reference (`N`/`S`/`E`/`W`). Returns `None` when the value is not numeric.
pub fn signed_degrees(value: &str, reference: &str) -> Option<f64> {
    let degrees: f64 = value.trim().parse().ok()?;
    match reference.trim().to_ascii_uppercase().as_str() {
        "S" | "W" => Some(-degrees.abs()),
        _ => Some(degrees),
    }
}
