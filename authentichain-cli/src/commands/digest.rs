//! Digest command implementation.

use std::path::Path;

use anyhow::Result;
use authentichain_core::{data_digest, metadata_digest, DataEncoding};
use colored::Colorize;
use tracing::debug;

use crate::utils::{read_file, read_metadata};

/// Print the commitment key for a metadata JSON file.
pub fn metadata(path: &Path, quiet: bool) -> Result<()> {
    let metadata = read_metadata(path)?;
    let digest = metadata_digest(&metadata);
    debug!(digest = %digest, "Computed metadata digest");

    if quiet {
        println!("{digest}");
    } else {
        println!("{} {digest}", "Metadata digest:".dimmed());
    }
    Ok(())
}

/// Print the data digest for a file.
pub fn data(path: &Path, abi_string: bool, quiet: bool) -> Result<()> {
    let content = read_file(path)?;
    let encoding = if abi_string {
        DataEncoding::AbiString
    } else {
        DataEncoding::Raw
    };
    let digest = data_digest(&content, encoding);
    debug!(digest = %digest, bytes = content.len(), encoding = ?encoding, "Computed data digest");

    if quiet {
        println!("{digest}");
    } else {
        println!("{} {digest}", "Data digest:".dimmed());
    }
    Ok(())
}
