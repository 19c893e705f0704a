//! Commit and authenticate commands.

use std::path::Path;

use anyhow::{Context, Result};
use authentichain_core::{Address, CallContext, RequestId};
use colored::Colorize;
use tracing::{info, warn};

use crate::exit_codes::NotAuthentic;
use crate::utils::{load_registry, read_file, read_metadata, save_registry};

/// Commit `file` under the metadata in `metadata_path` as `caller`.
pub fn commit(
    state: &Path,
    caller: Address,
    metadata_path: &Path,
    file: &Path,
    request_id: Option<RequestId>,
    quiet: bool,
) -> Result<()> {
    let metadata = read_metadata(metadata_path)?;
    let content = read_file(file)?;
    let mut registry = load_registry(state)?;

    let result = registry.commit(&CallContext::now(caller), metadata.clone(), &content, request_id);

    // An unfavorable verdict still consumes the request, so the state is
    // saved whether or not the commit went through.
    save_registry(state, &registry)?;
    let metadata_digest = result.context("Commit failed")?;
    let data_digest = registry.get_data_digest(&metadata)?;

    info!(metadata_digest = %metadata_digest, "Data committed");

    if quiet {
        println!("{metadata_digest}");
    } else {
        println!("{}", "Data committed".green().bold());
        println!();
        println!("   {} {metadata_digest}", "Metadata digest:".dimmed());
        println!("   {} {data_digest}", "Data digest:".dimmed());
        if let Some(id) = request_id {
            println!("   {} {id} (consumed)", "Request:".dimmed());
        }
    }
    Ok(())
}

/// Check `file` against the commitment for the metadata in `metadata_path`.
pub fn authenticate(state: &Path, metadata_path: &Path, file: &Path, quiet: bool) -> Result<()> {
    let metadata = read_metadata(metadata_path)?;
    let content = read_file(file)?;
    let registry = load_registry(state)?;

    if registry.authenticate(&metadata, &content) {
        info!(metadata_digest = %metadata.digest(), "Data authentic");
        if !quiet {
            println!();
            println!("{}", "╔════════════════════════════════════════╗".green());
            println!("{}", "║              AUTHENTIC                 ║".green().bold());
            println!("{}", "╚════════════════════════════════════════╝".green());
            println!();
            println!("   {} {}", "Metadata digest:".dimmed(), metadata.digest());
        }
        Ok(())
    } else {
        warn!(metadata_digest = %metadata.digest(), "Data not authentic");
        if !quiet {
            println!();
            println!("{}", "╔════════════════════════════════════════╗".red());
            println!("{}", "║            NOT AUTHENTIC               ║".red().bold());
            println!("{}", "╚════════════════════════════════════════╝".red());
            println!();
            match registry.get_data_digest(&metadata) {
                Ok(expected) => {
                    println!("   {} {expected}", "Committed digest:".dimmed());
                    println!(
                        "   {} {}",
                        "Candidate digest:".dimmed(),
                        authentichain_core::data_digest(&content, registry.data_encoding())
                    );
                }
                Err(_) => println!("   {}", "Nothing committed under this metadata".red()),
            }
        }
        Err(NotAuthentic.into())
    }
}
