//! Simulate command implementation.
//!
//! Runs request, attestation, commit and authentication against an
//! in-memory registry with the mock attestor. Nothing is persisted.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use authentichain_core::{
    Address, AttestationClient, AttestationRelay, AttestationRequest, CallContext, Coordinates,
    Metadata, MockAttestation, Registry, RegistryConfig, SecretsRef, Verdict,
};
use colored::Colorize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::utils::{read_file, read_metadata, signed_degrees};

const OWNER: Address = Address::new([0xaa; 20]);
const CALLBACK: Address = Address::new([0xcb; 20]);
const REQUESTER: Address = Address::new([0xa1; 20]);

/// The capture position recorded in the metadata, or the origin when the
/// coordinates are not numeric.
fn claimed_position(metadata: &Metadata) -> Coordinates {
    let lat = signed_degrees(&metadata.gps_latitude, &metadata.gps_latitude_ref);
    let lng = signed_degrees(&metadata.gps_longitude, &metadata.gps_longitude_ref);
    match (lat, lng) {
        (Some(lat), Some(lng)) => Coordinates::new(lat, lng),
        _ => {
            warn!("Metadata coordinates are not numeric, using 0,0");
            Coordinates::new(0.0, 0.0)
        }
    }
}

fn step(n: u8, label: &str, quiet: bool) {
    if !quiet {
        println!("{} {}", format!("[{n}/4]").cyan().bold(), label);
    }
}

/// Execute the simulate command.
pub async fn execute(metadata_path: &Path, file: &Path, verdict: u64, quiet: bool) -> Result<()> {
    let metadata = read_metadata(metadata_path)?;
    let content = read_file(file)?;

    if !quiet {
        eprintln!(
            "{}",
            "Using MOCK attestation (verdicts are not real)".yellow()
        );
    }

    let registry = Arc::new(Mutex::new(Registry::new(RegistryConfig::new(OWNER, CALLBACK))));
    let attestor: Arc<dyn AttestationClient> =
        Arc::new(MockAttestation::new(Verdict::from(verdict)));
    let relay = AttestationRelay::new(attestor, registry.clone());

    step(1, "Opening verification request", quiet);
    let request_id = registry
        .lock()
        .await
        .request_verification(&CallContext::now(REQUESTER))?;
    if !quiet {
        println!("   {} {request_id}", "Request ID:".dimmed());
    }

    step(2, "Relaying location attestation", quiet);
    let position = claimed_position(&metadata);
    let request = AttestationRequest {
        request_id,
        cell_towers: serde_json::json!({ "considerIp": false, "cellTowers": [] }),
        reported: position,
        claimed: position,
    };
    let delivered = relay
        .relay(&request, &SecretsRef::default())
        .await
        .context("Attestation relay failed")?;
    if !quiet {
        let outcome = if delivered.is_accepted() {
            "accepted".green()
        } else {
            "rejected".red()
        };
        println!("   {} {delivered} ({outcome})", "Verdict:".dimmed());
    }

    step(3, "Committing data", quiet);
    let metadata_digest = registry
        .lock()
        .await
        .commit(
            &CallContext::now(REQUESTER),
            metadata.clone(),
            &content,
            Some(request_id),
        )
        .context("Commit failed")?;
    if !quiet {
        println!("   {} {metadata_digest}", "Metadata digest:".dimmed());
    }

    step(4, "Authenticating data", quiet);
    let authentic = registry.lock().await.authenticate(&metadata, &content);
    info!(request_id = %request_id, authentic, "Simulation complete");

    if quiet {
        println!("{metadata_digest}");
    } else {
        let result = if authentic {
            "AUTHENTIC".green().bold()
        } else {
            "NOT AUTHENTIC".red().bold()
        };
        println!("   {} {result}", "Result:".dimmed());
    }
    Ok(())
}
