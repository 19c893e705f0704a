//! Withdraw and events commands.

use std::path::Path;

use anyhow::{Context, Result};
use authentichain_core::{Address, CallContext};
use colored::Colorize;

use crate::utils::{format_timestamp, load_registry, save_registry};

/// Move the whole balance to the owner.
pub fn withdraw(state: &Path, caller: Address, quiet: bool) -> Result<()> {
    let mut registry = load_registry(state)?;
    let withdrawal = registry
        .withdraw(&CallContext::now(caller))
        .context("Withdraw failed")?;
    save_registry(state, &registry)?;

    if quiet {
        println!("{}", withdrawal.amount);
    } else {
        println!("{}", "Fees withdrawn".green().bold());
        println!("   {} {}", "To:".dimmed(), withdrawal.to);
        println!("   {} {}", "Amount:".dimmed(), withdrawal.amount);
        println!("   {} {}", "At:".dimmed(), format_timestamp(withdrawal.timestamp));
    }
    Ok(())
}

/// Print the event log, oldest first, as pretty JSON.
pub fn events(state: &Path) -> Result<()> {
    let registry = load_registry(state)?;
    let json = serde_json::to_string_pretty(registry.events())
        .context("Failed to serialize event log")?;
    println!("{json}");
    Ok(())
}
