//! Verification request commands: open, fulfill, status.

use std::path::Path;

use anyhow::{Context, Result};
use authentichain_core::{
    parse_u256, unix_now, Address, CallContext, RequestId, RequestState, Verdict, U256,
};
use colored::Colorize;
use tracing::info;

use crate::utils::{format_timestamp, load_registry, save_registry};

/// Open a verification request as `caller`, paying `value`.
pub fn open(state: &Path, caller: Address, value: U256, quiet: bool) -> Result<()> {
    let mut registry = load_registry(state)?;
    let ctx = CallContext::now(caller).with_value(value);

    let id = registry
        .request_verification(&ctx)
        .context("Request failed")?;
    save_registry(state, &registry)?;

    info!(request_id = %id, requester = %caller, "Request opened");

    if quiet {
        println!("{id}");
    } else {
        println!("{}", "Verification request opened".green().bold());
        println!("   {} {id}", "Request ID:".dimmed());
        println!("   {} {caller}", "Requester:".dimmed());
        println!("   {} {value}", "Paid:".dimmed());
    }
    Ok(())
}

/// A verdict argument: a `0x`-prefixed word is passed to the registry as raw
/// bytes, anything else is a numeric code.
enum VerdictArg {
    Word(Vec<u8>),
    Code(Verdict),
}

fn parse_verdict_arg(raw: &str) -> Result<VerdictArg> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex_part) => {
            let word = hex::decode(hex_part)
                .with_context(|| format!("Invalid verdict word '{raw}'"))?;
            Ok(VerdictArg::Word(word))
        }
        None => Ok(VerdictArg::Code(Verdict(parse_u256(raw)?))),
    }
}

/// Deliver a verdict for request `id` as `caller`.
pub fn fulfill(state: &Path, caller: Address, id: RequestId, verdict: &str, quiet: bool) -> Result<()> {
    let verdict = parse_verdict_arg(verdict)?;
    let mut registry = load_registry(state)?;
    let ctx = CallContext::now(caller);

    let verdict = match verdict {
        VerdictArg::Word(word) => {
            registry
                .fulfill_encoded(&ctx, id, &word)
                .context("Fulfill failed")?;
            Verdict::from_word(&word)?
        }
        VerdictArg::Code(verdict) => {
            registry
                .fulfill(&ctx, id, verdict)
                .context("Fulfill failed")?;
            verdict
        }
    };
    save_registry(state, &registry)?;

    if !quiet {
        let outcome = if verdict.is_accepted() {
            "accepted".green()
        } else {
            "rejected".red()
        };
        println!("{} {id}", "Fulfilled request".bold());
        println!("   {} {verdict} ({outcome})", "Verdict:".dimmed());
    }
    Ok(())
}

/// Show the current state of request `id`.
pub fn status(state: &Path, id: RequestId, quiet: bool) -> Result<()> {
    let registry = load_registry(state)?;
    let request = registry.request(id)?;
    let effective = registry.request_state(id, unix_now())?;

    if quiet {
        println!("{effective}");
        return Ok(());
    }

    let rendered = match effective {
        RequestState::Pending => effective.to_string().yellow(),
        RequestState::Fulfilled { verdict } | RequestState::Consumed { verdict }
            if verdict.is_accepted() =>
        {
            effective.to_string().green()
        }
        _ => effective.to_string().red(),
    };

    println!("{} {id}", "Request".bold());
    println!("   {} {}", "Requester:".dimmed(), request.requester);
    println!("   {} {rendered}", "State:".dimmed());
    println!(
        "   {} {}",
        "Opened:".dimmed(),
        format_timestamp(request.created_at)
    );
    if let Some(fulfilled_at) = request.fulfilled_at {
        println!(
            "   {} {}",
            "Fulfilled:".dimmed(),
            format_timestamp(fulfilled_at)
        );
    }
    Ok(())
}
