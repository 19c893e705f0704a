//! AuthentiChain CLI - Location-gated data commitment registry tool.

use std::path::PathBuf;

use anyhow::Result;
use authentichain_core::{parse_u256, Address, RequestId, U256};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod commands;
mod exit_codes;
mod utils;

use exit_codes::ExitCode;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Success
  1   General error
  64  Usage error (invalid arguments or values)
  65  Not authentic, or location verdict rejected
  66  Input file not found or unreadable
  69  Attestation unavailable
  74  I/O error writing output";

#[derive(Parser)]
#[command(name = "authentichain")]
#[command(author, version, about = "Location-gated data commitment registry", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    /// Registry state file (CBOR)
    #[arg(long, global = true, default_value = "authentichain.state")]
    state: PathBuf,

    /// Suppress user-facing output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new registry state file
    Init {
        /// Identity allowed to withdraw fees
        #[arg(long)]
        owner: Address,

        /// Identity allowed to deliver verdicts
        #[arg(long)]
        callback: Address,

        /// Fee required to open a verification request
        #[arg(long, default_value = "0", value_parser = parse_amount)]
        fee: U256,

        /// Requests older than this many seconds expire
        #[arg(long, value_name = "SECS")]
        ttl: Option<u64>,

        /// Commit without verification requests (no fee, no verdict check)
        #[arg(long)]
        ungated: bool,

        /// Hash data as an ABI-encoded string instead of raw bytes
        #[arg(long)]
        abi_string_data: bool,

        /// Overwrite an existing state file
        #[arg(long)]
        force: bool,
    },

    /// Compute commitment digests without touching any state
    #[command(subcommand)]
    Digest(DigestCommand),

    /// Open a verification request
    Request {
        #[command(flatten)]
        caller: CallerArg,

        /// Payment attached to the request
        #[arg(long, default_value = "0", value_parser = parse_amount)]
        value: U256,
    },

    /// Deliver a verdict for a pending request (authorized callback only)
    Fulfill {
        #[command(flatten)]
        caller: CallerArg,

        #[arg(value_name = "ID")]
        id: RequestId,

        /// Verdict code (0 = accepted), or a 0x-prefixed 32-byte word
        #[arg(value_name = "VERDICT")]
        verdict: String,
    },

    /// Show a request's current state
    Status {
        #[arg(value_name = "ID")]
        id: RequestId,
    },

    /// Commit a file's digest under capture metadata
    Commit {
        #[command(flatten)]
        caller: CallerArg,

        /// Metadata JSON file
        #[arg(long, value_name = "JSON")]
        metadata: PathBuf,

        /// File to commit
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Fulfilled verification request to consume
        #[arg(long)]
        request_id: Option<RequestId>,
    },

    /// Check a file against the digest committed under its metadata
    Authenticate {
        /// Metadata JSON file
        #[arg(long, value_name = "JSON")]
        metadata: PathBuf,

        /// Candidate file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Move the collected fees to the owner
    Withdraw {
        #[command(flatten)]
        caller: CallerArg,
    },

    /// Print the registry event log as JSON
    Events,

    /// Run a complete in-memory flow against the mock attestor
    Simulate {
        /// Metadata JSON file
        #[arg(long, value_name = "JSON")]
        metadata: PathBuf,

        /// File to commit
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Verdict the mock attestor returns (0 = accepted)
        #[arg(long, default_value_t = 0)]
        verdict: u64,
    },
}

#[derive(Subcommand)]
enum DigestCommand {
    /// Keccak-256 of the ABI-encoded metadata (the commitment key)
    Metadata {
        #[arg(value_name = "JSON")]
        metadata: PathBuf,
    },

    /// Keccak-256 of a file's contents
    Data {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Hash the contents as an ABI-encoded string
        #[arg(long)]
        abi_string: bool,
    },
}

#[derive(Args)]
struct CallerArg {
    /// Address the call is made from
    #[arg(long, value_name = "ADDRESS")]
    caller: Address,
}

fn parse_amount(s: &str) -> std::result::Result<U256, String> {
    parse_u256(s).map_err(|e| e.to_string())
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "authentichain=debug,authentichain_core=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let Cli {
        state,
        quiet,
        command,
        ..
    } = cli;

    match command {
        Commands::Init {
            owner,
            callback,
            fee,
            ttl,
            ungated,
            abi_string_data,
            force,
        } => commands::init::execute(
            &state,
            commands::init::InitOptions {
                owner,
                callback,
                fee,
                ttl,
                ungated,
                abi_string_data,
                force,
            },
            quiet,
        ),
        Commands::Digest(DigestCommand::Metadata { metadata }) => {
            commands::digest::metadata(&metadata, quiet)
        }
        Commands::Digest(DigestCommand::Data { file, abi_string }) => {
            commands::digest::data(&file, abi_string, quiet)
        }
        Commands::Request { caller, value } => {
            commands::request::open(&state, caller.caller, value, quiet)
        }
        Commands::Fulfill {
            caller,
            id,
            verdict,
        } => commands::request::fulfill(&state, caller.caller, id, &verdict, quiet),
        Commands::Status { id } => commands::request::status(&state, id, quiet),
        Commands::Commit {
            caller,
            metadata,
            file,
            request_id,
        } => commands::commit::commit(&state, caller.caller, &metadata, &file, request_id, quiet),
        Commands::Authenticate { metadata, file } => {
            commands::commit::authenticate(&state, &metadata, &file, quiet)
        }
        Commands::Withdraw { caller } => commands::treasury::withdraw(&state, caller.caller, quiet),
        Commands::Events => commands::treasury::events(&state),
        Commands::Simulate {
            metadata,
            file,
            verdict,
        } => commands::simulate::execute(&metadata, &file, verdict, quiet).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help and --version
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(exit_codes::USAGE_ERROR);
        }
    };
    init_tracing(cli.verbose);

    let exit = match run(cli).await {
        Ok(()) => ExitCode::success(),
        Err(err) => ExitCode::from_anyhow(&err),
    };

    if let Some(message) = &exit.message {
        eprintln!("{} {}", "Error:".red().bold(), message);
    }
    std::process::exit(exit.code);
}
