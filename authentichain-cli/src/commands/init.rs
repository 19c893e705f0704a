//! Init command implementation.

use std::path::Path;

use anyhow::{bail, Result};
use authentichain_core::{Address, DataEncoding, Registry, RegistryConfig, RequestGate, U256};
use colored::Colorize;
use tracing::info;

use crate::utils::save_registry;

pub struct InitOptions {
    pub owner: Address,
    pub callback: Address,
    pub fee: U256,
    pub ttl: Option<u64>,
    pub ungated: bool,
    pub abi_string_data: bool,
    pub force: bool,
}

impl InitOptions {
    fn registry_config(&self) -> RegistryConfig {
        let mut config = RegistryConfig::new(self.owner, self.callback).with_fee(self.fee);
        if self.ungated {
            config.gate = RequestGate::Disabled;
        }
        if let Some(ttl) = self.ttl {
            config = config.with_request_ttl(ttl);
        }
        if self.abi_string_data {
            config = config.with_data_encoding(DataEncoding::AbiString);
        }
        config
    }
}

/// Execute the init command.
pub fn execute(state: &Path, options: InitOptions, quiet: bool) -> Result<()> {
    if state.exists() && !options.force {
        bail!(
            "State file {} already exists (use --force to overwrite)",
            state.display()
        );
    }

    let config = options.registry_config();
    let registry = Registry::new(config.clone());
    save_registry(state, &registry)?;

    info!(path = %state.display(), owner = %config.owner, "Registry initialized");

    if !quiet {
        println!("{}", "Registry initialized".green().bold());
        println!();
        println!("   {} {}", "State file:".dimmed(), state.display());
        println!("   {} {}", "Owner:".dimmed(), config.owner);
        println!("   {} {}", "Callback:".dimmed(), config.authorized_callback);
        println!("   {} {}", "Fee:".dimmed(), config.fee);
        println!("   {} {:?}", "Gate:".dimmed(), config.gate);
        println!("   {} {:?}", "Data encoding:".dimmed(), config.data_encoding);
        match config.request_ttl_secs {
            Some(ttl) => println!("   {} {ttl}s", "Request TTL:".dimmed()),
            None => println!("   {} never", "Request TTL:".dimmed()),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> InitOptions {
        InitOptions {
            owner: Address::new([1u8; 20]),
            callback: Address::new([2u8; 20]),
            fee: U256::from(5u64),
            ttl: None,
            ungated: false,
            abi_string_data: false,
            force: false,
        }
    }

    #[test]
    fn test_registry_config_from_options() {
        let config = options().registry_config();
        assert_eq!(config.gate, RequestGate::Required);
        assert_eq!(config.fee, U256::from(5u64));
        assert_eq!(config.request_ttl_secs, None);

        let config = InitOptions {
            ungated: true,
            ttl: Some(60),
            abi_string_data: true,
            ..options()
        }
        .registry_config();
        assert_eq!(config.gate, RequestGate::Disabled);
        assert_eq!(config.request_ttl_secs, Some(60));
        assert_eq!(config.data_encoding, DataEncoding::AbiString);
    }

    #[test]
    fn test_refuses_to_overwrite_without_force() {
        let dir = tempfile::TempDir::new().unwrap();
        let state = dir.path().join("registry.state");

        execute(&state, options(), true).unwrap();
        assert!(execute(&state, options(), true).is_err());
        execute(&state, InitOptions { force: true, ..options() }, true).unwrap();
    }
}
