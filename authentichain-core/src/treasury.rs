use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{RegistryError, Result};
use crate::primitives::{u256_serde, Address, U256};

/// A completed withdrawal: the whole balance moved to the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Withdrawal {
    pub to: Address,
    #[serde(with = "u256_serde")]
    pub amount: U256,
    pub timestamp: u64,
}

/// Fee accounting. The balance only grows through collected fees and only
/// shrinks through an owner withdrawal of everything held.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Treasury {
    owner: Address,
    #[serde(with = "u256_serde")]
    fee: U256,
    #[serde(with = "u256_serde")]
    balance: U256,
}

impl Treasury {
    pub fn new(owner: Address, fee: U256) -> Self {
        Self {
            owner,
            fee,
            balance: U256::zero(),
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn fee(&self) -> U256 {
        self.fee
    }

    pub fn balance(&self) -> U256 {
        self.balance
    }

    /// Accept a payment of at least the configured fee. The entire payment
    /// is kept; a payment the balance cannot hold is refused.
    pub fn collect(&mut self, payment: U256) -> Result<()> {
        if payment < self.fee {
            return Err(RegistryError::InsufficientFee {
                required: self.fee,
                provided: payment,
            });
        }
        self.balance = self
            .balance
            .checked_add(payment)
            .ok_or(RegistryError::BalanceOverflow {
                balance: self.balance,
                payment,
            })?;
        Ok(())
    }

    /// Move the entire balance to the owner. An empty treasury yields a
    /// zero-amount withdrawal.
    pub fn withdraw(&mut self, caller: Address, now: u64) -> Result<Withdrawal> {
        if caller != self.owner {
            warn!(caller = %caller, "Rejected withdrawal from non-owner");
            return Err(RegistryError::NotOwner);
        }

        let amount = std::mem::replace(&mut self.balance, U256::zero());
        info!(amount = %amount, to = %self.owner, "Treasury withdrawn");

        Ok(Withdrawal {
            to: self.owner,
            amount,
            timestamp: now,
        })
    }
}
