//! Execution host
//!
//! The world an authorized action is dispatched into: native balances
//! plus any call targets registered at an address. Value moves only after
//! the target accepts the call, so a rejected call leaves balances as they
//! were.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::crypto::Address;

/// Why an outbound call failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallFailure {
    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: u128, need: u128 },
    #[error("Balance overflow: {balance} + {amount} exceeds u128")]
    BalanceOverflow { balance: u128, amount: u128 },
    #[error("Call rejected: {0}")]
    Rejected(String),
}

/// Where the dispatcher sends authorized calls
pub trait Host {
    /// Perform a call from `from` to `to`, moving `value` along with it
    fn call(
        &mut self,
        from: Address,
        to: Address,
        value: u128,
        payload: &[u8],
    ) -> Result<Vec<u8>, CallFailure>;
}

/// Code living at an address
///
/// A target that returns `Err` must leave its own state untouched.
pub trait CallTarget: Send {
    fn invoke(&mut self, caller: Address, value: u128, payload: &[u8])
        -> Result<Vec<u8>, CallFailure>;
}

/// In-memory host: a balance book plus registered call targets
#[derive(Default, Serialize, Deserialize)]
pub struct AccountHost {
    balances: HashMap<Address, u128>,
    #[serde(skip)]
    targets: HashMap<Address, Box<dyn CallTarget>>,
}

impl AccountHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` to `address`
    pub fn deposit(&mut self, address: Address, amount: u128) -> Result<u128, CallFailure> {
        let balance = self.balance(&address);
        let updated = balance
            .checked_add(amount)
            .ok_or(CallFailure::BalanceOverflow { balance, amount })?;
        self.balances.insert(address, updated);
        Ok(updated)
    }

    pub fn balance(&self, address: &Address) -> u128 {
        self.balances.get(address).copied().unwrap_or(0)
    }

    /// Install code at `address`
    pub fn register(&mut self, address: Address, target: Box<dyn CallTarget>) {
        self.targets.insert(address, target);
    }
}

impl Host for AccountHost {
    fn call(
        &mut self,
        from: Address,
        to: Address,
        value: u128,
        payload: &[u8],
    ) -> Result<Vec<u8>, CallFailure> {
        let have = self.balance(&from);
        if have < value {
            return Err(CallFailure::InsufficientBalance { have, need: value });
        }
        let moves = value > 0 && from != to;
        if moves {
            let balance = self.balance(&to);
            if balance.checked_add(value).is_none() {
                return Err(CallFailure::BalanceOverflow {
                    balance,
                    amount: value,
                });
            }
        }

        let output = match self.targets.get_mut(&to) {
            Some(target) => target.invoke(from, value, payload)?,
            None => Vec::new(),
        };

        if moves {
            self.balances.insert(from, have - value);
            self.deposit(to, value)?;
        }
        Ok(output)
    }
}

impl fmt::Debug for AccountHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountHost")
            .field("balances", &self.balances)
            .field("targets", &self.targets.keys().collect::<Vec<_>>())
            .finish()
    }
}
