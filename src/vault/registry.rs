//! Signer registry
//!
//! Owns the set of authorized signers and the quorum threshold. Signers
//! live in a dense slot arena with an index map, so membership checks and
//! removals are O(1). Removal swaps the last slot into the hole, which means
//! enumeration order is not stable across removals.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::crypto::Address;
use crate::vault::error::VaultError;

/// Signer set plus threshold. Invariant: `1 <= threshold <= len()`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RegistryRecord", into = "RegistryRecord")]
pub struct SignerRegistry {
    /// Enumerable signer slots
    slots: Vec<Address>,
    /// Signer -> slot position
    index: HashMap<Address, usize>,
    /// Distinct signatures required to authorize an action
    threshold: usize,
}

/// On-disk form; the index is derived
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistryRecord {
    pub signers: Vec<Address>,
    pub threshold: usize,
}

impl SignerRegistry {
    /// Build the initial registry
    ///
    /// # Errors
    /// - `IncorrectThreshold` if `threshold` is 0 or exceeds the signer count
    /// - `IncorrectSigner` if a signer is the zero identity or the vault itself
    /// - `SignerAlreadyExists` if a signer is listed twice
    pub fn initialize(
        signers: &[Address],
        threshold: usize,
        vault: &Address,
    ) -> Result<Self, VaultError> {
        check_threshold(threshold, signers.len())?;

        let mut registry = Self {
            slots: Vec::with_capacity(signers.len()),
            index: HashMap::with_capacity(signers.len()),
            threshold,
        };

        for signer in signers {
            check_signer(signer, vault)?;
            if registry.is_signer(signer) {
                return Err(VaultError::SignerAlreadyExists(*signer));
            }
            registry.insert(*signer);
        }

        Ok(registry)
    }

    /// Add `signer` and move the threshold to `new_threshold`
    pub fn add_signer(
        &mut self,
        signer: Address,
        new_threshold: usize,
        vault: &Address,
    ) -> Result<(), VaultError> {
        check_signer(&signer, vault)?;
        if self.is_signer(&signer) {
            return Err(VaultError::SignerAlreadyExists(signer));
        }
        check_threshold(new_threshold, self.len() + 1)?;

        self.insert(signer);
        self.threshold = new_threshold;
        Ok(())
    }

    /// Remove `signer` and move the threshold to `new_threshold`
    pub fn remove_signer(&mut self, signer: Address, new_threshold: usize) -> Result<(), VaultError> {
        let slot = *self
            .index
            .get(&signer)
            .ok_or(VaultError::SignerNotFound(signer))?;
        check_threshold(new_threshold, self.len() - 1)?;

        // Swap the last slot into the hole
        self.slots.swap_remove(slot);
        self.index.remove(&signer);
        if let Some(moved) = self.slots.get(slot) {
            self.index.insert(*moved, slot);
        }
        self.threshold = new_threshold;
        Ok(())
    }

    pub fn is_signer(&self, address: &Address) -> bool {
        self.index.contains_key(address)
    }

    /// Current signers, in no meaningful order
    pub fn signers(&self) -> &[Address] {
        &self.slots
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Get description like "2-of-3"
    pub fn description(&self) -> String {
        format!("{}-of-{}", self.threshold, self.slots.len())
    }

    fn insert(&mut self, signer: Address) {
        self.index.insert(signer, self.slots.len());
        self.slots.push(signer);
    }
}

fn check_threshold(threshold: usize, signers: usize) -> Result<(), VaultError> {
    if threshold == 0 || threshold > signers {
        return Err(VaultError::IncorrectThreshold { threshold, signers });
    }
    Ok(())
}

fn check_signer(signer: &Address, vault: &Address) -> Result<(), VaultError> {
    if signer.is_zero() || signer == vault {
        return Err(VaultError::IncorrectSigner(*signer));
    }
    Ok(())
}

impl From<SignerRegistry> for RegistryRecord {
    fn from(registry: SignerRegistry) -> Self {
        Self {
            signers: registry.slots,
            threshold: registry.threshold,
        }
    }
}

impl TryFrom<RegistryRecord> for SignerRegistry {
    type Error = VaultError;

    fn try_from(record: RegistryRecord) -> Result<Self, Self::Error> {
        // The vault identity is not in the record; `Vault` checks it on load
        SignerRegistry::initialize(&record.signers, record.threshold, &Address::ZERO)
    }
}
