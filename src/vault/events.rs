//! Events emitted by the vault

use serde::{Deserialize, Serialize};

use crate::crypto::{Address, Digest};

/// An entry in the vault's append-only event log
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum VaultEvent {
    SetupCompleted {
        signers: Vec<Address>,
        threshold: usize,
    },
    SignerAdded {
        operator: Address,
        signer: Address,
        new_threshold: usize,
    },
    SignerRemoved {
        operator: Address,
        signer: Address,
    },
    ThresholdUpdated {
        operator: Address,
        new_threshold: usize,
    },
    TransactionExecuted {
        executor: Address,
        digest: Digest,
    },
}

impl VaultEvent {
    pub fn name(&self) -> &'static str {
        match self {
            VaultEvent::SetupCompleted { .. } => "SetupCompleted",
            VaultEvent::SignerAdded { .. } => "SignerAdded",
            VaultEvent::SignerRemoved { .. } => "SignerRemoved",
            VaultEvent::ThresholdUpdated { .. } => "ThresholdUpdated",
            VaultEvent::TransactionExecuted { .. } => "TransactionExecuted",
        }
    }
}
