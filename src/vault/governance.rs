//! Governance payload codec
//!
//! Signer-set changes travel as the payload of an ordinary action whose
//! destination is the vault itself. A payload is
//! `selector(4) || signer(20) || new_threshold_be8`, where the selector is
//! the first four bytes of the SHA-256 of the operation signature.

use serde::{Deserialize, Serialize};

use crate::crypto::{sha256, Address};

/// Signature string for adding a signer
pub const ADD_SIGNER_SIGNATURE: &str = "addSignerAndSetThreshold(address,uint64)";
/// Signature string for removing a signer
pub const REMOVE_SIGNER_SIGNATURE: &str = "removeSignerAndSetThreshold(address,uint64)";

/// Encoded governance payload length
pub const GOVERNANCE_PAYLOAD_LEN: usize = 4 + 20 + 8;

/// A decoded governance command
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GovernanceCall {
    AddSigner { signer: Address, new_threshold: u64 },
    RemoveSigner { signer: Address, new_threshold: u64 },
}

/// Four-byte selector of an operation signature
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = sha256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

impl GovernanceCall {
    pub fn signature(&self) -> &'static str {
        match self {
            GovernanceCall::AddSigner { .. } => ADD_SIGNER_SIGNATURE,
            GovernanceCall::RemoveSigner { .. } => REMOVE_SIGNER_SIGNATURE,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let (signer, new_threshold) = match self {
            GovernanceCall::AddSigner {
                signer,
                new_threshold,
            }
            | GovernanceCall::RemoveSigner {
                signer,
                new_threshold,
            } => (signer, new_threshold),
        };

        let mut payload = Vec::with_capacity(GOVERNANCE_PAYLOAD_LEN);
        payload.extend_from_slice(&selector(self.signature()));
        payload.extend_from_slice(signer.as_bytes());
        payload.extend_from_slice(&new_threshold.to_be_bytes());
        payload
    }

    /// Decode a payload; `None` if it is not a recognized command
    pub fn decode(payload: &[u8]) -> Option<Self> {
        if payload.len() != GOVERNANCE_PAYLOAD_LEN {
            return None;
        }

        let mut signer = [0u8; 20];
        signer.copy_from_slice(&payload[4..24]);
        let signer = Address(signer);

        let mut threshold = [0u8; 8];
        threshold.copy_from_slice(&payload[24..]);
        let new_threshold = u64::from_be_bytes(threshold);

        let head = &payload[..4];
        if head == selector(ADD_SIGNER_SIGNATURE) {
            Some(GovernanceCall::AddSigner {
                signer,
                new_threshold,
            })
        } else if head == selector(REMOVE_SIGNER_SIGNATURE) {
            Some(GovernanceCall::RemoveSigner {
                signer,
                new_threshold,
            })
        } else {
            None
        }
    }
}
