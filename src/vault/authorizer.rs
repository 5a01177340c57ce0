//! Transaction authorizer
//!
//! Computes the canonical digest of a proposed action and checks a bundle
//! of recoverable signatures against the signer registry.
//!
//! Digest layout:
//!
//! ```text
//! action_hash = SHA256(destination || value_be16 || payload_len_be8 || payload || sequence_be8)
//! digest      = SHA256(DOMAIN_TAG || chain_id_be8 || vault || action_hash)
//! ```
//!
//! Both layers are plain SHA-256 over fixed-width fields, so any client can
//! recompute the digest it is asked to sign.

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::collections::HashSet;

use crate::crypto::{Address, Digest, RecoverableSig};
use crate::vault::error::VaultError;
use crate::vault::registry::SignerRegistry;

/// Domain separation prefix folded into every digest
pub const DOMAIN_TAG: &[u8] = b"\x19multisig-vault:v1";

/// Default chain ID (for replay protection)
pub const DEFAULT_CHAIN_ID: u64 = 1;

/// Execution domain a digest is bound to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainContext {
    pub chain_id: u64,
    pub vault: Address,
}

impl DomainContext {
    pub fn new(chain_id: u64, vault: Address) -> Self {
        Self { chain_id, vault }
    }
}

/// The unit that gets digested, signed and executed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub destination: Address,
    pub value: u128,
    #[serde(with = "hex_bytes")]
    pub payload: Vec<u8>,
    pub sequence: u64,
}

impl ActionRequest {
    pub fn new(destination: Address, value: u128, payload: Vec<u8>, sequence: u64) -> Self {
        Self {
            destination,
            value,
            payload,
            sequence,
        }
    }

    /// Hash of the action fields alone, without domain binding
    pub fn action_hash(&self) -> Digest {
        let mut hasher = Sha256::new();
        hasher.update(self.destination.as_bytes());
        hasher.update(self.value.to_be_bytes());
        hasher.update((self.payload.len() as u64).to_be_bytes());
        hasher.update(&self.payload);
        hasher.update(self.sequence.to_be_bytes());

        let mut out = [0u8; 32];
        out.copy_from_slice(&hasher.finalize());
        Digest(out)
    }

    /// The value signers must sign for this action in `domain`
    pub fn digest(&self, domain: &DomainContext) -> Digest {
        digest(self, domain)
    }
}

/// Canonical domain-wrapped digest of `request`
pub fn digest(request: &ActionRequest, domain: &DomainContext) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(DOMAIN_TAG);
    hasher.update(domain.chain_id.to_be_bytes());
    hasher.update(domain.vault.as_bytes());
    hasher.update(request.action_hash().as_bytes());

    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    Digest(out)
}

/// Check that `bundle` carries a quorum of distinct registered signers over `digest`
///
/// Signature order is irrelevant. Signatures that fail to recover, recover
/// to a non-signer, or repeat an identity already counted are skipped.
/// Returns the counted signers as soon as the threshold is reached.
pub fn verify_quorum(
    digest: &Digest,
    bundle: &[RecoverableSig],
    registry: &SignerRegistry,
) -> Result<Vec<Address>, VaultError> {
    let need = registry.threshold();
    if bundle.len() < need {
        return Err(VaultError::InsufficientSignatures {
            have: bundle.len(),
            need,
        });
    }

    let mut counted: HashSet<Address> = HashSet::with_capacity(need);
    let mut approvers = Vec::with_capacity(need);

    for (position, sig) in bundle.iter().enumerate() {
        let signer = match sig.recover(digest) {
            Ok(signer) => signer,
            Err(e) => {
                log::debug!("Signature {} skipped: {}", position, e);
                continue;
            }
        };

        if !registry.is_signer(&signer) {
            log::debug!("Signature {} skipped: {} is not a signer", position, signer);
            continue;
        }
        if !counted.insert(signer) {
            log::debug!("Signature {} skipped: {} already counted", position, signer);
            continue;
        }

        approvers.push(signer);
        if approvers.len() == need {
            return Ok(approvers);
        }
    }

    Err(VaultError::InvalidSignatures {
        valid: approvers.len(),
        need,
    })
}

/// Hex (de)serialization for raw payload bytes
mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        hex::decode(text.strip_prefix("0x").unwrap_or(&text)).map_err(serde::de::Error::custom)
    }
}
