//! Multisig Vault: a quorum-authorized account in Rust
//!
//! This crate provides an on-ledger authorization engine featuring:
//! - Canonical, domain-separated action digests (SHA-256)
//! - Recoverable ECDSA signatures (secp256k1)
//! - M-of-N quorum verification over distinct registered signers
//! - Replay protection through a strict sequence counter and executed-digest record
//! - Signer-set governance through the same quorum path as ordinary actions
//! - All-or-nothing execution
//! - JSON persistence with backups
//!
//! See [`vault`] for a worked example.

pub mod cli;
pub mod crypto;
pub mod storage;
pub mod vault;

// Re-export commonly used types
pub use crypto::{Address, Digest, KeyPair, RecoverableSig};
pub use storage::{Storage, StorageConfig};
pub use vault::{
    AccountHost, ActionRequest, DomainContext, ErrorKind, ExecutionReceipt, GovernanceCall, Host,
    SignerRegistry, Vault, VaultError, VaultEvent,
};
