//! Cryptographic utilities for the vault
//!
//! This module provides:
//! - SHA-256 hashing and the `Digest` type
//! - 20-byte `Address` identities
//! - ECDSA key management with recoverable signatures (secp256k1)

pub mod address;
pub mod hash;
pub mod keys;

pub use address::Address;
pub use hash::{hash160, sha256, sha256_hex, Digest};
pub use keys::{
    public_key_from_hex, recover_signer, sign_recoverable, KeyError, KeyPair, RecoverableSig,
    RECOVERABLE_SIG_LEN,
};
