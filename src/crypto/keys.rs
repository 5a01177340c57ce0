//! ECDSA key management for vault signers
//!
//! Provides key pair generation and recoverable signing using the
//! secp256k1 elliptic curve. Signatures carry their recovery id so the
//! signer's identity can be recovered from the digest alone.

use rand::rngs::OsRng;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::address::Address;
use super::hash::Digest;

/// Length of a serialized recoverable signature: recovery id + r + s
pub const RECOVERABLE_SIG_LEN: usize = 65;

/// Errors that can occur during key operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Invalid digest")]
    InvalidDigest,
    #[error("Secp256k1 error: {0}")]
    Secp256k1Error(#[from] secp256k1::Error),
}

/// A key pair consisting of a private key and its corresponding public key
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from an existing secret key
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from a hex-encoded private key
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, KeyError> {
        let raw = hex_key.strip_prefix("0x").unwrap_or(hex_key);
        let bytes = hex::decode(raw).map_err(|_| KeyError::InvalidPrivateKey)?;
        let secret_key =
            SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Get the private key as a hex string
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Get the public key as a hex string (compressed format)
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize())
    }

    /// The identity this key signs as
    pub fn address(&self) -> Address {
        Address::from_public_key(&self.public_key)
    }

    /// Sign a digest, producing a signature the signer can be recovered from
    pub fn sign(&self, digest: &Digest) -> Result<RecoverableSig, KeyError> {
        sign_recoverable(&self.secret_key, digest)
    }
}

/// A recoverable ECDSA signature: `[recovery_id, r, s]`
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct RecoverableSig(pub [u8; RECOVERABLE_SIG_LEN]);

impl RecoverableSig {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; RECOVERABLE_SIG_LEN] =
            bytes.try_into().map_err(|_| KeyError::InvalidSignature)?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; RECOVERABLE_SIG_LEN] {
        &self.0
    }

    /// Recover the identity that produced this signature over `digest`
    pub fn recover(&self, digest: &Digest) -> Result<Address, KeyError> {
        recover_signer(digest, self)
    }
}

impl fmt::Display for RecoverableSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for RecoverableSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecoverableSig({})", self)
    }
}

impl FromStr for RecoverableSig {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(raw).map_err(|_| KeyError::InvalidSignature)?;
        Self::from_slice(&bytes)
    }
}

impl From<RecoverableSig> for String {
    fn from(sig: RecoverableSig) -> Self {
        sig.to_string()
    }
}

impl TryFrom<String> for RecoverableSig {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Parse a public key from hex string
pub fn public_key_from_hex(hex_key: &str) -> Result<PublicKey, KeyError> {
    let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPublicKey)?;
    PublicKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPublicKey)
}

/// Sign a digest with a secret key
pub fn sign_recoverable(
    secret_key: &SecretKey,
    digest: &Digest,
) -> Result<RecoverableSig, KeyError> {
    let secp = Secp256k1::new();
    let message = Message::from_digest_slice(digest.as_bytes())?;
    let signature = secp.sign_ecdsa_recoverable(&message, secret_key);
    let (recovery_id, compact) = signature.serialize_compact();

    let mut bytes = [0u8; RECOVERABLE_SIG_LEN];
    bytes[0] = recovery_id.to_i32() as u8;
    bytes[1..].copy_from_slice(&compact);
    Ok(RecoverableSig(bytes))
}

/// Recover the signer identity from a signature over `digest`
pub fn recover_signer(digest: &Digest, sig: &RecoverableSig) -> Result<Address, KeyError> {
    let secp = Secp256k1::new();
    let message = Message::from_digest_slice(digest.as_bytes())?;

    let recovery_id =
        RecoveryId::from_i32(sig.0[0] as i32).map_err(|_| KeyError::InvalidSignature)?;
    let signature = RecoverableSignature::from_compact(&sig.0[1..], recovery_id)
        .map_err(|_| KeyError::InvalidSignature)?;

    let public_key = secp
        .recover_ecdsa(&message, &signature)
        .map_err(|_| KeyError::InvalidSignature)?;
    Ok(Address::from_public_key(&public_key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_pair_generation() {
        let kp = KeyPair::generate();
        assert_eq!(kp.private_key_hex().len(), 64);
        assert_eq!(kp.public_key_hex().len(), 66);
        assert!(!kp.address().is_zero());
    }

    #[test]
    fn test_sign_and_recover() {
        let kp = KeyPair::generate();
        let digest = Digest::of(b"Hello, vault!");

        let sig = kp.sign(&digest).unwrap();
        assert_eq!(sig.recover(&digest).unwrap(), kp.address());
    }

    #[test]
    fn test_recover_over_other_digest_yields_other_identity() {
        let kp = KeyPair::generate();
        let sig = kp.sign(&Digest::of(b"one")).unwrap();

        // Recovery still succeeds, but names somebody else
        match sig.recover(&Digest::of(b"two")) {
            Ok(address) => assert_ne!(address, kp.address()),
            Err(e) => assert_eq!(e, KeyError::InvalidSignature),
        }
    }

    #[test]
    fn test_malformed_signature() {
        let digest = Digest::of(b"payload");
        let mut bytes = [0u8; RECOVERABLE_SIG_LEN];
        bytes[0] = 9;
        assert!(RecoverableSig(bytes).recover(&digest).is_err());
        assert!(RecoverableSig::from_slice(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_key_pair_from_hex() {
        let kp1 = KeyPair::generate();
        let kp2 = KeyPair::from_private_key_hex(&kp1.private_key_hex()).unwrap();
        assert_eq!(kp1.public_key_hex(), kp2.public_key_hex());
        assert_eq!(kp1.address(), kp2.address());
        assert_eq!(
            Address::from_public_key(&public_key_from_hex(&kp1.public_key_hex()).unwrap()),
            kp1.address()
        );
    }

    #[test]
    fn test_signature_hex_round_trip() {
        let kp = KeyPair::generate();
        let sig = kp.sign(&Digest::of(b"x")).unwrap();
        assert_eq!(sig.to_string().parse::<RecoverableSig>().unwrap(), sig);
    }
}
