//! Error taxonomy for vault operations
//!
//! Every failure aborts the whole invocation. The kind tells a caller
//! whether resubmitting can help.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::{Address, Digest};
use crate::vault::host::CallFailure;

/// Errors related to vault authorization and governance
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    #[error("Incorrect threshold {threshold} for {signers} signer(s)")]
    IncorrectThreshold { threshold: usize, signers: usize },
    #[error("Incorrect signer: {0}")]
    IncorrectSigner(Address),
    #[error("Unauthorized caller: {0}")]
    Unauthorized(Address),
    #[error("Insufficient signatures: have {have}, need {need}")]
    InsufficientSignatures { have: usize, need: usize },
    #[error("Invalid signatures: {valid} distinct valid signer(s), need {need}")]
    InvalidSignatures { valid: usize, need: usize },
    #[error("Invalid nonce: expected {expected}, got {got}")]
    InvalidNonce { expected: u64, got: u64 },
    #[error("Signer already exists: {0}")]
    SignerAlreadyExists(Address),
    #[error("Signer not found: {0}")]
    SignerNotFound(Address),
    #[error("Transaction already executed: {0}")]
    TransactionAlreadyExecuted(Digest),
    #[error("Execution failed: {0}")]
    ExecutionFailed(#[from] CallFailure),
}

/// Fieldless discriminant of a [`VaultError`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    IncorrectThreshold,
    IncorrectSigner,
    Unauthorized,
    InsufficientSignatures,
    InvalidSignatures,
    InvalidNonce,
    SignerAlreadyExists,
    SignerNotFound,
    TransactionAlreadyExecuted,
    ExecutionFailed,
}

impl VaultError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VaultError::IncorrectThreshold { .. } => ErrorKind::IncorrectThreshold,
            VaultError::IncorrectSigner(_) => ErrorKind::IncorrectSigner,
            VaultError::Unauthorized(_) => ErrorKind::Unauthorized,
            VaultError::InsufficientSignatures { .. } => ErrorKind::InsufficientSignatures,
            VaultError::InvalidSignatures { .. } => ErrorKind::InvalidSignatures,
            VaultError::InvalidNonce { .. } => ErrorKind::InvalidNonce,
            VaultError::SignerAlreadyExists(_) => ErrorKind::SignerAlreadyExists,
            VaultError::SignerNotFound(_) => ErrorKind::SignerNotFound,
            VaultError::TransactionAlreadyExecuted(_) => ErrorKind::TransactionAlreadyExecuted,
            VaultError::ExecutionFailed(_) => ErrorKind::ExecutionFailed,
        }
    }

    /// Whether resubmitting (new sequence number, more signatures) can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidNonce | ErrorKind::InsufficientSignatures
        )
    }
}
