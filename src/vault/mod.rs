//! Quorum-authorized multisig vault
//!
//! A fixed group of signers jointly controls an account: any action (an
//! outbound call, or a change to the group itself) runs only once a quorum
//! of distinct registered signers has signed its digest, and runs at most
//! once.
//!
//! # Example
//!
//! ```rust
//! use multisig_vault::crypto::KeyPair;
//! use multisig_vault::vault::{AccountHost, ActionRequest, Vault, DEFAULT_CHAIN_ID};
//!
//! let keys: Vec<KeyPair> = (0..3).map(|_| KeyPair::generate()).collect();
//! let signers: Vec<_> = keys.iter().map(|k| k.address()).collect();
//! let deployer = KeyPair::generate().address();
//!
//! // A 2-of-3 vault holding 100 units
//! let mut vault = Vault::deploy(&deployer, 0, DEFAULT_CHAIN_ID, &signers, 2).unwrap();
//! let mut host = AccountHost::new();
//! host.deposit(vault.address(), 100).unwrap();
//!
//! // Pay 40 to the first signer, approved by two of them
//! let request = ActionRequest::new(signers[0], 40, vec![], vault.sequence() + 1);
//! let digest = vault.digest(&request);
//! let signatures = vec![keys[1].sign(&digest).unwrap(), keys[2].sign(&digest).unwrap()];
//!
//! vault.execute(&mut host, deployer, &request, &signatures).unwrap();
//! assert_eq!(host.balance(&signers[0]), 40);
//! assert_eq!(vault.sequence(), 1);
//! ```

pub mod authorizer;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod governance;
pub mod host;
pub mod registry;
pub mod sequence;

pub use authorizer::{
    digest, verify_quorum, ActionRequest, DomainContext, DEFAULT_CHAIN_ID, DOMAIN_TAG,
};
pub use dispatcher::{ExecutionReceipt, Vault};
pub use error::{ErrorKind, VaultError};
pub use events::VaultEvent;
pub use governance::{selector, GovernanceCall, GOVERNANCE_PAYLOAD_LEN};
pub use host::{AccountHost, CallFailure, CallTarget, Host};
pub use registry::SignerRegistry;
pub use sequence::{SequenceLedger, SEQUENCE_ORIGIN};
