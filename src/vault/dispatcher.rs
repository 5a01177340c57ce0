//! Execution dispatcher
//!
//! `Vault::execute` runs the whole authorization pipeline for one action:
//! replay check, quorum check, sequence check, mark-executed, dispatch.
//! Every step works on a staged copy of the vault state; the copy and its
//! events replace the live state only once the dispatch has succeeded, so
//! any failure leaves the vault exactly as it was.
//!
//! An action whose destination is the vault itself is never sent to the
//! host. Its payload must decode to a governance command, which is applied
//! to the staged signer registry.

use serde::{Deserialize, Serialize};

use crate::crypto::{Address, Digest, RecoverableSig};
use crate::vault::authorizer::{verify_quorum, ActionRequest, DomainContext};
use crate::vault::error::VaultError;
use crate::vault::events::VaultEvent;
use crate::vault::governance::GovernanceCall;
use crate::vault::host::{CallFailure, Host};
use crate::vault::registry::SignerRegistry;
use crate::vault::sequence::SequenceLedger;

/// Durable vault state
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct VaultState {
    registry: SignerRegistry,
    sequence: SequenceLedger,
}

/// Writes made during one invocation, discarded unless it succeeds
struct Staged {
    state: VaultState,
    events: Vec<VaultEvent>,
}

/// Outcome of a successful `execute`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReceipt {
    pub digest: Digest,
    pub sequence: u64,
    /// Signers counted toward quorum
    pub approvers: Vec<Address>,
    /// Whatever the call target returned
    pub output: Vec<u8>,
}

/// A multisig vault
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "VaultRecord")]
pub struct Vault {
    domain: DomainContext,
    state: VaultState,
    events: Vec<VaultEvent>,
}

/// Serialized vault, checked against its own domain before use
#[derive(Deserialize)]
struct VaultRecord {
    domain: DomainContext,
    state: VaultState,
    events: Vec<VaultEvent>,
}

impl TryFrom<VaultRecord> for Vault {
    type Error = VaultError;

    fn try_from(record: VaultRecord) -> Result<Self, Self::Error> {
        let vault = record.domain.vault;
        if vault.is_zero() || record.state.registry.is_signer(&vault) {
            return Err(VaultError::IncorrectSigner(vault));
        }

        Ok(Self {
            domain: record.domain,
            state: record.state,
            events: record.events,
        })
    }
}

impl Vault {
    /// Create a vault at `domain.vault` controlled by `signers`
    pub fn new(
        domain: DomainContext,
        signers: &[Address],
        threshold: usize,
    ) -> Result<Self, VaultError> {
        let registry = SignerRegistry::initialize(signers, threshold, &domain.vault)?;

        log::info!(
            "Vault {} set up as {} on chain {}",
            domain.vault,
            registry.description(),
            domain.chain_id
        );

        let setup = VaultEvent::SetupCompleted {
            signers: registry.signers().to_vec(),
            threshold,
        };

        Ok(Self {
            domain,
            state: VaultState {
                registry,
                sequence: SequenceLedger::new(),
            },
            events: vec![setup],
        })
    }

    /// Create a vault at the address derived from `deployer` and `salt`
    pub fn deploy(
        deployer: &Address,
        salt: u64,
        chain_id: u64,
        signers: &[Address],
        threshold: usize,
    ) -> Result<Self, VaultError> {
        let domain = DomainContext::new(chain_id, Address::derive(deployer, salt));
        Self::new(domain, signers, threshold)
    }

    pub fn address(&self) -> Address {
        self.domain.vault
    }

    pub fn domain(&self) -> &DomainContext {
        &self.domain
    }

    pub fn signers(&self) -> &[Address] {
        self.state.registry.signers()
    }

    pub fn is_signer(&self, address: &Address) -> bool {
        self.state.registry.is_signer(address)
    }

    pub fn threshold(&self) -> usize {
        self.state.registry.threshold()
    }

    /// Number of actions executed so far
    pub fn sequence(&self) -> u64 {
        self.state.sequence.current()
    }

    pub fn registry(&self) -> &SignerRegistry {
        &self.state.registry
    }

    pub fn is_executed(&self, digest: &Digest) -> bool {
        self.state.sequence.is_executed(digest)
    }

    pub fn events(&self) -> &[VaultEvent] {
        &self.events
    }

    /// Digest signers must sign to authorize `request` on this vault
    pub fn digest(&self, request: &ActionRequest) -> Digest {
        request.digest(&self.domain)
    }

    /// Digest of an action given by its fields
    pub fn digest_of(
        &self,
        destination: Address,
        value: u128,
        payload: &[u8],
        sequence: u64,
    ) -> Digest {
        self.digest(&ActionRequest::new(
            destination,
            value,
            payload.to_vec(),
            sequence,
        ))
    }

    /// Authorize and perform `request` on behalf of `caller`
    ///
    /// All-or-nothing: on error no counter advance, executed mark, signer
    /// change or event survives.
    pub fn execute<H: Host>(
        &mut self,
        host: &mut H,
        caller: Address,
        request: &ActionRequest,
        signatures: &[RecoverableSig],
    ) -> Result<ExecutionReceipt, VaultError> {
        let digest = self.digest(request);

        let mut staged = Staged {
            state: self.state.clone(),
            events: Vec::new(),
        };

        match self.run(&mut staged, host, caller, request, signatures, digest) {
            Ok(receipt) => {
                self.state = staged.state;
                self.events.extend(staged.events);
                log::info!(
                    "Executed {} at sequence {} ({} approver(s))",
                    digest,
                    receipt.sequence,
                    receipt.approvers.len()
                );
                Ok(receipt)
            }
            Err(e) => {
                log::warn!(
                    "Rejected action {} at sequence {}: {}",
                    digest,
                    request.sequence,
                    e
                );
                Err(e)
            }
        }
    }

    /// Governance entry point for direct calls
    ///
    /// Signer-set changes are reachable only as the payload of an authorized
    /// `execute`; a direct call is rejected whoever claims to make it.
    pub fn call_governance(&self, caller: Address, payload: &[u8]) -> Result<(), VaultError> {
        log::warn!(
            "Direct governance call from {} rejected ({} byte payload)",
            caller,
            payload.len()
        );
        Err(VaultError::Unauthorized(caller))
    }

    fn run<H: Host>(
        &self,
        staged: &mut Staged,
        host: &mut H,
        caller: Address,
        request: &ActionRequest,
        signatures: &[RecoverableSig],
        digest: Digest,
    ) -> Result<ExecutionReceipt, VaultError> {
        // Replays are reported as such however far the counter has moved
        if staged.state.sequence.is_executed(&digest) {
            return Err(VaultError::TransactionAlreadyExecuted(digest));
        }

        let approvers = verify_quorum(&digest, signatures, &staged.state.registry)?;
        staged.state.sequence.reserve(request.sequence)?;
        staged
            .state
            .sequence
            .mark_executed(digest, request.sequence)?;

        let output = if request.destination == self.domain.vault {
            if request.value > 0 {
                return Err(CallFailure::Rejected(
                    "value cannot be sent to the vault itself".to_string(),
                )
                .into());
            }
            self.dispatch_self(staged, &request.payload)?;
            Vec::new()
        } else {
            host.call(
                self.domain.vault,
                request.destination,
                request.value,
                &request.payload,
            )?
        };

        staged
            .events
            .push(VaultEvent::TransactionExecuted { executor: caller, digest });

        Ok(ExecutionReceipt {
            digest,
            sequence: request.sequence,
            approvers,
            output,
        })
    }

    fn dispatch_self(&self, staged: &mut Staged, payload: &[u8]) -> Result<(), VaultError> {
        let call = GovernanceCall::decode(payload).ok_or_else(|| {
            CallFailure::Rejected("payload is not a governance command".to_string())
        })?;
        let operator = self.domain.vault;

        match call {
            GovernanceCall::AddSigner {
                signer,
                new_threshold,
            } => {
                let new_threshold = to_threshold(new_threshold);
                staged
                    .state
                    .registry
                    .add_signer(signer, new_threshold, &self.domain.vault)?;
                log::info!("Signer {} added, threshold now {}", signer, new_threshold);
                staged.events.push(VaultEvent::SignerAdded {
                    operator,
                    signer,
                    new_threshold,
                });
                staged.events.push(VaultEvent::ThresholdUpdated {
                    operator,
                    new_threshold,
                });
            }
            GovernanceCall::RemoveSigner {
                signer,
                new_threshold,
            } => {
                let new_threshold = to_threshold(new_threshold);
                staged
                    .state
                    .registry
                    .remove_signer(signer, new_threshold)?;
                log::info!("Signer {} removed, threshold now {}", signer, new_threshold);
                staged
                    .events
                    .push(VaultEvent::SignerRemoved { operator, signer });
                staged.events.push(VaultEvent::ThresholdUpdated {
                    operator,
                    new_threshold,
                });
            }
        }
        Ok(())
    }
}

/// Out-of-range values saturate and are then rejected by the registry
fn to_threshold(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}
