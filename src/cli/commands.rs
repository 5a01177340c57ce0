//! CLI commands for the vault
//!
//! Implements all command handlers for the CLI interface.

use crate::crypto::{Address, KeyPair, RecoverableSig};
use crate::storage::{Storage, StorageConfig};
use crate::vault::{AccountHost, ActionRequest, GovernanceCall, Vault, VaultEvent};
use std::path::{Path, PathBuf};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Application state
pub struct AppState {
    pub vault: Vault,
    pub host: AccountHost,
    pub storage: Storage,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Load the vault saved in `data_dir`
    pub fn new(data_dir: PathBuf) -> CliResult<Self> {
        let storage = Storage::new(storage_config(&data_dir))?;

        if !storage.exists() {
            return Err(format!(
                "no vault found in {:?}; create one with: vault init",
                data_dir
            )
            .into());
        }

        let snapshot = storage.load()?;
        log::debug!("Loaded vault saved at {}", snapshot.saved_at);

        Ok(Self {
            vault: snapshot.vault,
            host: snapshot.host,
            storage,
            data_dir,
        })
    }

    /// Save the current state
    pub fn save(&self) -> CliResult<()> {
        self.storage.save(&self.vault, &self.host)?;
        Ok(())
    }
}

fn storage_config(data_dir: &Path) -> StorageConfig {
    StorageConfig {
        data_dir: data_dir.to_path_buf(),
        ..Default::default()
    }
}

/// Parse a hex payload; empty means no payload
pub fn parse_payload(hex_payload: &str) -> CliResult<Vec<u8>> {
    let raw = hex_payload.strip_prefix("0x").unwrap_or(hex_payload);
    Ok(hex::decode(raw)?)
}

/// Initialize a new vault
pub fn cmd_init(
    data_dir: &Path,
    chain_id: u64,
    deployer: &Address,
    salt: u64,
    signers: &[Address],
    threshold: usize,
) -> CliResult<()> {
    let storage = Storage::new(storage_config(data_dir))?;

    if storage.exists() {
        println!("⚠️  A vault already exists at {:?}", data_dir);
        return Ok(());
    }

    let vault = Vault::deploy(deployer, salt, chain_id, signers, threshold)?;
    storage.save(&vault, &AccountHost::new())?;

    println!("✅ Vault initialized!");
    println!("   📁 Data directory: {:?}", data_dir);
    println!("   📍 Address: {}", vault.address());
    println!("   ⛓️  Chain ID: {}", chain_id);
    println!("   🔐 Policy: {}", vault.registry().description());

    Ok(())
}

/// Generate a signer key
pub fn cmd_keygen() -> CliResult<()> {
    let key = KeyPair::generate();

    println!("🔑 New signer key");
    println!("   📍 Address: {}", key.address());
    println!("   Public key: {}", key.public_key_hex());
    println!("   Private key: {}", key.private_key_hex());
    println!("\n   ⚠️  Keep the private key secret; it is not stored anywhere.");

    Ok(())
}

/// Show signers, threshold and sequence
pub fn cmd_info(state: &AppState) -> CliResult<()> {
    let vault = &state.vault;

    println!("🏦 Vault {}", vault.address());
    println!("   ├─ Chain ID: {}", vault.domain().chain_id);
    println!("   ├─ Policy: {}", vault.registry().description());
    println!("   ├─ Sequence: {} (next: {})", vault.sequence(), vault.sequence() + 1);
    println!("   ├─ Balance: {}", state.host.balance(&vault.address()));
    println!("   ├─ Signers:");
    for signer in vault.signers() {
        println!("   │  └─ {}", signer);
    }

    let stats = state.storage.stats()?;
    println!(
        "   └─ Storage: {} bytes in {:?}, {} backup(s)",
        stats.file_size, stats.data_dir, stats.backup_count
    );

    Ok(())
}

/// Replace the saved vault with backup `index`
pub fn cmd_restore(state: &mut AppState, index: usize) -> CliResult<()> {
    let snapshot = state.storage.restore_backup(index)?;
    state.vault = snapshot.vault;
    state.host = snapshot.host;
    state.save()?;

    println!("♻️  Restored backup {} (saved at {})", index, snapshot.saved_at);
    println!("   Sequence: {}", state.vault.sequence());

    Ok(())
}

/// Credit the vault's balance
pub fn cmd_deposit(state: &mut AppState, amount: u128) -> CliResult<()> {
    let address = state.vault.address();
    let balance = state.host.deposit(address, amount)?;
    state.save()?;

    println!("💰 Deposited {} into {}", amount, address);
    println!("   New balance: {}", balance);

    Ok(())
}

/// Print the digest signers must sign for `request`
pub fn cmd_digest(state: &AppState, request: &ActionRequest) -> CliResult<()> {
    println!("{}", state.vault.digest(request));
    Ok(())
}

/// Sign `request` with a hex private key
pub fn cmd_sign(state: &AppState, private_key: &str, request: &ActionRequest) -> CliResult<()> {
    let key = KeyPair::from_private_key_hex(private_key)?;
    let digest = state.vault.digest(request);
    let signature = key.sign(&digest)?;

    if !state.vault.is_signer(&key.address()) {
        println!("⚠️  {} is not a signer of this vault", key.address());
    }
    println!("✍️  Signed {} as {}", digest, key.address());
    println!("{}", signature);

    Ok(())
}

/// Authorize and execute `request`
pub fn cmd_execute(
    state: &mut AppState,
    caller: Address,
    request: &ActionRequest,
    signatures: &[RecoverableSig],
) -> CliResult<()> {
    match state
        .vault
        .execute(&mut state.host, caller, request, signatures)
    {
        Ok(receipt) => {
            state.save()?;
            println!("✅ Executed!");
            println!("   ├─ Digest: {}", receipt.digest);
            println!("   ├─ Sequence: {}", receipt.sequence);
            println!("   └─ Approved by:");
            for signer in &receipt.approvers {
                println!("      └─ {}", signer);
            }
            Ok(())
        }
        Err(e) => {
            println!("❌ Execution rejected: {}", e);
            if e.is_retryable() {
                println!(
                    "   Resubmit against sequence {} or with more signatures.",
                    state.vault.sequence() + 1
                );
            }
            Err(e.into())
        }
    }
}

/// Print a governance payload as hex
pub fn cmd_encode(call: &GovernanceCall) -> CliResult<()> {
    println!("{}", hex::encode(call.encode()));
    Ok(())
}

/// Print the event log
pub fn cmd_events(state: &AppState) -> CliResult<()> {
    let events = state.vault.events();
    println!("📜 Events ({}):", events.len());
    for (i, event) in events.iter().enumerate() {
        println!("   #{} {}", i, describe(event));
    }
    Ok(())
}

fn describe(event: &VaultEvent) -> String {
    let detail = match event {
        VaultEvent::SetupCompleted { signers, threshold } => {
            format!("{}-of-{}", threshold, signers.len())
        }
        VaultEvent::SignerAdded {
            signer,
            new_threshold,
            ..
        } => format!("{} (threshold {})", signer, new_threshold),
        VaultEvent::SignerRemoved { signer, .. } => signer.to_string(),
        VaultEvent::ThresholdUpdated { new_threshold, .. } => new_threshold.to_string(),
        VaultEvent::TransactionExecuted { executor, digest } => {
            format!("{} by {}", digest, executor)
        }
    };
    format!("{} {}", event.name(), detail)
}

/// Export the vault to a file
pub fn cmd_export(state: &AppState, path: &Path) -> CliResult<()> {
    crate::storage::save_to_file(&state.vault, &state.host, path)?;
    println!("📦 Vault exported to {:?}", path);
    Ok(())
}

/// Import a vault from a file
pub fn cmd_import(data_dir: &Path, path: &Path) -> CliResult<()> {
    let snapshot = crate::storage::load_from_file(path)?;
    let storage = Storage::new(storage_config(data_dir))?;
    storage.save(&snapshot.vault, &snapshot.host)?;

    println!("📥 Vault imported from {:?}", path);
    println!("   Address: {}", snapshot.vault.address());
    println!("   Sequence: {}", snapshot.vault.sequence());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_payload() {
        assert_eq!(parse_payload("").unwrap(), Vec::<u8>::new());
        assert_eq!(parse_payload("0x0aff").unwrap(), vec![0x0a, 0xff]);
        assert!(parse_payload("zz").is_err());
    }

    #[test]
    fn test_init_then_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let signers: Vec<Address> = (0..2).map(|_| KeyPair::generate().address()).collect();
        let deployer = KeyPair::generate().address();

        cmd_init(temp_dir.path(), 5, &deployer, 3, &signers, 2).unwrap();
        let state = AppState::new(temp_dir.path().to_path_buf()).unwrap();

        assert_eq!(state.vault.address(), Address::derive(&deployer, 3));
        assert_eq!(state.vault.domain().chain_id, 5);
        assert_eq!(state.vault.threshold(), 2);
    }

    #[test]
    fn test_restore_backup() {
        let temp_dir = tempfile::tempdir().unwrap();
        let signers: Vec<Address> = (0..2).map(|_| KeyPair::generate().address()).collect();
        let deployer = KeyPair::generate().address();
        cmd_init(temp_dir.path(), 1, &deployer, 0, &signers, 1).unwrap();

        let mut state = AppState::new(temp_dir.path().to_path_buf()).unwrap();
        cmd_deposit(&mut state, 10).unwrap();
        cmd_deposit(&mut state, 5).unwrap();
        assert_eq!(state.storage.stats().unwrap().backup_count, 2);

        // Backup 0 holds the state before the latest deposit
        cmd_restore(&mut state, 0).unwrap();
        assert_eq!(state.host.balance(&state.vault.address()), 10);

        let reloaded = AppState::new(temp_dir.path().to_path_buf()).unwrap();
        assert_eq!(reloaded.host.balance(&reloaded.vault.address()), 10);
        assert!(cmd_restore(&mut state, 4).is_err());
    }

    #[test]
    fn test_deposit_overflow_is_reported() {
        let temp_dir = tempfile::tempdir().unwrap();
        let signers: Vec<Address> = (0..2).map(|_| KeyPair::generate().address()).collect();
        let deployer = KeyPair::generate().address();
        cmd_init(temp_dir.path(), 1, &deployer, 0, &signers, 1).unwrap();

        let mut state = AppState::new(temp_dir.path().to_path_buf()).unwrap();
        cmd_deposit(&mut state, u128::MAX).unwrap();
        assert!(cmd_deposit(&mut state, 1).is_err());
        assert_eq!(state.host.balance(&state.vault.address()), u128::MAX);
    }

    #[test]
    fn test_missing_vault_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(AppState::new(temp_dir.path().to_path_buf()).is_err());
    }
}
