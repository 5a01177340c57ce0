//! Vault persistence layer
//!
//! Saves the vault together with the host's balance book as one JSON
//! snapshot. Writes go through a temporary file and an atomic rename, and
//! the previous snapshots are kept as rotating backups.

use crate::vault::{AccountHost, Vault};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub vault_file: String,
    pub backup_enabled: bool,
    pub max_backups: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".vault_data"),
            vault_file: "vault.json".to_string(),
            backup_enabled: true,
            max_backups: 5,
        }
    }
}

/// Everything persisted for one vault
#[derive(Debug, Serialize, Deserialize)]
pub struct VaultSnapshot {
    pub saved_at: DateTime<Utc>,
    pub vault: Vault,
    pub host: AccountHost,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    saved_at: DateTime<Utc>,
    vault: &'a Vault,
    host: &'a AccountHost,
}

/// Vault storage manager
pub struct Storage {
    config: StorageConfig,
}

impl Storage {
    /// Create a new storage manager
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(&config.data_dir)?;
        Ok(Self { config })
    }

    fn vault_path(&self) -> PathBuf {
        self.config.data_dir.join(&self.config.vault_file)
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        self.config
            .data_dir
            .join(format!("{}.backup.{}", self.config.vault_file, index))
    }

    /// Save the vault and host to disk
    pub fn save(&self, vault: &Vault, host: &AccountHost) -> Result<(), StorageError> {
        let path = self.vault_path();

        if self.config.backup_enabled && path.exists() {
            self.rotate_backups()?;
            fs::copy(&path, self.backup_path(0))?;
        }

        // Write to temporary file first
        let temp_path = self.config.data_dir.join("vault.tmp");
        let file = fs::File::create(&temp_path)?;
        let writer = BufWriter::new(file);

        let snapshot = SnapshotRef {
            saved_at: Utc::now(),
            vault,
            host,
        };
        serde_json::to_writer_pretty(writer, &snapshot)?;

        // Atomic rename
        fs::rename(&temp_path, &path)?;

        log::debug!("Vault {} saved to {:?}", vault.address(), path);
        Ok(())
    }

    /// Load the vault snapshot from disk
    pub fn load(&self) -> Result<VaultSnapshot, StorageError> {
        let path = self.vault_path();

        if !path.exists() {
            return Err(StorageError::InvalidData(
                "Vault file not found".to_string(),
            ));
        }

        read_snapshot(&path)
    }

    /// Check if a saved vault exists
    pub fn exists(&self) -> bool {
        self.vault_path().exists()
    }

    fn rotate_backups(&self) -> Result<(), StorageError> {
        if self.config.max_backups == 0 {
            return Ok(());
        }

        // Delete oldest backup
        let oldest = self.backup_path(self.config.max_backups - 1);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }

        // Shift existing backups
        for i in (0..self.config.max_backups - 1).rev() {
            let current = self.backup_path(i);
            if current.exists() {
                fs::rename(&current, self.backup_path(i + 1))?;
            }
        }

        Ok(())
    }

    /// Restore from a backup
    pub fn restore_backup(&self, backup_index: usize) -> Result<VaultSnapshot, StorageError> {
        let backup_path = self.backup_path(backup_index);

        if !backup_path.exists() {
            return Err(StorageError::InvalidData(format!(
                "Backup {} not found",
                backup_index
            )));
        }

        read_snapshot(&backup_path)
    }

    /// List available backups
    pub fn list_backups(&self) -> Vec<usize> {
        (0..self.config.max_backups)
            .filter(|i| self.backup_path(*i).exists())
            .collect()
    }

    /// Get storage statistics
    pub fn stats(&self) -> Result<StorageStats, StorageError> {
        let path = self.vault_path();

        let file_size = if path.exists() {
            fs::metadata(&path)?.len()
        } else {
            0
        };

        Ok(StorageStats {
            file_size,
            backup_count: self.list_backups().len(),
            data_dir: self.config.data_dir.clone(),
        })
    }
}

/// Storage statistics
#[derive(Debug)]
pub struct StorageStats {
    pub file_size: u64,
    pub backup_count: usize,
    pub data_dir: PathBuf,
}

fn read_snapshot(path: &Path) -> Result<VaultSnapshot, StorageError> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

/// Save a vault snapshot to a specific file path
pub fn save_to_file(vault: &Vault, host: &AccountHost, path: &Path) -> Result<(), StorageError> {
    let file = fs::File::create(path)?;
    let writer = BufWriter::new(file);
    let snapshot = SnapshotRef {
        saved_at: Utc::now(),
        vault,
        host,
    };
    serde_json::to_writer_pretty(writer, &snapshot)?;
    Ok(())
}

/// Load a vault snapshot from a specific file path
pub fn load_from_file(path: &Path) -> Result<VaultSnapshot, StorageError> {
    read_snapshot(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;
    use crate::vault::{ActionRequest, DEFAULT_CHAIN_ID};

    fn sample() -> (Vault, AccountHost, Vec<KeyPair>) {
        let keys: Vec<KeyPair> = (0..3).map(|_| KeyPair::generate()).collect();
        let signers: Vec<_> = keys.iter().map(|k| k.address()).collect();
        let vault = Vault::deploy(&signers[0], 1, DEFAULT_CHAIN_ID, &signers, 2).unwrap();
        let mut host = AccountHost::new();
        host.deposit(vault.address(), 50).unwrap();
        (vault, host, keys)
    }

    #[test]
    fn test_save_load_vault() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            data_dir: temp_dir.path().to_path_buf(),
            ..Default::default()
        };
        let storage = Storage::new(config).unwrap();
        let (mut vault, mut host, keys) = sample();

        let request = ActionRequest::new(keys[2].address(), 20, vec![], 1);
        let digest = vault.digest(&request);
        let signatures = vec![keys[0].sign(&digest).unwrap(), keys[1].sign(&digest).unwrap()];
        vault
            .execute(&mut host, keys[0].address(), &request, &signatures)
            .unwrap();

        storage.save(&vault, &host).unwrap();
        assert!(storage.exists());

        let loaded = storage.load().unwrap();
        assert_eq!(loaded.vault.address(), vault.address());
        assert_eq!(loaded.vault.sequence(), 1);
        assert_eq!(loaded.vault.threshold(), 2);
        assert!(loaded.vault.is_executed(&digest));
        assert!(keys.iter().all(|k| loaded.vault.is_signer(&k.address())));
        assert_eq!(loaded.host.balance(&vault.address()), 30);
        assert_eq!(loaded.host.balance(&keys[2].address()), 20);
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(StorageConfig {
            data_dir: temp_dir.path().to_path_buf(),
            ..Default::default()
        })
        .unwrap();

        assert!(!storage.exists());
        assert!(matches!(storage.load(), Err(StorageError::InvalidData(_))));
    }

    #[test]
    fn test_backup_rotation() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            data_dir: temp_dir.path().to_path_buf(),
            max_backups: 3,
            ..Default::default()
        };
        let storage = Storage::new(config).unwrap();
        let (vault, mut host, _) = sample();

        for round in 0..5 {
            host.deposit(vault.address(), round).unwrap();
            storage.save(&vault, &host).unwrap();
        }

        assert_eq!(storage.list_backups(), vec![0, 1, 2]);
        let restored = storage.restore_backup(0).unwrap();
        assert_eq!(restored.vault.address(), vault.address());
        assert!(storage.restore_backup(7).is_err());
        assert_eq!(storage.stats().unwrap().backup_count, 3);
    }

    #[test]
    fn test_export_import() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("export.json");
        let (vault, host, _) = sample();

        save_to_file(&vault, &host, &path).unwrap();
        let imported = load_from_file(&path).unwrap();
        assert_eq!(imported.vault.signers(), vault.signers());
        assert_eq!(imported.host.balance(&vault.address()), 50);
    }
}
