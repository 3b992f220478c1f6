// src/storage/json_file.rs
//! File-backed storage.
//!
//! Keeps both tables in memory and rewrites a JSON snapshot after every
//! mutation. The snapshot is written to a sibling temp file and renamed over
//! the previous one, so a crash leaves either the old or the new state on
//! disk. If the write fails the in-memory change is rolled back and the
//! error is returned to the caller.

use super::{CredentialStore, PrincipalStore, Tables};
use crate::error::{RegistryError, StorageError};
use crate::models::credential::{CredentialId, CredentialRecord};
use crate::utils::serialization::{deserialize, serialize};
use ethers::types::Address;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    tables: RwLock<Tables>,
}

impl JsonFileStore {
    /// Opens the snapshot at `path`, starting empty if the file does not exist.
    ///
    /// # Errors
    /// - [`StorageError::Io`] if the file exists but cannot be read
    /// - [`StorageError::Serialization`] if it is not a valid snapshot
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let tables = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            deserialize::<Tables>(&raw)?
        } else {
            Tables::default()
        };
        log::info!(
            "opened credential snapshot {} ({} records, {} issuers)",
            path.display(),
            tables.count(),
            tables.issuers.len()
        );
        Ok(Self {
            path,
            tables: RwLock::new(tables),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StorageError> {
        self.tables.read().map_err(|_| StorageError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StorageError> {
        self.tables.write().map_err(|_| StorageError::Poisoned)
    }

    fn flush(&self, tables: &Tables) -> Result<(), StorageError> {
        let json = serialize(tables)?;
        let tmp = self.path.with_extension("json.tmp");
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Applies `mutate`, persists, and restores the prior state if persisting fails.
    fn commit<T>(
        &self,
        mutate: impl FnOnce(&mut Tables) -> T,
    ) -> Result<T, StorageError> {
        let mut tables = self.write()?;
        let before = tables.clone();
        let out = mutate(&mut tables);
        if let Err(e) = self.flush(&tables) {
            log::error!("failed to persist snapshot {}: {}", self.path.display(), e);
            *tables = before;
            return Err(e);
        }
        Ok(out)
    }
}

impl CredentialStore for JsonFileStore {
    fn put(&self, id: CredentialId, record: CredentialRecord) -> Result<(), StorageError> {
        self.commit(|t| {
            t.credentials.insert(id, record);
        })
    }

    fn put_if_absent(&self, id: CredentialId, record: CredentialRecord) -> Result<bool, StorageError> {
        if self.read()?.has(&id) {
            return Ok(false);
        }
        self.commit(|t| {
            if t.has(&id) {
                return false;
            }
            t.credentials.insert(id, record);
            true
        })
    }

    fn get(&self, id: &CredentialId) -> Result<Option<CredentialRecord>, StorageError> {
        Ok(self.read()?.get(id))
    }

    fn mark_revoked(&self, id: &CredentialId) -> Result<bool, RegistryError> {
        match self.read()?.get(id) {
            None => return Err(RegistryError::NotFound(*id)),
            Some(record) if record.revoked => return Ok(false),
            Some(_) => {}
        }
        let changed = self.commit(|t| match t.credentials.get_mut(id) {
            Some(record) if record.exists => {
                let changed = !record.revoked;
                record.revoked = true;
                Some(changed)
            }
            _ => None,
        })?;
        changed.ok_or(RegistryError::NotFound(*id))
    }

    fn count(&self) -> Result<usize, StorageError> {
        Ok(self.read()?.count())
    }
}

impl PrincipalStore for JsonFileStore {
    fn contains(&self, principal: &Address) -> Result<bool, StorageError> {
        Ok(self.read()?.issuers.contains(principal))
    }

    fn insert(&self, principal: Address) -> Result<bool, StorageError> {
        if self.read()?.issuers.contains(&principal) {
            return Ok(false);
        }
        self.commit(|t| t.issuers.insert(principal))
    }

    fn remove(&self, principal: &Address) -> Result<bool, StorageError> {
        if !self.read()?.issuers.contains(principal) {
            return Ok(false);
        }
        self.commit(|t| t.issuers.remove(principal))
    }

    fn list(&self) -> Result<Vec<Address>, StorageError> {
        Ok(self.read()?.issuers.iter().copied().collect())
    }

    fn seed(&self, principals: &[Address]) -> Result<bool, StorageError> {
        if self.read()?.seeded {
            return Ok(false);
        }
        self.commit(|t| t.seed(principals))
    }
}
