// src/storage/memory.rs
//! In-memory storage for credential records and issuer principals.
//!
//! Suited to tests and to deployments where the process itself is the
//! ledger's only writer. All state is lost on restart.

use super::{CredentialStore, PrincipalStore, Tables};
use crate::error::{RegistryError, StorageError};
use crate::models::credential::{CredentialId, CredentialRecord};
use ethers::types::Address;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StorageError> {
        self.tables.read().map_err(|_| StorageError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StorageError> {
        self.tables.write().map_err(|_| StorageError::Poisoned)
    }
}

impl CredentialStore for MemoryStore {
    fn put(&self, id: CredentialId, record: CredentialRecord) -> Result<(), StorageError> {
        self.write()?.credentials.insert(id, record);
        Ok(())
    }

    fn put_if_absent(&self, id: CredentialId, record: CredentialRecord) -> Result<bool, StorageError> {
        let mut tables = self.write()?;
        if tables.has(&id) {
            return Ok(false);
        }
        tables.credentials.insert(id, record);
        Ok(true)
    }

    fn get(&self, id: &CredentialId) -> Result<Option<CredentialRecord>, StorageError> {
        Ok(self.read()?.get(id))
    }

    fn mark_revoked(&self, id: &CredentialId) -> Result<bool, RegistryError> {
        let mut tables = self.write()?;
        match tables.credentials.get_mut(id) {
            Some(record) if record.exists => {
                let changed = !record.revoked;
                record.revoked = true;
                Ok(changed)
            }
            _ => Err(RegistryError::NotFound(*id)),
        }
    }

    fn count(&self) -> Result<usize, StorageError> {
        Ok(self.read()?.count())
    }
}

impl PrincipalStore for MemoryStore {
    fn contains(&self, principal: &Address) -> Result<bool, StorageError> {
        Ok(self.read()?.issuers.contains(principal))
    }

    fn insert(&self, principal: Address) -> Result<bool, StorageError> {
        Ok(self.write()?.issuers.insert(principal))
    }

    fn remove(&self, principal: &Address) -> Result<bool, StorageError> {
        Ok(self.write()?.issuers.remove(principal))
    }

    fn list(&self) -> Result<Vec<Address>, StorageError> {
        Ok(self.read()?.issuers.iter().copied().collect())
    }

    fn seed(&self, principals: &[Address]) -> Result<bool, StorageError> {
        Ok(self.write()?.seed(principals))
    }
}
