// src/storage/mod.rs
//! Persistence layer for the registry.
//!
//! Two tables make up the persisted state:
//! - credential records keyed by [`CredentialId`]
//! - the issuer-capability set keyed by principal address
//!
//! Every method is atomic with respect to a single call; no partial write is
//! ever observable by a concurrent reader.

use crate::error::{RegistryError, StorageError};
use crate::models::credential::{CredentialId, CredentialRecord};
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

/// Keyed storage of credential records.
pub trait CredentialStore: Send + Sync {
    /// Inserts or overwrites the record stored under `id`.
    fn put(&self, id: CredentialId, record: CredentialRecord) -> Result<(), StorageError>;

    /// Inserts only when no existing record is stored under `id`.
    ///
    /// Returns `false`, leaving the store untouched, if one already exists.
    fn put_if_absent(&self, id: CredentialId, record: CredentialRecord) -> Result<bool, StorageError>;

    /// Looks up a record. Entries whose `exists` flag is unset read as absent.
    fn get(&self, id: &CredentialId) -> Result<Option<CredentialRecord>, StorageError>;

    /// Sets the revocation flag in place.
    ///
    /// Returns `true` if the flag changed and `false` if it was already set.
    ///
    /// # Errors
    /// [`RegistryError::NotFound`] when no existing record is stored under `id`.
    fn mark_revoked(&self, id: &CredentialId) -> Result<bool, RegistryError>;

    /// Number of existing records.
    fn count(&self) -> Result<usize, StorageError>;
}

/// Set of principals holding the issuer capability.
pub trait PrincipalStore: Send + Sync {
    fn contains(&self, principal: &Address) -> Result<bool, StorageError>;

    /// Returns `true` if the principal was newly added.
    fn insert(&self, principal: Address) -> Result<bool, StorageError>;

    /// Returns `true` if the principal was present.
    fn remove(&self, principal: &Address) -> Result<bool, StorageError>;

    fn list(&self) -> Result<Vec<Address>, StorageError>;

    /// Inserts `principals` if the set has never been initialized.
    ///
    /// Returns `true` only on the call that initializes it. Later calls, for
    /// instance on every restart over a persisted set, leave it untouched, so
    /// principals withdrawn since then stay withdrawn.
    fn seed(&self, principals: &[Address]) -> Result<bool, StorageError>;
}

/// In-memory image of both tables, shared by the store implementations.
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
pub(crate) struct Tables {
    #[serde(default)]
    pub credentials: BTreeMap<CredentialId, CredentialRecord>,
    #[serde(default)]
    pub issuers: BTreeSet<Address>,
    /// Set once the issuer set has been initialized.
    #[serde(default)]
    pub seeded: bool,
}

impl Tables {
    pub fn get(&self, id: &CredentialId) -> Option<CredentialRecord> {
        self.credentials.get(id).filter(|r| r.exists).cloned()
    }

    pub fn has(&self, id: &CredentialId) -> bool {
        self.credentials.get(id).map_or(false, |r| r.exists)
    }

    pub fn count(&self) -> usize {
        self.credentials.values().filter(|r| r.exists).count()
    }

    /// Snapshots written before `seeded` existed count as initialized when
    /// they already hold issuers.
    pub fn seed(&mut self, principals: &[Address]) -> bool {
        if self.seeded || !self.issuers.is_empty() {
            self.seeded = true;
            return false;
        }
        self.issuers.extend(principals.iter().copied());
        self.seeded = true;
        true
    }
}
