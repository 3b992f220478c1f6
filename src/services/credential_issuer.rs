// src/services/credential_issuer.rs
//! Credential Issuer Service
//!
//! Runs on the issuing institution's side of the trust boundary. It holds the
//! holder's identity fields just long enough to derive a commitment, then hands
//! only that commitment to the registry.
//!
//! The returned [`IssuanceReceipt`] carries the salt. The registry never
//! stores it, so the issuer must pass it on to the holder or keep it.

use crate::contracts::credential_registry::RegistryService;
use crate::error::RegistryError;
use crate::models::credential::{Commitment, CredentialId};
use crate::utils::crypto::{derive_commitment, generate_salt, trim_field};
use crate::wallet::key_management::KeyManager;
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IssuanceError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Identity fields of a credential holder. Never leaves the issuer.
#[derive(Debug, Clone)]
pub struct HolderIdentity {
    /// National identity number
    pub national_id: String,
    /// Full name, normalized before hashing
    pub full_name: String,
}

impl HolderIdentity {
    pub fn new(national_id: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            national_id: national_id.into(),
            full_name: full_name.into(),
        }
    }

    /// Commitment binding these fields to `salt`.
    pub fn commitment(&self, salt: &str) -> Commitment {
        derive_commitment(&self.national_id, &self.full_name, salt)
    }

    fn validate(&self) -> Result<(), IssuanceError> {
        if trim_field(&self.national_id).is_empty() {
            return Err(IssuanceError::MissingField("national_id"));
        }
        if trim_field(&self.full_name).is_empty() {
            return Err(IssuanceError::MissingField("full_name"));
        }
        Ok(())
    }
}

/// What the issuer needs to keep after a successful issuance.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct IssuanceReceipt {
    pub id: CredentialId,
    pub commitment: Commitment,
    pub salt: String,
    pub issued_at: u64,
}

/// Issues and revokes credentials as a single issuer principal.
#[derive(Clone)]
pub struct CredentialIssuer {
    registry: Arc<RegistryService>,
    keys: KeyManager,
    /// Institution name written into every issued record
    institution: String,
}

impl CredentialIssuer {
    pub fn new(registry: Arc<RegistryService>, keys: KeyManager, institution: impl Into<String>) -> Self {
        Self {
            registry,
            keys,
            institution: institution.into(),
        }
    }

    /// Principal this issuer acts as.
    pub fn principal(&self) -> Address {
        self.keys.address()
    }

    /// Derives the holder commitment and records the credential.
    ///
    /// # Arguments
    /// * `id` - credential label or `0x` hex identifier
    /// * `holder` - holder identity fields
    /// * `salt` - secret salt; a random one is generated when `None` or blank
    /// * `title` - credential title
    /// * `expires_at` - unix seconds, `0` for no expiry
    pub fn issue(
        &self,
        id: &str,
        holder: &HolderIdentity,
        salt: Option<&str>,
        title: &str,
        expires_at: u64,
    ) -> Result<IssuanceReceipt, IssuanceError> {
        holder.validate()?;
        let id: CredentialId = id.parse()?;
        let salt = match salt.map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => s.to_owned(),
            None => generate_salt(),
        };
        let commitment = holder.commitment(&salt);

        let record = self.registry.issue(
            &self.principal(),
            id,
            commitment,
            title.to_owned(),
            self.institution.clone(),
            expires_at,
        )?;

        Ok(IssuanceReceipt {
            id,
            commitment,
            salt,
            issued_at: record.issued_at,
        })
    }

    /// Revokes a previously issued credential.
    pub fn revoke(&self, id: &str) -> Result<(), IssuanceError> {
        let id: CredentialId = id.parse()?;
        self.registry.revoke(&self.principal(), &id)?;
        Ok(())
    }
}
