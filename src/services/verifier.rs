// src/services/verifier.rs
//! Credential verification service.
//!
//! The registry answers `verify` with a flat tuple in which a wrong
//! commitment and an expired credential both read as `valid = false`. This
//! service runs on the verifying party's side, recomputes the commitment from
//! the identity fields and salt the holder presents, and infers the specific
//! reason from the returned flags and the current time.

use crate::contracts::credential_registry::RegistryService;
use crate::error::RegistryError;
use crate::models::credential::{Commitment, CredentialId, VerificationResult};
use crate::services::credential_issuer::HolderIdentity;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Why a credential did or did not verify.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Valid,
    NotFound,
    Revoked,
    Expired,
    CommitmentMismatch,
}

impl VerificationStatus {
    /// Infers the status from a registry answer observed at `now`.
    ///
    /// Revocation takes precedence over expiry, and expiry over a commitment
    /// mismatch.
    pub fn classify(result: &VerificationResult, now: u64) -> Self {
        if result.valid {
            VerificationStatus::Valid
        } else if !result.found() {
            VerificationStatus::NotFound
        } else if result.revoked {
            VerificationStatus::Revoked
        } else if result.expires_at != 0 && now >= result.expires_at {
            VerificationStatus::Expired
        } else {
            VerificationStatus::CommitmentMismatch
        }
    }
}

/// Registry answer plus the inferred status.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    pub id: CredentialId,
    pub status: VerificationStatus,
    #[serde(flatten)]
    pub result: VerificationResult,
}

/// Read-only verifier over the registry. Needs no issuer capability.
#[derive(Clone)]
pub struct Verifier {
    registry: Arc<RegistryService>,
}

impl Verifier {
    pub fn new(registry: Arc<RegistryService>) -> Self {
        Self { registry }
    }

    /// Verifies using the holder's identity fields and salt.
    pub fn verify_holder(
        &self,
        id: &str,
        holder: &HolderIdentity,
        salt: &str,
    ) -> Result<VerificationReport, RegistryError> {
        self.verify_commitment(id, &holder.commitment(salt))
    }

    /// Verifies an already derived commitment.
    ///
    /// # Errors
    /// - [`RegistryError::MalformedIdentifier`] if `id` cannot be encoded
    /// - [`RegistryError::StorageFailure`] if the lookup fails
    pub fn verify_commitment(
        &self,
        id: &str,
        commitment: &Commitment,
    ) -> Result<VerificationReport, RegistryError> {
        let id: CredentialId = id.parse()?;
        let result = self.registry.verify(&id, commitment)?;
        let status = VerificationStatus::classify(&result, self.registry.now());
        Ok(VerificationReport { id, status, result })
    }
}
