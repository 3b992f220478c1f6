// src/error.rs
//! Error types for the registry.
//!
//! Storage failures are wrapped unchanged in [`RegistryError::StorageFailure`]
//! and never retried internally. Authentication of signed operations has its
//! own [`AuthError`] since it happens before a caller principal is known.

use crate::models::credential::CredentialId;
use ethers::types::Address;
use thiserror::Error;

/// Failure of the underlying persistence layer.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage snapshot is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage lock poisoned")]
    Poisoned,
}

/// Errors surfaced by registry operations.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Caller lacks the issuer capability for a mutating call.
    #[error("principal {0:?} is not an authorized issuer")]
    Unauthorized(Address),

    /// Revocation targeted an identifier that was never issued.
    #[error("credential {0} not found")]
    NotFound(CredentialId),

    /// Identifier does not fit the fixed-width encoding.
    #[error("malformed credential identifier: {0}")]
    MalformedIdentifier(String),

    /// Re-issue attempted while strict uniqueness is enabled.
    #[error("credential {0} already issued")]
    AlreadyIssued(CredentialId),

    #[error(transparent)]
    StorageFailure(#[from] StorageError),
}

/// Rejections of a signed operation envelope.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("signature is malformed or does not recover")]
    InvalidSignature,

    #[error("signature was produced by {recovered:?}, not {claimed:?}")]
    SignerMismatch { claimed: Address, recovered: Address },

    #[error("request timestamp {timestamp} is outside the accepted window")]
    Expired { timestamp: u64 },

    #[error("signed request from {signer:?} was already used")]
    Replayed { signer: Address },
}
