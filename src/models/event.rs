// src/models/event.rs
//! Lifecycle events emitted by the registry for off-registry observers
//! (indexers, UIs, audit tooling).

use crate::models::credential::{Commitment, CredentialId};
use ethers::types::Address;
use serde::{Deserialize, Serialize};

/// An observable state change.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum RegistryEvent {
    CredentialIssued {
        id: CredentialId,
        commitment: Commitment,
        title: String,
        issuer: String,
    },
    CredentialRevoked {
        id: CredentialId,
    },
    IssuerGranted {
        principal: Address,
        granted_by: Address,
    },
    IssuerRevoked {
        principal: Address,
        revoked_by: Address,
    },
}

impl RegistryEvent {
    /// Credential the event refers to, if any.
    pub fn credential_id(&self) -> Option<&CredentialId> {
        match self {
            RegistryEvent::CredentialIssued { id, .. } | RegistryEvent::CredentialRevoked { id } => {
                Some(id)
            }
            RegistryEvent::IssuerGranted { .. } | RegistryEvent::IssuerRevoked { .. } => None,
        }
    }
}

/// An event as recorded in the append-only log.
///
/// `sequence` starts at 1 and increases by one per appended event.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LoggedEvent {
    pub sequence: u64,
    pub timestamp: u64,
    pub event: RegistryEvent,
}
