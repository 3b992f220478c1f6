// src/models/operation.rs
//! Signed mutating operations.
//!
//! Remote callers prove their principal by signing the Keccak-256 digest of
//! the operation they request. The server recovers the secp256k1 signer and
//! uses that address as the caller identity for the access-control gate.
//!
//! # Digest layout
//! `keccak256(DOMAIN ‖ tag ‖ field₁ ‖ … ‖ fieldₙ ‖ timestamp)`, where every
//! variable-length field is prefixed by its big-endian `u32` length and
//! integers are big-endian `u64`.

use crate::error::AuthError;
use crate::models::credential::{Commitment, CredentialId};
use crate::utils::crypto::hash_data;
use ethers::types::{Address, Signature, H256};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Domain separator mixed into every operation digest.
pub const DOMAIN: &[u8] = b"credential-registry/v1";

/// A state-changing request, independent of how it is transported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Issue {
        id: CredentialId,
        commitment: Commitment,
        title: String,
        issuer: String,
        expires_at: u64,
    },
    Revoke {
        id: CredentialId,
    },
    GrantIssuer {
        principal: Address,
    },
    RevokeIssuer {
        principal: Address,
    },
}

impl Operation {
    fn tag(&self) -> &'static [u8] {
        match self {
            Operation::Issue { .. } => b"issue",
            Operation::Revoke { .. } => b"revoke",
            Operation::GrantIssuer { .. } => b"grant-issuer",
            Operation::RevokeIssuer { .. } => b"revoke-issuer",
        }
    }

    /// Digest a caller signs to authorize this operation at `timestamp`.
    pub fn digest(&self, timestamp: u64) -> H256 {
        let mut buf = Vec::with_capacity(128);
        push_field(&mut buf, DOMAIN);
        push_field(&mut buf, self.tag());
        match self {
            Operation::Issue {
                id,
                commitment,
                title,
                issuer,
                expires_at,
            } => {
                push_field(&mut buf, id.as_bytes());
                push_field(&mut buf, commitment.as_bytes());
                push_field(&mut buf, title.as_bytes());
                push_field(&mut buf, issuer.as_bytes());
                buf.extend_from_slice(&expires_at.to_be_bytes());
            }
            Operation::Revoke { id } => push_field(&mut buf, id.as_bytes()),
            Operation::GrantIssuer { principal } | Operation::RevokeIssuer { principal } => {
                push_field(&mut buf, principal.as_bytes())
            }
        }
        buf.extend_from_slice(&timestamp.to_be_bytes());
        H256::from(hash_data(&buf))
    }
}

fn push_field(buf: &mut Vec<u8>, field: &[u8]) {
    buf.extend_from_slice(&(field.len() as u32).to_be_bytes());
    buf.extend_from_slice(field);
}

/// Proof that `signer` requested an operation at `timestamp`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    /// Principal the caller claims to be
    pub signer: Address,
    /// Unix seconds at which the request was signed
    pub timestamp: u64,
    /// 65-byte recoverable ECDSA signature, hex encoded
    pub signature: String,
}

impl Authorization {
    /// Checks the envelope against `operation` and returns the authenticated
    /// principal.
    ///
    /// # Errors
    /// - [`AuthError::Expired`] if `timestamp` is more than `max_age_secs` away
    ///   from `now` in either direction
    /// - [`AuthError::InvalidSignature`] if the signature does not parse or
    ///   recover
    /// - [`AuthError::SignerMismatch`] if it recovers to another address
    ///
    /// A valid envelope stays valid for the whole window; pair this with a
    /// [`crate::ledger::replay_guard::ReplayGuard`] to accept it only once.
    pub fn authenticate(
        &self,
        operation: &Operation,
        now: u64,
        max_age_secs: u64,
    ) -> Result<Address, AuthError> {
        if now.abs_diff(self.timestamp) > max_age_secs {
            return Err(AuthError::Expired {
                timestamp: self.timestamp,
            });
        }
        let signature =
            Signature::from_str(&self.signature).map_err(|_| AuthError::InvalidSignature)?;
        let recovered = signature
            .recover(operation.digest(self.timestamp))
            .map_err(|_| AuthError::InvalidSignature)?;
        if recovered != self.signer {
            return Err(AuthError::SignerMismatch {
                claimed: self.signer,
                recovered,
            });
        }
        Ok(recovered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::key_management::KeyManager;

    fn revoke_op() -> Operation {
        Operation::Revoke {
            id: CredentialId::from_label("CERT_001").unwrap(),
        }
    }

    #[test]
    fn test_digest_binds_fields_and_time() {
        let op = revoke_op();
        assert_eq!(op.digest(10), op.digest(10));
        assert_ne!(op.digest(10), op.digest(11));

        let other = Operation::Revoke {
            id: CredentialId::from_label("CERT_002").unwrap(),
        };
        assert_ne!(op.digest(10), other.digest(10));
    }

    #[test]
    fn test_digest_separates_operation_kinds() {
        let principal = Address::repeat_byte(0x11);
        let grant = Operation::GrantIssuer { principal };
        let revoke = Operation::RevokeIssuer { principal };
        assert_ne!(grant.digest(1), revoke.digest(1));
    }

    #[test]
    fn test_authenticate_roundtrip() {
        let keys = KeyManager::new();
        let op = revoke_op();
        let auth = keys.authorize(&op, 1_000).unwrap();
        assert_eq!(auth.authenticate(&op, 1_010, 300), Ok(keys.address()));
    }

    #[test]
    fn test_authenticate_rejects_tampered_operation() {
        let keys = KeyManager::new();
        let auth = keys.authorize(&revoke_op(), 1_000).unwrap();
        let tampered = Operation::Revoke {
            id: CredentialId::from_label("CERT_999").unwrap(),
        };
        assert!(matches!(
            auth.authenticate(&tampered, 1_000, 300),
            Err(AuthError::SignerMismatch { .. })
        ));
    }

    #[test]
    fn test_authenticate_rejects_stale_request() {
        let keys = KeyManager::new();
        let op = revoke_op();
        let auth = keys.authorize(&op, 1_000).unwrap();
        assert_eq!(
            auth.authenticate(&op, 1_301, 300),
            Err(AuthError::Expired { timestamp: 1_000 })
        );
    }

    #[test]
    fn test_authenticate_rejects_garbage_signature() {
        let keys = KeyManager::new();
        let op = revoke_op();
        let mut auth = keys.authorize(&op, 1_000).unwrap();
        auth.signature = "0xdeadbeef".into();
        assert_eq!(
            auth.authenticate(&op, 1_000, 300),
            Err(AuthError::InvalidSignature)
        );
    }
}
