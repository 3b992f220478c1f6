// src/models/credential.rs
//! Credential record data model.
//!
//! Defines the fixed-width identifiers and commitments the registry stores,
//! together with the stored record and the flat result returned by `verify`.
//! The registry never sees holder identity fields: a record only carries the
//! opaque [`Commitment`] the issuer derived off-registry.

use crate::error::RegistryError;
use crate::utils::serialization::{decode_bytes32, encode_bytes32};
use ethers::utils::{format_bytes32_string, parse_bytes32_string};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Fixed-width (32-byte) credential identifier chosen by the issuer.
///
/// Two textual forms are accepted when parsing:
/// - `0x` followed by 64 hex digits, taken as the raw bytes
/// - any other non-empty UTF-8 label of at most 31 bytes, right-padded with
///   zeros (the same layout as Solidity's `bytes32` string encoding)
///
/// The all-zero identifier is rejected; it reads the same as an unset slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CredentialId([u8; 32]);

impl CredentialId {
    /// Wraps raw bytes, rejecting the all-zero value.
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, RegistryError> {
        if bytes == [0u8; 32] {
            return Err(RegistryError::MalformedIdentifier(
                "identifier must not be all zero".into(),
            ));
        }
        Ok(Self(bytes))
    }

    /// Encodes a human-readable label such as `"CERT_001"`.
    pub fn from_label(label: &str) -> Result<Self, RegistryError> {
        if label.is_empty() {
            return Err(RegistryError::MalformedIdentifier(
                "identifier must not be empty".into(),
            ));
        }
        // one byte is reserved for the terminator
        let too_long = || {
            RegistryError::MalformedIdentifier(format!(
                "label is {} bytes, at most 31 are allowed",
                label.len()
            ))
        };
        if label.len() > 31 {
            return Err(too_long());
        }
        let bytes = format_bytes32_string(label).map_err(|_| too_long())?;
        Self::from_bytes(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Decodes the identifier back to its label, if it was built from one.
    pub fn label(&self) -> Option<String> {
        let label = parse_bytes32_string(&self.0).ok()?;
        if label.is_empty() || label.len() == 32 {
            return None;
        }
        // Anything after the terminator must be padding.
        if self.0[label.len()..].iter().any(|b| *b != 0) {
            return None;
        }
        Some(label.to_owned())
    }
}

impl FromStr for CredentialId {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("0x") && s.len() == 66 {
            let bytes = decode_bytes32(s).map_err(RegistryError::MalformedIdentifier)?;
            return Self::from_bytes(bytes);
        }
        Self::from_label(s)
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label() {
            Some(label) => f.write_str(&label),
            None => f.write_str(&encode_bytes32(&self.0)),
        }
    }
}

impl fmt::Debug for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CredentialId({})", self)
    }
}

impl Serialize for CredentialId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode_bytes32(&self.0))
    }
}

impl<'de> Deserialize<'de> for CredentialId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Opaque 32-byte keyed commitment over the holder's identity fields.
///
/// Only equality is meaningful; see [`crate::utils::crypto::derive_commitment`]
/// for how callers produce one.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Commitment([u8; 32]);

impl Commitment {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl FromStr for Commitment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_bytes32(s).map(Self)
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_bytes32(&self.0))
    }
}

impl fmt::Debug for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Commitment({})", self)
    }
}

impl Serialize for Commitment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode_bytes32(&self.0))
    }
}

impl<'de> Deserialize<'de> for Commitment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A credential as held by the registry.
///
/// Immutable after issuance except for `revoked`, which only ever moves from
/// `false` to `true`.
///
/// # Fields
/// - `id`: storage key
/// - `commitment`: keyed hash of the holder's identity fields
/// - `title`: credential title, e.g. "Diploma"
/// - `issuer`: display name of the issuing institution
/// - `issued_at`: unix seconds at which the record was written
/// - `expires_at`: unix seconds, `0` meaning the credential never expires
/// - `revoked`: revocation flag
/// - `exists`: set on every issued record; storage lookups check it explicitly
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub id: CredentialId,
    pub commitment: Commitment,
    pub title: String,
    pub issuer: String,
    #[serde(default)]
    pub issued_at: u64,
    pub expires_at: u64,
    pub revoked: bool,
    pub exists: bool,
}

impl CredentialRecord {
    /// Builds a freshly issued, unrevoked record.
    pub fn issued(
        id: CredentialId,
        commitment: Commitment,
        title: String,
        issuer: String,
        issued_at: u64,
        expires_at: u64,
    ) -> Self {
        Self {
            id,
            commitment,
            title,
            issuer,
            issued_at,
            expires_at,
            revoked: false,
            exists: true,
        }
    }

    /// True once `now` has reached a non-zero `expires_at`.
    pub fn is_expired(&self, now: u64) -> bool {
        self.expires_at != 0 && now >= self.expires_at
    }
}

/// Flat answer to a `verify` call.
///
/// Mirrors the `(valid, revoked, issuedAt, expiresAt, title, issuer)` tuple of
/// the public contract. An unknown id yields the all-default value, which is
/// only distinguishable from an invalid record by its empty `title`/`issuer`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationResult {
    pub valid: bool,
    pub revoked: bool,
    pub issued_at: u64,
    pub expires_at: u64,
    pub title: String,
    pub issuer: String,
}

impl VerificationResult {
    pub fn not_found() -> Self {
        Self::default()
    }

    /// Evaluates `record` against a presented commitment at time `now`.
    pub fn evaluate(record: &CredentialRecord, presented: &Commitment, now: u64) -> Self {
        let valid =
            record.commitment == *presented && !record.revoked && !record.is_expired(now);
        Self {
            valid,
            revoked: record.revoked,
            issued_at: record.issued_at,
            expires_at: record.expires_at,
            title: record.title.clone(),
            issuer: record.issuer.clone(),
        }
    }

    /// True when the response describes a record that exists.
    pub fn found(&self) -> bool {
        !self.title.is_empty() || !self.issuer.is_empty() || self.issued_at != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(expires_at: u64) -> CredentialRecord {
        CredentialRecord::issued(
            CredentialId::from_label("CERT_001").unwrap(),
            Commitment::from_bytes([7u8; 32]),
            "Diploma".into(),
            "KTUN".into(),
            100,
            expires_at,
        )
    }

    #[test]
    fn test_label_roundtrip() {
        let id = CredentialId::from_label("CERT_001").unwrap();
        assert_eq!(id.label().as_deref(), Some("CERT_001"));
        assert_eq!(&id.as_bytes()[..8], b"CERT_001");
        assert!(id.as_bytes()[8..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_label_too_long() {
        let label = "x".repeat(32);
        assert!(matches!(
            CredentialId::from_label(&label),
            Err(RegistryError::MalformedIdentifier(_))
        ));
        assert!(CredentialId::from_label(&"x".repeat(31)).is_ok());
    }

    #[test]
    fn test_empty_and_zero_rejected() {
        assert!(CredentialId::from_label("").is_err());
        assert!(CredentialId::from_bytes([0u8; 32]).is_err());
        let zero = format!("0x{}", "0".repeat(64));
        assert!(zero.parse::<CredentialId>().is_err());
    }

    #[test]
    fn test_parse_hex_identifier() {
        let hex = format!("0x{}", "ab".repeat(32));
        let id: CredentialId = hex.parse().unwrap();
        assert_eq!(id.as_bytes(), &[0xab; 32]);
        assert_eq!(id.label(), None);
        assert_eq!(id.to_string(), hex);
    }

    #[test]
    fn test_serde_uses_hex() {
        let id = CredentialId::from_label("ID1").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert!(json.starts_with("\"0x4944310000"));
        let back: CredentialId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_evaluate_expiry_boundary() {
        let rec = record(200);
        let good = Commitment::from_bytes([7u8; 32]);
        assert!(VerificationResult::evaluate(&rec, &good, 199).valid);
        assert!(!VerificationResult::evaluate(&rec, &good, 200).valid);
        assert!(VerificationResult::evaluate(&record(0), &good, u64::MAX).valid);
    }

    #[test]
    fn test_evaluate_keeps_metadata_when_invalid() {
        let rec = record(0);
        let result = VerificationResult::evaluate(&rec, &Commitment::from_bytes([1u8; 32]), 0);
        assert!(!result.valid);
        assert!(!result.revoked);
        assert_eq!(result.title, "Diploma");
        assert_eq!(result.issuer, "KTUN");
        assert!(result.found());
        assert!(!VerificationResult::not_found().found());
    }
}
