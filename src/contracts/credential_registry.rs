// src/contracts/credential_registry.rs
//! Credential registry service.
//!
//! Orchestrates issue, verify and revoke against the [`AccessControl`] gate
//! and a [`CredentialStore`], and appends lifecycle events to the
//! [`EventLog`]. An event is appended only after the store has committed the
//! change it describes.
//!
//! Per-record state machine: `Absent -> Issued -> Revoked`. Nothing leads back
//! out of `Revoked`.
//!
//! The registry compares opaque commitments only. It never derives one and
//! never sees the holder's identity fields or salt.

use crate::contracts::access_control::AccessControl;
use crate::error::RegistryError;
use crate::ledger::clock::Clock;
use crate::ledger::event_log::EventLog;
use crate::models::credential::{Commitment, CredentialId, CredentialRecord, VerificationResult};
use crate::models::event::{LoggedEvent, RegistryEvent};
use crate::models::operation::Operation;
use crate::storage::CredentialStore;
use ethers::types::Address;
use std::sync::Arc;

/// Behavioural switches for the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryOptions {
    /// Reject re-issuing an existing id instead of overwriting it.
    ///
    /// Off by default: concurrent issues of one id resolve last-writer-wins.
    pub strict_uniqueness: bool,
}

/// Registry over a credential store, an issuer gate, an event log and a clock.
#[derive(Clone)]
pub struct RegistryService {
    access: AccessControl,
    store: Arc<dyn CredentialStore>,
    events: Arc<EventLog>,
    clock: Arc<dyn Clock>,
    options: RegistryOptions,
}

impl RegistryService {
    pub fn new(
        access: AccessControl,
        store: Arc<dyn CredentialStore>,
        events: Arc<EventLog>,
        clock: Arc<dyn Clock>,
        options: RegistryOptions,
    ) -> Self {
        Self {
            access,
            store,
            events,
            clock,
            options,
        }
    }

    pub fn options(&self) -> RegistryOptions {
        self.options
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Records a new credential.
    ///
    /// With the default options an existing record under `id` is silently
    /// overwritten, including a revoked one.
    ///
    /// # Errors
    /// - [`RegistryError::Unauthorized`] if `caller` is not an issuer
    /// - [`RegistryError::AlreadyIssued`] if `id` exists and strict uniqueness is on
    /// - [`RegistryError::StorageFailure`] if the store rejects the write
    pub fn issue(
        &self,
        caller: &Address,
        id: CredentialId,
        commitment: Commitment,
        title: String,
        issuer: String,
        expires_at: u64,
    ) -> Result<CredentialRecord, RegistryError> {
        self.access.ensure_issuer(caller)?;

        let now = self.clock.now();
        let record =
            CredentialRecord::issued(id, commitment, title, issuer, now, expires_at);

        if self.options.strict_uniqueness {
            if !self.store.put_if_absent(id, record.clone())? {
                log::warn!("rejected re-issue of credential {}", id);
                return Err(RegistryError::AlreadyIssued(id));
            }
        } else {
            self.store.put(id, record.clone())?;
        }

        self.events.append(
            RegistryEvent::CredentialIssued {
                id,
                commitment,
                title: record.title.clone(),
                issuer: record.issuer.clone(),
            },
            now,
        );
        log::info!("credential {} issued by {:?}", id, caller);
        Ok(record)
    }

    /// Checks a presented commitment against the stored record.
    ///
    /// Open to anyone. An unknown id is a normal, reportable outcome and
    /// yields [`VerificationResult::not_found`]. The only error is a storage
    /// failure.
    pub fn verify(
        &self,
        id: &CredentialId,
        commitment: &Commitment,
    ) -> Result<VerificationResult, RegistryError> {
        let result = match self.store.get(id)? {
            Some(record) => VerificationResult::evaluate(&record, commitment, self.clock.now()),
            None => VerificationResult::not_found(),
        };
        log::debug!(
            "verified credential {}: valid={} revoked={}",
            id,
            result.valid,
            result.revoked
        );
        Ok(result)
    }

    /// Irreversibly revokes an issued credential.
    ///
    /// Revoking an already revoked credential succeeds without emitting a
    /// second event.
    ///
    /// # Errors
    /// - [`RegistryError::Unauthorized`] if `caller` is not an issuer
    /// - [`RegistryError::NotFound`] if `id` was never issued
    pub fn revoke(&self, caller: &Address, id: &CredentialId) -> Result<(), RegistryError> {
        self.access.ensure_issuer(caller)?;

        if self.store.mark_revoked(id)? {
            self.events.append(
                RegistryEvent::CredentialRevoked { id: *id },
                self.clock.now(),
            );
            log::info!("credential {} revoked by {:?}", id, caller);
        } else {
            log::debug!("credential {} was already revoked", id);
        }
        Ok(())
    }

    pub fn is_issuer(&self, principal: &Address) -> Result<bool, RegistryError> {
        self.access.is_issuer(principal)
    }

    pub fn issuers(&self) -> Result<Vec<Address>, RegistryError> {
        self.access.issuers()
    }

    /// Grants the issuer capability; gated by the same capability.
    pub fn grant_issuer(&self, caller: &Address, principal: Address) -> Result<(), RegistryError> {
        if self.access.grant_issuer(caller, principal)? {
            self.events.append(
                RegistryEvent::IssuerGranted {
                    principal,
                    granted_by: *caller,
                },
                self.clock.now(),
            );
            log::info!("issuer capability granted to {:?} by {:?}", principal, caller);
        }
        Ok(())
    }

    /// Withdraws the issuer capability; gated by the same capability.
    pub fn revoke_issuer(&self, caller: &Address, principal: Address) -> Result<(), RegistryError> {
        if self.access.revoke_issuer(caller, &principal)? {
            self.events.append(
                RegistryEvent::IssuerRevoked {
                    principal,
                    revoked_by: *caller,
                },
                self.clock.now(),
            );
            log::info!("issuer capability revoked from {:?} by {:?}", principal, caller);
        }
        Ok(())
    }

    /// Executes an authenticated mutating operation on behalf of `caller`.
    pub fn apply(&self, caller: &Address, operation: Operation) -> Result<(), RegistryError> {
        match operation {
            Operation::Issue {
                id,
                commitment,
                title,
                issuer,
                expires_at,
            } => self
                .issue(caller, id, commitment, title, issuer, expires_at)
                .map(|_| ()),
            Operation::Revoke { id } => self.revoke(caller, &id),
            Operation::GrantIssuer { principal } => self.grant_issuer(caller, principal),
            Operation::RevokeIssuer { principal } => self.revoke_issuer(caller, principal),
        }
    }

    /// Events concerning `id`, oldest first.
    pub fn history(&self, id: &CredentialId) -> Result<Vec<LoggedEvent>, RegistryError> {
        Ok(self.events.for_credential(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::ledger::clock::ManualClock;
    use crate::storage::{JsonFileStore, MemoryStore};
    use crate::utils::crypto::derive_commitment;
    use tempfile::tempdir;

    const T0: u64 = 1_700_000_000;

    struct Fixture {
        registry: RegistryService,
        clock: Arc<ManualClock>,
        store: Arc<MemoryStore>,
        owner: Address,
        outsider: Address,
    }

    fn fixture(options: RegistryOptions) -> Fixture {
        let owner = Address::repeat_byte(0x0a);
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(T0));
        let access = AccessControl::new(store.clone(), owner).unwrap();
        let registry = RegistryService::new(
            access,
            store.clone(),
            Arc::new(EventLog::new()),
            clock.clone(),
            options,
        );
        Fixture {
            registry,
            clock,
            store,
            owner,
            outsider: Address::repeat_byte(0x0b),
        }
    }

    fn cert() -> CredentialId {
        CredentialId::from_label("CERT_001").unwrap()
    }

    fn good() -> Commitment {
        derive_commitment("85264178523", "AHMET AÇIKGÖZ", "randomSalt123")
    }

    fn issue_diploma(f: &Fixture, expires_at: u64) {
        f.registry
            .issue(&f.owner, cert(), good(), "Diploma".into(), "KTUN".into(), expires_at)
            .unwrap();
    }

    #[test]
    fn test_issue_then_verify_scenario() {
        let f = fixture(RegistryOptions::default());
        issue_diploma(&f, 0);

        let ok = f.registry.verify(&cert(), &good()).unwrap();
        assert_eq!(
            ok,
            VerificationResult {
                valid: true,
                revoked: false,
                issued_at: T0,
                expires_at: 0,
                title: "Diploma".into(),
                issuer: "KTUN".into(),
            }
        );

        let wrong_salt = derive_commitment("85264178523", "AHMET AÇIKGÖZ", "wrongSalt");
        let bad = f.registry.verify(&cert(), &wrong_salt).unwrap();
        assert!(!bad.valid);
        assert!(!bad.revoked);
        assert_eq!(bad.title, "Diploma");

        f.registry.revoke(&f.owner, &cert()).unwrap();
        let revoked = f.registry.verify(&cert(), &good()).unwrap();
        assert!(!revoked.valid);
        assert!(revoked.revoked);
    }

    #[test]
    fn test_verify_unknown_is_empty() {
        let f = fixture(RegistryOptions::default());
        let result = f.registry.verify(&cert(), &good()).unwrap();
        assert_eq!(result, VerificationResult::not_found());
    }

    #[test]
    fn test_non_issuer_cannot_issue() {
        let f = fixture(RegistryOptions::default());
        let err = f
            .registry
            .issue(&f.outsider, cert(), good(), "Test".into(), "KTU".into(), 0)
            .unwrap_err();
        assert!(matches!(err, RegistryError::Unauthorized(a) if a == f.outsider));
        assert_eq!(f.store.count().unwrap(), 0);
        assert_eq!(f.registry.events().len(), 0);
    }

    #[test]
    fn test_non_issuer_cannot_revoke() {
        let f = fixture(RegistryOptions::default());
        issue_diploma(&f, 0);
        assert!(matches!(
            f.registry.revoke(&f.outsider, &cert()),
            Err(RegistryError::Unauthorized(_))
        ));
        assert!(f.registry.verify(&cert(), &good()).unwrap().valid);
    }

    #[test]
    fn test_revoke_unknown_is_not_found() {
        let f = fixture(RegistryOptions::default());
        assert!(matches!(
            f.registry.revoke(&f.owner, &cert()),
            Err(RegistryError::NotFound(id)) if id == cert()
        ));
    }

    #[test]
    fn test_revoke_twice_keeps_flag_and_single_event() {
        let f = fixture(RegistryOptions::default());
        issue_diploma(&f, 0);
        f.registry.revoke(&f.owner, &cert()).unwrap();
        f.registry.revoke(&f.owner, &cert()).unwrap();

        assert!(f.registry.verify(&cert(), &good()).unwrap().revoked);
        let history = f.registry.history(&cert()).unwrap();
        assert_eq!(history.len(), 2);
        assert!(matches!(history[1].event, RegistryEvent::CredentialRevoked { .. }));
    }

    #[test]
    fn test_expiry() {
        let f = fixture(RegistryOptions::default());
        issue_diploma(&f, T0 + 100);

        f.clock.advance(99);
        assert!(f.registry.verify(&cert(), &good()).unwrap().valid);

        f.clock.advance(1);
        let expired = f.registry.verify(&cert(), &good()).unwrap();
        assert!(!expired.valid);
        assert!(!expired.revoked);
        assert_eq!(expired.expires_at, T0 + 100);
    }

    #[test]
    fn test_reissue_overwrites_by_default() {
        let f = fixture(RegistryOptions::default());
        issue_diploma(&f, 0);
        f.registry.revoke(&f.owner, &cert()).unwrap();

        let other = derive_commitment("1", "SOMEONE ELSE", "x");
        f.registry
            .issue(&f.owner, cert(), other, "Transcript".into(), "KTUN".into(), 0)
            .unwrap();

        assert!(!f.registry.verify(&cert(), &good()).unwrap().valid);
        let now = f.registry.verify(&cert(), &other).unwrap();
        assert!(now.valid);
        assert_eq!(now.title, "Transcript");
    }

    #[test]
    fn test_strict_uniqueness_rejects_reissue() {
        let f = fixture(RegistryOptions {
            strict_uniqueness: true,
        });
        issue_diploma(&f, 0);
        let err = f
            .registry
            .issue(&f.owner, cert(), good(), "Copy".into(), "KTUN".into(), 0)
            .unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyIssued(_)));
        assert_eq!(f.registry.verify(&cert(), &good()).unwrap().title, "Diploma");
        assert_eq!(f.registry.events().len(), 1);
    }

    #[test]
    fn test_issued_event_contents() {
        let f = fixture(RegistryOptions::default());
        issue_diploma(&f, 0);
        let events = f.registry.events().since(0);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].timestamp, T0);
        assert_eq!(
            events[0].event,
            RegistryEvent::CredentialIssued {
                id: cert(),
                commitment: good(),
                title: "Diploma".into(),
                issuer: "KTUN".into(),
            }
        );
    }

    #[test]
    fn test_issuer_governance_through_apply() {
        let f = fixture(RegistryOptions::default());
        let newcomer = Address::repeat_byte(0x0c);

        f.registry
            .apply(&f.owner, Operation::GrantIssuer { principal: newcomer })
            .unwrap();
        f.registry
            .apply(
                &newcomer,
                Operation::Issue {
                    id: cert(),
                    commitment: good(),
                    title: "Diploma".into(),
                    issuer: "KTUN".into(),
                    expires_at: 0,
                },
            )
            .unwrap();
        assert!(f.registry.verify(&cert(), &good()).unwrap().valid);

        f.registry
            .apply(&f.owner, Operation::RevokeIssuer { principal: newcomer })
            .unwrap();
        assert!(matches!(
            f.registry.apply(&newcomer, Operation::Revoke { id: cert() }),
            Err(RegistryError::Unauthorized(_))
        ));
        assert!(!f.registry.is_issuer(&newcomer).unwrap());
        assert_eq!(f.registry.issuers().unwrap(), vec![f.owner]);
    }

    #[test]
    fn test_storage_failure_reaches_caller() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("registry.json");
        let owner = Address::repeat_byte(0x0a);
        let store = Arc::new(JsonFileStore::open(&path).unwrap());
        let registry = RegistryService::new(
            AccessControl::new(store.clone(), owner).unwrap(),
            store,
            Arc::new(EventLog::new()),
            Arc::new(ManualClock::new(T0)),
            RegistryOptions::default(),
        );
        std::fs::create_dir(path.with_extension("json.tmp")).unwrap();

        let err = registry
            .issue(&owner, cert(), good(), "Diploma".into(), "KTUN".into(), 0)
            .unwrap_err();
        assert!(matches!(err, RegistryError::StorageFailure(StorageError::Io(_))));
        assert_eq!(registry.verify(&cert(), &good()).unwrap(), VerificationResult::not_found());
        assert!(registry.events().is_empty());
    }
}
