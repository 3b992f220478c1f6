// src/ledger/event_log.rs
//! Append-only event log.
//!
//! Events are never edited or removed. Each appended entry gets the next
//! sequence number, so observers can resume from the last sequence they saw.
//!
//! Appending cannot fail. Events are emitted after the store has committed the
//! change they describe, and a push never leaves the vector half-written, so a
//! poisoned lock is recovered rather than reported.

use crate::models::credential::CredentialId;
use crate::models::event::{LoggedEvent, RegistryEvent};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
pub struct EventLog {
    entries: RwLock<Vec<LoggedEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<LoggedEvent>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<LoggedEvent>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `event` stamped with `timestamp` and returns the stored entry.
    pub fn append(&self, event: RegistryEvent, timestamp: u64) -> LoggedEvent {
        let mut entries = self.write();
        let logged = LoggedEvent {
            sequence: entries.len() as u64 + 1,
            timestamp,
            event,
        };
        entries.push(logged.clone());
        logged
    }

    /// Entries with a sequence number greater than `after`.
    pub fn since(&self, after: u64) -> Vec<LoggedEvent> {
        self.read()
            .iter()
            .filter(|e| e.sequence > after)
            .cloned()
            .collect()
    }

    /// Entries concerning a single credential, oldest first.
    pub fn for_credential(&self, id: &CredentialId) -> Vec<LoggedEvent> {
        self.read()
            .iter()
            .filter(|e| e.event.credential_id() == Some(id))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
