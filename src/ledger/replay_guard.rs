// src/ledger/replay_guard.rs
//! Single-use tracking for signed requests.
//!
//! A signed operation digest already binds the operation fields and the
//! signing timestamp, so a `(signer, digest)` pair names one request. Each
//! pair is accepted once. Entries are kept only while their timestamp is still
//! inside the freshness window; past that, `Authorization::authenticate`
//! rejects the request as expired anyway.

use crate::error::AuthError;
use ethers::types::{Address, H256};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

#[derive(Debug)]
pub struct ReplayGuard {
    window_secs: u64,
    seen: Mutex<HashMap<(Address, H256), u64>>,
}

impl ReplayGuard {
    pub fn new(window_secs: u64) -> Self {
        Self {
            window_secs,
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// Records the request signed by `signer` over `digest` at `timestamp`.
    ///
    /// # Errors
    /// [`AuthError::Replayed`] if the same pair was already admitted and has
    /// not yet aged out of the window.
    pub fn admit(
        &self,
        signer: Address,
        digest: H256,
        timestamp: u64,
        now: u64,
    ) -> Result<(), AuthError> {
        // The map is never left half-updated, so a poisoned lock is still usable.
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        let window = self.window_secs;
        seen.retain(|_, signed_at| signed_at.saturating_add(window) >= now);

        if seen.contains_key(&(signer, digest)) {
            log::warn!("rejected replayed request from {:?}", signer);
            return Err(AuthError::Replayed { signer });
        }
        seen.insert((signer, digest), timestamp);
        Ok(())
    }

    /// Number of requests currently remembered.
    pub fn tracked(&self) -> usize {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest(b: u8) -> H256 {
        H256::repeat_byte(b)
    }

    #[test]
    fn test_second_use_is_rejected() {
        let guard = ReplayGuard::new(300);
        let signer = Address::repeat_byte(1);
        guard.admit(signer, digest(1), 1_000, 1_000).unwrap();
        assert_eq!(
            guard.admit(signer, digest(1), 1_000, 1_010),
            Err(AuthError::Replayed { signer })
        );
    }

    #[test]
    fn test_distinct_requests_are_independent() {
        let guard = ReplayGuard::new(300);
        let a = Address::repeat_byte(1);
        let b = Address::repeat_byte(2);
        guard.admit(a, digest(1), 1_000, 1_000).unwrap();
        guard.admit(a, digest(2), 1_000, 1_000).unwrap();
        guard.admit(b, digest(1), 1_000, 1_000).unwrap();
        assert_eq!(guard.tracked(), 3);
    }

    #[test]
    fn test_entries_age_out_with_the_window() {
        let guard = ReplayGuard::new(300);
        let signer = Address::repeat_byte(1);
        guard.admit(signer, digest(1), 1_000, 1_000).unwrap();

        // still inside the window: remembered
        guard.admit(signer, digest(2), 1_300, 1_300).unwrap();
        assert_eq!(guard.tracked(), 2);

        guard.admit(signer, digest(3), 1_301, 1_301).unwrap();
        assert_eq!(guard.tracked(), 2);
    }

    #[test]
    fn test_future_dated_request_is_kept_until_it_expires() {
        let guard = ReplayGuard::new(300);
        let signer = Address::repeat_byte(1);
        guard.admit(signer, digest(1), 1_250, 1_000).unwrap();
        assert!(guard.admit(signer, digest(1), 1_250, 1_540).is_err());
    }
}
