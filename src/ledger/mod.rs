//! Ledger-facing collaborators: the time source, the append-only event log,
//! and the single-use record of signed requests.

pub mod clock;
pub mod event_log;
pub mod replay_guard;
