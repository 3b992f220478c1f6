//! Privacy-preserving credential registry.
//!
//! Issuers record credentials keyed by a fixed-width identifier, storing a
//! keyed commitment over the holder's identity instead of the identity itself.
//! Anyone can verify a credential by presenting the recomputed commitment.
//! Only authorized issuers can issue or revoke.

pub mod contracts;     // Issuer gate and registry logic
pub mod error;         // Error taxonomy
pub mod ledger;        // Clock and event log
pub mod models;        // Data structures
pub mod services;      // API and caller-side helpers
pub mod settings;      // Layered settings
pub mod storage;       // Persistence layer
pub mod utils;         // Hashing and encoding helpers
pub mod wallet;        // Principal key operations

pub use contracts::access_control::AccessControl;
pub use contracts::credential_registry::{RegistryOptions, RegistryService};
pub use error::{AuthError, RegistryError, StorageError};
