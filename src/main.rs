// src/main.rs

//! # Credential Registry - Main Entry Point
//!
//! Issues, verifies and revokes tamper-evident credential records without
//! storing any personally identifying data. Each record holds a keyed
//! commitment over the holder's identity fields, and verifiers recompute that
//! commitment off-registry and compare.
//!
//! ## Architecture Overview
//! 1. **Contracts Layer**: `AccessControl` issuer gate and `RegistryService`
//! 2. **Storage Layer**: credential and issuer tables, in memory or as a JSON snapshot
//! 3. **Ledger Layer**: clock and append-only event log
//! 4. **Services Layer**: HTTP API plus caller-side issuer and verifier helpers
//! 5. **Wallet Layer**: secp256k1 principal keys
//!
//! ## Environment Variables
//! - `PRIVATE_KEY`: (Optional) hex key of the deploying principal, seeded as
//!   first issuer when the issuer set is first created
//! - `REGISTRY_CONFIG`: (Optional) settings file (default: registry.toml)
//! - `REGISTRY__…`: settings overrides, see `settings.rs`
//! - `RUST_LOG`: log filter (default: info)

use anyhow::Context;
use credential_registry::ledger::clock::SystemClock;
use credential_registry::ledger::event_log::EventLog;
use credential_registry::services::api_server::ApiServer;
use credential_registry::settings::Settings;
use credential_registry::storage::{CredentialStore, JsonFileStore, MemoryStore, PrincipalStore};
use credential_registry::wallet::key_management::KeyManager;
use credential_registry::{AccessControl, RegistryOptions, RegistryService};
use dotenv::dotenv;
use ethers::types::Address;
use std::sync::Arc;

/// Main application entry point
///
/// # Initialization Sequence
/// 1. Load environment and settings
/// 2. Load or generate the deployer key
/// 3. Open storage and assemble the registry
/// 4. Start API server
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::load().context("failed to load settings")?;

    let deployer = match std::env::var("PRIVATE_KEY") {
        Ok(key) => KeyManager::from_private_key(&key).context("PRIVATE_KEY is invalid")?,
        Err(_) => {
            let keys = KeyManager::new();
            log::warn!(
                "PRIVATE_KEY not set; generated ephemeral deployer {:?}",
                keys.address()
            );
            keys
        }
    };

    let registry = match &settings.storage.path {
        Some(path) => {
            let store = Arc::new(
                JsonFileStore::open(path)
                    .with_context(|| format!("failed to open {}", path.display()))?,
            );
            assemble(store, deployer.address(), &settings)?
        }
        None => {
            log::warn!("storage.path not set; registry state will not survive restarts");
            assemble(Arc::new(MemoryStore::new()), deployer.address(), &settings)?
        }
    };

    log::info!(
        "registry ready: deployer {:?}, {} issuer(s), strict uniqueness {}",
        deployer.address(),
        registry.issuers()?.len(),
        registry.options().strict_uniqueness
    );

    let api_server = Arc::new(ApiServer::new(
        Arc::new(registry),
        settings.auth.max_request_age_secs,
    ));
    api_server
        .run(settings.server.bind_addr)
        .await
        .context("API server failed")?;
    Ok(())
}

/// Wires one store into both tables. The deployer and the configured issuers
/// are only seeded into a fresh issuer set.
fn assemble<S>(store: Arc<S>, deployer: Address, settings: &Settings) -> anyhow::Result<RegistryService>
where
    S: CredentialStore + PrincipalStore + 'static,
{
    let access =
        AccessControl::with_initial_issuers(store.clone(), deployer, &settings.registry.initial_issuers)?;
    if !access.is_issuer(&deployer)? {
        log::warn!("deployer {:?} does not hold the issuer capability", deployer);
    }
    Ok(RegistryService::new(
        access,
        store,
        Arc::new(EventLog::new()),
        Arc::new(SystemClock),
        RegistryOptions {
            strict_uniqueness: settings.registry.strict_uniqueness,
        },
    ))
}
