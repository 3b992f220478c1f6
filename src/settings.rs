// src/settings.rs
//! Layered runtime settings.
//!
//! Sources, later ones overriding earlier ones:
//! 1. built-in defaults
//! 2. optional `registry.toml` (or the file named by `REGISTRY_CONFIG`)
//! 3. environment variables prefixed `REGISTRY__`, e.g.
//!    `REGISTRY__SERVER__BIND_ADDR=0.0.0.0:3000` or
//!    `REGISTRY__REGISTRY__INITIAL_ISSUERS=0xabc…,0xdef…`
//!
//! The deployer key is read separately from `PRIVATE_KEY`.

use config::{Config, ConfigError, Environment, File};
use ethers::types::Address;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub registry: RegistrySettings,
    #[serde(default)]
    pub storage: StorageSettings,
    pub auth: AuthSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub bind_addr: SocketAddr,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrySettings {
    /// Reject re-issuing an existing credential id
    pub strict_uniqueness: bool,
    /// Principals seeded with the issuer capability alongside the deployer when
    /// the issuer set is first created
    #[serde(default)]
    pub initial_issuers: Vec<Address>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageSettings {
    /// Snapshot file; state is kept in memory only when unset
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// Largest accepted distance between a signed request's timestamp and now
    pub max_request_age_secs: u64,
}

impl Settings {
    /// Loads settings from the default file location and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let file = std::env::var("REGISTRY_CONFIG").unwrap_or_else(|_| "registry.toml".into());
        let env = Environment::with_prefix("REGISTRY")
            .prefix_separator("__")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("registry.initial_issuers")
            .try_parsing(true);
        Self::from_sources(Some(file.as_str()), env)
    }

    fn from_sources(file: Option<&str>, env: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.bind_addr", "127.0.0.1:3000")?
            .set_default("registry.strict_uniqueness", false)?
            .set_default("auth.max_request_age_secs", 300)?;
        if let Some(file) = file {
            builder = builder.add_source(File::with_name(file).required(false));
        }
        builder.add_source(env).build()?.try_deserialize()
    }
}
