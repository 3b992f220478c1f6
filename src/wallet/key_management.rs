// src/wallet/key_management.rs
//! Principal key management.
//!
//! Every principal (issuer, administrator, deployer) is a secp256k1 key pair
//! whose Ethereum-style address is the identifier the access-control gate
//! checks. This module generates or loads such keys and signs operation
//! digests with them.
//!
//! Uses the following cryptographic primitives:
//! - secp256k1 curve (via `k256` crate)
//! - Keccak-256 address derivation and recoverable signatures (via `ethers`)

use crate::models::operation::{Authorization, Operation};
use ethers::signers::{LocalWallet, Signer, WalletError};
use ethers::types::{Address, Signature, H256};
use ethers::utils::hex;
use k256::ecdsa::SigningKey;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeyError {
    #[error("private key is not valid hex: {0}")]
    Hex(String),

    #[error("private key is not a valid secp256k1 scalar")]
    InvalidKey,

    #[error(transparent)]
    Signing(#[from] WalletError),
}

/// Key material for a single principal.
///
/// # Security Notes
/// - The secret key never leaves this struct
/// - Signatures are deterministic ECDSA (RFC 6979) over prehashed digests
#[derive(Clone)]
pub struct KeyManager {
    wallet: LocalWallet,
}

impl KeyManager {
    /// Generates a fresh random key pair from the system RNG.
    pub fn new() -> Self {
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        KeyManager {
            wallet: LocalWallet::from(signing_key),
        }
    }

    /// Loads a key from a hex-encoded 32-byte secret (with or without `0x`).
    pub fn from_private_key(private_key: &str) -> Result<Self, KeyError> {
        let digits = private_key.trim();
        let digits = digits.strip_prefix("0x").unwrap_or(digits);
        let bytes = hex::decode(digits).map_err(|e| KeyError::Hex(e.to_string()))?;
        let signing_key = SigningKey::from_slice(&bytes).map_err(|_| KeyError::InvalidKey)?;
        Ok(KeyManager {
            wallet: LocalWallet::from(signing_key),
        })
    }

    /// Address identifying this principal.
    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    /// Signs a 32-byte digest without any message prefix.
    pub fn sign_digest(&self, digest: H256) -> Result<Signature, KeyError> {
        Ok(self.wallet.sign_hash(digest)?)
    }

    /// Produces the authorization envelope for `operation` at `timestamp`.
    pub fn authorize(&self, operation: &Operation, timestamp: u64) -> Result<Authorization, KeyError> {
        let signature = self.sign_digest(operation.digest(timestamp))?;
        Ok(Authorization {
            signer: self.address(),
            timestamp,
            signature: format!("0x{}", signature),
        })
    }
}

impl Default for KeyManager {
    fn default() -> Self {
        Self::new()
    }
}
