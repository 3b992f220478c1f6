// src/utils/serialization.rs
//! Serialization utilities for the registry.
//!
//! Provides:
//! - JSON (de)serialization wrappers used by the file-backed store
//! - `0x`-prefixed hex encoding of fixed-width 32-byte values

use ethers::utils::hex;
use serde::{Deserialize, Serialize};

/// Serializes a value to a pretty-printed JSON string.
///
/// # Returns
/// - `Ok(String)` with JSON representation on success
/// - `Err(serde_json::Error)` if serialization fails
pub fn serialize<T: Serialize>(data: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(data)
}

/// Deserializes a value from a JSON string.
pub fn deserialize<'a, T: Deserialize<'a>>(data: &'a str) -> Result<T, serde_json::Error> {
    serde_json::from_str(data)
}

/// Encodes 32 bytes as a lowercase `0x`-prefixed hex string.
pub fn encode_bytes32(bytes: &[u8; 32]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decodes a 32-byte value from hex, with or without the `0x` prefix.
///
/// # Errors
/// Returns a human-readable reason if the input is not valid hex or does not
/// decode to exactly 32 bytes.
pub fn decode_bytes32(input: &str) -> Result<[u8; 32], String> {
    let digits = input.strip_prefix("0x").unwrap_or(input);
    if digits.len() != 64 {
        return Err(format!(
            "expected 64 hex digits, got {}",
            digits.len()
        ));
    }
    let bytes = hex::decode(digits).map_err(|e| format!("invalid hex: {}", e))?;
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Ok(out)
}
