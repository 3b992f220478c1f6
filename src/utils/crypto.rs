// src/utils/crypto.rs
//! Cryptographic utilities optimized for blockchain compatibility.
//!
//! Uses Keccak-256 (Ethereum's standard hash function) for all operations,
//! which keeps commitments byte-identical to the ones browser clients compute
//! with `ethers.keccak256(ethers.toUtf8Bytes(...))`.
//!
//! Commitment derivation runs on the caller's side of the trust boundary. The
//! registry itself only stores and compares the resulting opaque values.

use crate::models::credential::Commitment;
use ethers::utils::{hex, keccak256};
use rand::RngCore;

/// Separator placed between identity fields and the salt.
pub const FIELD_SEPARATOR: char = '|';

/// Number of random bytes in a generated salt.
pub const SALT_LEN: usize = 16;

/// Computes a Keccak-256 hash of the input data (Ethereum-compatible).
pub fn hash_data(data: &[u8]) -> [u8; 32] {
    keccak256(data)
}

/// Whitespace as browser clients trim it with `String.prototype.trim`.
///
/// That set is Unicode `White_Space` plus U+FEFF, minus U+0085, so it differs
/// from [`str::trim`] in exactly those two characters.
fn is_client_whitespace(c: char) -> bool {
    c == '\u{FEFF}' || (c != '\u{0085}' && c.is_whitespace())
}

/// Strips leading and trailing whitespace the same way browser clients do.
pub fn trim_field(field: &str) -> &str {
    field.trim_matches(is_client_whitespace)
}

/// Canonical form of the holder's name: trimmed and upper-cased.
///
/// Makes verification tolerant of casing and surrounding whitespace, but not
/// of any change to the name itself.
pub fn normalize_name(name: &str) -> String {
    trim_field(name).to_uppercase()
}

/// Builds the exact preimage hashed into a commitment.
///
/// `national_id` and `salt` are trimmed with [`trim_field`], `name` is
/// normalized with [`normalize_name`].
pub fn commitment_preimage(national_id: &str, name: &str, salt: &str) -> String {
    format!(
        "{}{sep}{}{sep}{}",
        trim_field(national_id),
        normalize_name(name),
        trim_field(salt),
        sep = FIELD_SEPARATOR
    )
}

/// Derives the identity commitment stored by the registry.
///
/// `commitment = keccak256(trim(national_id) | upper(trim(name)) | trim(salt))`
///
/// # Example
/// ```ignore
/// let c = derive_commitment("85264178523", "Ahmet Açıkgöz", "randomSalt123");
/// assert_eq!(c, derive_commitment(" 85264178523", "AHMET AÇIKGÖZ ", "randomSalt123"));
/// ```
pub fn derive_commitment(national_id: &str, name: &str, salt: &str) -> Commitment {
    let preimage = commitment_preimage(national_id, name, salt);
    Commitment::from_bytes(hash_data(preimage.as_bytes()))
}

/// Generates a fresh random salt as lowercase hex.
///
/// The registry never stores salts; whoever calls this must keep the value,
/// since verification is impossible without it.
pub fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preimage_layout() {
        assert_eq!(
            commitment_preimage(" 85264178523 ", "  ahmet açıkgöz ", " randomSalt123"),
            "85264178523|AHMET AÇIKGÖZ|randomSalt123"
        );
    }

    #[test]
    fn test_commitment_matches_plain_keccak() {
        let expected = keccak256("85264178523|AHMET AÇIKGÖZ|randomSalt123".as_bytes());
        let c = derive_commitment("85264178523", "Ahmet Açıkgöz", "randomSalt123");
        assert_eq!(c.as_bytes(), &expected);
    }

    #[test]
    fn test_deterministic_and_normalized() {
        let a = derive_commitment("85264178523", "ahmet açıkgöz", "s");
        let b = derive_commitment("85264178523 ", " AHMET AÇIKGÖZ", "s ");
        assert_eq!(a, b);
    }

    #[test]
    fn test_any_field_change_changes_commitment() {
        let base = derive_commitment("85264178523", "AHMET AÇIKGÖZ", "randomSalt123");
        assert_ne!(base, derive_commitment("85264178524", "AHMET AÇIKGÖZ", "randomSalt123"));
        assert_ne!(base, derive_commitment("85264178523", "AHMET ACIKGOZ", "randomSalt123"));
        assert_ne!(base, derive_commitment("85264178523", "AHMET AÇIKGÖZ", "randomSalt124"));
    }

    #[test]
    fn test_trim_matches_browser_clients() {
        // byte order mark is stripped, next-line is kept
        assert_eq!(trim_field("\u{FEFF}85264178523\u{FEFF}"), "85264178523");
        assert_eq!(trim_field("\u{0085}AHMET"), "\u{0085}AHMET");
        assert_eq!(trim_field("\t\u{00A0}\u{3000}salt\u{2028}\n"), "salt");

        assert_eq!(
            derive_commitment("85264178523", "\u{FEFF}Ahmet Açıkgöz", "randomSalt123"),
            derive_commitment("85264178523", "AHMET AÇIKGÖZ", "randomSalt123")
        );
        assert_ne!(
            derive_commitment("85264178523", "Ahmet Açıkgöz\u{0085}", "randomSalt123"),
            derive_commitment("85264178523", "AHMET AÇIKGÖZ", "randomSalt123")
        );
    }

    #[test]
    fn test_known_vector() {
        // keccak256("") is a well-known constant
        assert_eq!(
            hex::encode(hash_data(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_generate_salt() {
        let a = generate_salt();
        let b = generate_salt();
        assert_eq!(a.len(), SALT_LEN * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(a, b);
    }
}
