// crates/broker-gate-core/src/hashing.rs
// ============================================================================
// Module: Hashing Helpers
// Description: Digest and constant-time comparison helpers.
// Purpose: Provide the shared digest primitives for credential handling.
// Dependencies: sha2, subtle
// ============================================================================

//! ## Overview
//! Credential material is digested with SHA-256 and compared through a
//! constant-time path so comparison timing reveals nothing about stored
//! secrets.

// ============================================================================
// SECTION: Imports
// ============================================================================

use sha2::Digest;
use sha2::Sha256;
use subtle::ConstantTimeEq;

// ============================================================================
// SECTION: Digests
// ============================================================================

/// Returns the lowercase hex SHA-256 digest of the given bytes.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex_encode(&hasher.finalize())
}

/// Compares two byte strings in constant time.
///
/// Both sides are digested first so the comparison cost is independent of
/// their lengths and contents.
#[must_use]
pub fn constant_time_eq(lhs: &[u8], rhs: &[u8]) -> bool {
    let lhs_digest = Sha256::digest(lhs);
    let rhs_digest = Sha256::digest(rhs);
    lhs_digest.ct_eq(&rhs_digest).into()
}

// ============================================================================
// SECTION: Hex Encoding
// ============================================================================

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only panic-based assertions."
    )]

    use super::constant_time_eq;
    use super::sha256_hex;

    /// Tests the digest against a known vector.
    #[test]
    fn sha256_matches_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    /// Tests equality and inequality through the constant-time path.
    #[test]
    fn constant_time_eq_compares_content() {
        assert!(constant_time_eq(b"secret", b"secret"));
        assert!(!constant_time_eq(b"secret", b"Secret"));
        assert!(!constant_time_eq(b"secret", b"secret-longer"));
    }
}
