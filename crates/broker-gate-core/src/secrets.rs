// crates/broker-gate-core/src/secrets.rs
// ============================================================================
// Module: Secret Encryption
// Description: Reversible encryption for stored platform passwords.
// Purpose: Encrypt credentials at rest and reverse them before comparison.
// Dependencies: aes-gcm, base64, rand, thiserror
// ============================================================================

//! ## Overview
//! Platform passwords are stored as AES-256-GCM ciphertext and reversed
//! through the [`SecretDecrypter`] seam before comparison. The ciphertext
//! encoding is `base64(nonce || ciphertext)` with a fresh random 96-bit nonce
//! per encryption, so encrypting the same plaintext twice never yields the
//! same stored value.
//!
//! ## Invariants
//! - Keys are exactly 32 bytes; construction fails closed on any other size.
//! - A (key, nonce) pair is never reused.

// ============================================================================
// SECTION: Imports
// ============================================================================

use aes_gcm::Aes256Gcm;
use aes_gcm::Key;
use aes_gcm::Nonce;
use aes_gcm::aead::Aead;
use aes_gcm::aead::KeyInit;
use aes_gcm::aead::OsRng;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::RngCore;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Size of the AES-256 key in bytes.
pub const SECRET_KEY_SIZE: usize = 32;
/// Size of the AES-GCM nonce in bytes.
const NONCE_SIZE: usize = 12;

// ============================================================================
// SECTION: Secrets Error
// ============================================================================

/// Failure raised by secret encryption or decryption.
#[derive(Debug, Clone, Error)]
pub enum SecretsError {
    /// The supplied key has the wrong size.
    #[error("encryption key must be {SECRET_KEY_SIZE} bytes, got {0}")]
    InvalidKeySize(usize),
    /// Encrypting the plaintext failed.
    #[error("secret encryption failed: {0}")]
    Encryption(String),
    /// Decrypting or decoding the ciphertext failed.
    #[error("secret decryption failed: {0}")]
    Decryption(String),
}

// ============================================================================
// SECTION: Seams
// ============================================================================

/// Encrypts plaintext secrets for storage.
pub trait SecretEncrypter: Send + Sync {
    /// Encrypts the plaintext into the stored ciphertext form.
    ///
    /// # Errors
    ///
    /// Returns [`SecretsError`] when encryption fails.
    fn encrypt(&self, plaintext: &[u8]) -> Result<String, SecretsError>;
}

/// Reverses stored ciphertext before credential comparison.
pub trait SecretDecrypter: Send + Sync {
    /// Decrypts the stored ciphertext back into the plaintext.
    ///
    /// # Errors
    ///
    /// Returns [`SecretsError`] when the ciphertext is malformed or was not
    /// produced under the configured key.
    fn decrypt(&self, ciphertext: &str) -> Result<Vec<u8>, SecretsError>;
}

// ============================================================================
// SECTION: AES-GCM Cipher
// ============================================================================

/// AES-256-GCM cipher implementing both secret seams.
pub struct AesGcmSecretCipher {
    /// AEAD cipher initialized from the configured key.
    cipher: Aes256Gcm,
}

impl AesGcmSecretCipher {
    /// Creates a cipher from a 32-byte key.
    ///
    /// # Errors
    ///
    /// Returns [`SecretsError::InvalidKeySize`] for any other key length.
    pub fn new(key: &[u8]) -> Result<Self, SecretsError> {
        if key.len() != SECRET_KEY_SIZE {
            return Err(SecretsError::InvalidKeySize(key.len()));
        }
        let key = Key::<Aes256Gcm>::from_slice(key);
        Ok(Self {
            cipher: Aes256Gcm::new(key),
        })
    }
}

impl SecretEncrypter for AesGcmSecretCipher {
    fn encrypt(&self, plaintext: &[u8]) -> Result<String, SecretsError> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|err| SecretsError::Encryption(err.to_string()))?;
        let mut payload = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        payload.extend_from_slice(&nonce_bytes);
        payload.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(payload))
    }
}

impl SecretDecrypter for AesGcmSecretCipher {
    fn decrypt(&self, ciphertext: &str) -> Result<Vec<u8>, SecretsError> {
        let payload = BASE64
            .decode(ciphertext)
            .map_err(|err| SecretsError::Decryption(format!("invalid encoding: {err}")))?;
        if payload.len() < NONCE_SIZE {
            return Err(SecretsError::Decryption("ciphertext too short".to_string()));
        }
        let (nonce_bytes, body) = payload.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);
        self.cipher
            .decrypt(nonce, body)
            .map_err(|err| SecretsError::Decryption(err.to_string()))
    }
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

    use super::AesGcmSecretCipher;
    use super::SECRET_KEY_SIZE;
    use super::SecretDecrypter;
    use super::SecretEncrypter;
    use super::SecretsError;

    /// Tests that encrypting then decrypting yields the original plaintext.
    #[test]
    fn round_trip_restores_plaintext() {
        let cipher = AesGcmSecretCipher::new(&[7u8; SECRET_KEY_SIZE]).unwrap();
        let stored = cipher.encrypt(b"platform-password").unwrap();
        assert_eq!(cipher.decrypt(&stored).unwrap(), b"platform-password");
    }

    /// Tests that each encryption produces a distinct ciphertext.
    #[test]
    fn encryption_is_randomized() {
        let cipher = AesGcmSecretCipher::new(&[7u8; SECRET_KEY_SIZE]).unwrap();
        let first = cipher.encrypt(b"same").unwrap();
        let second = cipher.encrypt(b"same").unwrap();
        assert_ne!(first, second);
    }

    /// Tests that malformed and short keys are rejected.
    #[test]
    fn wrong_key_sizes_fail_closed() {
        assert!(matches!(
            AesGcmSecretCipher::new(&[]),
            Err(SecretsError::InvalidKeySize(0))
        ));
        assert!(matches!(
            AesGcmSecretCipher::new(&[1u8; 16]),
            Err(SecretsError::InvalidKeySize(16))
        ));
    }

    /// Tests that a different key cannot reverse the ciphertext.
    #[test]
    fn decrypting_with_another_key_fails() {
        let cipher = AesGcmSecretCipher::new(&[7u8; SECRET_KEY_SIZE]).unwrap();
        let other = AesGcmSecretCipher::new(&[8u8; SECRET_KEY_SIZE]).unwrap();
        let stored = cipher.encrypt(b"secret").unwrap();
        assert!(other.decrypt(&stored).is_err());
    }

    /// Tests that malformed ciphertext encodings are rejected.
    #[test]
    fn malformed_ciphertext_is_rejected() {
        let cipher = AesGcmSecretCipher::new(&[7u8; SECRET_KEY_SIZE]).unwrap();
        assert!(cipher.decrypt("not base64!").is_err());
        assert!(cipher.decrypt("AAAA").is_err());
    }
}
