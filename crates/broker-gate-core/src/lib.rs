// crates/broker-gate-core/src/lib.rs
// ============================================================================
// Module: Broker Gate Core
// Description: Domain types and collaborator interfaces for the gateway.
// Purpose: Provide credential records, storage and crypto seams, and the
//          token verifier interface consumed by the security policies.
// Dependencies: aes-gcm, async-trait, base64, rand, serde, sha2, subtle
// ============================================================================

//! ## Overview
//! The core crate carries what the decision engine consumes but does not own:
//! registered credential records (including the broker-platform rotation
//! window), the credential store seam with its not-found sentinel, reversible
//! secret encryption, digest helpers, and the bearer token verifier seam.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod credentials;
pub mod hashing;
pub mod secrets;
pub mod store;
pub mod verifier;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use credentials::BrokerPlatformCredentials;
pub use credentials::PlatformCredentials;
pub use hashing::constant_time_eq;
pub use hashing::sha256_hex;
pub use secrets::AesGcmSecretCipher;
pub use secrets::SECRET_KEY_SIZE;
pub use secrets::SecretDecrypter;
pub use secrets::SecretEncrypter;
pub use secrets::SecretsError;
pub use store::CredentialFilter;
pub use store::CredentialStore;
pub use store::InMemoryCredentialStore;
pub use store::StorageError;
pub use verifier::TokenVerificationError;
pub use verifier::TokenVerifier;
pub use verifier::VerifiedClaims;
