// crates/broker-gate-oidc/src/errors.rs
// ============================================================================
// Module: OIDC Errors
// Description: Failure taxonomy for discovery and token verification setup.
// Purpose: Provide typed, fail-closed construction errors for the verifier.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Discovery and verifier construction fail closed: a malformed issuer,
//! unreachable discovery document, issuer mismatch, or unusable key set all
//! abort gateway startup rather than degrade into an unverifiable state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: OIDC Error
// ============================================================================

/// Failure raised during discovery or verifier construction.
#[derive(Debug, Error)]
pub enum OidcError {
    /// The configured issuer URL is not usable.
    #[error("invalid issuer url: {0}")]
    InvalidIssuer(String),
    /// Fetching or parsing the discovery document failed.
    #[error("oidc discovery failed: {0}")]
    Discovery(String),
    /// The discovered document names a different issuer.
    #[error("issuer mismatch: configured {configured}, discovered {discovered}")]
    IssuerMismatch {
        /// Issuer the gateway was configured with.
        configured: String,
        /// Issuer the discovery document declared.
        discovered: String,
    },
    /// Fetching or parsing the key set failed.
    #[error("jwks fetch failed: {0}")]
    Jwks(String),
    /// The key set carries no key the verifier can use.
    #[error("jwks contains no usable keys: {0}")]
    NoUsableKeys(String),
}
