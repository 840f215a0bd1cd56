// crates/broker-gate-core/src/verifier.rs
// ============================================================================
// Module: Token Verifier Seam
// Description: Bearer token verification interface and claims accessor.
// Purpose: Decouple the bearer authenticator from the OIDC implementation.
// Dependencies: async-trait, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The bearer authenticator verifies tokens through the [`TokenVerifier`]
//! seam and reads the resulting [`VerifiedClaims`]. The concrete JWKS-backed
//! implementation lives in the OIDC crate; tests substitute scripted
//! verifiers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Verification Error
// ============================================================================

/// Failure raised when a bearer token cannot be accepted.
#[derive(Debug, Clone, Error)]
pub enum TokenVerificationError {
    /// The token was inspected and rejected.
    #[error("token rejected: {0}")]
    Rejected(String),
    /// The verifier could not evaluate the token.
    #[error("token verification unavailable: {0}")]
    Unavailable(String),
}

// ============================================================================
// SECTION: Verified Claims
// ============================================================================

/// Claims extracted from a successfully verified token.
#[derive(Debug, Clone)]
pub struct VerifiedClaims {
    /// Raw claim set as the verifier produced it.
    claims: Value,
}

impl VerifiedClaims {
    /// Wraps a raw claim set.
    #[must_use]
    pub const fn new(claims: Value) -> Self {
        Self {
            claims,
        }
    }

    /// Returns the raw claim set.
    #[must_use]
    pub const fn raw(&self) -> &Value {
        &self.claims
    }

    /// Returns a string claim by name, when present.
    #[must_use]
    pub fn string_claim(&self, name: &str) -> Option<&str> {
        self.claims.get(name).and_then(Value::as_str)
    }

    /// Deserializes the claim set into a caller-supplied structure.
    ///
    /// # Errors
    ///
    /// Returns [`TokenVerificationError::Rejected`] when the claims do not
    /// match the requested shape.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, TokenVerificationError> {
        serde_json::from_value(self.claims.clone()).map_err(|err| {
            TokenVerificationError::Rejected(format!("claim deserialization failed: {err}"))
        })
    }

    /// Consumes the accessor and returns the raw claim set.
    #[must_use]
    pub fn into_raw(self) -> Value {
        self.claims
    }
}

// ============================================================================
// SECTION: Verifier Interface
// ============================================================================

/// Remote token verification seam.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verifies a bearer token and returns its claims.
    ///
    /// # Errors
    ///
    /// Returns [`TokenVerificationError`] when the token is rejected or the
    /// verifier cannot evaluate it.
    async fn verify(&self, token: &str) -> Result<VerifiedClaims, TokenVerificationError>;
}

// ============================================================================
// SECTION: Tests
// ============================================================================
