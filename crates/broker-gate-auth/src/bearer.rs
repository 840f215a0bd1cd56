// crates/broker-gate-auth/src/bearer.rs
// ============================================================================
// Module: Bearer Authentication
// Description: OIDC bearer token authenticator over the verifier seam.
// Purpose: Resolve a caller identity from a verified bearer token.
// Dependencies: broker-gate-core, broker-gate-security
// ============================================================================

//! ## Overview
//! Bearer tokens are verified through the [`TokenVerifier`] seam; the
//! resolved identity takes its principal name from a configurable username
//! claim and exposes the raw claim set for downstream authorizers. Requests
//! without a Bearer header abstain; an empty token after trimming is a bare
//! denial; verification and claim-extraction failures deny with the cause.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use broker_gate_core::TokenVerifier;
use broker_gate_security::AuthenticationOutcome;
use broker_gate_security::AuthenticationType;
use broker_gate_security::Authenticator;
use broker_gate_security::SecurityError;
use broker_gate_security::SecurityRequest;
use broker_gate_security::UserContext;

use crate::basic::strip_scheme;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Username claim used when none is configured.
pub const DEFAULT_USERNAME_CLAIM: &str = "sub";

// ============================================================================
// SECTION: Bearer Authenticator
// ============================================================================

/// Authenticates callers through verified bearer tokens.
pub struct BearerAuthenticator {
    /// Verifier the tokens are validated through.
    verifier: Arc<dyn TokenVerifier>,
    /// Claim the principal name is taken from.
    username_claim: String,
}

impl BearerAuthenticator {
    /// Creates an authenticator reading the default username claim.
    #[must_use]
    pub fn new(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self::with_username_claim(verifier, DEFAULT_USERNAME_CLAIM)
    }

    /// Creates an authenticator reading the given username claim.
    #[must_use]
    pub fn with_username_claim(
        verifier: Arc<dyn TokenVerifier>,
        username_claim: impl Into<String>,
    ) -> Self {
        Self {
            verifier,
            username_claim: username_claim.into(),
        }
    }
}

#[async_trait]
impl Authenticator for BearerAuthenticator {
    fn name(&self) -> &str {
        "oidc-bearer"
    }

    async fn authenticate(
        &self,
        request: &SecurityRequest,
    ) -> Result<AuthenticationOutcome, SecurityError> {
        let Some(header) = request.authorization_header() else {
            return Ok(AuthenticationOutcome::Abstain);
        };
        let Some(token) = strip_scheme(header, "Bearer") else {
            return Ok(AuthenticationOutcome::Abstain);
        };
        let token = token.trim();
        if token.is_empty() {
            return Ok(AuthenticationOutcome::Deny(None));
        }

        let claims = match self.verifier.verify(token).await {
            Ok(claims) => claims,
            Err(err) => {
                return Ok(AuthenticationOutcome::Deny(Some(SecurityError::Unauthenticated(
                    format!("token verification failed: {err}"),
                ))));
            }
        };
        let Some(username) = claims.string_claim(&self.username_claim).map(str::to_string)
        else {
            return Ok(AuthenticationOutcome::Deny(Some(SecurityError::Unauthenticated(
                format!("username claim {} not found in the token", self.username_claim),
            ))));
        };

        let user =
            UserContext::new(username, AuthenticationType::Bearer, claims.into_raw());
        Ok(AuthenticationOutcome::Allow(Box::new(user)))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
