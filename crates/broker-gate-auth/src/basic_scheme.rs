// crates/broker-gate-auth/src/basic_scheme.rs
// ============================================================================
// Module: Basic Scheme Authorization
// Description: Authorizer granting a fixed level to Basic-credentialed calls.
// Purpose: Let authentication-vetted Basic callers pass authorization.
// Dependencies: broker-gate-security
// ============================================================================

//! ## Overview
//! Basic credentials are fully vetted by the authentication stage, so the
//! authorization stage only needs to recognize the scheme: a request carrying
//! Basic credentials is allowed at a fixed access level, anything else
//! abstains and defers to the token-driven authorizers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use broker_gate_security::AccessLevel;
use broker_gate_security::AuthorizationOutcome;
use broker_gate_security::Authorizer;
use broker_gate_security::SecurityError;
use broker_gate_security::SecurityRequest;

use crate::basic::strip_scheme;

// ============================================================================
// SECTION: Basic Scheme Authorizer
// ============================================================================

/// Allows requests carrying Basic credentials at a fixed level.
pub struct BasicSchemeAuthorizer {
    /// Level granted to Basic-credentialed requests.
    level: AccessLevel,
}

impl BasicSchemeAuthorizer {
    /// Creates an authorizer granting the given level.
    #[must_use]
    pub const fn new(level: AccessLevel) -> Self {
        Self {
            level,
        }
    }
}

#[async_trait]
impl Authorizer for BasicSchemeAuthorizer {
    fn name(&self) -> &str {
        "basic-scheme"
    }

    async fn authorize(
        &self,
        request: &SecurityRequest,
    ) -> Result<AuthorizationOutcome, SecurityError> {
        let carries_basic = request
            .authorization_header()
            .and_then(|header| strip_scheme(header, "Basic"))
            .is_some();
        if carries_basic {
            Ok(AuthorizationOutcome::Allow(self.level))
        } else {
            Ok(AuthorizationOutcome::Abstain)
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
