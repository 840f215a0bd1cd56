// crates/broker-gate-auth/src/client_id.rs
// ============================================================================
// Module: Client Identity Authorization
// Description: Claim-driven authorizers over the token client id.
// Purpose: Allow callers whose token was issued to a trusted client.
// Dependencies: broker-gate-security, serde_json
// ============================================================================

//! ## Overview
//! Tokens carry the issuing client in the `cid` claim. The exact-match
//! authorizer trusts a single configured client id; the suffix authorizer
//! trusts any client id ending with one of the configured suffixes, which is
//! how multi-instance client registrations are recognized.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use broker_gate_security::AccessLevel;
use broker_gate_security::AuthorizationOutcome;
use broker_gate_security::Authorizer;
use broker_gate_security::SecurityError;
use broker_gate_security::TokenClaimsAuthorizer;
use serde_json::Value;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Claim carrying the issuing client id.
const CLIENT_ID_CLAIM: &str = "cid";

// ============================================================================
// SECTION: Client Id Authorizers
// ============================================================================

/// Builds an authorizer trusting exactly the given client id.
#[must_use]
pub fn client_id_authorizer(expected: String, level: AccessLevel) -> Arc<dyn Authorizer> {
    Arc::new(TokenClaimsAuthorizer::new("client-id", move |_user, claims| {
        let Some(cid) = client_id(claims) else {
            return Ok(AuthorizationOutcome::Deny(Some(missing_claim())));
        };
        if cid == expected {
            Ok(AuthorizationOutcome::Allow(level))
        } else {
            Ok(AuthorizationOutcome::Deny(Some(SecurityError::Forbidden(format!(
                "client id {cid} does not match the trusted client id {expected}"
            )))))
        }
    }))
}

/// Builds an authorizer trusting client ids with any of the given suffixes.
#[must_use]
pub fn client_id_suffix_authorizer(
    suffixes: Vec<String>,
    level: AccessLevel,
) -> Arc<dyn Authorizer> {
    Arc::new(TokenClaimsAuthorizer::new("client-id-suffix", move |_user, claims| {
        let Some(cid) = client_id(claims) else {
            return Ok(AuthorizationOutcome::Deny(Some(missing_claim())));
        };
        if suffixes.iter().any(|suffix| cid.ends_with(suffix)) {
            Ok(AuthorizationOutcome::Allow(level))
        } else {
            Ok(AuthorizationOutcome::Deny(Some(SecurityError::Forbidden(format!(
                "client id {cid} does not end with any of the trusted suffixes [{}]",
                suffixes.join(", ")
            )))))
        }
    }))
}

/// Reads the client id claim from the token.
fn client_id(claims: &Value) -> Option<&str> {
    claims.get(CLIENT_ID_CLAIM).and_then(Value::as_str)
}

/// Builds the rejection cause for tokens without a client id claim.
fn missing_claim() -> SecurityError {
    SecurityError::Forbidden("cid claim not found in the user token".to_string())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
