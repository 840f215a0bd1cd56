// crates/broker-gate-auth/src/scope.rs
// ============================================================================
// Module: Scope Authorization
// Description: Claim-driven authorizer over the token scope array.
// Purpose: Allow callers whose token carries any of the requested scopes.
// Dependencies: broker-gate-security, serde_json
// ============================================================================

//! ## Overview
//! The scope authorizer reads the `scope` claim array from a bearer identity
//! and allows the request when any requested scope is present. Denials name
//! both the requested and the held scopes so operators can see exactly what
//! was missing.

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

/// Claim carrying the token's granted scopes.
const SCOPE_CLAIM: &str = "scope";

// ============================================================================
// SECTION: Scope Authorizer
// ============================================================================

/// Builds an authorizer requiring any of the given scopes.
///
/// Abstains for non-bearer identities per the claims base; allows with the
/// given level when any requested scope is held; denies naming the missing
/// scopes otherwise.
#[must_use]
pub fn scope_authorizer(scopes: Vec<String>, level: AccessLevel) -> Arc<dyn Authorizer> {
    Arc::new(TokenClaimsAuthorizer::new("scope", move |_user, claims| {
        let held = held_scopes(claims);
        if held.iter().any(|scope| scopes.iter().any(|wanted| wanted == scope)) {
            Ok(AuthorizationOutcome::Allow(level))
        } else {
            Ok(AuthorizationOutcome::Deny(Some(SecurityError::Forbidden(format!(
                "none of the scopes [{}] are present in the user token scopes [{}]",
                scopes.join(", "),
                held.join(", ")
            )))))
        }
    }))
}

/// Reads the scope claim array, treating a missing claim as empty.
fn held_scopes(claims: &Value) -> Vec<String> {
    claims
        .get(SCOPE_CLAIM)
        .and_then(Value::as_array)
        .map(|values| {
            values.iter().filter_map(|value| value.as_str().map(ToString::to_string)).collect()
        })
        .unwrap_or_default()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
