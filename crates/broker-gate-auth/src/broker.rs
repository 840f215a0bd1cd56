// crates/broker-gate-auth/src/broker.rs
// ============================================================================
// Module: Broker Platform Authentication
// Description: Basic authenticator over per-broker rotating credentials.
// Purpose: Authenticate OSB calls against a broker's current or old pair and
//          resolve the owning platform.
// Dependencies: broker-gate-core, broker-gate-security
// ============================================================================

//! ## Overview
//! Brokers reach the gateway under `/v1/osb/{broker_id}/...` with per-broker
//! Basic credentials. A credential update keeps the previous pair valid until
//! the next rotation supersedes it, so a presented pair is checked against
//! both the current and the old slot. A match resolves the owning platform
//! record, which becomes the authenticated identity.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use broker_gate_core::BrokerPlatformCredentials;
use broker_gate_core::CredentialStore;
use broker_gate_core::constant_time_eq;
use broker_gate_core::sha256_hex;
use broker_gate_security::AuthenticationOutcome;
use broker_gate_security::Authenticator;
use broker_gate_security::SecurityError;
use broker_gate_security::SecurityRequest;

use crate::basic::INVALID_CREDENTIALS;
use crate::basic::parse_basic_credentials;
use crate::basic::platform_user;

// ============================================================================
// SECTION: Path Extraction
// ============================================================================

/// Extracts the broker identifier from an OSB path.
///
/// OSB calls are routed under `/v1/osb/{broker_id}/...`; any other shape
/// yields `None`.
#[must_use]
pub fn broker_id_from_path(path: &str) -> Option<&str> {
    let mut segments = path.split('/').filter(|segment| !segment.is_empty());
    if segments.next() != Some("v1") || segments.next() != Some("osb") {
        return None;
    }
    segments.next()
}

// ============================================================================
// SECTION: Broker Authenticator
// ============================================================================

/// Authenticates brokers against their rotating credential pairs.
pub struct BrokerPlatformAuthenticator {
    /// Store the credential records are resolved from.
    store: Arc<dyn CredentialStore>,
}

impl BrokerPlatformAuthenticator {
    /// Creates an authenticator over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
        }
    }
}

/// Returns true when the presented pair matches the stored pair.
///
/// The password digest comparison runs in constant time.
fn pair_matches(
    presented_username: &str,
    presented_password: &str,
    stored_username: &str,
    stored_password_hash: &str,
) -> bool {
    let digest = sha256_hex(presented_password.as_bytes());
    presented_username == stored_username
        && constant_time_eq(digest.as_bytes(), stored_password_hash.as_bytes())
}

/// Returns true when the presented pair matches the current or old slot.
fn credentials_match(
    record: &BrokerPlatformCredentials,
    username: &str,
    password: &str,
) -> bool {
    if pair_matches(username, password, &record.username, &record.password_hash) {
        return true;
    }
    match record.old_pair() {
        Some((old_username, old_password_hash)) => {
            pair_matches(username, password, old_username, old_password_hash)
        }
        None => false,
    }
}

#[async_trait]
impl Authenticator for BrokerPlatformAuthenticator {
    fn name(&self) -> &str {
        "broker-platform"
    }

    async fn authenticate(
        &self,
        request: &SecurityRequest,
    ) -> Result<AuthenticationOutcome, SecurityError> {
        let credentials = match parse_basic_credentials(request.authorization_header()) {
            Ok(Some(credentials)) => credentials,
            Ok(None) => return Ok(AuthenticationOutcome::Abstain),
            Err(cause) => return Ok(AuthenticationOutcome::Deny(Some(cause))),
        };
        let Some(broker_id) = broker_id_from_path(request.path()) else {
            return Ok(AuthenticationOutcome::Abstain);
        };

        let record = match self.store.broker_credentials(broker_id).await {
            Ok(record) => record,
            Err(err) if err.is_not_found() => {
                return Ok(AuthenticationOutcome::Deny(Some(SecurityError::Unauthenticated(
                    format!("no credentials registered for broker {broker_id}"),
                ))));
            }
            Err(err) => {
                return Err(SecurityError::Evaluation(format!(
                    "broker credential lookup failed: {err}"
                )));
            }
        };

        if !credentials_match(&record, &credentials.username, &credentials.password) {
            return Ok(AuthenticationOutcome::Deny(Some(SecurityError::Unauthenticated(
                INVALID_CREDENTIALS.to_string(),
            ))));
        }

        // A dangling platform reference is a storage inconsistency, not a
        // caller failure.
        let platform = self.store.platform_by_id(&record.platform_id).await.map_err(|err| {
            SecurityError::Evaluation(format!(
                "owning platform {} could not be resolved: {err}",
                record.platform_id
            ))
        })?;
        Ok(AuthenticationOutcome::Allow(Box::new(platform_user(&platform)?)))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
