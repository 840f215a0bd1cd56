// crates/broker-gate-auth/src/basic.rs
// ============================================================================
// Module: Basic Platform Authentication
// Description: HTTP Basic header parsing and the platform authenticator.
// Purpose: Resolve a platform identity from Basic credentials in the store.
// Dependencies: base64, broker-gate-core, broker-gate-security
// ============================================================================

//! ## Overview
//! Platforms authenticate with HTTP Basic credentials. The authenticator
//! abstains when the request carries no Basic header, resolves the platform
//! by username through the credential store, reverses the stored secret
//! through the decrypter, and compares it against the presented password in
//! constant time. Exactly one active platform must match the username.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use broker_gate_core::CredentialFilter;
use broker_gate_core::CredentialStore;
use broker_gate_core::PlatformCredentials;
use broker_gate_core::SecretDecrypter;
use broker_gate_core::constant_time_eq;
use broker_gate_security::AuthenticationOutcome;
use broker_gate_security::AuthenticationType;
use broker_gate_security::Authenticator;
use broker_gate_security::SecurityError;
use broker_gate_security::SecurityRequest;
use broker_gate_security::UserContext;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum accepted `Authorization` header size in bytes.
const MAX_AUTH_HEADER_BYTES: usize = 8 * 1024;
/// Fixed rejection message for credential mismatches.
pub(crate) const INVALID_CREDENTIALS: &str = "provided credentials are invalid";

// ============================================================================
// SECTION: Header Parsing
// ============================================================================

/// Username and password presented through an HTTP Basic header.
#[derive(Debug, Clone)]
pub struct BasicCredentials {
    /// Presented username.
    pub username: String,
    /// Presented password.
    pub password: String,
}

/// Strips a case-insensitive scheme prefix from an authorization header.
pub(crate) fn strip_scheme<'a>(header: &'a str, scheme: &str) -> Option<&'a str> {
    let (candidate, rest) = header.split_once(' ')?;
    if candidate.eq_ignore_ascii_case(scheme) { Some(rest) } else { None }
}

/// Extracts Basic credentials from an `Authorization` header.
///
/// Returns `Ok(None)` when the header is absent or uses another scheme.
///
/// # Errors
///
/// Returns [`SecurityError::Unauthenticated`] when the header is oversized or
/// the Basic payload is malformed.
pub fn parse_basic_credentials(
    header: Option<&str>,
) -> Result<Option<BasicCredentials>, SecurityError> {
    let Some(header) = header else {
        return Ok(None);
    };
    if header.len() > MAX_AUTH_HEADER_BYTES {
        return Err(SecurityError::Unauthenticated(
            "authorization header exceeds size limit".to_string(),
        ));
    }
    let Some(payload) = strip_scheme(header, "Basic") else {
        return Ok(None);
    };
    let decoded = BASE64.decode(payload.trim()).map_err(|_| {
        SecurityError::Unauthenticated("basic credentials are not valid base64".to_string())
    })?;
    let decoded = String::from_utf8(decoded).map_err(|_| {
        SecurityError::Unauthenticated("basic credentials are not valid utf-8".to_string())
    })?;
    let Some((username, password)) = decoded.split_once(':') else {
        return Err(SecurityError::Unauthenticated(
            "basic credentials are missing the separator".to_string(),
        ));
    };
    Ok(Some(BasicCredentials {
        username: username.to_string(),
        password: password.to_string(),
    }))
}

// ============================================================================
// SECTION: Platform Authenticator
// ============================================================================

/// Authenticates platforms through Basic credentials in the store.
pub struct BasicPlatformAuthenticator {
    /// Store the platform records are resolved from.
    store: Arc<dyn CredentialStore>,
    /// Decrypter reversing stored platform secrets.
    decrypter: Arc<dyn SecretDecrypter>,
}

impl BasicPlatformAuthenticator {
    /// Creates an authenticator over the given store and decrypter.
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>, decrypter: Arc<dyn SecretDecrypter>) -> Self {
        Self {
            store,
            decrypter,
        }
    }
}

#[async_trait]
impl Authenticator for BasicPlatformAuthenticator {
    fn name(&self) -> &str {
        "basic-platform"
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

        let filter = CredentialFilter::active_username(&credentials.username);
        let platforms = self.store.list_platforms(&filter).await.map_err(|err| {
            SecurityError::Evaluation(format!("platform lookup failed: {err}"))
        })?;
        let platform = match platforms.as_slice() {
            [platform] => platform,
            [] => {
                return Ok(AuthenticationOutcome::Deny(Some(SecurityError::Unauthenticated(
                    "no platform registered for the provided username".to_string(),
                ))));
            }
            _ => {
                return Ok(AuthenticationOutcome::Deny(Some(SecurityError::Unauthenticated(
                    "multiple platforms registered for the provided username".to_string(),
                ))));
            }
        };

        let stored = self.decrypter.decrypt(&platform.secret).map_err(|err| {
            SecurityError::Evaluation(format!("stored secret could not be reversed: {err}"))
        })?;
        if !constant_time_eq(&stored, credentials.password.as_bytes()) {
            return Ok(AuthenticationOutcome::Deny(Some(SecurityError::Unauthenticated(
                INVALID_CREDENTIALS.to_string(),
            ))));
        }

        Ok(AuthenticationOutcome::Allow(Box::new(platform_user(platform)?)))
    }
}

/// Builds the user context exposing the matched platform record.
pub(crate) fn platform_user(platform: &PlatformCredentials) -> Result<UserContext, SecurityError> {
    let data = serde_json::to_value(platform).map_err(|err| {
        SecurityError::Evaluation(format!("platform record serialization failed: {err}"))
    })?;
    Ok(UserContext::new(platform.username.clone(), AuthenticationType::Basic, data))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
