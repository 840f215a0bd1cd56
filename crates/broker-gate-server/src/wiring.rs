// crates/broker-gate-server/src/wiring.rs
// ============================================================================
// Module: Security Wiring
// Description: Default gateway policy layout over the security builder.
// Purpose: Attach the leaf policies to the OSB and management surfaces.
// Dependencies: broker-gate-auth, broker-gate-core, broker-gate-security
// ============================================================================

//! ## Overview
//! The default layout guards three surfaces: OSB calls under `/v1/osb/**`
//! authenticate with per-broker rotating credentials; the management surface
//! under `/v1/**` takes platform Basic credentials or bearer tokens, with
//! authorization satisfied by the Basic scheme or by the combined
//! client-id/scope checks; health and info are carved out as optional so they
//! stay reachable without credentials. Declaration order matters: the
//! carve-outs narrow only the scopes declared before them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use broker_gate_auth::BasicPlatformAuthenticator;
use broker_gate_auth::BasicSchemeAuthorizer;
use broker_gate_auth::BearerAuthenticator;
use broker_gate_auth::BrokerPlatformAuthenticator;
use broker_gate_auth::client_id_authorizer;
use broker_gate_auth::client_id_suffix_authorizer;
use broker_gate_auth::scope_authorizer;
use broker_gate_core::CredentialStore;
use broker_gate_core::SecretDecrypter;
use broker_gate_core::TokenVerifier;
use broker_gate_security::AccessLevel;
use broker_gate_security::AndAuthorizer;
use broker_gate_security::AuditSink;
use broker_gate_security::Authenticator;
use broker_gate_security::Authorizer;
use broker_gate_security::Method;
use broker_gate_security::OrAuthorizer;
use broker_gate_security::SecurityBuilder;
use broker_gate_security::SecurityPipeline;

// ============================================================================
// SECTION: Policy Settings
// ============================================================================

/// Token policy settings taken from the OIDC configuration section.
#[derive(Debug, Clone)]
pub struct OidcPolicySettings {
    /// Client id trusted by the exact-match authorizer.
    pub client_id: String,
    /// Trusted suffixes; overrides the exact match when non-empty.
    pub trusted_client_id_suffixes: Vec<String>,
    /// Claim the principal name is taken from.
    pub username_claim: String,
    /// Scopes of which any one must be present; empty skips the check.
    pub required_scopes: Vec<String>,
}

// ============================================================================
// SECTION: Default Layout
// ============================================================================

/// Wires the default gateway policy layout into a pipeline.
#[must_use]
pub fn configure_security(
    store: Arc<dyn CredentialStore>,
    decrypter: Arc<dyn SecretDecrypter>,
    oidc: Option<(Arc<dyn TokenVerifier>, OidcPolicySettings)>,
    audit: Arc<dyn AuditSink>,
) -> SecurityPipeline {
    let mut builder = SecurityBuilder::new().with_audit_sink(audit);

    // Brokers authenticate with their own rotating credential pairs. The
    // group is declared first so the broker authenticator resolves the
    // identity before the platform chain runs.
    builder = builder
        .path(["/v1/osb/**"])
        .with_authentication(Arc::new(BrokerPlatformAuthenticator::new(Arc::clone(&store))))
        .required();

    let mut authenticators: Vec<Arc<dyn Authenticator>> =
        vec![Arc::new(BasicPlatformAuthenticator::new(store, decrypter))];
    let mut authorizers: Vec<Arc<dyn Authorizer>> =
        vec![Arc::new(BasicSchemeAuthorizer::new(AccessLevel::GlobalAccess))];
    if let Some((verifier, settings)) = oidc {
        authenticators.push(Arc::new(BearerAuthenticator::with_username_claim(
            verifier,
            settings.username_claim,
        )));
        authorizers.push(token_authorizer(&settings));
    }

    builder = builder.path(["/v1/**"]);
    for authenticator in authenticators {
        builder = builder.with_authentication(authenticator);
    }
    builder = builder
        .with_authorization(Arc::new(OrAuthorizer::new(authorizers)))
        .required();

    // Monitoring and build info stay reachable without credentials. These
    // narrow the scopes declared above only.
    builder = builder
        .path(["/v1/monitor/health"])
        .method([Method::Get])
        .authentication()
        .authorization()
        .optional();
    builder = builder
        .path(["/v1/info"])
        .method([Method::Get])
        .authentication()
        .authorization()
        .optional();

    builder.build()
}

/// Builds the combined client-id and scope checks for bearer identities.
fn token_authorizer(settings: &OidcPolicySettings) -> Arc<dyn Authorizer> {
    let mut checks: Vec<Arc<dyn Authorizer>> = Vec::new();
    if settings.trusted_client_id_suffixes.is_empty() {
        checks.push(client_id_authorizer(
            settings.client_id.clone(),
            AccessLevel::GlobalAccess,
        ));
    } else {
        checks.push(client_id_suffix_authorizer(
            settings.trusted_client_id_suffixes.clone(),
            AccessLevel::GlobalAccess,
        ));
    }
    if !settings.required_scopes.is_empty() {
        checks.push(scope_authorizer(
            settings.required_scopes.clone(),
            AccessLevel::GlobalAccess,
        ));
    }
    Arc::new(AndAuthorizer::new(checks))
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

    use std::sync::Arc;

    use async_trait::async_trait;
    use broker_gate_core::AesGcmSecretCipher;
    use broker_gate_core::InMemoryCredentialStore;
    use broker_gate_core::SECRET_KEY_SIZE;
    use broker_gate_core::TokenVerificationError;
    use broker_gate_core::TokenVerifier;
    use broker_gate_core::VerifiedClaims;
    use broker_gate_security::Method;
    use broker_gate_security::NoopAuditSink;
    use broker_gate_security::SecurityPipeline;
    use broker_gate_security::SecurityRequest;
    use serde_json::json;

    use super::OidcPolicySettings;
    use super::configure_security;

    /// Verifier accepting every token with fixed claims.
    struct AcceptAll;

    #[async_trait]
    impl TokenVerifier for AcceptAll {
        async fn verify(&self, _token: &str) -> Result<VerifiedClaims, TokenVerificationError> {
            Ok(VerifiedClaims::new(json!({
                "sub": "client-1",
                "cid": "broker-gate",
                "scope": ["broker.read"],
            })))
        }
    }

    /// Builds the default pipeline over an empty store.
    fn pipeline() -> SecurityPipeline {
        let cipher = AesGcmSecretCipher::new(&[3u8; SECRET_KEY_SIZE]).unwrap();
        configure_security(
            Arc::new(InMemoryCredentialStore::new()),
            Arc::new(cipher),
            Some((
                Arc::new(AcceptAll),
                OidcPolicySettings {
                    client_id: "broker-gate".to_string(),
                    trusted_client_id_suffixes: Vec::new(),
                    username_claim: "sub".to_string(),
                    required_scopes: vec!["broker.read".to_string()],
                },
            )),
            Arc::new(NoopAuditSink),
        )
    }

    /// Tests that the carve-outs keep health and info reachable.
    #[tokio::test]
    async fn health_and_info_stay_public() {
        let pipeline = pipeline();
        for path in ["/v1/monitor/health", "/v1/info"] {
            let mut request = SecurityRequest::new(Method::Get, path, None);
            pipeline.run(&mut request).await.unwrap();
        }
    }

    /// Tests that the management surface stays required.
    #[tokio::test]
    async fn management_surface_requires_credentials() {
        let pipeline = pipeline();
        let mut request = SecurityRequest::new(Method::Get, "/v1/whoami", None);
        assert!(pipeline.run(&mut request).await.is_err());
    }

    /// Tests that a verified bearer token satisfies both stages.
    #[tokio::test]
    async fn bearer_token_passes_both_stages() {
        let pipeline = pipeline();
        let mut request = SecurityRequest::new(
            Method::Get,
            "/v1/whoami",
            Some("Bearer token".to_string()),
        );
        pipeline.run(&mut request).await.unwrap();
        assert!(request.context().is_authorized());
        assert_eq!(
            request.context().user().map(broker_gate_security::UserContext::name),
            Some("client-1")
        );
    }
}
