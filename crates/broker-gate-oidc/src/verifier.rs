// crates/broker-gate-oidc/src/verifier.rs
// ============================================================================
// Module: OIDC Token Verifier
// Description: JWKS-backed bearer token verification.
// Purpose: Implement the core token verifier seam over the issuer's key set.
// Dependencies: broker-gate-core, jsonwebtoken, reqwest, serde_json, url
// ============================================================================

//! ## Overview
//! The verifier fetches the issuer's key set once at construction and
//! validates bearer tokens locally afterwards: the token's `kid` header
//! resolves the key, the key's algorithm drives validation, and the issuer
//! claim must match the configured issuer. Verification performs no further
//! network calls.
//!
//! ## Invariants
//! - Construction fails closed when the key set is empty or carries no
//!   signing keys.
//! - Keys are resolved by `kid`; a token without `kid` is accepted only when
//!   the key set holds exactly one key.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use broker_gate_core::TokenVerificationError;
use broker_gate_core::TokenVerifier;
use broker_gate_core::VerifiedClaims;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::Validation;
use jsonwebtoken::decode;
use jsonwebtoken::decode_header;
use jsonwebtoken::jwk::Jwk;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::jwk::KeyAlgorithm;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::discovery::discover;
use crate::errors::OidcError;

// ============================================================================
// SECTION: Verification Keys
// ============================================================================

/// Decoding key with its resolved signing algorithm.
struct VerificationKey {
    /// Key identifier from the JWK, when present.
    kid: Option<String>,
    /// Decoding key material.
    key: DecodingKey,
    /// Signing algorithm the key validates.
    algorithm: Algorithm,
}

/// Maps a JWK signing algorithm onto a validation algorithm.
///
/// Encryption-only algorithms resolve to `None`; their keys are skipped.
const fn signing_algorithm(algorithm: KeyAlgorithm) -> Option<Algorithm> {
    match algorithm {
        KeyAlgorithm::HS256 => Some(Algorithm::HS256),
        KeyAlgorithm::HS384 => Some(Algorithm::HS384),
        KeyAlgorithm::HS512 => Some(Algorithm::HS512),
        KeyAlgorithm::RS256 => Some(Algorithm::RS256),
        KeyAlgorithm::RS384 => Some(Algorithm::RS384),
        KeyAlgorithm::RS512 => Some(Algorithm::RS512),
        KeyAlgorithm::ES256 => Some(Algorithm::ES256),
        KeyAlgorithm::ES384 => Some(Algorithm::ES384),
        KeyAlgorithm::PS256 => Some(Algorithm::PS256),
        KeyAlgorithm::PS384 => Some(Algorithm::PS384),
        KeyAlgorithm::PS512 => Some(Algorithm::PS512),
        KeyAlgorithm::EdDSA => Some(Algorithm::EdDSA),
        _ => None,
    }
}

/// Builds a verification key from a JWK, skipping unusable entries.
fn verification_key(jwk: &Jwk) -> Option<VerificationKey> {
    let algorithm = signing_algorithm(jwk.common.key_algorithm?)?;
    let key = DecodingKey::from_jwk(jwk).ok()?;
    Some(VerificationKey {
        kid: jwk.common.key_id.clone(),
        key,
        algorithm,
    })
}

// ============================================================================
// SECTION: OIDC Verifier
// ============================================================================

/// JWKS-backed token verifier constructed once per issuer.
pub struct OidcVerifier {
    /// Issuer every accepted token must name.
    issuer: String,
    /// Usable verification keys from the issuer's key set.
    keys: Vec<VerificationKey>,
}

impl OidcVerifier {
    /// Discovers the issuer and fetches its key set.
    ///
    /// # Errors
    ///
    /// Returns [`OidcError`] when discovery fails, the key set cannot be
    /// fetched, or no usable signing key is found.
    pub async fn from_issuer(client: &Client, issuer: &Url) -> Result<Self, OidcError> {
        let metadata = discover(client, issuer).await?;
        let jwks_url =
            Url::parse(&metadata.jwks_uri).map_err(|err| OidcError::Jwks(err.to_string()))?;
        let response = client
            .get(jwks_url.clone())
            .send()
            .await
            .map_err(|err| OidcError::Jwks(err.to_string()))?;
        if !response.status().is_success() {
            return Err(OidcError::Jwks(format!(
                "{} returned status {}",
                jwks_url,
                response.status()
            )));
        }
        let key_set: JwkSet =
            response.json().await.map_err(|err| OidcError::Jwks(err.to_string()))?;
        Self::from_key_set(issuer, &key_set)
    }

    /// Builds a verifier from an already fetched key set.
    ///
    /// # Errors
    ///
    /// Returns [`OidcError::NoUsableKeys`] when the set holds no signing key
    /// with a resolvable algorithm.
    pub fn from_key_set(issuer: &Url, key_set: &JwkSet) -> Result<Self, OidcError> {
        let keys: Vec<VerificationKey> = key_set.keys.iter().filter_map(verification_key).collect();
        if keys.is_empty() {
            return Err(OidcError::NoUsableKeys(format!(
                "none of the {} published keys carry a usable signing algorithm",
                key_set.keys.len()
            )));
        }
        Ok(Self {
            issuer: issuer.as_str().trim_end_matches('/').to_string(),
            keys,
        })
    }

    /// Resolves the verification key for a token's `kid` header.
    fn resolve_key(&self, kid: Option<&str>) -> Option<&VerificationKey> {
        match kid {
            Some(kid) => self.keys.iter().find(|key| key.kid.as_deref() == Some(kid)),
            None if self.keys.len() == 1 => self.keys.first(),
            None => None,
        }
    }
}

#[async_trait]
impl TokenVerifier for OidcVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedClaims, TokenVerificationError> {
        let header = decode_header(token).map_err(|err| {
            TokenVerificationError::Rejected(format!("malformed token header: {err}"))
        })?;
        let key = self.resolve_key(header.kid.as_deref()).ok_or_else(|| {
            TokenVerificationError::Rejected("no key in the issuer key set matches the token".to_string())
        })?;
        let mut validation = Validation::new(key.algorithm);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.validate_aud = false;
        let data = decode::<Value>(token, &key.key, &validation).map_err(|err| {
            TokenVerificationError::Rejected(format!("token validation failed: {err}"))
        })?;
        Ok(VerifiedClaims::new(data.claims))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
