// crates/broker-gate-oidc/src/discovery.rs
// ============================================================================
// Module: OIDC Discovery
// Description: Well-known configuration fetch for an OIDC issuer.
// Purpose: Resolve the issuer's JWKS endpoint once at construction time.
// Dependencies: reqwest, serde, url
// ============================================================================

//! ## Overview
//! The verifier is constructed once per issuer from the issuer's well-known
//! configuration document at `{issuer}/.well-known/openid-configuration`. The
//! document must echo the configured issuer back; a mismatch aborts
//! construction.

// ============================================================================
// SECTION: Imports
// ============================================================================

use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::errors::OidcError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Well-known configuration path appended to the issuer URL.
const WELL_KNOWN_PATH: &str = ".well-known/openid-configuration";

// ============================================================================
// SECTION: Provider Metadata
// ============================================================================

/// Discovery document fields the gateway consumes.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderMetadata {
    /// Issuer the document was published for.
    pub issuer: String,
    /// Endpoint serving the issuer's key set.
    pub jwks_uri: String,
}

/// Fetches and checks the issuer's discovery document.
///
/// # Errors
///
/// Returns [`OidcError`] when the document cannot be fetched or parsed, or
/// when it names a different issuer than the one configured.
pub async fn discover(client: &Client, issuer: &Url) -> Result<ProviderMetadata, OidcError> {
    let well_known = discovery_url(issuer)?;
    let response = client
        .get(well_known.clone())
        .send()
        .await
        .map_err(|err| OidcError::Discovery(err.to_string()))?;
    if !response.status().is_success() {
        return Err(OidcError::Discovery(format!(
            "{} returned status {}",
            well_known,
            response.status()
        )));
    }
    let metadata: ProviderMetadata =
        response.json().await.map_err(|err| OidcError::Discovery(err.to_string()))?;

    let configured = issuer.as_str().trim_end_matches('/');
    let discovered = metadata.issuer.trim_end_matches('/');
    if configured != discovered {
        return Err(OidcError::IssuerMismatch {
            configured: configured.to_string(),
            discovered: discovered.to_string(),
        });
    }
    Ok(metadata)
}

/// Builds the well-known configuration URL for an issuer.
fn discovery_url(issuer: &Url) -> Result<Url, OidcError> {
    let base = issuer.as_str().trim_end_matches('/');
    Url::parse(&format!("{base}/{WELL_KNOWN_PATH}"))
        .map_err(|err| OidcError::InvalidIssuer(err.to_string()))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
