// crates/broker-gate-server/src/config.rs
// ============================================================================
// Module: Gateway Configuration
// Description: Configuration loading and validation for the gateway binary.
// Purpose: Provide strict, fail-closed config parsing for serving.
// Dependencies: base64, broker-gate-core, serde, thiserror, toml, url
// ============================================================================

//! ## Overview
//! Gateway configuration is loaded from a TOML file with a hard size limit.
//! Validation fails closed: a malformed bind address, an undersized
//! encryption key, or an unusable issuer URL aborts startup rather than
//! serving with a weakened security posture.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use broker_gate_core::SECRET_KEY_SIZE;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum configuration file size in bytes.
const MAX_CONFIG_FILE_SIZE: usize = 64 * 1024;
/// Username claim applied when the OIDC section names none.
const DEFAULT_USERNAME_CLAIM: &str = "sub";

// ============================================================================
// SECTION: Config Error
// ============================================================================

/// Failure raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the configuration file failed.
    #[error("config io error: {0}")]
    Io(String),
    /// The configuration file is not valid TOML.
    #[error("config parse error: {0}")]
    Parse(String),
    /// The configuration content failed validation.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Gateway Config
// ============================================================================

/// Top-level gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Socket address the gateway listens on.
    pub bind: String,
    /// Base64-encoded 32-byte key reversing stored platform secrets.
    pub encryption_key: String,
    /// Audit event emission settings.
    #[serde(default)]
    pub audit: AuditConfig,
    /// OIDC issuer settings; bearer authentication is off when absent.
    #[serde(default)]
    pub oidc: Option<OidcConfig>,
}

/// Audit event emission settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Whether enforcement outcomes are written to stderr.
    pub enabled: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
        }
    }
}

/// OIDC issuer settings for bearer authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OidcConfig {
    /// Issuer URL discovery starts from.
    pub issuer: String,
    /// Client id trusted by the client-id authorizer.
    pub client_id: String,
    /// Trusted client id suffixes; overrides the exact match when non-empty.
    #[serde(default)]
    pub trusted_client_id_suffixes: Vec<String>,
    /// Claim the principal name is taken from.
    #[serde(default = "default_username_claim")]
    pub username_claim: String,
    /// Scopes of which any one must be present; empty skips the scope check.
    #[serde(default)]
    pub required_scopes: Vec<String>,
}

/// Returns the default username claim.
fn default_username_claim() -> String {
    DEFAULT_USERNAME_CLAIM.to_string()
}

impl GatewayConfig {
    /// Loads and validates the configuration at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading, parsing, or validation fails.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let bytes = fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section, failing closed on the first problem.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        self.decoded_key()?;
        if let Some(oidc) = &self.oidc {
            oidc.validate()?;
        }
        Ok(())
    }

    /// Returns the parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the address does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("invalid bind address {}", self.bind)))
    }

    /// Returns the decoded encryption key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the key is not base64 or has the
    /// wrong size.
    pub fn decoded_key(&self) -> Result<Vec<u8>, ConfigError> {
        let key = BASE64
            .decode(&self.encryption_key)
            .map_err(|_| ConfigError::Invalid("encryption_key is not valid base64".to_string()))?;
        if key.len() != SECRET_KEY_SIZE {
            return Err(ConfigError::Invalid(format!(
                "encryption_key must decode to {SECRET_KEY_SIZE} bytes, got {}",
                key.len()
            )));
        }
        Ok(key)
    }
}

impl OidcConfig {
    /// Validates the OIDC section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending field.
    fn validate(&self) -> Result<(), ConfigError> {
        let issuer = self.issuer_url()?;
        if issuer.scheme() != "http" && issuer.scheme() != "https" {
            return Err(ConfigError::Invalid(format!(
                "oidc.issuer must be http or https, got {}",
                issuer.scheme()
            )));
        }
        if self.client_id.is_empty() {
            return Err(ConfigError::Invalid("oidc.client_id must be set".to_string()));
        }
        if self.username_claim.is_empty() {
            return Err(ConfigError::Invalid("oidc.username_claim must be set".to_string()));
        }
        Ok(())
    }

    /// Returns the parsed issuer URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the URL does not parse.
    pub fn issuer_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.issuer)
            .map_err(|err| ConfigError::Invalid(format!("invalid oidc.issuer: {err}")))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
