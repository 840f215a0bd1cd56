// crates/broker-gate-core/src/credentials.rs
// ============================================================================
// Module: Credential Records
// Description: Platform and broker-platform credential data models.
// Purpose: Carry registered credentials, including the rotation window for
//          broker-platform pairs.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A platform registers with a username and an encrypted secret. A broker
//! additionally carries per-platform basic credentials whose password is
//! stored as a SHA-256 digest; rotating them keeps the previous pair valid
//! until it is explicitly superseded, so brokers can roll credentials with
//! zero downtime.
//!
//! ## Invariants
//! - Rotation moves the current pair to the old slot; the old slot is only
//!   overwritten by the next rotation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Platform Credentials
// ============================================================================

/// Registered platform record with its basic credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformCredentials {
    /// Platform identifier.
    pub platform_id: String,
    /// Human-readable platform name.
    pub name: String,
    /// Basic authentication username.
    pub username: String,
    /// Encrypted password, reversed through the secret decrypter.
    pub secret: String,
    /// Whether the platform may authenticate.
    pub active: bool,
}

// ============================================================================
// SECTION: Broker Platform Credentials
// ============================================================================

/// Per-broker basic credentials with the rotation window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerPlatformCredentials {
    /// Broker identifier the credentials belong to.
    pub broker_id: String,
    /// Owning platform identifier.
    pub platform_id: String,
    /// Current basic authentication username.
    pub username: String,
    /// SHA-256 hex digest of the current password.
    pub password_hash: String,
    /// Previous username kept valid through the rotation window.
    pub old_username: Option<String>,
    /// Previous password digest kept valid through the rotation window.
    pub old_password_hash: Option<String>,
}

impl BrokerPlatformCredentials {
    /// Creates a credential record with no rotation history.
    #[must_use]
    pub fn new(
        broker_id: impl Into<String>,
        platform_id: impl Into<String>,
        username: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            broker_id: broker_id.into(),
            platform_id: platform_id.into(),
            username: username.into(),
            password_hash: password_hash.into(),
            old_username: None,
            old_password_hash: None,
        }
    }

    /// Installs a new credential pair, keeping the current one valid as the
    /// old pair until the next rotation supersedes it.
    pub fn rotate(&mut self, username: impl Into<String>, password_hash: impl Into<String>) {
        self.old_username = Some(std::mem::replace(&mut self.username, username.into()));
        self.old_password_hash =
            Some(std::mem::replace(&mut self.password_hash, password_hash.into()));
    }

    /// Returns the old credential pair while the rotation window is open.
    #[must_use]
    pub fn old_pair(&self) -> Option<(&str, &str)> {
        match (&self.old_username, &self.old_password_hash) {
            (Some(username), Some(password_hash)) => {
                Some((username.as_str(), password_hash.as_str()))
            }
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
