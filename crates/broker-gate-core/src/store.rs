// crates/broker-gate-core/src/store.rs
// ============================================================================
// Module: Credential Store
// Description: Credential lookup interface and in-memory implementation.
// Purpose: Provide the storage seam the authenticators resolve records from.
// Dependencies: async-trait, thiserror, crate::credentials
// ============================================================================

//! ## Overview
//! Authenticators resolve registered platforms and broker credentials through
//! the [`CredentialStore`] interface. Absence is signalled with the
//! [`StorageError::NotFound`] sentinel so callers can distinguish a missing
//! record from a backend failure. The [`InMemoryCredentialStore`] ships for
//! gateway wiring and tests; it is not intended for production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

use crate::credentials::BrokerPlatformCredentials;
use crate::credentials::PlatformCredentials;

// ============================================================================
// SECTION: Storage Error
// ============================================================================

/// Failure raised by credential store operations.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// The requested record does not exist.
    #[error("not found in storage")]
    NotFound,
    /// The storage backend failed to answer.
    #[error("storage failure: {0}")]
    Backend(String),
}

impl StorageError {
    /// Returns true when the error is the not-found sentinel.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

// ============================================================================
// SECTION: Credential Filter
// ============================================================================

/// Filter applied to platform listings.
#[derive(Debug, Clone, Default)]
pub struct CredentialFilter {
    /// Restrict to platforms registered under this username.
    pub username: Option<String>,
    /// Restrict to platforms that may authenticate.
    pub active_only: bool,
}

impl CredentialFilter {
    /// Builds a filter over active platforms with the given username.
    #[must_use]
    pub fn active_username(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            active_only: true,
        }
    }

    /// Returns true when the platform record passes the filter.
    #[must_use]
    pub fn accepts(&self, platform: &PlatformCredentials) -> bool {
        if self.active_only && !platform.active {
            return false;
        }
        match &self.username {
            Some(username) => platform.username == *username,
            None => true,
        }
    }
}

// ============================================================================
// SECTION: Store Interface
// ============================================================================

/// Credential lookup seam consumed by the authenticators.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns the platform registered under the given username.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] when no platform matches.
    async fn get_platform(&self, username: &str) -> Result<PlatformCredentials, StorageError>;

    /// Lists platforms passing the given filter.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend fails; an empty list is not
    /// an error.
    async fn list_platforms(
        &self,
        filter: &CredentialFilter,
    ) -> Result<Vec<PlatformCredentials>, StorageError>;

    /// Returns the platform with the given identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] when no platform matches.
    async fn platform_by_id(
        &self,
        platform_id: &str,
    ) -> Result<PlatformCredentials, StorageError>;

    /// Returns the credential record registered for the given broker.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] when no record exists.
    async fn broker_credentials(
        &self,
        broker_id: &str,
    ) -> Result<BrokerPlatformCredentials, StorageError>;
}

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// In-memory credential store for wiring and tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCredentialStore {
    /// Platform records keyed by platform identifier.
    platforms: Arc<Mutex<BTreeMap<String, PlatformCredentials>>>,
    /// Broker credential records keyed by broker identifier.
    brokers: Arc<Mutex<BTreeMap<String, BrokerPlatformCredentials>>>,
}

impl InMemoryCredentialStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces a platform record.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Backend`] when the store lock is poisoned.
    pub fn put_platform(&self, platform: PlatformCredentials) -> Result<(), StorageError> {
        let mut guard = self.platforms.lock().map_err(poisoned)?;
        guard.insert(platform.platform_id.clone(), platform);
        Ok(())
    }

    /// Registers or replaces a broker credential record.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Backend`] when the store lock is poisoned.
    pub fn put_broker_credentials(
        &self,
        credentials: BrokerPlatformCredentials,
    ) -> Result<(), StorageError> {
        let mut guard = self.brokers.lock().map_err(poisoned)?;
        guard.insert(credentials.broker_id.clone(), credentials);
        Ok(())
    }

    /// Removes a broker credential record, if present.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Backend`] when the store lock is poisoned.
    pub fn remove_broker_credentials(&self, broker_id: &str) -> Result<(), StorageError> {
        let mut guard = self.brokers.lock().map_err(poisoned)?;
        guard.remove(broker_id);
        Ok(())
    }
}

/// Maps a poisoned lock to a backend failure.
fn poisoned<T>(_: std::sync::PoisonError<T>) -> StorageError {
    StorageError::Backend("credential store mutex poisoned".to_string())
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn get_platform(&self, username: &str) -> Result<PlatformCredentials, StorageError> {
        let guard = self.platforms.lock().map_err(poisoned)?;
        guard
            .values()
            .find(|platform| platform.username == username)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_platforms(
        &self,
        filter: &CredentialFilter,
    ) -> Result<Vec<PlatformCredentials>, StorageError> {
        let guard = self.platforms.lock().map_err(poisoned)?;
        Ok(guard.values().filter(|platform| filter.accepts(platform)).cloned().collect())
    }

    async fn platform_by_id(
        &self,
        platform_id: &str,
    ) -> Result<PlatformCredentials, StorageError> {
        let guard = self.platforms.lock().map_err(poisoned)?;
        guard.get(platform_id).cloned().ok_or(StorageError::NotFound)
    }

    async fn broker_credentials(
        &self,
        broker_id: &str,
    ) -> Result<BrokerPlatformCredentials, StorageError> {
        let guard = self.brokers.lock().map_err(poisoned)?;
        guard.get(broker_id).cloned().ok_or(StorageError::NotFound)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
