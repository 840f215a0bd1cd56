// crates/broker-gate-security/src/access.rs
// ============================================================================
// Module: Access Levels
// Description: Ordered access scope lattice granted by authorization.
// Purpose: Provide the scope vocabulary attached to allow decisions.
// Dependencies: serde::{Deserialize, Serialize}
// ============================================================================

//! ## Overview
//! Access levels form an ordered scale from most to least restrictive. An
//! authorizer that allows a request grants one of these levels; combining
//! several allowing authorizers keeps the most restrictive (minimum) level.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Access Level
// ============================================================================

/// Ordered access scope granted on an allow decision.
///
/// # Invariants
/// - Variant order is the scope order: smaller means more restrictive.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum AccessLevel {
    /// No access granted.
    #[default]
    NoAccess,
    /// Access restricted to the caller's own tenant.
    TenantAccess,
    /// Access across all tenants.
    AllTenantAccess,
    /// Unrestricted global access.
    GlobalAccess,
}

impl AccessLevel {
    /// Returns the most restrictive (minimum) of the provided levels.
    ///
    /// Falls back to [`AccessLevel::NoAccess`] when the iterator is empty.
    #[must_use]
    pub fn most_restrictive<I>(levels: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        levels.into_iter().min().unwrap_or(Self::NoAccess)
    }

    /// Returns a stable label for audit events.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoAccess => "no_access",
            Self::TenantAccess => "tenant_access",
            Self::AllTenantAccess => "all_tenant_access",
            Self::GlobalAccess => "global_access",
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
