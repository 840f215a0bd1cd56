// crates/broker-gate-security/src/decision.rs
// ============================================================================
// Module: Security Decision
// Description: Tri-state policy decision values.
// Purpose: Provide the shared Allow/Deny/Abstain vocabulary for all policies.
// Dependencies: serde::{Deserialize, Serialize}
// ============================================================================

//! ## Overview
//! Every authentication and authorization policy resolves to one of three
//! decisions: `Allow`, `Deny`, or `Abstain`. Abstaining policies defer to the
//! remaining policies in a combination; the required filters treat a request
//! for which every policy abstained as unauthenticated/unauthorized.
//!
//! ## Invariants
//! - Consumers must match on named variants; the variant order carries no
//!   meaning and no ordering is derived.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Decision
// ============================================================================

/// Tri-state outcome of a security policy evaluation.
///
/// # Invariants
/// - Represents a closed set of outcomes: allow, deny, or abstain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    /// The policy grants the request.
    Allow,
    /// The policy explicitly rejects the request.
    Deny,
    /// The policy has no opinion; defer to others.
    Abstain,
}

impl Decision {
    /// Returns true if the decision is `Allow`.
    #[must_use]
    pub const fn is_allow(self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Returns true if the decision is `Deny`.
    #[must_use]
    pub const fn is_deny(self) -> bool {
        matches!(self, Self::Deny)
    }

    /// Returns true if the decision is `Abstain`.
    #[must_use]
    pub const fn is_abstain(self) -> bool {
        matches!(self, Self::Abstain)
    }

    /// Returns a stable label for audit events.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
            Self::Abstain => "abstain",
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
