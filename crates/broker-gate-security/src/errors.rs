// crates/broker-gate-security/src/errors.rs
// ============================================================================
// Module: Security Errors
// Description: Error taxonomy for the request security decision engine.
// Purpose: Provide typed failure values for policies, filters, and combinators.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Security failures fall into three families: authentication failures (the
//! caller could not be identified), authorization failures (the caller is
//! known but may not proceed), and evaluation failures (a policy could not
//! run at all). Explainable rejections from several combined policies are
//! carried as a [`CompositeError`] so every contributing cause stays visible
//! in one message.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use thiserror::Error;

// ============================================================================
// SECTION: Security Error
// ============================================================================

/// Failure raised by policies, combinators, and enforcement filters.
#[derive(Debug, Clone, Error)]
pub enum SecurityError {
    /// The caller could not be authenticated.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
    /// The caller is authenticated but may not proceed.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// A policy could not evaluate the request at all.
    #[error("security evaluation failed: {0}")]
    Evaluation(String),
    /// Several combined policies rejected the request.
    #[error(transparent)]
    Composite(#[from] CompositeError),
}

impl SecurityError {
    /// Returns the human-readable description without the variant prefix.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::Unauthenticated(message)
            | Self::Forbidden(message)
            | Self::Evaluation(message) => message.clone(),
            Self::Composite(composite) => composite.to_string(),
        }
    }
}

// ============================================================================
// SECTION: Composite Error
// ============================================================================

/// Separator used when joining aggregated denial causes.
const CAUSE_SEPARATOR: &str = ". ";

/// Ordered collection of denial causes from combined policies.
///
/// # Invariants
/// - Causes are kept in policy evaluation order.
/// - Rendering joins causes with `". "`.
#[derive(Debug, Clone, Default)]
pub struct CompositeError {
    /// Recorded causes in evaluation order.
    causes: Vec<SecurityError>,
}

impl CompositeError {
    /// Creates an empty composite.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            causes: Vec::new(),
        }
    }

    /// Records another denial cause.
    pub fn push(&mut self, cause: SecurityError) {
        self.causes.push(cause);
    }

    /// Returns true when no causes were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.causes.is_empty()
    }

    /// Returns the number of recorded causes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.causes.len()
    }

    /// Converts the composite into a [`SecurityError`] when non-empty.
    #[must_use]
    pub fn into_error(self) -> Option<SecurityError> {
        if self.is_empty() { None } else { Some(SecurityError::Composite(self)) }
    }
}

impl fmt::Display for CompositeError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for cause in &self.causes {
            if !first {
                formatter.write_str(CAUSE_SEPARATOR)?;
            }
            write!(formatter, "{}", cause.description())?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for CompositeError {}

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

    use super::CompositeError;
    use super::SecurityError;

    /// Tests that causes join with the separator in order.
    #[test]
    fn composite_joins_causes_in_order() {
        let mut composite = CompositeError::new();
        composite.push(SecurityError::Unauthenticated("bad credentials".to_string()));
        composite.push(SecurityError::Unauthenticated("token rejected".to_string()));
        assert_eq!(composite.to_string(), "bad credentials. token rejected");
    }

    /// Tests that an empty composite produces no error.
    #[test]
    fn empty_composite_yields_no_error() {
        assert!(CompositeError::new().into_error().is_none());
    }

    /// Tests that descriptions omit the variant prefix.
    #[test]
    fn description_strips_variant_prefix() {
        let error = SecurityError::Forbidden("missing scope".to_string());
        assert_eq!(error.description(), "missing scope");
        assert_eq!(error.to_string(), "forbidden: missing scope");
    }

    /// Tests that composite descriptions match their display form.
    #[test]
    fn composite_description_matches_display() {
        let mut composite = CompositeError::new();
        composite.push(SecurityError::Forbidden("first".to_string()));
        composite.push(SecurityError::Forbidden("second".to_string()));
        let error = composite.into_error().unwrap();
        assert_eq!(error.description(), "first. second");
    }
}
