// crates/broker-gate-security/src/authn.rs
// ============================================================================
// Module: Authentication Policies
// Description: Authenticator interface and the OR combinator.
// Purpose: Resolve a caller identity from any one of several schemes.
// Dependencies: async-trait, crate::context, crate::errors
// ============================================================================

//! ## Overview
//! An [`Authenticator`] inspects a request and resolves to an
//! [`AuthenticationOutcome`]: an identity on allow, an optional explainable
//! cause on deny, or abstain when the request carries nothing the policy
//! understands. [`OrAuthenticator`] combines several schemes so that any one
//! of them may satisfy a path: the first allow wins, explainable denials are
//! aggregated, and a fatal evaluation failure collapses the whole combination
//! to a hard denial.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::SecurityRequest;
use crate::context::UserContext;
use crate::decision::Decision;
use crate::errors::CompositeError;
use crate::errors::SecurityError;

// ============================================================================
// SECTION: Outcome
// ============================================================================

/// Result of an authentication policy evaluation.
///
/// # Invariants
/// - `Deny(Some(_))` carries an explainable cause that combinators may
///   aggregate; `Deny(None)` is a bare denial.
#[derive(Debug)]
pub enum AuthenticationOutcome {
    /// The caller was identified.
    Allow(Box<UserContext>),
    /// The caller was rejected, optionally with an explainable cause.
    Deny(Option<SecurityError>),
    /// The policy has no opinion on this request.
    Abstain,
}

impl AuthenticationOutcome {
    /// Returns the decision component of the outcome.
    #[must_use]
    pub const fn decision(&self) -> Decision {
        match self {
            Self::Allow(_) => Decision::Allow,
            Self::Deny(_) => Decision::Deny,
            Self::Abstain => Decision::Abstain,
        }
    }
}

// ============================================================================
// SECTION: Authenticator Interface
// ============================================================================

/// Single authentication policy.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Returns the policy name used in audit events.
    fn name(&self) -> &str;

    /// Evaluates the request and resolves a caller identity.
    ///
    /// # Errors
    ///
    /// Returns [`SecurityError`] when the policy could not evaluate at all;
    /// explainable rejections are reported through
    /// [`AuthenticationOutcome::Deny`] instead.
    async fn authenticate(
        &self,
        request: &SecurityRequest,
    ) -> Result<AuthenticationOutcome, SecurityError>;
}

// ============================================================================
// SECTION: Or Combinator
// ============================================================================

/// Lets any one of several authentication schemes satisfy a request.
///
/// # Invariants
/// - Members are evaluated in registration order; the first allow wins and
///   later members are not invoked.
/// - A fatal member failure aborts the run and collapses to a denial
///   carrying that failure.
pub struct OrAuthenticator {
    /// Combined policy name for audit events.
    name: String,
    /// Member policies in evaluation order.
    members: Vec<Arc<dyn Authenticator>>,
}

impl OrAuthenticator {
    /// Combines the given authenticators in order.
    #[must_use]
    pub fn new(members: Vec<Arc<dyn Authenticator>>) -> Self {
        let name = members.iter().map(|member| member.name()).collect::<Vec<_>>().join(" or ");
        Self {
            name,
            members,
        }
    }
}

#[async_trait]
impl Authenticator for OrAuthenticator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn authenticate(
        &self,
        request: &SecurityRequest,
    ) -> Result<AuthenticationOutcome, SecurityError> {
        let mut causes = CompositeError::new();
        let mut denied = false;
        for member in &self.members {
            match member.authenticate(request).await {
                Err(fatal) => {
                    // An abstain/allow-with-error is never tolerated.
                    return Ok(AuthenticationOutcome::Deny(Some(fatal)));
                }
                Ok(AuthenticationOutcome::Allow(user)) => {
                    return Ok(AuthenticationOutcome::Allow(user));
                }
                Ok(AuthenticationOutcome::Deny(Some(cause))) => {
                    causes.push(cause);
                    denied = true;
                }
                Ok(AuthenticationOutcome::Deny(None)) => {
                    denied = true;
                }
                Ok(AuthenticationOutcome::Abstain) => {}
            }
        }
        if denied {
            return Ok(AuthenticationOutcome::Deny(causes.into_error()));
        }
        Ok(AuthenticationOutcome::Abstain)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
