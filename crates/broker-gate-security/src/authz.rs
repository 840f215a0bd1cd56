// crates/broker-gate-security/src/authz.rs
// ============================================================================
// Module: Authorization Policies
// Description: Authorizer interface, AND/OR combinators, and helpers.
// Purpose: Decide whether an identified caller may proceed and at what scope.
// Dependencies: async-trait, serde_json, crate::context, crate::errors
// ============================================================================

//! ## Overview
//! An [`Authorizer`] inspects a request and resolves to an
//! [`AuthorizationOutcome`]: an access level on allow, an optional cause on
//! deny, or abstain. [`AndAuthorizer`] requires all of several checks and
//! grants the most restrictive level among them; [`OrAuthorizer`] lets any
//! one check satisfy a requirement. [`AccessLevelOverride`] pins the granted
//! level regardless of what the inner policy computed, and
//! [`TokenClaimsAuthorizer`] is the base for claim-driven checks over bearer
//! identities.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::access::AccessLevel;
use crate::context::AuthenticationType;
use crate::context::SecurityRequest;
use crate::context::UserContext;
use crate::decision::Decision;
use crate::errors::CompositeError;
use crate::errors::SecurityError;

// ============================================================================
// SECTION: Outcome
// ============================================================================

/// Result of an authorization policy evaluation.
///
/// # Invariants
/// - `Deny(Some(_))` carries an explainable cause that combinators may
///   aggregate; `Deny(None)` is a bare denial.
#[derive(Debug)]
pub enum AuthorizationOutcome {
    /// The caller may proceed at the given access level.
    Allow(AccessLevel),
    /// The caller may not proceed, optionally with an explainable cause.
    Deny(Option<SecurityError>),
    /// The policy has no opinion on this request.
    Abstain,
}

impl AuthorizationOutcome {
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
// SECTION: Authorizer Interface
// ============================================================================

/// Single authorization policy.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Returns the policy name used in audit events.
    fn name(&self) -> &str;

    /// Evaluates the request and decides whether the caller may proceed.
    ///
    /// # Errors
    ///
    /// Returns [`SecurityError`] when the policy could not evaluate at all;
    /// explainable rejections are reported through
    /// [`AuthorizationOutcome::Deny`] instead.
    async fn authorize(
        &self,
        request: &SecurityRequest,
    ) -> Result<AuthorizationOutcome, SecurityError>;
}

// ============================================================================
// SECTION: And Combinator
// ============================================================================

/// Requires all of several authorization checks to pass.
///
/// # Invariants
/// - Members are evaluated in registration order; the first denial or fatal
///   failure aborts the run.
/// - When every member allows, the combination grants the most restrictive
///   of the recorded levels.
pub struct AndAuthorizer {
    /// Combined policy name for audit events.
    name: String,
    /// Member policies in evaluation order.
    members: Vec<Arc<dyn Authorizer>>,
}

impl AndAuthorizer {
    /// Combines the given authorizers in order.
    #[must_use]
    pub fn new(members: Vec<Arc<dyn Authorizer>>) -> Self {
        let name = members.iter().map(|member| member.name()).collect::<Vec<_>>().join(" and ");
        Self {
            name,
            members,
        }
    }
}

#[async_trait]
impl Authorizer for AndAuthorizer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn authorize(
        &self,
        request: &SecurityRequest,
    ) -> Result<AuthorizationOutcome, SecurityError> {
        if self.members.is_empty() {
            return Ok(AuthorizationOutcome::Abstain);
        }
        let mut levels = Vec::with_capacity(self.members.len());
        let mut fully_allowed = true;
        for member in &self.members {
            match member.authorize(request).await? {
                AuthorizationOutcome::Deny(cause) => {
                    return Ok(AuthorizationOutcome::Deny(cause));
                }
                AuthorizationOutcome::Abstain => {
                    fully_allowed = false;
                }
                AuthorizationOutcome::Allow(level) => {
                    levels.push(level);
                }
            }
        }
        if fully_allowed {
            return Ok(AuthorizationOutcome::Allow(AccessLevel::most_restrictive(levels)));
        }
        Ok(AuthorizationOutcome::Abstain)
    }
}

// ============================================================================
// SECTION: Or Combinator
// ============================================================================

/// Lets any one of several authorization checks satisfy a requirement.
///
/// # Invariants
/// - Members are evaluated in registration order; the first allow wins and
///   later members are not invoked.
pub struct OrAuthorizer {
    /// Combined policy name for audit events.
    name: String,
    /// Member policies in evaluation order.
    members: Vec<Arc<dyn Authorizer>>,
}

impl OrAuthorizer {
    /// Combines the given authorizers in order.
    #[must_use]
    pub fn new(members: Vec<Arc<dyn Authorizer>>) -> Self {
        let name = members.iter().map(|member| member.name()).collect::<Vec<_>>().join(" or ");
        Self {
            name,
            members,
        }
    }
}

#[async_trait]
impl Authorizer for OrAuthorizer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn authorize(
        &self,
        request: &SecurityRequest,
    ) -> Result<AuthorizationOutcome, SecurityError> {
        let mut causes = CompositeError::new();
        let mut denied = false;
        for member in &self.members {
            match member.authorize(request).await? {
                AuthorizationOutcome::Allow(level) => {
                    return Ok(AuthorizationOutcome::Allow(level));
                }
                AuthorizationOutcome::Deny(Some(cause)) => {
                    causes.push(cause);
                    denied = true;
                }
                AuthorizationOutcome::Deny(None) => {
                    denied = true;
                }
                AuthorizationOutcome::Abstain => {}
            }
        }
        if denied {
            return Ok(AuthorizationOutcome::Deny(causes.into_error()));
        }
        Ok(AuthorizationOutcome::Abstain)
    }
}

// ============================================================================
// SECTION: Access Level Override
// ============================================================================

/// Pins the granted access level of an inner authorizer to a fixed value.
pub struct AccessLevelOverride {
    /// Policy name for audit events.
    name: String,
    /// Inner authorizer whose decision is delegated to.
    inner: Arc<dyn Authorizer>,
    /// Level granted whenever the inner authorizer allows.
    level: AccessLevel,
}

impl AccessLevelOverride {
    /// Wraps an authorizer with a fixed granted level.
    #[must_use]
    pub fn new(inner: Arc<dyn Authorizer>, level: AccessLevel) -> Self {
        let name = format!("{}@{}", inner.name(), level.as_str());
        Self {
            name,
            inner,
            level,
        }
    }
}

#[async_trait]
impl Authorizer for AccessLevelOverride {
    fn name(&self) -> &str {
        &self.name
    }

    async fn authorize(
        &self,
        request: &SecurityRequest,
    ) -> Result<AuthorizationOutcome, SecurityError> {
        match self.inner.authorize(request).await? {
            AuthorizationOutcome::Allow(_) => Ok(AuthorizationOutcome::Allow(self.level)),
            other => Ok(other),
        }
    }
}

// ============================================================================
// SECTION: Token Claims Base
// ============================================================================

/// Base for claim-driven authorizers over bearer identities.
///
/// # Invariants
/// - Abstains when no identity is attached or the identity did not
///   authenticate with a bearer token.
pub struct TokenClaimsAuthorizer<F> {
    /// Policy name for audit events.
    name: String,
    /// Claim check invoked with the identity and its raw claims.
    check: F,
}

impl<F> TokenClaimsAuthorizer<F>
where
    F: Fn(&UserContext, &Value) -> Result<AuthorizationOutcome, SecurityError> + Send + Sync,
{
    /// Creates a claim-driven authorizer with the given check.
    #[must_use]
    pub fn new(name: impl Into<String>, check: F) -> Self {
        Self {
            name: name.into(),
            check,
        }
    }
}

#[async_trait]
impl<F> Authorizer for TokenClaimsAuthorizer<F>
where
    F: Fn(&UserContext, &Value) -> Result<AuthorizationOutcome, SecurityError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn authorize(
        &self,
        request: &SecurityRequest,
    ) -> Result<AuthorizationOutcome, SecurityError> {
        let Some(user) = request.context().user() else {
            return Ok(AuthorizationOutcome::Abstain);
        };
        if user.authentication_type() != AuthenticationType::Bearer {
            return Ok(AuthorizationOutcome::Abstain);
        }
        (self.check)(user, user.raw_data())
    }
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
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use async_trait::async_trait;
    use serde_json::json;

    use super::AccessLevelOverride;
    use super::AndAuthorizer;
    use super::AuthorizationOutcome;
    use super::Authorizer;
    use super::OrAuthorizer;
    use super::TokenClaimsAuthorizer;
    use crate::access::AccessLevel;
    use crate::context::AuthenticationType;
    use crate::context::SecurityRequest;
    use crate::context::UserContext;
    use crate::decision::Decision;
    use crate::errors::SecurityError;
    use crate::matcher::Method;

    /// Scripted authorizer returning a fixed outcome and counting calls.
    struct Scripted {
        /// Outcome the policy resolves to.
        outcome: fn() -> Result<AuthorizationOutcome, SecurityError>,
        /// Number of times the policy was invoked.
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Authorizer for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn authorize(
            &self,
            _request: &SecurityRequest,
        ) -> Result<AuthorizationOutcome, SecurityError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.outcome)()
        }
    }

    /// Builds a scripted member and its call counter.
    fn member(
        outcome: fn() -> Result<AuthorizationOutcome, SecurityError>,
    ) -> (Arc<dyn Authorizer>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let scripted = Scripted {
            outcome,
            calls: Arc::clone(&calls),
        };
        (Arc::new(scripted), calls)
    }

    /// Builds a request without an identity.
    fn request() -> SecurityRequest {
        SecurityRequest::new(Method::Get, "/v1/service_brokers", None)
    }

    /// Builds a request carrying a bearer identity with the given claims.
    fn bearer_request(claims: serde_json::Value) -> SecurityRequest {
        let mut request = request();
        request
            .context_mut()
            .attach_user(UserContext::new("client", AuthenticationType::Bearer, claims));
        request
    }

    /// Tests that a denial stops evaluation of later members.
    #[tokio::test]
    async fn and_denies_and_stops_on_first_denial() {
        let (first, _) = member(|| Ok(AuthorizationOutcome::Allow(AccessLevel::GlobalAccess)));
        let (second, _) = member(|| Ok(AuthorizationOutcome::Deny(None)));
        let (third, third_calls) =
            member(|| Ok(AuthorizationOutcome::Allow(AccessLevel::GlobalAccess)));
        let combined = AndAuthorizer::new(vec![first, second, third]);
        let outcome = combined.authorize(&request()).await.unwrap();
        assert_eq!(outcome.decision(), Decision::Deny);
        assert_eq!(third_calls.load(Ordering::SeqCst), 0);
    }

    /// Tests that all-allow members grant the most restrictive level.
    #[tokio::test]
    async fn and_grants_most_restrictive_level() {
        let (first, _) = member(|| Ok(AuthorizationOutcome::Allow(AccessLevel::GlobalAccess)));
        let (second, _) = member(|| Ok(AuthorizationOutcome::Allow(AccessLevel::TenantAccess)));
        let combined = AndAuthorizer::new(vec![first, second]);
        match combined.authorize(&request()).await.unwrap() {
            AuthorizationOutcome::Allow(level) => assert_eq!(level, AccessLevel::TenantAccess),
            other => panic!("expected allow, got {:?}", other.decision()),
        }
    }

    /// Tests that an abstaining member keeps the combination abstaining.
    #[tokio::test]
    async fn and_abstains_when_any_member_abstains() {
        let (first, _) = member(|| Ok(AuthorizationOutcome::Allow(AccessLevel::GlobalAccess)));
        let (second, _) = member(|| Ok(AuthorizationOutcome::Abstain));
        let combined = AndAuthorizer::new(vec![first, second]);
        let outcome = combined.authorize(&request()).await.unwrap();
        assert_eq!(outcome.decision(), Decision::Abstain);
    }

    /// Tests that a member error propagates unchanged out of the AND.
    #[tokio::test]
    async fn and_propagates_member_errors() {
        let (first, _) = member(|| Err(SecurityError::Evaluation("boom".to_string())));
        let (second, second_calls) = member(|| Ok(AuthorizationOutcome::Abstain));
        let combined = AndAuthorizer::new(vec![first, second]);
        assert!(combined.authorize(&request()).await.is_err());
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    /// Tests that the first allowing member short-circuits the OR.
    #[tokio::test]
    async fn or_short_circuits_on_first_allow() {
        let (first, _) = member(|| Ok(AuthorizationOutcome::Allow(AccessLevel::TenantAccess)));
        let (second, second_calls) = member(|| Ok(AuthorizationOutcome::Deny(None)));
        let combined = OrAuthorizer::new(vec![first, second]);
        match combined.authorize(&request()).await.unwrap() {
            AuthorizationOutcome::Allow(level) => assert_eq!(level, AccessLevel::TenantAccess),
            other => panic!("expected allow, got {:?}", other.decision()),
        }
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    /// Tests that an allow wins even after an earlier denial with error.
    #[tokio::test]
    async fn or_allows_after_denial_with_error() {
        let (first, _) = member(|| {
            Ok(AuthorizationOutcome::Deny(Some(SecurityError::Forbidden("denied".to_string()))))
        });
        let (second, _) = member(|| Ok(AuthorizationOutcome::Allow(AccessLevel::GlobalAccess)));
        let combined = OrAuthorizer::new(vec![first, second]);
        let outcome = combined.authorize(&request()).await.unwrap();
        assert_eq!(outcome.decision(), Decision::Allow);
    }

    /// Tests that denials aggregate when no member allows.
    #[tokio::test]
    async fn or_aggregates_denial_causes() {
        let (first, _) = member(|| {
            Ok(AuthorizationOutcome::Deny(Some(SecurityError::Forbidden("first".to_string()))))
        });
        let (second, _) = member(|| {
            Ok(AuthorizationOutcome::Deny(Some(SecurityError::Forbidden("second".to_string()))))
        });
        let combined = OrAuthorizer::new(vec![first, second]);
        match combined.authorize(&request()).await.unwrap() {
            AuthorizationOutcome::Deny(Some(cause)) => {
                assert_eq!(cause.description(), "first. second");
            }
            other => panic!("expected denial, got {:?}", other.decision()),
        }
    }

    /// Tests that the override pins the granted level on allow only.
    #[tokio::test]
    async fn override_replaces_granted_level() {
        let (inner, _) = member(|| Ok(AuthorizationOutcome::Allow(AccessLevel::TenantAccess)));
        let wrapped = AccessLevelOverride::new(inner, AccessLevel::GlobalAccess);
        match wrapped.authorize(&request()).await.unwrap() {
            AuthorizationOutcome::Allow(level) => assert_eq!(level, AccessLevel::GlobalAccess),
            other => panic!("expected allow, got {:?}", other.decision()),
        }

        let (denying, _) = member(|| Ok(AuthorizationOutcome::Deny(None)));
        let wrapped = AccessLevelOverride::new(denying, AccessLevel::GlobalAccess);
        let outcome = wrapped.authorize(&request()).await.unwrap();
        assert_eq!(outcome.decision(), Decision::Deny);
    }

    /// Tests that the claims base abstains without a bearer identity.
    #[tokio::test]
    async fn claims_base_abstains_without_bearer_user() {
        let authorizer = TokenClaimsAuthorizer::new("claims", |_user, _claims| {
            Ok(AuthorizationOutcome::Allow(AccessLevel::GlobalAccess))
        });
        let outcome = authorizer.authorize(&request()).await.unwrap();
        assert_eq!(outcome.decision(), Decision::Abstain);

        let mut basic = request();
        basic
            .context_mut()
            .attach_user(UserContext::new("p1", AuthenticationType::Basic, json!({})));
        let outcome = authorizer.authorize(&basic).await.unwrap();
        assert_eq!(outcome.decision(), Decision::Abstain);
    }

    /// Tests that the claims base passes raw claims to the check.
    #[tokio::test]
    async fn claims_base_invokes_check_with_claims() {
        let authorizer = TokenClaimsAuthorizer::new("claims", |_user, claims| {
            if claims.get("cid").and_then(serde_json::Value::as_str) == Some("trusted") {
                Ok(AuthorizationOutcome::Allow(AccessLevel::GlobalAccess))
            } else {
                Ok(AuthorizationOutcome::Deny(None))
            }
        });
        let outcome =
            authorizer.authorize(&bearer_request(json!({"cid": "trusted"}))).await.unwrap();
        assert_eq!(outcome.decision(), Decision::Allow);
        let outcome =
            authorizer.authorize(&bearer_request(json!({"cid": "other"}))).await.unwrap();
        assert_eq!(outcome.decision(), Decision::Deny);
    }
}
