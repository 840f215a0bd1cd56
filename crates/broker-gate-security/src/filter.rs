// crates/broker-gate-security/src/filter.rs
// ============================================================================
// Module: Request Filters
// Description: Dynamic matching filter, stage filters, and required filters.
// Purpose: Enforce policy outcomes over the per-request security context.
// Dependencies: async-trait, crate::authn, crate::authz, crate::matcher
// ============================================================================

//! ## Overview
//! Filters run in a fixed order per request: the dynamic authentication
//! filter evaluates every registered authenticator chain whose matchers fire
//! and may attach a [`crate::context::UserContext`]; the required
//! authentication filter rejects requests on registered paths that still
//! carry no identity; the dynamic authorization filter applies authorizer
//! outcomes and may mark the request authorized; the required authorization
//! filter rejects requests on registered paths that were never marked. The
//! [`SecurityPipeline`] binds the four stages together and emits one audit
//! event per enforcement.
//!
//! ## Invariants
//! - Filter configuration is mutated only at build time; requests see a
//!   read-only view and evaluation holds no cross-request state.
//! - Matched entries run in registration order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;

use crate::audit::AuditSink;
use crate::audit::SecurityAuditEvent;
use crate::authn::AuthenticationOutcome;
use crate::authn::Authenticator;
use crate::authz::AuthorizationOutcome;
use crate::authz::Authorizer;
use crate::context::SecurityRequest;
use crate::errors::SecurityError;
use crate::matcher::FilterMatcher;
use crate::matcher::any_filter_matches;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Fixed description for requests missing a required identity.
const REQUIRED_AUTHENTICATION_REASON: &str = "no authenticated user found for the request";
/// Fixed description for requests missing a required authorization.
const REQUIRED_AUTHORIZATION_REASON: &str = "request is not authorized";
/// Fallback description for bare authentication denials.
const AUTHENTICATION_DENIED_REASON: &str = "authentication failed";
/// Fallback description for bare authorization denials.
const AUTHORIZATION_DENIED_REASON: &str = "authorization failed";

// ============================================================================
// SECTION: Filter Interface
// ============================================================================

/// Request-scoped middleware run by the security pipeline.
#[async_trait]
pub trait RequestFilter: Send + Sync {
    /// Returns the filter name used in audit events.
    fn name(&self) -> &str;

    /// Applies the filter to the request.
    ///
    /// # Errors
    ///
    /// Returns [`SecurityError`] when the request must be rejected.
    async fn apply(&self, request: &mut SecurityRequest) -> Result<(), SecurityError>;
}

// ============================================================================
// SECTION: Dynamic Matching Filter
// ============================================================================

/// Registered policy chain entry.
struct MatchingEntry {
    /// Matcher groups; the entry fires when any group matches.
    matchers: Vec<FilterMatcher>,
    /// Filter run when the entry fires.
    filter: Arc<dyn RequestFilter>,
}

/// Request-time router over registered `(matcher set, filter)` entries.
///
/// # Invariants
/// - Entries are evaluated against the live endpoint on every request.
/// - When no entry matches, the request passes through untouched.
pub struct DynamicMatchingFilter {
    /// Filter name used in audit events.
    name: String,
    /// Registered entries in registration order.
    entries: Vec<MatchingEntry>,
}

impl DynamicMatchingFilter {
    /// Creates an empty dynamic filter.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Registers a filter under the given matcher set.
    pub fn register(&mut self, matchers: Vec<FilterMatcher>, filter: Arc<dyn RequestFilter>) {
        self.entries.push(MatchingEntry {
            matchers,
            filter,
        });
    }

    /// Returns the number of registered entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no entries are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl RequestFilter for DynamicMatchingFilter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn apply(&self, request: &mut SecurityRequest) -> Result<(), SecurityError> {
        let endpoint = request.endpoint();
        for entry in &self.entries {
            if any_filter_matches(&entry.matchers, &endpoint) {
                entry.filter.apply(request).await?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Stage Filters
// ============================================================================

/// Applies an authenticator's outcome to the request context.
pub struct AuthenticationFilter {
    /// Filter name used in audit events.
    name: String,
    /// Authenticator evaluated for matching requests.
    authenticator: Arc<dyn Authenticator>,
}

impl AuthenticationFilter {
    /// Creates a stage filter over the given authenticator.
    #[must_use]
    pub fn new(authenticator: Arc<dyn Authenticator>) -> Self {
        let name = format!("authentication[{}]", authenticator.name());
        Self {
            name,
            authenticator,
        }
    }
}

#[async_trait]
impl RequestFilter for AuthenticationFilter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn apply(&self, request: &mut SecurityRequest) -> Result<(), SecurityError> {
        if request.context().has_user() {
            return Ok(());
        }
        match self.authenticator.authenticate(request).await? {
            AuthenticationOutcome::Allow(user) => {
                request.context_mut().attach_user(*user);
                Ok(())
            }
            AuthenticationOutcome::Deny(Some(cause)) => {
                Err(SecurityError::Unauthenticated(cause.description()))
            }
            AuthenticationOutcome::Deny(None) => {
                Err(SecurityError::Unauthenticated(AUTHENTICATION_DENIED_REASON.to_string()))
            }
            AuthenticationOutcome::Abstain => Ok(()),
        }
    }
}

/// Applies an authorizer's outcome to the request context.
pub struct AuthorizationFilter {
    /// Filter name used in audit events.
    name: String,
    /// Authorizer evaluated for matching requests.
    authorizer: Arc<dyn Authorizer>,
}

impl AuthorizationFilter {
    /// Creates a stage filter over the given authorizer.
    #[must_use]
    pub fn new(authorizer: Arc<dyn Authorizer>) -> Self {
        let name = format!("authorization[{}]", authorizer.name());
        Self {
            name,
            authorizer,
        }
    }
}

#[async_trait]
impl RequestFilter for AuthorizationFilter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn apply(&self, request: &mut SecurityRequest) -> Result<(), SecurityError> {
        match self.authorizer.authorize(request).await? {
            AuthorizationOutcome::Allow(level) => {
                let context = request.context_mut();
                context.mark_authorized();
                if let Some(user) = context.user_mut() {
                    user.grant_access_level(level);
                }
                Ok(())
            }
            AuthorizationOutcome::Deny(Some(cause)) => {
                Err(SecurityError::Forbidden(cause.description()))
            }
            AuthorizationOutcome::Deny(None) => {
                Err(SecurityError::Forbidden(AUTHORIZATION_DENIED_REASON.to_string()))
            }
            AuthorizationOutcome::Abstain => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Required Filters
// ============================================================================

/// Rejects requests on registered paths that carry no identity.
pub struct RequiredAuthenticationFilter {
    /// Matcher groups naming the required endpoints.
    matchers: Vec<FilterMatcher>,
}

impl RequiredAuthenticationFilter {
    /// Creates the terminal authentication check over the given matchers.
    #[must_use]
    pub const fn new(matchers: Vec<FilterMatcher>) -> Self {
        Self {
            matchers,
        }
    }
}

#[async_trait]
impl RequestFilter for RequiredAuthenticationFilter {
    fn name(&self) -> &str {
        "required-authentication"
    }

    async fn apply(&self, request: &mut SecurityRequest) -> Result<(), SecurityError> {
        if any_filter_matches(&self.matchers, &request.endpoint())
            && !request.context().has_user()
        {
            return Err(SecurityError::Unauthenticated(
                REQUIRED_AUTHENTICATION_REASON.to_string(),
            ));
        }
        Ok(())
    }
}

/// Rejects requests on registered paths never marked authorized.
pub struct RequiredAuthorizationFilter {
    /// Matcher groups naming the required endpoints.
    matchers: Vec<FilterMatcher>,
}

impl RequiredAuthorizationFilter {
    /// Creates the terminal authorization check over the given matchers.
    #[must_use]
    pub const fn new(matchers: Vec<FilterMatcher>) -> Self {
        Self {
            matchers,
        }
    }
}

#[async_trait]
impl RequestFilter for RequiredAuthorizationFilter {
    fn name(&self) -> &str {
        "required-authorization"
    }

    async fn apply(&self, request: &mut SecurityRequest) -> Result<(), SecurityError> {
        if any_filter_matches(&self.matchers, &request.endpoint())
            && !request.context().is_authorized()
        {
            return Err(SecurityError::Forbidden(REQUIRED_AUTHORIZATION_REASON.to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Security Pipeline
// ============================================================================

/// Fixed-order enforcement chain assembled by the security builder.
///
/// # Invariants
/// - Stage order is authentication, required authentication, authorization,
///   required authorization.
/// - Configuration is finalized before serving; runs are read-only and safe
///   for unsynchronized concurrent use.
pub struct SecurityPipeline {
    /// Dynamic authentication stage.
    authentication: DynamicMatchingFilter,
    /// Terminal authentication check.
    required_authentication: RequiredAuthenticationFilter,
    /// Dynamic authorization stage.
    authorization: DynamicMatchingFilter,
    /// Terminal authorization check.
    required_authorization: RequiredAuthorizationFilter,
    /// Sink receiving one event per enforcement.
    audit: Arc<dyn AuditSink>,
}

impl SecurityPipeline {
    /// Assembles the pipeline from its four stages.
    pub(crate) fn new(
        authentication: DynamicMatchingFilter,
        required_authentication: RequiredAuthenticationFilter,
        authorization: DynamicMatchingFilter,
        required_authorization: RequiredAuthorizationFilter,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            authentication,
            required_authentication,
            authorization,
            required_authorization,
            audit,
        }
    }

    /// Runs the pipeline over a request, enforcing every stage in order.
    ///
    /// # Errors
    ///
    /// Returns [`SecurityError`] when any stage rejects the request.
    pub async fn run(&self, request: &mut SecurityRequest) -> Result<(), SecurityError> {
        let stages: [&dyn RequestFilter; 4] = [
            &self.authentication,
            &self.required_authentication,
            &self.authorization,
            &self.required_authorization,
        ];
        for stage in stages {
            if let Err(error) = stage.apply(request).await {
                self.audit.record(&SecurityAuditEvent::denied(request, stage.name(), &error));
                return Err(error);
            }
        }
        self.audit.record(&SecurityAuditEvent::passed(request));
        Ok(())
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

    use super::AuthenticationFilter;
    use super::AuthorizationFilter;
    use super::DynamicMatchingFilter;
    use super::RequestFilter;
    use super::RequiredAuthenticationFilter;
    use super::RequiredAuthorizationFilter;
    use crate::access::AccessLevel;
    use crate::authn::AuthenticationOutcome;
    use crate::authn::Authenticator;
    use crate::authz::AuthorizationOutcome;
    use crate::authz::Authorizer;
    use crate::context::AuthenticationType;
    use crate::context::SecurityRequest;
    use crate::context::UserContext;
    use crate::errors::SecurityError;
    use crate::matcher::FilterMatcher;
    use crate::matcher::Matcher;
    use crate::matcher::Method;

    /// Filter that records how often it ran.
    struct Counting {
        /// Number of times the filter ran.
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl RequestFilter for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        async fn apply(&self, _request: &mut SecurityRequest) -> Result<(), SecurityError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Authenticator that always resolves the same identity.
    struct FixedIdentity;

    #[async_trait]
    impl Authenticator for FixedIdentity {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn authenticate(
            &self,
            _request: &SecurityRequest,
        ) -> Result<AuthenticationOutcome, SecurityError> {
            Ok(AuthenticationOutcome::Allow(Box::new(UserContext::new(
                "fixed-user",
                AuthenticationType::Basic,
                json!({}),
            ))))
        }
    }

    /// Authorizer that always grants the given level.
    struct FixedGrant {
        /// Level granted on every request.
        level: AccessLevel,
    }

    #[async_trait]
    impl Authorizer for FixedGrant {
        fn name(&self) -> &str {
            "fixed-grant"
        }

        async fn authorize(
            &self,
            _request: &SecurityRequest,
        ) -> Result<AuthorizationOutcome, SecurityError> {
            Ok(AuthorizationOutcome::Allow(self.level))
        }
    }

    /// Builds a matcher group over a single path pattern.
    fn group(pattern: &str) -> FilterMatcher {
        FilterMatcher::new(pattern, vec![Matcher::paths([pattern])])
    }

    /// Tests that only matching entries run, in registration order.
    #[tokio::test]
    async fn dynamic_filter_runs_matching_entries_only() {
        let matched = Arc::new(AtomicUsize::new(0));
        let unmatched = Arc::new(AtomicUsize::new(0));
        let mut dynamic = DynamicMatchingFilter::new("authn");
        dynamic.register(
            vec![group("/v1/service_brokers")],
            Arc::new(Counting {
                calls: Arc::clone(&matched),
            }),
        );
        dynamic.register(
            vec![group("/v1/platforms")],
            Arc::new(Counting {
                calls: Arc::clone(&unmatched),
            }),
        );
        let mut request = SecurityRequest::new(Method::Get, "/v1/service_brokers", None);
        dynamic.apply(&mut request).await.unwrap();
        assert_eq!(matched.load(Ordering::SeqCst), 1);
        assert_eq!(unmatched.load(Ordering::SeqCst), 0);
    }

    /// Tests that no matching entry leaves the request untouched.
    #[tokio::test]
    async fn dynamic_filter_passes_through_without_matches() {
        let dynamic = DynamicMatchingFilter::new("authn");
        let mut request = SecurityRequest::new(Method::Get, "/v1/info", None);
        dynamic.apply(&mut request).await.unwrap();
        assert!(!request.context().has_user());
        assert!(dynamic.is_empty());
    }

    /// Tests that the authentication stage attaches the resolved identity.
    #[tokio::test]
    async fn authentication_filter_attaches_identity_once() {
        let filter = AuthenticationFilter::new(Arc::new(FixedIdentity));
        let mut request = SecurityRequest::new(Method::Get, "/v1/info", None);
        filter.apply(&mut request).await.unwrap();
        assert_eq!(request.context().user().map(UserContext::name), Some("fixed-user"));

        // A previously attached identity is never replaced.
        request
            .context_mut()
            .attach_user(UserContext::new("existing", AuthenticationType::Bearer, json!({})));
        filter.apply(&mut request).await.unwrap();
        assert_eq!(request.context().user().map(UserContext::name), Some("existing"));
    }

    /// Tests that the authorization stage marks and raises the context.
    #[tokio::test]
    async fn authorization_filter_marks_and_raises() {
        let filter = AuthorizationFilter::new(Arc::new(FixedGrant {
            level: AccessLevel::AllTenantAccess,
        }));
        let mut request = SecurityRequest::new(Method::Get, "/v1/info", None);
        request
            .context_mut()
            .attach_user(UserContext::new("client", AuthenticationType::Bearer, json!({})));
        filter.apply(&mut request).await.unwrap();
        assert!(request.context().is_authorized());
        assert_eq!(
            request.context().user().map(UserContext::access_level),
            Some(AccessLevel::AllTenantAccess)
        );
    }

    /// Tests the required filters on matching and non-matching paths.
    #[tokio::test]
    async fn required_filters_enforce_registered_paths_only() {
        let authn = RequiredAuthenticationFilter::new(vec![group("/v1/**")]);
        let authz = RequiredAuthorizationFilter::new(vec![group("/v1/**")]);

        let mut outside = SecurityRequest::new(Method::Get, "/healthz", None);
        authn.apply(&mut outside).await.unwrap();
        authz.apply(&mut outside).await.unwrap();

        let mut inside = SecurityRequest::new(Method::Get, "/v1/service_brokers", None);
        let error = authn.apply(&mut inside).await.unwrap_err();
        assert!(matches!(error, SecurityError::Unauthenticated(_)));
        let error = authz.apply(&mut inside).await.unwrap_err();
        assert!(matches!(error, SecurityError::Forbidden(_)));

        inside
            .context_mut()
            .attach_user(UserContext::new("client", AuthenticationType::Bearer, json!({})));
        inside.context_mut().mark_authorized();
        authn.apply(&mut inside).await.unwrap();
        authz.apply(&mut inside).await.unwrap();
    }
}
