// crates/broker-gate-security/src/builder.rs
// ============================================================================
// Module: Security Builder
// Description: Fluent accumulator wiring policies into the filter pipeline.
// Purpose: Group policies by path/method and finalize them as required or
//          optional before the server starts serving.
// Dependencies: crate::authn, crate::authz, crate::filter, crate::matcher
// ============================================================================

//! ## Overview
//! The builder accumulates one policy group at a time: paths, methods,
//! authenticators, and authorizers. [`SecurityBuilder::required`] combines
//! the group (authenticators OR-combined, authorizers AND-combined),
//! registers it into the dynamic filters, and records the group's matcher so
//! the required filters enforce it. [`SecurityBuilder::optional`] instead
//! carves the group's endpoints out of every *previously* declared required
//! matcher. Declaration order controls precedence: an optional group narrows
//! only required scopes declared before it.
//!
//! ## Invariants
//! - The accumulator resets after every `required()`/`optional()` call.
//! - The required matcher lists only grow, or gain negation clauses; entries
//!   are never removed.
//! - `build()` is called once, after all path configuration.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::access::AccessLevel;
use crate::audit::AuditSink;
use crate::audit::NoopAuditSink;
use crate::authn::Authenticator;
use crate::authn::OrAuthenticator;
use crate::authz::AccessLevelOverride;
use crate::authz::AndAuthorizer;
use crate::authz::Authorizer;
use crate::filter::AuthenticationFilter;
use crate::filter::AuthorizationFilter;
use crate::filter::DynamicMatchingFilter;
use crate::filter::RequiredAuthenticationFilter;
use crate::filter::RequiredAuthorizationFilter;
use crate::filter::SecurityPipeline;
use crate::matcher::FilterMatcher;
use crate::matcher::Matcher;
use crate::matcher::Method;

// ============================================================================
// SECTION: Policy Group Accumulator
// ============================================================================

/// Pending policy group state between finalizer calls.
#[derive(Default)]
struct PolicyGroup {
    /// Path patterns the group applies to.
    paths: Vec<String>,
    /// Methods the group applies to.
    methods: Vec<Method>,
    /// Authenticators combined with OR at finalization.
    authenticators: Vec<Arc<dyn Authenticator>>,
    /// Authorizers combined with AND at finalization.
    authorizers: Vec<Arc<dyn Authorizer>>,
    /// Fixed access level override, when set.
    access_level: Option<AccessLevel>,
    /// Whether authentication was requested for the group.
    authentication_requested: bool,
    /// Whether authorization was requested for the group.
    authorization_requested: bool,
}

impl PolicyGroup {
    /// Returns the endpoint matchers of the group.
    fn matchers(&self) -> Vec<Matcher> {
        let mut matchers = Vec::new();
        if !self.paths.is_empty() {
            matchers.push(Matcher::paths(self.paths.clone()));
        }
        if !self.methods.is_empty() {
            matchers.push(Matcher::methods(self.methods.clone()));
        }
        matchers
    }

    /// Returns a readable group label for audit events.
    fn label(&self) -> String {
        let paths = if self.paths.is_empty() { "/**".to_string() } else { self.paths.join(",") };
        let methods = if self.methods.is_empty() {
            "*".to_string()
        } else {
            self.methods.iter().map(|method| method.as_str()).collect::<Vec<_>>().join(",")
        };
        format!("{paths} {methods}")
    }
}

// ============================================================================
// SECTION: Security Builder
// ============================================================================

/// Fluent accumulator producing a [`SecurityPipeline`].
pub struct SecurityBuilder {
    /// Dynamic authentication stage under construction.
    authentication: DynamicMatchingFilter,
    /// Dynamic authorization stage under construction.
    authorization: DynamicMatchingFilter,
    /// Matchers the required authentication filter will enforce.
    required_authn_matchers: Vec<FilterMatcher>,
    /// Matchers the required authorization filter will enforce.
    required_authz_matchers: Vec<FilterMatcher>,
    /// Sink receiving pipeline audit events.
    audit: Arc<dyn AuditSink>,
    /// Pending policy group.
    group: PolicyGroup,
}

impl Default for SecurityBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SecurityBuilder {
    /// Creates a builder with no registered policies and a no-op audit sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            authentication: DynamicMatchingFilter::new("dynamic-authentication"),
            authorization: DynamicMatchingFilter::new("dynamic-authorization"),
            required_authn_matchers: Vec::new(),
            required_authz_matchers: Vec::new(),
            audit: Arc::new(NoopAuditSink),
            group: PolicyGroup::default(),
        }
    }

    /// Replaces the audit sink the pipeline will emit to.
    #[must_use]
    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Sets the path patterns of the pending group.
    #[must_use]
    pub fn path<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group.paths = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the methods of the pending group.
    #[must_use]
    pub fn method<I>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = Method>,
    {
        self.group.methods = methods.into_iter().collect();
        self
    }

    /// Flags authentication for the group without appending a policy.
    #[must_use]
    pub fn authentication(mut self) -> Self {
        self.group.authentication_requested = true;
        self
    }

    /// Appends an authenticator; multiple appends are OR-combined.
    #[must_use]
    pub fn with_authentication(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.group.authenticators.push(authenticator);
        self.group.authentication_requested = true;
        self
    }

    /// Flags authorization for the group without appending a policy.
    #[must_use]
    pub fn authorization(mut self) -> Self {
        self.group.authorization_requested = true;
        self
    }

    /// Appends an authorizer; multiple appends are AND-combined.
    #[must_use]
    pub fn with_authorization(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.group.authorizers.push(authorizer);
        self.group.authorization_requested = true;
        self
    }

    /// Pins the access level granted when the combined authorizer allows.
    #[must_use]
    pub fn set_access_level(mut self, level: AccessLevel) -> Self {
        self.group.access_level = Some(level);
        self
    }

    /// Finalizes the group as required for its endpoints.
    #[must_use]
    pub fn required(mut self) -> Self {
        let matcher = self.register_group();
        if self.group.authentication_requested {
            self.required_authn_matchers.push(matcher.clone());
        }
        if self.group.authorization_requested {
            self.required_authz_matchers.push(matcher);
        }
        self.group = PolicyGroup::default();
        self
    }

    /// Finalizes the group as optional, carving its endpoints out of every
    /// previously declared required scope.
    #[must_use]
    pub fn optional(mut self) -> Self {
        let carve_out = Matcher::negate(self.group.matchers());
        if self.group.authentication_requested {
            for matcher in &mut self.required_authn_matchers {
                matcher.push(carve_out.clone());
            }
        }
        if self.group.authorization_requested {
            for matcher in &mut self.required_authz_matchers {
                matcher.push(carve_out.clone());
            }
        }
        let _ = self.register_group();
        self.group = PolicyGroup::default();
        self
    }

    /// Installs the required matcher sets and returns the finished pipeline.
    #[must_use]
    pub fn build(self) -> SecurityPipeline {
        SecurityPipeline::new(
            self.authentication,
            RequiredAuthenticationFilter::new(self.required_authn_matchers),
            self.authorization,
            RequiredAuthorizationFilter::new(self.required_authz_matchers),
            self.audit,
        )
    }

    /// Combines and registers the pending group's policies under its matcher.
    fn register_group(&mut self) -> FilterMatcher {
        let matcher = FilterMatcher::new(self.group.label(), self.group.matchers());
        if self.group.authentication_requested {
            let combined = OrAuthenticator::new(std::mem::take(&mut self.group.authenticators));
            self.authentication.register(
                vec![matcher.clone()],
                Arc::new(AuthenticationFilter::new(Arc::new(combined))),
            );
        }
        if self.group.authorization_requested {
            let mut combined: Arc<dyn Authorizer> =
                Arc::new(AndAuthorizer::new(std::mem::take(&mut self.group.authorizers)));
            if let Some(level) = self.group.access_level {
                combined = Arc::new(AccessLevelOverride::new(combined, level));
            }
            self.authorization
                .register(vec![matcher.clone()], Arc::new(AuthorizationFilter::new(combined)));
        }
        matcher
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

    use async_trait::async_trait;
    use serde_json::json;

    use super::SecurityBuilder;
    use crate::authn::AuthenticationOutcome;
    use crate::authn::Authenticator;
    use crate::context::AuthenticationType;
    use crate::context::SecurityRequest;
    use crate::context::UserContext;
    use crate::errors::SecurityError;
    use crate::matcher::Method;

    /// Authenticator that resolves an identity whenever a header is present.
    struct HeaderIdentity;

    #[async_trait]
    impl Authenticator for HeaderIdentity {
        fn name(&self) -> &str {
            "header"
        }

        async fn authenticate(
            &self,
            request: &SecurityRequest,
        ) -> Result<AuthenticationOutcome, SecurityError> {
            match request.authorization_header() {
                Some(_) => Ok(AuthenticationOutcome::Allow(Box::new(UserContext::new(
                    "caller",
                    AuthenticationType::Basic,
                    json!({}),
                )))),
                None => Ok(AuthenticationOutcome::Abstain),
            }
        }
    }

    /// Tests that a required group rejects unauthenticated requests.
    #[tokio::test]
    async fn required_group_enforces_authentication() {
        let pipeline = SecurityBuilder::new()
            .path(["/v1/**"])
            .method([Method::Get])
            .with_authentication(Arc::new(HeaderIdentity))
            .required()
            .build();

        let mut anonymous = SecurityRequest::new(Method::Get, "/v1/service_brokers", None);
        let error = pipeline.run(&mut anonymous).await.unwrap_err();
        assert!(matches!(error, SecurityError::Unauthenticated(_)));

        let mut credentialed = SecurityRequest::new(
            Method::Get,
            "/v1/service_brokers",
            Some("Basic Zm9vOmJhcg==".to_string()),
        );
        pipeline.run(&mut credentialed).await.unwrap();
        assert!(credentialed.context().has_user());
    }

    /// Tests that an optional group narrows previously declared scopes only.
    #[tokio::test]
    async fn optional_narrows_only_previous_required_scopes() {
        let pipeline = SecurityBuilder::new()
            .path(["/**"])
            .with_authentication(Arc::new(HeaderIdentity))
            .required()
            .path(["/v1/monitor/health"])
            .method([Method::Get])
            .authentication()
            .optional()
            .build();

        let mut health = SecurityRequest::new(Method::Get, "/v1/monitor/health", None);
        pipeline.run(&mut health).await.unwrap();

        let mut other = SecurityRequest::new(Method::Get, "/v1/service_brokers", None);
        assert!(pipeline.run(&mut other).await.is_err());
    }

    /// Tests that an optional group declared first narrows nothing.
    #[tokio::test]
    async fn optional_before_required_has_no_carve_out() {
        let pipeline = SecurityBuilder::new()
            .path(["/v1/monitor/health"])
            .method([Method::Get])
            .authentication()
            .optional()
            .path(["/**"])
            .with_authentication(Arc::new(HeaderIdentity))
            .required()
            .build();

        let mut health = SecurityRequest::new(Method::Get, "/v1/monitor/health", None);
        assert!(pipeline.run(&mut health).await.is_err());
    }

    /// Tests that repeating an optional carve-out changes nothing.
    #[tokio::test]
    async fn optional_is_idempotent() {
        let build = |repeats: usize| {
            let mut builder = SecurityBuilder::new()
                .path(["/**"])
                .with_authentication(Arc::new(HeaderIdentity))
                .required();
            for _ in 0..repeats {
                builder = builder
                    .path(["/v1/monitor/health"])
                    .method([Method::Get])
                    .authentication()
                    .optional();
            }
            builder.build()
        };

        for pipeline in [build(1), build(2)] {
            let mut health = SecurityRequest::new(Method::Get, "/v1/monitor/health", None);
            pipeline.run(&mut health).await.unwrap();
            let mut other = SecurityRequest::new(Method::Get, "/v1/platforms", None);
            assert!(pipeline.run(&mut other).await.is_err());
        }
    }

    /// Tests that the accumulator resets between finalized groups.
    #[tokio::test]
    async fn accumulator_resets_between_groups() {
        let pipeline = SecurityBuilder::new()
            .path(["/v1/service_brokers"])
            .method([Method::Get])
            .with_authentication(Arc::new(HeaderIdentity))
            .required()
            .path(["/v1/platforms"])
            .method([Method::Get])
            .authentication()
            .required()
            .build();

        // The second group carries no authenticator of its own, so a request
        // on its path stays unauthenticated even with credentials attached.
        let mut platforms = SecurityRequest::new(
            Method::Get,
            "/v1/platforms",
            Some("Basic Zm9vOmJhcg==".to_string()),
        );
        assert!(pipeline.run(&mut platforms).await.is_err());
    }
}
