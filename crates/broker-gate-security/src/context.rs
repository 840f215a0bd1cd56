// crates/broker-gate-security/src/context.rs
// ============================================================================
// Module: Security Context
// Description: Per-request identity and authorization state.
// Purpose: Carry the resolved caller identity through the filter chain.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`UserContext`] is created by a successful authentication, attached to
//! the request's [`SecurityContext`], raised to a higher access level by the
//! authorization stage, and dropped with the request. Downstream handlers
//! read the final context and must not mutate it.
//!
//! ## Invariants
//! - The `authorized` flag is set only by a successful authorization run.
//! - Per-request state is never shared across requests.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::access::AccessLevel;
use crate::errors::SecurityError;
use crate::matcher::Endpoint;
use crate::matcher::Method;

// ============================================================================
// SECTION: Authentication Type
// ============================================================================

/// Scheme through which a caller authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthenticationType {
    /// HTTP Basic credentials.
    Basic,
    /// OAuth2/OIDC bearer token.
    Bearer,
}

impl AuthenticationType {
    /// Returns a stable label for audit events.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Bearer => "bearer",
        }
    }
}

// ============================================================================
// SECTION: User Context
// ============================================================================

/// Resolved caller identity attached to a request after authentication.
///
/// # Invariants
/// - `access_level` starts at [`AccessLevel::NoAccess`] and is only raised.
/// - `data` holds the raw claims or credential record that produced the
///   identity; consumers deserialize it through [`UserContext::data`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserContext {
    /// Principal identifier.
    name: String,
    /// Scheme through which the caller authenticated.
    authentication_type: AuthenticationType,
    /// Access level granted by authorization.
    access_level: AccessLevel,
    /// Raw claims or credential record backing the identity.
    data: Value,
}

impl UserContext {
    /// Creates an identity with no access granted yet.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        authentication_type: AuthenticationType,
        data: Value,
    ) -> Self {
        Self {
            name: name.into(),
            authentication_type,
            access_level: AccessLevel::NoAccess,
            data,
        }
    }

    /// Returns the principal identifier.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the authentication scheme.
    #[must_use]
    pub const fn authentication_type(&self) -> AuthenticationType {
        self.authentication_type
    }

    /// Returns the granted access level.
    #[must_use]
    pub const fn access_level(&self) -> AccessLevel {
        self.access_level
    }

    /// Raises the granted access level; lower grants never downgrade it.
    pub fn grant_access_level(&mut self, level: AccessLevel) {
        if level > self.access_level {
            self.access_level = level;
        }
    }

    /// Returns the raw claims or credential record.
    #[must_use]
    pub const fn raw_data(&self) -> &Value {
        &self.data
    }

    /// Deserializes the raw data into a caller-supplied structure.
    ///
    /// # Errors
    ///
    /// Returns [`SecurityError::Evaluation`] when the data does not match the
    /// requested shape.
    pub fn data<T: DeserializeOwned>(&self) -> Result<T, SecurityError> {
        serde_json::from_value(self.data.clone()).map_err(|err| {
            SecurityError::Evaluation(format!("user data deserialization failed: {err}"))
        })
    }
}

// ============================================================================
// SECTION: Security Context
// ============================================================================

/// Per-request container for identity and authorization state.
#[derive(Debug, Clone, Default)]
pub struct SecurityContext {
    /// Identity attached by the authentication stage.
    user: Option<UserContext>,
    /// Set only by a successful authorization run.
    authorized: bool,
}

impl SecurityContext {
    /// Creates an empty context.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            user: None,
            authorized: false,
        }
    }

    /// Returns the attached identity, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&UserContext> {
        self.user.as_ref()
    }

    /// Returns the attached identity mutably, if any.
    pub const fn user_mut(&mut self) -> Option<&mut UserContext> {
        self.user.as_mut()
    }

    /// Returns true when an identity is attached.
    #[must_use]
    pub const fn has_user(&self) -> bool {
        self.user.is_some()
    }

    /// Attaches an identity produced by authentication.
    pub fn attach_user(&mut self, user: UserContext) {
        self.user = Some(user);
    }

    /// Returns true when a successful authorization run marked the request.
    #[must_use]
    pub const fn is_authorized(&self) -> bool {
        self.authorized
    }

    /// Marks the request as authorized.
    pub const fn mark_authorized(&mut self) {
        self.authorized = true;
    }
}

// ============================================================================
// SECTION: Security Request
// ============================================================================

/// Snapshot of an inbound request as the decision engine sees it.
///
/// # Invariants
/// - The endpoint is taken from the live request and never cached across
///   requests.
#[derive(Debug, Clone)]
pub struct SecurityRequest {
    /// Request method.
    method: Method,
    /// Request path.
    path: String,
    /// Raw `Authorization` header value, when present.
    authorization: Option<String>,
    /// Per-request identity and authorization state.
    context: SecurityContext,
}

impl SecurityRequest {
    /// Creates a request snapshot for the decision engine.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>, authorization: Option<String>) -> Self {
        Self {
            method,
            path: path.into(),
            authorization,
            context: SecurityContext::new(),
        }
    }

    /// Returns the request method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the endpoint for matcher evaluation.
    #[must_use]
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.method, self.path.clone())
    }

    /// Returns the raw `Authorization` header value, when present.
    #[must_use]
    pub fn authorization_header(&self) -> Option<&str> {
        self.authorization.as_deref()
    }

    /// Returns the per-request security context.
    #[must_use]
    pub const fn context(&self) -> &SecurityContext {
        &self.context
    }

    /// Returns the per-request security context mutably.
    pub const fn context_mut(&mut self) -> &mut SecurityContext {
        &mut self.context
    }

    /// Consumes the request and returns the final context.
    #[must_use]
    pub fn into_context(self) -> SecurityContext {
        self.context
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

    use serde_json::json;

    use super::AuthenticationType;
    use super::SecurityContext;
    use super::SecurityRequest;
    use super::UserContext;
    use crate::access::AccessLevel;
    use crate::matcher::Method;

    /// Tests that new identities start without access.
    #[test]
    fn new_user_starts_with_no_access() {
        let user = UserContext::new("tester", AuthenticationType::Basic, json!({}));
        assert_eq!(user.access_level(), AccessLevel::NoAccess);
    }

    /// Tests that later grants never downgrade the level.
    #[test]
    fn grants_never_downgrade_access() {
        let mut user = UserContext::new("tester", AuthenticationType::Bearer, json!({}));
        user.grant_access_level(AccessLevel::AllTenantAccess);
        user.grant_access_level(AccessLevel::TenantAccess);
        assert_eq!(user.access_level(), AccessLevel::AllTenantAccess);
    }

    /// Tests the typed accessor over raw identity data.
    #[test]
    fn data_deserializes_into_requested_shape() {
        /// Claim shape used by the accessor test.
        #[derive(serde::Deserialize)]
        struct Claims {
            /// Subject claim.
            sub: String,
        }
        let user =
            UserContext::new("tester", AuthenticationType::Bearer, json!({"sub": "client-1"}));
        let claims: Claims = user.data().unwrap();
        assert_eq!(claims.sub, "client-1");
        assert!(user.data::<Vec<String>>().is_err());
    }

    /// Tests that a fresh context is empty and unauthorized.
    #[test]
    fn context_starts_empty_and_unauthorized() {
        let context = SecurityContext::new();
        assert!(!context.has_user());
        assert!(!context.is_authorized());
    }

    /// Tests that the request snapshot exposes its endpoint.
    #[test]
    fn request_exposes_its_endpoint() {
        let request = SecurityRequest::new(Method::Get, "/v1/info", None);
        let endpoint = request.endpoint();
        assert_eq!(endpoint.method(), Method::Get);
        assert_eq!(endpoint.path(), "/v1/info");
        assert!(request.authorization_header().is_none());
    }
}
