// crates/broker-gate-security/src/audit.rs
// ============================================================================
// Module: Security Audit
// Description: Structured audit events for pipeline enforcement outcomes.
// Purpose: Record every allow/deny decision the pipeline enforces.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Each pipeline run emits one audit event with the outcome: an allow event
//! carrying the resolved principal and access level, or a deny event naming
//! the enforcing filter and reason. Events are JSON-serializable and routed
//! through an [`AuditSink`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

use crate::context::SecurityRequest;
use crate::errors::SecurityError;

// ============================================================================
// SECTION: Audit Event
// ============================================================================

/// Security audit event payload.
#[derive(Debug, Serialize)]
pub struct SecurityAuditEvent {
    /// Event identifier.
    event: &'static str,
    /// Decision outcome.
    decision: &'static str,
    /// Enforcing filter name (deny events only).
    filter: Option<String>,
    /// Request method.
    method: &'static str,
    /// Request path.
    path: String,
    /// Resolved principal, when one was attached.
    principal: Option<String>,
    /// Granted access level label, when an identity was attached.
    access_level: Option<&'static str>,
    /// Whether the authorization stage marked the request.
    authorized: bool,
    /// Failure reason (deny events only).
    reason: Option<String>,
}

impl SecurityAuditEvent {
    /// Builds an allow event for a request that passed the pipeline.
    #[must_use]
    pub fn passed(request: &SecurityRequest) -> Self {
        let context = request.context();
        Self {
            event: "gateway_security",
            decision: "allow",
            filter: None,
            method: request.method().as_str(),
            path: request.path().to_string(),
            principal: context.user().map(|user| user.name().to_string()),
            access_level: context.user().map(|user| user.access_level().as_str()),
            authorized: context.is_authorized(),
            reason: None,
        }
    }

    /// Builds a deny event for a request rejected by the given filter.
    #[must_use]
    pub fn denied(request: &SecurityRequest, filter: &str, error: &SecurityError) -> Self {
        let context = request.context();
        Self {
            event: "gateway_security",
            decision: "deny",
            filter: Some(filter.to_string()),
            method: request.method().as_str(),
            path: request.path().to_string(),
            principal: context.user().map(|user| user.name().to_string()),
            access_level: None,
            authorized: context.is_authorized(),
            reason: Some(error.to_string()),
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for security decisions.
pub trait AuditSink: Send + Sync {
    /// Records a security audit event.
    fn record(&self, event: &SecurityAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    #[allow(clippy::print_stderr, reason = "Audit events are emitted as JSON lines on stderr.")]
    fn record(&self, event: &SecurityAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            eprintln!("{payload}");
        }
    }
}

/// No-op audit sink for tests.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &SecurityAuditEvent) {}
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

    use super::SecurityAuditEvent;
    use crate::context::AuthenticationType;
    use crate::context::SecurityRequest;
    use crate::context::UserContext;
    use crate::errors::SecurityError;
    use crate::matcher::Method;

    /// Tests that allow events carry the resolved principal.
    #[test]
    fn passed_event_carries_principal() {
        let mut request = SecurityRequest::new(Method::Get, "/v1/info", None);
        request
            .context_mut()
            .attach_user(UserContext::new("platform-1", AuthenticationType::Basic, json!({})));
        request.context_mut().mark_authorized();
        let event = SecurityAuditEvent::passed(&request);
        let payload = serde_json::to_value(&event).unwrap();
        assert_eq!(payload["decision"], "allow");
        assert_eq!(payload["principal"], "platform-1");
        assert_eq!(payload["authorized"], true);
    }

    /// Tests that deny events name the enforcing filter and reason.
    #[test]
    fn denied_event_names_filter_and_reason() {
        let request = SecurityRequest::new(Method::Get, "/v1/service_brokers", None);
        let error = SecurityError::Unauthenticated("no user".to_string());
        let event = SecurityAuditEvent::denied(&request, "required-authentication", &error);
        let payload = serde_json::to_value(&event).unwrap();
        assert_eq!(payload["decision"], "deny");
        assert_eq!(payload["filter"], "required-authentication");
        assert_eq!(payload["reason"], "unauthenticated: no user");
    }
}
