// crates/broker-gate-security/src/lib.rs
// ============================================================================
// Module: Broker Gate Security
// Description: Composable request security decision engine.
// Purpose: Decide, per request, who the caller is and at what access scope.
// Dependencies: async-trait, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The security engine decides, for every inbound HTTP request, who the
//! caller is, whether they may proceed, and at what access scope. Small
//! pluggable policies resolve to tri-state [`Decision`]s, combine through
//! OR/AND combinators, attach to path/method patterns through the
//! [`SecurityBuilder`], and are enforced by a request-scoped filter chain.
//! The crate is host-agnostic: it sees requests only as method/path/header
//! snapshots and owns no HTTP framework wiring.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod access;
pub mod audit;
pub mod authn;
pub mod authz;
pub mod builder;
pub mod context;
pub mod decision;
pub mod errors;
pub mod filter;
pub mod matcher;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use access::AccessLevel;
pub use audit::AuditSink;
pub use audit::NoopAuditSink;
pub use audit::SecurityAuditEvent;
pub use audit::StderrAuditSink;
pub use authn::AuthenticationOutcome;
pub use authn::Authenticator;
pub use authn::OrAuthenticator;
pub use authz::AccessLevelOverride;
pub use authz::AndAuthorizer;
pub use authz::AuthorizationOutcome;
pub use authz::Authorizer;
pub use authz::OrAuthorizer;
pub use authz::TokenClaimsAuthorizer;
pub use builder::SecurityBuilder;
pub use context::AuthenticationType;
pub use context::SecurityContext;
pub use context::SecurityRequest;
pub use context::UserContext;
pub use decision::Decision;
pub use errors::CompositeError;
pub use errors::SecurityError;
pub use filter::AuthenticationFilter;
pub use filter::AuthorizationFilter;
pub use filter::DynamicMatchingFilter;
pub use filter::RequestFilter;
pub use filter::RequiredAuthenticationFilter;
pub use filter::RequiredAuthorizationFilter;
pub use filter::SecurityPipeline;
pub use matcher::Endpoint;
pub use matcher::FilterMatcher;
pub use matcher::Matcher;
pub use matcher::Method;
pub use matcher::any_filter_matches;
