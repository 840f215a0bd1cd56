// crates/broker-gate-auth/src/lib.rs
// ============================================================================
// Module: Broker Gate Auth
// Description: Concrete leaf authenticators and authorizers.
// Purpose: Implement the policy leaves the gateway combines per endpoint.
// Dependencies: base64, broker-gate-core, broker-gate-security
// ============================================================================

//! ## Overview
//! The leaf policies resolve identities and scopes for the decision engine:
//! Basic platform and broker-platform authenticators over the credential
//! store, the OIDC bearer authenticator over the token verifier seam, and the
//! claim-driven scope, client-id, and basic-scheme authorizers. Each policy
//! owns exactly one check; the security builder combines them per endpoint.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod basic;
pub mod basic_scheme;
pub mod bearer;
pub mod broker;
pub mod client_id;
pub mod scope;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use basic::BasicCredentials;
pub use basic::BasicPlatformAuthenticator;
pub use basic::parse_basic_credentials;
pub use basic_scheme::BasicSchemeAuthorizer;
pub use bearer::BearerAuthenticator;
pub use bearer::DEFAULT_USERNAME_CLAIM;
pub use broker::BrokerPlatformAuthenticator;
pub use broker::broker_id_from_path;
pub use client_id::client_id_authorizer;
pub use client_id::client_id_suffix_authorizer;
pub use scope::scope_authorizer;
