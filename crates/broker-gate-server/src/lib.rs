// crates/broker-gate-server/src/lib.rs
// ============================================================================
// Module: Broker Gate Server
// Description: Axum gateway fronting the security decision engine.
// Purpose: Serve the management and OSB surfaces behind the pipeline.
// Dependencies: axum, broker-gate-auth, broker-gate-oidc, broker-gate-security
// ============================================================================

//! ## Overview
//! The server crate binds the decision engine to HTTP: configuration loading,
//! the security middleware that runs the pipeline per request, the default
//! policy wiring over the OSB and management surfaces, and the gateway
//! routes. The binary entry point lives in `main.rs`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod gateway;
pub mod wiring;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::AuditConfig;
pub use config::ConfigError;
pub use config::GatewayConfig;
pub use config::OidcConfig;
pub use gateway::CurrentUser;
pub use gateway::GatewayError;
pub use gateway::build_router;
pub use gateway::pipeline_from_config;
pub use gateway::serve;
pub use wiring::OidcPolicySettings;
pub use wiring::configure_security;
