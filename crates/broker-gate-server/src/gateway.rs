// crates/broker-gate-server/src/gateway.rs
// ============================================================================
// Module: Gateway HTTP Surface
// Description: Router assembly and the security middleware bridge.
// Purpose: Enforce the security pipeline in front of every gateway route.
// Dependencies: axum, broker-gate-core, broker-gate-oidc, broker-gate-security
// ============================================================================

//! ## Overview
//! Every inbound request is snapshotted into a [`SecurityRequest`] and run
//! through the [`SecurityPipeline`] before any handler executes. A rejection
//! maps to a JSON error body with the matching status code; a pass stores the
//! final [`SecurityContext`] in the request extensions, where handlers read
//! it through [`CurrentUser`] or the plain [`axum::Extension`] accessor and
//! must not mutate it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::FromRequestParts;
use axum::extract::Request;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::middleware;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use broker_gate_core::AesGcmSecretCipher;
use broker_gate_core::InMemoryCredentialStore;
use broker_gate_core::SecretsError;
use broker_gate_core::TokenVerifier;
use broker_gate_oidc::OidcError;
use broker_gate_oidc::OidcVerifier;
use broker_gate_security::AuditSink;
use broker_gate_security::Method;
use broker_gate_security::NoopAuditSink;
use broker_gate_security::SecurityContext;
use broker_gate_security::SecurityError;
use broker_gate_security::SecurityPipeline;
use broker_gate_security::SecurityRequest;
use broker_gate_security::StderrAuditSink;
use broker_gate_security::UserContext;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::config::ConfigError;
use crate::config::GatewayConfig;
use crate::wiring::OidcPolicySettings;
use crate::wiring::configure_security;

// ============================================================================
// SECTION: Gateway Error
// ============================================================================

/// Failure raised while assembling or running the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Configuration loading or validation failed.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// OIDC discovery or verifier construction failed.
    #[error("oidc setup failed: {0}")]
    Oidc(#[from] OidcError),
    /// The secret cipher could not be constructed.
    #[error("secret cipher setup failed: {0}")]
    Secrets(#[from] SecretsError),
    /// Binding or serving the listener failed.
    #[error("server io error: {0}")]
    Io(String),
}

// ============================================================================
// SECTION: Error Body
// ============================================================================

/// JSON error body returned for rejected requests.
#[derive(Debug, Serialize)]
struct ErrorBody {
    /// Short error class.
    error: &'static str,
    /// Human-readable description.
    description: String,
}

/// Builds a JSON error response with the given status.
fn error_response(status: StatusCode, error: &'static str, description: String) -> Response {
    (
        status,
        Json(ErrorBody {
            error,
            description,
        }),
    )
        .into_response()
}

/// Maps a pipeline rejection onto the HTTP surface.
///
/// Fatal evaluation failures are surfaced without upstream detail.
fn security_error_response(error: &SecurityError) -> Response {
    match error {
        SecurityError::Unauthenticated(_) => {
            error_response(StatusCode::UNAUTHORIZED, "Unauthorized", error.description())
        }
        SecurityError::Forbidden(_) | SecurityError::Composite(_) => {
            error_response(StatusCode::FORBIDDEN, "Forbidden", error.description())
        }
        SecurityError::Evaluation(_) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "InternalServerError",
            "security evaluation failed".to_string(),
        ),
    }
}

// ============================================================================
// SECTION: Security Middleware
// ============================================================================

/// Runs the security pipeline over the request before routing continues.
async fn enforce_security(
    State(pipeline): State<Arc<SecurityPipeline>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(method) = Method::parse(request.method().as_str()) else {
        return error_response(
            StatusCode::METHOD_NOT_ALLOWED,
            "MethodNotAllowed",
            format!("unsupported method {}", request.method()),
        );
    };
    let authorization = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let mut security_request =
        SecurityRequest::new(method, request.uri().path(), authorization);
    match pipeline.run(&mut security_request).await {
        Ok(()) => {
            request.extensions_mut().insert(security_request.into_context());
            next.run(request).await
        }
        Err(error) => security_error_response(&error),
    }
}

// ============================================================================
// SECTION: Extractors
// ============================================================================

/// Extracts the authenticated caller, rejecting with 401 when absent.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserContext);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SecurityContext>()
            .and_then(SecurityContext::user)
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| {
                error_response(
                    StatusCode::UNAUTHORIZED,
                    "Unauthorized",
                    "no authenticated user found for the request".to_string(),
                )
            })
    }
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Reports gateway liveness.
async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "UP"}))
}

/// Reports the gateway build identity.
async fn info() -> Json<serde_json::Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Echoes the caller identity the pipeline attached.
async fn whoami(
    CurrentUser(user): CurrentUser,
    axum::Extension(context): axum::Extension<SecurityContext>,
) -> Json<serde_json::Value> {
    Json(json!({
        "name": user.name(),
        "authentication_type": user.authentication_type().as_str(),
        "access_level": user.access_level().as_str(),
        "authorized": context.is_authorized(),
    }))
}

// ============================================================================
// SECTION: Router Assembly
// ============================================================================

/// Builds the gateway router behind the security middleware.
#[must_use]
pub fn build_router(pipeline: Arc<SecurityPipeline>) -> Router {
    Router::new()
        .route("/v1/monitor/health", get(health))
        .route("/v1/info", get(info))
        .route("/v1/whoami", get(whoami))
        .layer(middleware::from_fn_with_state(pipeline, enforce_security))
}

// ============================================================================
// SECTION: Serving
// ============================================================================

/// Assembles the pipeline from configuration.
///
/// # Errors
///
/// Returns [`GatewayError`] when the cipher or the OIDC verifier cannot be
/// constructed.
pub async fn pipeline_from_config(
    config: &GatewayConfig,
    store: Arc<InMemoryCredentialStore>,
) -> Result<SecurityPipeline, GatewayError> {
    let key = config.decoded_key()?;
    let cipher = Arc::new(AesGcmSecretCipher::new(&key)?);

    let oidc = match &config.oidc {
        Some(section) => {
            let issuer = section.issuer_url()?;
            let verifier = OidcVerifier::from_issuer(&reqwest::Client::new(), &issuer).await?;
            Some((
                Arc::new(verifier) as Arc<dyn TokenVerifier>,
                OidcPolicySettings {
                    client_id: section.client_id.clone(),
                    trusted_client_id_suffixes: section.trusted_client_id_suffixes.clone(),
                    username_claim: section.username_claim.clone(),
                    required_scopes: section.required_scopes.clone(),
                },
            ))
        }
        None => None,
    };

    let audit: Arc<dyn AuditSink> =
        if config.audit.enabled { Arc::new(StderrAuditSink) } else { Arc::new(NoopAuditSink) };
    Ok(configure_security(store, cipher, oidc, audit))
}

/// Binds the configured address and serves the gateway until shutdown.
///
/// # Errors
///
/// Returns [`GatewayError`] when assembly, binding, or serving fails.
pub async fn serve(config: GatewayConfig) -> Result<(), GatewayError> {
    let store = Arc::new(InMemoryCredentialStore::new());
    let pipeline = pipeline_from_config(&config, store).await?;
    let router = build_router(Arc::new(pipeline));
    let listener = tokio::net::TcpListener::bind(config.bind_addr()?)
        .await
        .map_err(|err| GatewayError::Io(err.to_string()))?;
    axum::serve(listener, router)
        .await
        .map_err(|err| GatewayError::Io(err.to_string()))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
