// crates/broker-gate-server/tests/config.rs
// ============================================================================
// Module: Config Tests
// Description: Tests for gateway configuration loading from disk.
// Purpose: Validate the fail-closed load path over real files.
// Dependencies: broker-gate-server, tempfile
// ============================================================================

//! ## Overview
//! Writes configuration files to a temporary directory and drives the load
//! path: a complete config round-trips, missing files and malformed TOML
//! fail with their own error classes, and validation runs as part of load.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod support;

use std::fs;
use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use broker_gate_core::SECRET_KEY_SIZE;
use broker_gate_server::ConfigError;
use broker_gate_server::GatewayConfig;
use tempfile::TempDir;

use crate::support::TestResult;
use crate::support::ensure;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

/// Writes a config file into the temporary directory.
fn write_config(dir: &TempDir, content: &str) -> TestResult<PathBuf> {
    let path = dir.path().join("broker-gate.toml");
    fs::write(&path, content)?;
    Ok(path)
}

/// Returns a base64 key of the expected size.
fn valid_key() -> String {
    BASE64.encode(vec![2u8; SECRET_KEY_SIZE])
}

// ============================================================================
// SECTION: Load Path
// ============================================================================

/// Tests that a complete configuration loads and validates.
#[test]
fn test_complete_config_loads() -> TestResult {
    let dir = TempDir::new()?;
    let path = write_config(
        &dir,
        &format!(
            concat!(
                "bind = \"127.0.0.1:8585\"\n",
                "encryption_key = \"{}\"\n\n",
                "[audit]\n",
                "enabled = false\n\n",
                "[oidc]\n",
                "issuer = \"https://login.example.com\"\n",
                "client_id = \"broker-gate\"\n",
                "trusted_client_id_suffixes = [\"-broker-gate\"]\n",
                "required_scopes = [\"broker.read\"]\n",
            ),
            valid_key()
        ),
    )?;

    let config = GatewayConfig::load(&path)?;
    ensure(!config.audit.enabled, "Expected the audit toggle to load")?;
    let oidc = config.oidc.as_ref().ok_or("missing oidc section")?;
    ensure(oidc.username_claim == "sub", "Expected the default username claim")?;
    ensure(
        oidc.trusted_client_id_suffixes == vec!["-broker-gate".to_string()],
        "Expected the trusted suffixes to load",
    )?;
    Ok(())
}

/// Tests that a missing file fails with an io error.
#[test]
fn test_missing_file_is_an_io_error() -> TestResult {
    let dir = TempDir::new()?;
    let result = GatewayConfig::load(&dir.path().join("absent.toml"));
    ensure(matches!(result, Err(ConfigError::Io(_))), "Expected an io error")?;
    Ok(())
}

/// Tests that malformed TOML fails with a parse error.
#[test]
fn test_malformed_toml_is_a_parse_error() -> TestResult {
    let dir = TempDir::new()?;
    let path = write_config(&dir, "bind = [not toml")?;
    let result = GatewayConfig::load(&path);
    ensure(matches!(result, Err(ConfigError::Parse(_))), "Expected a parse error")?;
    Ok(())
}

/// Tests that validation runs as part of the load path.
#[test]
fn test_load_validates_the_content() -> TestResult {
    let dir = TempDir::new()?;
    let path = write_config(
        &dir,
        "bind = \"127.0.0.1:8585\"\nencryption_key = \"dG9vLXNob3J0\"\n",
    )?;
    let result = GatewayConfig::load(&path);
    ensure(matches!(result, Err(ConfigError::Invalid(_))), "Expected a validation error")?;
    Ok(())
}
