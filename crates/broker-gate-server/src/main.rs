// crates/broker-gate-server/src/main.rs
// ============================================================================
// Module: Broker Gate Entry Point
// Description: Binary entry point for the gateway.
// Purpose: Parse arguments, load configuration, and serve until shutdown.
// Dependencies: broker-gate-server, clap, tokio
// ============================================================================

//! ## Overview
//! The binary parses its arguments with clap, loads and validates the TOML
//! configuration, applies the optional bind override, and serves the gateway.
//! Startup fails closed: any configuration or OIDC discovery problem aborts
//! before the listener binds.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::process::ExitCode;

use broker_gate_server::GatewayConfig;
use broker_gate_server::GatewayError;
use broker_gate_server::serve;
use clap::Parser;

// ============================================================================
// SECTION: Arguments
// ============================================================================

/// Broker Gate, a broker/platform management gateway.
#[derive(Debug, Parser)]
#[command(name = "broker-gate", version)]
struct Cli {
    /// Path to the gateway configuration file.
    #[arg(long)]
    config: PathBuf,
    /// Override the configured bind address.
    #[arg(long)]
    bind: Option<String>,
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Binary entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            emit_error(&err.to_string());
            ExitCode::FAILURE
        }
    }
}

/// Loads the configuration and serves the gateway.
async fn run() -> Result<(), GatewayError> {
    let cli = Cli::parse();
    let mut config = GatewayConfig::load(&cli.config)?;
    if let Some(bind) = cli.bind {
        config.bind = bind;
        config.validate()?;
    }
    serve(config).await
}

/// Writes a fatal startup error to stderr.
#[allow(clippy::print_stderr, reason = "Startup failures are reported on stderr.")]
fn emit_error(message: &str) {
    eprintln!("broker-gate: {message}");
}
