//! Lacework MCP server
//!
//! Stdio MCP server exposing Lacework query, alert, and compliance tools.
//! Credentials come from `LW_*` environment variables (a `.env` file is
//! honored); a missing required variable is fatal before any tool is
//! servable.

mod server;

use anyhow::Result;
use rmcp::{ServiceExt, transport::stdio};
use tracing::info;

use lacework_client::LaceworkClient;
use lacework_common::Credentials;

use crate::server::LaceworkServer;

/// Initializes structured logging with tracing.
///
/// Everything goes to stderr: stdout carries the MCP framing and must stay
/// clean. Log level is controlled via the `RUST_LOG` environment variable.
fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("lacework_mcp=info,lacework_client=info"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before reading any variables.
    dotenvy::dotenv().ok();
    init_tracing();

    let credentials = match Credentials::from_env() {
        Ok(credentials) => credentials,
        Err(err) => {
            eprintln!("lacework-mcp: {err}");
            std::process::exit(1);
        }
    };

    info!(account = %credentials.account, "starting Lacework MCP server");
    let client = LaceworkClient::new(credentials)?;

    let service = LaceworkServer::new(client).serve(stdio()).await?;
    service.waiting().await?;

    Ok(())
}
