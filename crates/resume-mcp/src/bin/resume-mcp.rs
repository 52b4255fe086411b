// Standalone MCP server binary

use anyhow::{Context, Result};
use clap::Parser;
use resume_mcp::clients::{ResumeClient, ResumeConfig};
use resume_mcp::{all_tools, McpServer, SERVER_INSTRUCTIONS};
use std::sync::Arc;

/// MCP server exposing resume editing tools over stdio.
#[derive(Debug, Parser)]
#[command(name = "resume-mcp", version, about)]
struct Args {
    /// API base URL, overrides RX_RESUME_BASE_URL
    #[arg(long)]
    base_url: Option<String>,

    /// Public site URL, overrides RX_RESUME_PUBLIC_URL
    #[arg(long)]
    public_url: Option<String>,

    /// Request timeout in seconds, overrides RX_RESUME_TIMEOUT_SECS
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Skip the version re-check before each write
    #[arg(long)]
    no_verify_before_patch: bool,

    /// Enable debug logging (same as DEBUG=1)
    #[arg(long)]
    debug: bool,
}

fn debug_from_env() -> bool {
    std::env::var("DEBUG")
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // stdout carries the protocol, so logs go to stderr
    let default_level = if args.debug || debug_from_env() { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let mut config = ResumeConfig::from_lookup(|key| {
        let from_args = match key {
            "RX_RESUME_BASE_URL" => args.base_url.clone(),
            "RX_RESUME_PUBLIC_URL" => args.public_url.clone(),
            _ => None,
        };
        from_args.or_else(|| std::env::var(key).ok())
    })
    .context("loading resume service configuration")?;

    if let Some(timeout) = args.timeout_secs {
        config.default_timeout_secs = timeout;
    }
    if args.no_verify_before_patch {
        config.verify_before_patch = false;
    }

    tracing::info!(
        base_url = %config.endpoint.base_url,
        verify_before_patch = config.verify_before_patch,
        "Resume MCP server starting..."
    );

    let client = Arc::new(ResumeClient::new(Arc::new(config)));
    let server = McpServer::new("resume-mcp", env!("CARGO_PKG_VERSION")).with_instructions(SERVER_INSTRUCTIONS);
    server.register_tools(all_tools(client)).await;

    tracing::info!("Registered {} tools", server.list_tools().await.len());

    resume_mcp::transport::serve_stdio(&server).await?;
    Ok(())
}
