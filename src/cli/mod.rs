//! Command-line interface.

mod check;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::bootstrap::build_components;
use crate::config::Config;
use crate::gateway::start_server;
use crate::webhook::sign;

pub use self::check::run_check_config;

#[derive(Parser, Debug)]
#[command(name = "allokoli-gateway", version, about = "Vapi webhook and CRUD gateway")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP gateway (default).
    Serve {
        /// Bind host, overrides GATEWAY_HOST.
        #[arg(long)]
        host: Option<String>,
        /// Bind port, overrides GATEWAY_PORT.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the resolved configuration with secrets redacted.
    CheckConfig,
    /// Compute the x-vapi-signature value for a test delivery.
    Sign {
        #[arg(long, env = "VAPI_WEBHOOK_SECRET", hide_env_values = true)]
        secret: String,
        /// Unix timestamp sent as x-vapi-timestamp; defaults to now.
        #[arg(long)]
        timestamp: Option<String>,
        /// File holding the exact request body.
        body_file: PathBuf,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command.unwrap_or(Command::Serve {
            host: None,
            port: None,
        }) {
            Command::Serve { host, port } => run_serve(host, port).await,
            Command::CheckConfig => run_check_config(),
            Command::Sign {
                secret,
                timestamp,
                body_file,
            } => {
                let (timestamp, signature) = run_sign(&secret, timestamp, &body_file)?;
                println!("x-vapi-timestamp: {timestamp}");
                println!("x-vapi-signature: {signature}");
                Ok(())
            }
        }
    }
}

async fn run_serve(host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let mut config = Config::from_env().context("failed to load configuration")?;
    if let Some(host) = host {
        config.gateway.host = host;
    }
    if let Some(port) = port {
        config.gateway.port = port;
    }

    let addr: SocketAddr = config
        .gateway
        .bind_addr()
        .parse()
        .with_context(|| format!("invalid bind address {}", config.gateway.bind_addr()))?;

    let components = build_components(&config)?;
    let state = components.state.clone();
    start_server(addr, components.state, components.auth).await?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    tracing::info!("Shutdown requested");
    state.shutdown().await;
    Ok(())
}

/// Returns the timestamp used and the hex signature.
pub fn run_sign(
    secret: &str,
    timestamp: Option<String>,
    body_file: &std::path::Path,
) -> anyhow::Result<(String, String)> {
    let body = std::fs::read(body_file)
        .with_context(|| format!("failed to read {}", body_file.display()))?;
    let timestamp = timestamp.unwrap_or_else(|| chrono::Utc::now().timestamp().to_string());
    let signature = sign(secret, &timestamp, &body);
    Ok((timestamp, signature))
}
