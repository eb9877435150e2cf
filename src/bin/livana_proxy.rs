//! livana-proxy: serve the chat proxy over HTTP.
//!
//! Usage:
//!   livana-proxy [--bind <addr>] [--config <file.yaml>]
//!
//! The gateway key is read from `AI_GATEWAY_API_KEY`; see `ProxyConfig` for
//! the remaining environment overrides.

use anyhow::Context;
use clap::Parser;
use livana_chat::config::ProxyConfig;
use livana_chat::proxy::ChatProxy;
use livana_chat::server::{self, AppState};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "livana-proxy", version, about = "Livana chat-completion proxy")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "LIVANA_BIND", default_value = "127.0.0.1:8787")]
    bind: SocketAddr,

    /// Optional YAML config file. Environment variables override it.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("livana_chat=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ProxyConfig::from_yaml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ProxyConfig::from_env()?,
    };
    config.validate().context("invalid proxy configuration")?;
    tracing::info!(?config, "configuration loaded");

    let shutdown = CancellationToken::new();
    let state = AppState::new(ChatProxy::new(config)?, shutdown.clone());

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutting down");
        }
        shutdown.cancel();
    });

    server::serve(args.bind, state)
        .await
        .with_context(|| format!("serving on {}", args.bind))?;
    Ok(())
}
