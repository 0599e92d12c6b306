//! Relay server binary.
//!
//! Configuration comes from an optional TOML file (`YNER_CONFIG`) with
//! environment-variable overrides on top; everything has defaults matching a
//! local Ollama at `http://localhost:11434`.

use anyhow::Context;
use std::path::Path;
use tracing_subscriber::EnvFilter;
use yner::config::AppConfig;
use yner::server::ChatServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("yner=info,yner_search=info")),
        )
        .init();

    let mut config = match std::env::var("YNER_CONFIG") {
        Ok(path) => AppConfig::load(Path::new(&path))
            .with_context(|| format!("loading config from {path}"))?,
        Err(_) => AppConfig::default(),
    };
    config.apply_env_overrides();

    let server = ChatServer::start(config)
        .await
        .context("starting chat relay")?;
    tracing::info!("web search enabled; relaying to the generation backend");

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    tracing::info!("shutting down");
    server.shutdown();
    Ok(())
}
