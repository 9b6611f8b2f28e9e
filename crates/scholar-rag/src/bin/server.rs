//! RAG Server binary
//!
//! Run with: cargo run -p scholar-rag --bin scholar-rag-server

use std::path::PathBuf;

use clap::Parser;
use scholar_rag::{config::RagConfig, server::RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Chat with PDF papers over HTTP
#[derive(Debug, Parser)]
#[command(name = "scholar-rag-server", version, about)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address (overrides the config file)
    #[arg(long)]
    host: Option<String>,

    /// Port (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scholar_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    // Load configuration
    let mut config = RagConfig::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    tracing::info!("Configuration loaded");
    tracing::info!("  - API base URL: {}", config.openai.base_url);
    tracing::info!("  - Embedding models: {}", config.models.embedding_models.join(", "));
    tracing::info!("  - LLM models: {}", config.models.llm_models.join(", "));
    tracing::info!(
        "  - Chunking: {} chars, {} overlap",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );

    let env_api_key = std::env::var(&config.openai.api_key_env)
        .ok()
        .filter(|key| !key.trim().is_empty());
    if env_api_key.is_none() {
        tracing::warn!(
            "{} is not set; users must enter an API key before processing",
            config.openai.api_key_env
        );
    }

    // Create and start server
    let server = RagServer::new(config, env_api_key);

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
