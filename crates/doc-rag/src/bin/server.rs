//! Document RAG server binary
//!
//! Run with: cargo run -p doc-rag --bin doc-rag-server -- --config doc-rag.toml

use std::path::PathBuf;

use clap::Parser;
use doc_rag::{
    config::{BackendProvider, RagConfig},
    server::RagServer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Answer questions about uploaded PDFs with page citations
#[derive(Parser, Debug)]
#[command(name = "doc-rag-server", version, about)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the listen host
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "doc_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = RagConfig::load(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    tracing::info!("Configuration loaded");
    match config.backend {
        BackendProvider::Ollama => {
            tracing::info!("  - Backend: ollama at {}", config.ollama.base_url);
            tracing::info!("  - Embedding model: {}", config.ollama.embed_model);
            tracing::info!("  - LLM model: {}", config.ollama.generate_model);
        }
        BackendProvider::OpenAi => {
            tracing::info!("  - Backend: openai at {}", config.openai.base_url);
            tracing::info!("  - Embedding model: {}", config.openai.embedding_model);
            tracing::info!("  - LLM model: {}", config.openai.chat_model);
        }
    }
    tracing::info!(
        "  - Chunk size: {} (overlap {})",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );
    tracing::info!("  - Store: {}", config.vector_db.database_path().display());

    let server = RagServer::new(config).await?;

    let health = server.state().rag().health().await;
    if !health.is_ready() {
        tracing::warn!(
            "Backend not fully available (embedder: {}, llm: {}, store: {})",
            health.embedder,
            health.llm,
            health.store
        );
    }

    tracing::info!("API: http://{}", server.address());
    server.start().await?;

    Ok(())
}
