//! docqa server binary
//!
//! Run with: cargo run -p docqa --bin docqa-server
//! The config file is read from `DOCQA_CONFIG` (default `config.toml`).

use docqa::{config::RagConfig, server::RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docqa=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                          docqa                            ║
║        Document Q&A with Re-ranked Source Citations       ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    let config_path = std::env::var("DOCQA_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let config = RagConfig::load_or_default(&config_path)?;

    tracing::info!("Configuration loaded from {}", config_path);
    tracing::info!("  - Embedding model: {}", config.embedding_model);
    tracing::info!("  - LLM model: {}", config.llm_model);
    tracing::info!("  - Re-ranker: {}", config.retrieval.reranker_model);
    tracing::info!(
        "  - Chunking: {} chars, {} overlap",
        config.chunk_size,
        config.chunk_overlap
    );
    tracing::info!("  - Vector store: {}", config.vector_store_path.display());

    tracing::info!("Checking Ollama at {}...", config.ollama_url);
    let client = reqwest::Client::new();
    match client.get(format!("{}/api/tags", config.ollama_url)).send().await {
        Ok(resp) if resp.status().is_success() => {
            tracing::info!("Ollama is running");
        }
        _ => {
            tracing::warn!("Ollama not available at {}", config.ollama_url);
            tracing::warn!("Please start Ollama:");
            tracing::warn!("  1. Start: ollama serve");
            tracing::warn!(
                "  2. Pull models: ollama pull {} && ollama pull {}",
                config.embedding_model,
                config.llm_model
            );
        }
    }

    let server = RagServer::new(config).await?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST   /api/ingest          - Upload documents");
    println!("  POST   /api/query           - Ask questions");
    println!("  POST   /api/query/stream    - Ask questions (streamed answer)");
    println!("  POST   /api/query/export    - Download an answer report");
    println!("  GET    /api/documents       - List documents");
    println!("  DELETE /api/documents/:name - Remove a document");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
