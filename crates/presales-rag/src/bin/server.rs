//! Presales assistant server binary
//!
//! Run with: cargo run -p presales-rag --bin presales-rag-server

use presales_rag::{config::RagConfig, server::RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "presales_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                 Dell Presales Assistant                   ║
║        Grounded answers and call summary reports          ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    let config = RagConfig::load()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Corpus: {}", config.corpus.root.display());
    tracing::info!("  - Embedding model: {}", config.embeddings.model);
    tracing::info!("  - LLM model: {}", config.llm.generate_model);
    tracing::info!(
        "  - Chunking: {} chars, {} overlap",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );
    tracing::info!("  - Top-k: {}", config.retrieval.top_k);

    let server = match RagServer::new(config).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Could not start server because AI components failed to initialize: {}", e);
            return Err(e.into());
        }
    };

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST /chat         - Streamed grounded answer");
    println!("  POST /report       - Streamed call summary");
    println!("  POST /json_report  - Streamed JSON extraction");
    println!("  POST /report_docx  - Call summary (.docx)");
    println!("  POST /report_pdf   - Call summary (.pdf)");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
