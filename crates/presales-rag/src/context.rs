//! Process-wide retrieval context, built once before serving

use std::sync::Arc;
use std::time::Instant;

use crate::config::RagConfig;
use crate::error::Result;
use crate::generation::{ConversationalRag, ReportGenerator};
use crate::ingestion::{build_index, IndexStats};
use crate::providers::{
    EmbeddingProvider, GeminiClient, InMemoryVectorStore, LlmProvider, VectorStoreProvider,
};
use crate::retrieval::Retriever;

/// Everything a request needs: the chat chain, the report generator, and the
/// statistics of the index they share. Read-only after construction.
pub struct RagContext {
    pub rag: ConversationalRag,
    pub reports: ReportGenerator,
    pub stats: IndexStats,
    pub llm_model: String,
}

impl RagContext {
    /// Build the index from the configured corpus using Gemini.
    ///
    /// Fails when the API key is missing or no PDF text can be loaded.
    pub async fn initialize(config: &RagConfig) -> Result<Self> {
        let started = Instant::now();
        tracing::info!("--- Initializing AI components ---");

        let api_key = config.require_api_key()?;
        let gemini = Arc::new(GeminiClient::new(api_key, &config.llm, &config.embeddings)?);
        let store = Arc::new(InMemoryVectorStore::new(config.embeddings.dimensions));

        let stats = build_index(config, gemini.as_ref(), store.as_ref()).await?;

        let context = Self::from_parts(config, gemini.clone(), gemini, store, stats);
        tracing::info!(
            "--- AI components ready in {:.1}s ---",
            started.elapsed().as_secs_f32()
        );
        Ok(context)
    }

    /// Assemble a context from already-built providers
    pub fn from_parts(
        config: &RagConfig,
        llm: Arc<dyn LlmProvider>,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
        stats: IndexStats,
    ) -> Self {
        let retriever = Retriever::new(embedder, store, config.retrieval.top_k);
        Self {
            rag: ConversationalRag::new(llm.clone(), retriever),
            reports: ReportGenerator::new(llm.clone()),
            stats,
            llm_model: llm.model().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::API_KEY_ENV;
    use crate::error::Error;

    #[tokio::test]
    async fn test_missing_api_key_fails_before_loading() {
        let mut config = RagConfig::default();
        config.api_key = None;

        let err = RagContext::initialize(&config).await.err().unwrap();
        assert!(matches!(err, Error::MissingCredential(name) if name == API_KEY_ENV));
    }
}
