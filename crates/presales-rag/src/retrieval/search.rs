//! Query embedding and top-k chunk lookup

use std::sync::Arc;

use crate::error::Result;
use crate::providers::{EmbeddingProvider, VectorSearchResult, VectorStoreProvider};

/// Embeds a query and returns the nearest chunks, best first
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
    top_k: usize,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            top_k: top_k.max(1),
        }
    }

    /// Nearest chunks for `query`
    pub async fn retrieve(&self, query: &str) -> Result<Vec<VectorSearchResult>> {
        let embedding = self.embedder.embed(query).await?;
        let results = self.store.search(&embedding, self.top_k).await?;

        tracing::debug!(
            "Retrieved {} chunks for query ({} chars)",
            results.len(),
            query.chars().count()
        );
        for result in &results {
            tracing::trace!(
                "  {:.3} {}",
                result.similarity,
                result.chunk.source.format_citation()
            );
        }

        Ok(results)
    }
}
