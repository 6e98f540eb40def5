//! Corpus ingestion: PDF loading, chunking, and index construction

mod chunker;
mod loader;

pub use chunker::TextSplitter;
pub use loader::{extract_pages, DocumentLoader};

use serde::Serialize;
use std::time::Instant;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, VectorStoreProvider};
use crate::types::PageContent;

/// Counts reported once the index is built
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub files: usize,
    pub pages: usize,
    pub chunks: usize,
}

/// Load the corpus, chunk it, embed every chunk, and fill the store.
///
/// Fails with `NoDocuments` when no page text could be loaded.
pub async fn build_index(
    config: &RagConfig,
    embedder: &dyn EmbeddingProvider,
    store: &dyn VectorStoreProvider,
) -> Result<IndexStats> {
    let started = Instant::now();
    let loader = DocumentLoader::from_config(&config.corpus);
    let pages = loader.load().await;

    if pages.is_empty() {
        return Err(Error::NoDocuments(loader.root().display().to_string()));
    }

    let splitter = TextSplitter::from_config(&config.chunking)?;
    index_pages(&pages, &splitter, embedder, store).await.map(|stats| {
        tracing::info!(
            "Indexed {} files ({} pages, {} chunks) in {:.1}s",
            stats.files,
            stats.pages,
            stats.chunks,
            started.elapsed().as_secs_f32()
        );
        stats
    })
}

/// Chunk and embed already-loaded pages into `store`
pub async fn index_pages(
    pages: &[PageContent],
    splitter: &TextSplitter,
    embedder: &dyn EmbeddingProvider,
    store: &dyn VectorStoreProvider,
) -> Result<IndexStats> {
    let mut files: Vec<&std::path::Path> = pages.iter().map(|p| p.path.as_path()).collect();
    files.dedup();

    let chunks = splitter.chunk_pages(pages);
    tracing::info!("Split {} pages into {} chunks", pages.len(), chunks.len());

    let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
    let embeddings = embedder.embed_batch(&texts).await?;
    if embeddings.len() != chunks.len() {
        return Err(Error::embedding(format!(
            "Expected {} embeddings, got {}",
            chunks.len(),
            embeddings.len()
        )));
    }

    let embedded: Vec<_> = chunks
        .into_iter()
        .zip(embeddings)
        .map(|(chunk, embedding)| chunk.with_embedding(embedding))
        .collect();
    store.insert_chunks(&embedded).await?;

    Ok(IndexStats {
        files: files.len(),
        pages: pages.len(),
        chunks: embedded.len(),
    })
}
