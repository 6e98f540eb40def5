//! In-memory vector store
//!
//! Chunks live in a `Vec` behind a `parking_lot::RwLock`. Search is
//! brute-force cosine similarity over every stored vector, which is plenty for
//! a product-documentation corpus built once at startup.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::Chunk;

use super::vector_store::{VectorSearchResult, VectorStoreProvider};

/// Brute-force cosine index
pub struct InMemoryVectorStore {
    chunks: Arc<RwLock<Vec<Chunk>>>,
    dimensions: usize,
}

impl InMemoryVectorStore {
    /// Create an empty store for vectors of `dimensions` length
    pub fn new(dimensions: usize) -> Self {
        Self {
            chunks: Arc::new(RwLock::new(Vec::new())),
            dimensions,
        }
    }

    fn check(&self, chunk: &Chunk) -> Result<()> {
        if chunk.embedding.is_empty() {
            return Err(Error::VectorDb("Chunk has no embedding".to_string()));
        }
        if chunk.embedding.len() != self.dimensions {
            return Err(Error::VectorDb(format!(
                "Embedding has {} dimensions, index expects {}",
                chunk.embedding.len(),
                self.dimensions
            )));
        }
        Ok(())
    }
}

/// Cosine similarity; zero for mismatched or degenerate vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

#[async_trait]
impl VectorStoreProvider for InMemoryVectorStore {
    async fn insert_chunk(&self, chunk: &Chunk) -> Result<()> {
        self.check(chunk)?;
        self.chunks.write().push(chunk.clone());
        Ok(())
    }

    async fn insert_chunks(&self, chunks: &[Chunk]) -> Result<()> {
        for chunk in chunks {
            self.check(chunk)?;
        }
        self.chunks.write().extend_from_slice(chunks);
        Ok(())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorSearchResult>> {
        if query_embedding.len() != self.dimensions {
            return Err(Error::VectorDb(format!(
                "Query has {} dimensions, index expects {}",
                query_embedding.len(),
                self.dimensions
            )));
        }

        let chunks = Arc::clone(&self.chunks);
        let query = query_embedding.to_vec();

        tokio::task::spawn_blocking(move || {
            let guard = chunks.read();
            let mut scored: Vec<(usize, f32)> = guard
                .iter()
                .enumerate()
                .map(|(i, chunk)| (i, cosine_similarity(&query, &chunk.embedding)))
                .collect();

            scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
            scored.truncate(top_k);

            scored
                .into_iter()
                .map(|(i, similarity)| VectorSearchResult {
                    chunk: guard[i].clone(),
                    similarity,
                })
                .collect()
        })
        .await
        .map_err(|e| Error::Internal(format!("Task join error: {}", e)))
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.chunks.read().len())
    }
}
