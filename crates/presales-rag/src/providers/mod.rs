//! Provider abstractions for embeddings, LLM generation, and vector search
//!
//! Gemini backs both the LLM and embedding traits; the index is an in-memory
//! cosine store. Tests swap in the scripted providers from `fakes`.

pub mod embedding;
pub mod gemini;
pub mod llm;
pub mod memory;
pub mod vector_store;

#[cfg(test)]
pub(crate) mod fakes;

pub use embedding::EmbeddingProvider;
pub use gemini::GeminiClient;
pub use llm::{ChatMessage, LlmProvider, MessageRole, TextStream};
pub use memory::InMemoryVectorStore;
pub use vector_store::{VectorSearchResult, VectorStoreProvider};
