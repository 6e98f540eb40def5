//! presales-rag: Dell technical presales assistant
//!
//! Answers questions during live customer calls from a corpus of Dell product
//! PDFs, using history-aware retrieval over an in-memory vector index and
//! Gemini for embeddings and generation. Call transcripts can be turned into
//! summary reports, streamed as text or exported as Word and PDF documents.

pub mod config;
pub mod context;
pub mod error;
pub mod export;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use context::RagContext;
pub use error::{Error, Result};
pub use types::{ChatRequest, ChatTurn, Chunk, ChunkSource, ReportKind, ReportRequest};
