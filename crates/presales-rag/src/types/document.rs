//! Page and chunk types with source tracking

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Text extracted from a single PDF page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    /// Source file path
    pub path: PathBuf,
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Total pages in the source file
    pub page_count: u32,
    /// Text content of the page
    pub content: String,
}

impl PageContent {
    /// File name component of the source path
    pub fn filename(&self) -> String {
        file_name(&self.path)
    }
}

/// Where a chunk came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkSource {
    /// File name of the source PDF
    pub filename: String,
    /// Full path of the source PDF
    pub path: PathBuf,
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Total pages in the source PDF
    pub page_count: u32,
}

impl ChunkSource {
    /// Source info for a chunk cut from `page`
    pub fn from_page(page: &PageContent) -> Self {
        Self {
            filename: page.filename(),
            path: page.path.clone(),
            page_number: page.page_number,
            page_count: page.page_count,
        }
    }

    /// Format source for logs
    pub fn format_citation(&self) -> String {
        format!("{}, Page {}", self.filename, self.page_number)
    }
}

/// A chunk of page text, the unit of embedding and retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Text content
    pub content: String,
    /// Embedding vector
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub embedding: Vec<f32>,
    /// Source information
    pub source: ChunkSource,
    /// Chunk index within its page
    pub chunk_index: u32,
}

impl Chunk {
    /// Create a new chunk without an embedding
    pub fn new(content: String, source: ChunkSource, chunk_index: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            content,
            embedding: Vec::new(),
            source,
            chunk_index,
        }
    }

    /// Attach an embedding
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}
