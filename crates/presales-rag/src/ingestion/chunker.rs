//! Recursive character splitting with page tracking
//!
//! Text is split on the coarsest separator present (paragraph, line, word,
//! character). Pieces still longer than the chunk size are split again with
//! the next separator. Adjacent small pieces are then merged back up to the
//! chunk size, carrying up to `chunk_overlap` characters into the next chunk.
//! Separators stay attached to the start of the piece that follows them.
//! Lengths are counted in characters.

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::types::{Chunk, ChunkSource, PageContent};

/// Paragraph, line, word, then character boundaries
const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Splits page text into overlapping chunks
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Config("chunk_size must be positive".to_string()));
        }
        if chunk_overlap > chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({}) is larger than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Split one text into chunk strings
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &DEFAULT_SEPARATORS)
    }

    /// Split every page, each chunk inheriting its page's source info
    pub fn chunk_pages(&self, pages: &[PageContent]) -> Vec<Chunk> {
        pages
            .iter()
            .flat_map(|page| {
                let source = ChunkSource::from_page(page);
                self.split_text(&page.content)
                    .into_iter()
                    .enumerate()
                    .map(move |(i, text)| Chunk::new(text, source.clone(), i as u32))
            })
            .collect()
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        // First separator present in the text; "" always matches
        let (index, separator) = separators
            .iter()
            .enumerate()
            .find(|(_, sep)| sep.is_empty() || text.contains(*sep))
            .map(|(i, sep)| (i, *sep))
            .unwrap_or((separators.len().saturating_sub(1), ""));
        let remaining = separators.get(index + 1..).unwrap_or(&[]);

        let mut chunks = Vec::new();
        let mut pending: Vec<String> = Vec::new();

        for piece in split_keeping_separator(text, separator) {
            if char_len(&piece) < self.chunk_size {
                pending.push(piece);
                continue;
            }

            if !pending.is_empty() {
                chunks.extend(self.merge(std::mem::take(&mut pending)));
            }
            if remaining.is_empty() {
                chunks.push(piece);
            } else {
                chunks.extend(self.split_recursive(&piece, remaining));
            }
        }

        if !pending.is_empty() {
            chunks.extend(self.merge(pending));
        }
        chunks
    }

    /// Merge small pieces into chunks of at most `chunk_size` characters
    fn merge(&self, pieces: Vec<String>) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: Vec<(String, usize)> = Vec::new();
        let mut window_start = 0;
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(&piece);

            if total + len > self.chunk_size && window.len() > window_start {
                if total > self.chunk_size {
                    tracing::warn!(
                        "Created a chunk of size {}, which is longer than the specified {}",
                        total,
                        self.chunk_size
                    );
                }
                push_joined(&mut chunks, &window[window_start..]);

                // Keep at most `chunk_overlap` characters, and only as much
                // as still leaves room for the incoming piece.
                while total > self.chunk_overlap
                    || (total + len > self.chunk_size && total > 0)
                {
                    total -= window[window_start].1;
                    window_start += 1;
                }
            }

            total += len;
            window.push((piece, len));
        }

        push_joined(&mut chunks, &window[window_start..]);
        chunks
    }
}

fn push_joined(chunks: &mut Vec<String>, window: &[(String, usize)]) {
    let joined: String = window.iter().map(|(piece, _)| piece.as_str()).collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

/// Split on `separator`, prefixing it to every piece after the first.
/// An empty separator splits into single characters.
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    let pieces: Vec<String> = if separator.is_empty() {
        text.chars().map(String::from).collect()
    } else {
        let mut parts = text.split(separator);
        let mut pieces: Vec<String> = parts.next().map(String::from).into_iter().collect();
        pieces.extend(parts.map(|part| format!("{}{}", separator, part)));
        pieces
    };

    pieces.into_iter().filter(|p| !p.is_empty()).collect()
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
