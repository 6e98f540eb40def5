//! Similarity retrieval over the chunk index

mod search;

pub use search::Retriever;
