//! Core types for the presales assistant

pub mod chat;
pub mod document;
pub mod report;
pub mod request;

pub use chat::{ChatHistory, ChatTurn, Role};
pub use document::{Chunk, ChunkSource, PageContent};
pub use report::{JsonReport, ReportField, ReportKind};
pub use request::{ChatRequest, ReportRequest};
