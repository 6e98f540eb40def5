//! Answer and report generation

pub mod pipeline;
pub mod prompt;
pub mod report;

pub use pipeline::ConversationalRag;
pub use prompt::{PromptBuilder, CONTEXTUALIZE_PROMPT, NOT_AVAILABLE};
pub use report::{format_transcript, ReportGenerator};
