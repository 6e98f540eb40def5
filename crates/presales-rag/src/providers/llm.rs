//! LLM provider trait for chat-style generation

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::error::Result;
use crate::types::{ChatTurn, Role};

/// Incremental generation output, one text fragment per item
pub type TextStream = BoxStream<'static, Result<String>>;

/// Author of a prompt message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A single prompt message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

impl From<&ChatTurn> for ChatMessage {
    fn from(turn: &ChatTurn) -> Self {
        match turn.role {
            Role::Human => Self::user(turn.content.clone()),
            Role::Assistant => Self::assistant(turn.content.clone()),
        }
    }
}

/// Rebuild a history as prompt messages, preserving order
pub fn history_messages(history: &[ChatTurn]) -> Vec<ChatMessage> {
    history.iter().map(ChatMessage::from).collect()
}

/// Trait for chat-style text generation
///
/// Implementations:
/// - `GeminiClient`: Google Generative Language API (gemini-1.5-flash)
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a complete response
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Generate a response incrementally.
    ///
    /// The returned stream owns the upstream connection; dropping it abandons
    /// the generation.
    async fn generate_stream(&self, messages: &[ChatMessage]) -> Result<TextStream>;

    /// Get the model being used
    fn model(&self) -> &str;
}
