//! HTTP request bodies

use serde::{Deserialize, Serialize};

use super::chat::ChatHistory;

/// Body of `POST /chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Latest user question
    pub input: String,
    /// Prior turns, oldest first
    #[serde(default)]
    pub chat_history: ChatHistory,
}

/// Body of every report endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportRequest {
    /// Full call transcript, oldest first
    #[serde(default)]
    pub chat_history: ChatHistory,
}
