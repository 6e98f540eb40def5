//! Chat turns as carried on the wire
//!
//! History arrives as an ordered list of `[role, content]` pairs. The server
//! keeps nothing between requests, so every request carries the full history.

use serde::{Deserialize, Serialize};

/// Speaker of a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The presales engineer
    Human,
    /// The assistant
    Assistant,
}

impl Role {
    /// `"human"` is the engineer; any other wire role is the assistant
    pub fn from_wire(role: &str) -> Self {
        if role == "human" {
            Self::Human
        } else {
            Self::Assistant
        }
    }

    /// Role string used on the wire
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::Assistant => "ai",
        }
    }

    /// Speaker label used in report transcripts
    pub fn transcript_label(&self) -> &'static str {
        match self {
            Self::Human => "Presales Engineer",
            Self::Assistant => "Assistant",
        }
    }
}

/// One `(role, content)` turn of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn human(content: impl Into<String>) -> Self {
        Self {
            role: Role::Human,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

impl From<(String, String)> for ChatTurn {
    fn from((role, content): (String, String)) -> Self {
        Self {
            role: Role::from_wire(&role),
            content,
        }
    }
}

impl From<ChatTurn> for (String, String) {
    fn from(turn: ChatTurn) -> Self {
        (turn.role.as_wire().to_string(), turn.content)
    }
}

/// Ordered conversation history
pub type ChatHistory = Vec<ChatTurn>;
