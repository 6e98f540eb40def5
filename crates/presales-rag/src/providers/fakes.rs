//! Deterministic providers for unit tests

use async_trait::async_trait;
use futures_util::StreamExt;
use parking_lot::Mutex;
use std::collections::VecDeque;

use crate::error::{Error, Result};
use crate::providers::{ChatMessage, EmbeddingProvider, LlmProvider, TextStream};

/// LLM that replays scripted responses and records every prompt
#[derive(Default)]
pub struct ScriptedLlm {
    responses: Mutex<VecDeque<Vec<String>>>,
    pub calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedLlm {
    /// Each response is streamed as the given fragments
    pub fn new(responses: Vec<Vec<&str>>) -> Self {
        Self {
            responses: Mutex::new(
                responses
                    .into_iter()
                    .map(|r| r.into_iter().map(String::from).collect())
                    .collect(),
            ),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn next(&self, messages: &[ChatMessage]) -> Result<Vec<String>> {
        self.calls.lock().push(messages.to_vec());
        self.responses
            .lock()
            .pop_front()
            .ok_or_else(|| Error::llm("no scripted response left"))
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        Ok(self.next(messages)?.concat())
    }

    async fn generate_stream(&self, messages: &[ChatMessage]) -> Result<TextStream> {
        let fragments = self.next(messages)?;
        Ok(futures_util::stream::iter(fragments.into_iter().map(Ok)).boxed())
    }

    fn model(&self) -> &str {
        "scripted-model"
    }
}

/// Embeds text by counting keyword hits, so similar wording lands close
pub struct KeywordEmbedder {
    keywords: Vec<&'static str>,
    pub queries: Mutex<Vec<String>>,
}

impl KeywordEmbedder {
    pub fn new(keywords: Vec<&'static str>) -> Self {
        Self {
            keywords,
            queries: Mutex::new(Vec::new()),
        }
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        let mut v: Vec<f32> = self
            .keywords
            .iter()
            .map(|k| lower.matches(k).count() as f32)
            .collect();
        // bias term keeps keyword-free text from being a zero vector
        v.push(0.1);
        v
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.queries.lock().push(text.to_string());
        Ok(self.vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.keywords.len() + 1
    }
}
