//! History-aware retrieval chain: reformulate, retrieve, stream the answer

use std::sync::Arc;

use crate::error::Result;
use crate::providers::{LlmProvider, TextStream};
use crate::retrieval::Retriever;
use crate::types::ChatTurn;

use super::prompt::PromptBuilder;

/// Conversational RAG chain over the shared index
#[derive(Clone)]
pub struct ConversationalRag {
    llm: Arc<dyn LlmProvider>,
    retriever: Retriever,
}

impl ConversationalRag {
    pub fn new(llm: Arc<dyn LlmProvider>, retriever: Retriever) -> Self {
        Self { llm, retriever }
    }

    /// Rewrite `question` so it stands alone without `history`.
    ///
    /// With no history there is nothing to resolve, so the question is
    /// returned as is without calling the model.
    pub async fn reformulate(&self, history: &[ChatTurn], question: &str) -> Result<String> {
        if history.is_empty() {
            return Ok(question.to_string());
        }

        let messages = PromptBuilder::contextualize_messages(history, question);
        let standalone = self.llm.generate(&messages).await?;
        let standalone = standalone.trim();

        if standalone.is_empty() {
            tracing::debug!("Empty reformulation, using the question verbatim");
            return Ok(question.to_string());
        }

        tracing::debug!("Reformulated question: {}", standalone);
        Ok(standalone.to_string())
    }

    /// Answer `question` grounded in the chunks retrieved for its standalone
    /// form, streamed as generated.
    ///
    /// Reformulation and retrieval finish before this returns, so their
    /// failures surface as errors here rather than inside the stream. The
    /// stream itself carries answer text only.
    pub async fn stream_answer(&self, history: &[ChatTurn], question: &str) -> Result<TextStream> {
        let standalone = self.reformulate(history, question).await?;
        let results = self.retriever.retrieve(&standalone).await?;

        tracing::info!(
            "Answering with {} retrieved chunks ({} history turns)",
            results.len(),
            history.len()
        );

        let context = PromptBuilder::build_context(&results);
        let messages = PromptBuilder::qa_messages(&context, history, question);
        self.llm.generate_stream(&messages).await
    }
}
