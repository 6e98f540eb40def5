//! Call-summary reports generated from a chat transcript

use futures_util::{future, stream, StreamExt};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::error::Result;
use crate::providers::{ChatMessage, LlmProvider, TextStream};
use crate::types::{ChatTurn, JsonReport, ReportKind};

use super::prompt::PromptBuilder;

/// Plain-text transcript, one `"<Speaker>: <content>"` line per turn
pub fn format_transcript(history: &[ChatTurn]) -> String {
    history
        .iter()
        .map(|turn| format!("{}: {}", turn.role.transcript_label(), turn.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Runs the human or JSON report template with a single LLM call
#[derive(Clone)]
pub struct ReportGenerator {
    llm: Arc<dyn LlmProvider>,
}

impl ReportGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    fn messages(kind: ReportKind, history: &[ChatTurn]) -> Vec<ChatMessage> {
        let transcript = format_transcript(history);
        vec![ChatMessage::user(PromptBuilder::report_prompt(kind, &transcript))]
    }

    /// Stream the report as it is generated.
    ///
    /// JSON reports pass through unmodified; once complete, the text is
    /// checked against the six-key schema and a warning is logged if it
    /// does not conform.
    pub async fn stream(&self, kind: ReportKind, history: &[ChatTurn]) -> Result<TextStream> {
        tracing::info!("Streaming {:?} report over {} turns", kind, history.len());
        let stream = self.llm.generate_stream(&Self::messages(kind, history)).await?;

        Ok(match kind {
            ReportKind::Human => stream,
            ReportKind::Json => audit_json(stream),
        })
    }

    /// Generate the complete report text
    pub async fn generate(&self, kind: ReportKind, history: &[ChatTurn]) -> Result<String> {
        tracing::info!("Generating {:?} report over {} turns", kind, history.len());
        let text = self.llm.generate(&Self::messages(kind, history)).await?;

        if kind == ReportKind::Json {
            check_json_report(&text);
        }
        Ok(text)
    }
}

fn check_json_report(text: &str) {
    match JsonReport::parse(text) {
        Ok(_) => tracing::debug!("JSON report matches schema"),
        Err(e) => tracing::warn!("JSON report returned as generated, but {}", e),
    }
}

/// Forward `stream` untouched, validating the accumulated text at the end
fn audit_json(inner: TextStream) -> TextStream {
    let buffer = Arc::new(Mutex::new(String::new()));
    let tap = Arc::clone(&buffer);

    let body = inner.inspect(move |item| {
        if let Ok(text) = item {
            tap.lock().push_str(text);
        }
    });

    let tail = stream::once(async move {
        let text = std::mem::take(&mut *buffer.lock());
        check_json_report(&text);
        None::<Result<String>>
    })
    .filter_map(future::ready);

    body.chain(tail).boxed()
}
