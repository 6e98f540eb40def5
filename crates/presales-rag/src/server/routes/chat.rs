//! Conversational answer endpoint

use axum::{extract::State, response::Response, Json};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::ChatRequest;

use super::text_stream_response;

/// Stream a grounded answer to the latest question
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Response> {
    let context = state.context()?;

    tracing::info!(
        "Chat: {} chars, {} history turns",
        request.input.chars().count(),
        request.chat_history.len()
    );

    let stream = context
        .rag
        .stream_answer(&request.chat_history, &request.input)
        .await?;

    Ok(text_stream_response(stream))
}
