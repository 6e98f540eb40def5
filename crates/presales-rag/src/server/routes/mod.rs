//! API routes for the presales server

pub mod chat;
pub mod report;

use axum::{
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures_util::StreamExt;

use crate::providers::TextStream;
use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat::chat))
        .route("/report", post(report::human_report))
        .route("/json_report", post(report::json_report))
        .route("/report_docx", post(report::report_docx))
        .route("/report_pdf", post(report::report_pdf))
        .route("/info", get(info))
}

/// Stream generated text to the client as it arrives.
///
/// An upstream error ends the body early; it is logged here because the
/// status line has already been sent. A client disconnect drops the body
/// and with it the upstream request.
pub(crate) fn text_stream_response(stream: TextStream) -> Response {
    let body = stream.map(|item| {
        item.map_err(|e| {
            tracing::error!("Stream aborted: {}", e);
            std::io::Error::other(e.to_string())
        })
    });

    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(body),
    )
        .into_response()
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Json<serde_json::Value> {
    let context = state.context().ok();

    Json(serde_json::json!({
        "name": "presales-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Dell technical presales assistant over a PDF knowledge base",
        "ready": context.is_some(),
        "model": context.as_ref().map(|c| c.llm_model.clone()),
        "index": context.as_ref().map(|c| c.stats),
        "endpoints": {
            "POST /chat": "Streamed answer grounded in the document corpus",
            "POST /report": "Streamed call summary report",
            "POST /json_report": "Streamed JSON requirements extraction",
            "POST /report_docx": "Call summary report as a Word document",
            "POST /report_pdf": "Call summary report as a PDF",
            "GET /health": "Liveness check",
            "GET /ready": "Readiness check",
        }
    }))
}
