//! Report endpoints: streamed text and downloadable documents

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::Result;
use crate::export::ExportFormat;
use crate::server::state::AppState;
use crate::types::{ReportKind, ReportRequest};

use super::text_stream_response;

/// Stream the human-readable call summary
pub async fn human_report(
    State(state): State<AppState>,
    Json(request): Json<ReportRequest>,
) -> Result<Response> {
    stream_report(state, request, ReportKind::Human).await
}

/// Stream the JSON requirements extraction
pub async fn json_report(
    State(state): State<AppState>,
    Json(request): Json<ReportRequest>,
) -> Result<Response> {
    stream_report(state, request, ReportKind::Json).await
}

/// Call summary as a Word document
pub async fn report_docx(
    State(state): State<AppState>,
    Json(request): Json<ReportRequest>,
) -> Result<Response> {
    export_report(state, request, ExportFormat::Docx).await
}

/// Call summary as a PDF
pub async fn report_pdf(
    State(state): State<AppState>,
    Json(request): Json<ReportRequest>,
) -> Result<Response> {
    export_report(state, request, ExportFormat::Pdf).await
}

async fn stream_report(state: AppState, request: ReportRequest, kind: ReportKind) -> Result<Response> {
    let context = state.context()?;
    let stream = context.reports.stream(kind, &request.chat_history).await?;
    Ok(text_stream_response(stream))
}

async fn export_report(
    state: AppState,
    request: ReportRequest,
    format: ExportFormat,
) -> Result<Response> {
    let context = state.context()?;
    let text = context
        .reports
        .generate(ReportKind::Human, &request.chat_history)
        .await?;

    let bytes = format.render_blocking(text).await?;
    tracing::info!("Exported {} ({} bytes)", format.filename(), bytes.len());

    Ok((
        [
            (header::CONTENT_TYPE, format.mime_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", format.filename()),
            ),
        ],
        bytes,
    )
        .into_response())
}
