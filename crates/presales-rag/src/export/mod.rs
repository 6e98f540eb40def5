//! Report export to Word and PDF documents

mod docx;
mod markdown;
mod pdf;

pub use docx::render_docx;
pub use markdown::{inline_bold, layout, parse_report, Flowable, PdfLayout, ReportLine, TextRun};
pub use pdf::{render_pdf, REPORT_TITLE};

use crate::error::{Error, Result};

/// Downloadable export format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Docx,
    Pdf,
}

impl ExportFormat {
    /// Attachment file name
    pub fn filename(&self) -> &'static str {
        match self {
            Self::Docx => "dell_presales_report.docx",
            Self::Pdf => "dell_presales_report.pdf",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Docx => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            Self::Pdf => "application/pdf",
        }
    }

    /// Render `report` in this format
    pub fn render(&self, report: &str) -> Result<Vec<u8>> {
        match self {
            Self::Docx => render_docx(report),
            Self::Pdf => render_pdf(report),
        }
    }

    /// Render on the blocking pool
    pub async fn render_blocking(self, report: String) -> Result<Vec<u8>> {
        tokio::task::spawn_blocking(move || self.render(&report))
            .await
            .map_err(|e| Error::internal(format!("Export task failed: {}", e)))?
    }
}
