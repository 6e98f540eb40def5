//! Word document export

use docx_rs::{
    AbstractNumbering, Docx, IndentLevel, Level, LevelJc, LevelText, LineSpacing, NumberFormat,
    Numbering, NumberingId, PageMargin, Paragraph, Run, SpecialIndentType, Start, Style,
    StyleType,
};
use std::io::Cursor;

use crate::error::{Error, Result};

use super::markdown::{parse_report, ReportLine};

/// One inch in twentieths of a point
const INCH: i32 = 1440;
const BULLET_STYLE: &str = "ListBullet";
const BULLET_NUMBERING: usize = 1;

/// Render report text as a `.docx` file
pub fn render_docx(report: &str) -> Result<Vec<u8>> {
    let docx = parse_report(report)
        .into_iter()
        .fold(base_document(), |docx, line| docx.add_paragraph(paragraph(line)));

    let mut bytes = Vec::new();
    docx.build()
        .pack(&mut Cursor::new(&mut bytes))
        .map_err(|e| Error::export(format!("Failed to generate DOCX: {}", e)))?;

    Ok(bytes)
}

fn base_document() -> Docx {
    let bullet_level = Level::new(
        0,
        Start::new(1),
        NumberFormat::new("bullet"),
        LevelText::new("•"),
        LevelJc::new("left"),
    )
    .indent(Some(720), Some(SpecialIndentType::Hanging(360)), None, None);

    Docx::new()
        .page_margin(PageMargin::new().left(INCH).right(INCH))
        .add_style(Style::new(BULLET_STYLE, StyleType::Paragraph).name("List Bullet"))
        .add_abstract_numbering(AbstractNumbering::new(BULLET_NUMBERING).add_level(bullet_level))
        .add_numbering(Numbering::new(BULLET_NUMBERING, BULLET_NUMBERING))
}

fn bullet() -> Paragraph {
    Paragraph::new()
        .style(BULLET_STYLE)
        .numbering(NumberingId::new(BULLET_NUMBERING), IndentLevel::new(0))
}

fn paragraph(line: ReportLine) -> Paragraph {
    match line {
        // 12pt before, 6pt after
        ReportLine::Heading(title) => Paragraph::new()
            .add_run(Run::new().add_text(title).bold())
            .line_spacing(LineSpacing::new().before(240).after(120)),
        ReportLine::LabeledBullet { label, rest } => {
            let p = bullet().add_run(Run::new().add_text(format!("{}:", label)).bold());
            if rest.is_empty() {
                p
            } else {
                p.add_run(Run::new().add_text(rest))
            }
        }
        ReportLine::Bullet(text) => bullet().add_run(Run::new().add_text(text)),
        ReportLine::Paragraph(text) => Paragraph::new().add_run(Run::new().add_text(text)),
    }
}
