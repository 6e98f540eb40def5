//! PDF export with the built-in Helvetica faces
//!
//! Flowables from [`layout`] are typeset top to bottom on A4 pages. Lines are
//! wrapped using Helvetica advance widths and spill onto new pages as needed.

use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Rgb,
};

use crate::error::{Error, Result};

use super::markdown::{layout, Flowable, TextRun};

pub const REPORT_TITLE: &str = "Presales Call Summary Report";

const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;
const MARGIN: f32 = 54.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
const LIST_INDENT: f32 = 18.0;

/// #007DB8
const HEADING_COLOR: (f32, f32, f32) = (0.0, 125.0 / 255.0, 184.0 / 255.0);
const BLACK: (f32, f32, f32) = (0.0, 0.0, 0.0);

#[derive(Debug, Clone, Copy)]
struct TextStyle {
    size: f32,
    leading: f32,
    space_before: f32,
    space_after: f32,
    color: (f32, f32, f32),
}

const TITLE: TextStyle = TextStyle {
    size: 18.0,
    leading: 22.0,
    space_before: 0.0,
    space_after: 20.4,
    color: BLACK,
};

const SECTION_HEADING: TextStyle = TextStyle {
    size: 14.0,
    leading: 17.0,
    space_before: 12.0,
    space_after: 6.0,
    color: HEADING_COLOR,
};

const BODY: TextStyle = TextStyle {
    size: 10.0,
    leading: 14.0,
    space_before: 0.0,
    space_after: 6.0,
    color: BLACK,
};

/// Render report text as a PDF
pub fn render_pdf(report: &str) -> Result<Vec<u8>> {
    let mut writer = PdfWriter::new(REPORT_TITLE)?;

    writer.block(&[TextRun::bold(REPORT_TITLE)], TITLE, 0.0);

    for flowable in layout(report) {
        match flowable {
            Flowable::Heading(title) => writer.block(&[TextRun::bold(title)], SECTION_HEADING, 0.0),
            Flowable::Paragraph(text) => writer.block(&[TextRun::plain(text)], BODY, 0.0),
            Flowable::BulletList(items) => writer.bullet_list(&items),
        }
    }

    writer.finish()
}

fn mm(points: f32) -> Mm {
    Mm(points * 25.4 / 72.0)
}

struct PdfWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    /// Distance from the top of the page to the next line's top, in points
    cursor: f32,
    pages: usize,
}

impl PdfWriter {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) =
            PdfDocument::new(title, mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Layer 1");
        let layer = doc.get_page(page).get_layer(layer);

        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| Error::export(format!("Failed to load Helvetica: {}", e)))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| Error::export(format!("Failed to load Helvetica-Bold: {}", e)))?;

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            cursor: MARGIN,
            pages: 1,
        })
    }

    fn new_page(&mut self) {
        self.pages += 1;
        let (page, layer) = self.doc.add_page(
            mm(PAGE_WIDTH),
            mm(PAGE_HEIGHT),
            format!("Layer {}", self.pages),
        );
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.cursor = MARGIN;
    }

    /// Reserve `height` points, breaking the page when it does not fit
    fn reserve(&mut self, height: f32) {
        if self.cursor + height > PAGE_HEIGHT - MARGIN && self.cursor > MARGIN {
            self.new_page();
        }
    }

    fn skip(&mut self, space: f32) {
        // space before a block is dropped at the top of a page
        if self.cursor > MARGIN {
            self.cursor += space;
        }
    }

    fn block(&mut self, runs: &[TextRun], style: TextStyle, indent: f32) {
        self.skip(style.space_before);
        for line in wrap(runs, style.size, CONTENT_WIDTH - indent) {
            self.reserve(style.leading);
            self.draw_line(&line, MARGIN + indent, style);
            self.cursor += style.leading;
        }
        self.cursor += style.space_after;
    }

    fn bullet_list(&mut self, items: &[Vec<TextRun>]) {
        let item_style = TextStyle {
            space_after: 0.0,
            ..BODY
        };

        for item in items {
            let lines = wrap(item, item_style.size, CONTENT_WIDTH - LIST_INDENT);
            for (i, line) in lines.iter().enumerate() {
                self.reserve(item_style.leading);
                if i == 0 {
                    self.draw_line(&[TextRun::plain("-")], MARGIN, item_style);
                }
                self.draw_line(line, MARGIN + LIST_INDENT, item_style);
                self.cursor += item_style.leading;
            }
        }
        self.cursor += BODY.space_after;
    }

    fn draw_line(&self, runs: &[TextRun], x: f32, style: TextStyle) {
        if runs.is_empty() {
            return;
        }
        let baseline = PAGE_HEIGHT - (self.cursor + style.size);
        let (r, g, b) = style.color;

        self.layer.set_fill_color(Color::Rgb(Rgb::new(r, g, b, None)));
        self.layer.begin_text_section();
        self.layer.set_text_cursor(mm(x), mm(baseline));
        for run in runs {
            let font = if run.bold { &self.bold } else { &self.regular };
            self.layer.set_font(font, style.size);
            self.layer.write_text(winansi(&run.text), font);
        }
        self.layer.end_text_section();
    }

    fn finish(self) -> Result<Vec<u8>> {
        tracing::debug!("Rendered report PDF with {} pages", self.pages);
        self.doc
            .save_to_bytes()
            .map_err(|e| Error::export(format!("Failed to save PDF: {}", e)))
    }
}

/// Map text onto what the built-in fonts can encode
fn winansi(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2013}' | '\u{2014}' | '\u{2010}' | '\u{2011}' => '-',
            '\u{2022}' => '*',
            '\u{00A0}' => ' ',
            c if (c as u32) < 0x20 => ' ',
            c if (c as u32) <= 0xFF => c,
            _ => '?',
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
struct Word {
    text: String,
    bold: bool,
    space_before: bool,
}

fn words(runs: &[TextRun]) -> Vec<Word> {
    let mut out = Vec::new();
    let mut pending_space = false;

    for run in runs {
        let mut current = String::new();
        for ch in run.text.chars() {
            if ch.is_whitespace() {
                if !current.is_empty() {
                    out.push(Word {
                        text: std::mem::take(&mut current),
                        bold: run.bold,
                        space_before: pending_space,
                    });
                }
                pending_space = true;
            } else {
                current.push(ch);
            }
        }
        if !current.is_empty() {
            out.push(Word {
                text: current,
                bold: run.bold,
                space_before: pending_space,
            });
            pending_space = false;
        }
    }

    if let Some(first) = out.first_mut() {
        first.space_before = false;
    }
    out
}

/// Greedy word wrap; each line comes back as runs of uniform weight
fn wrap(runs: &[TextRun], size: f32, max_width: f32) -> Vec<Vec<TextRun>> {
    let mut lines: Vec<Vec<Word>> = Vec::new();
    let mut line: Vec<Word> = Vec::new();
    let mut width = 0.0f32;

    for word in words(runs) {
        let word_width = text_width(&word.text, word.bold, size);
        let space = if word.space_before && !line.is_empty() {
            text_width(" ", word.bold, size)
        } else {
            0.0
        };

        if !line.is_empty() && width + space + word_width > max_width {
            lines.push(std::mem::take(&mut line));
            width = word_width;
        } else {
            width += space + word_width;
        }
        line.push(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }

    lines.into_iter().map(merge_words).collect()
}

fn merge_words(words: Vec<Word>) -> Vec<TextRun> {
    let mut runs: Vec<TextRun> = Vec::new();
    for (i, word) in words.into_iter().enumerate() {
        let piece = if i > 0 && word.space_before {
            format!(" {}", word.text)
        } else {
            word.text
        };
        match runs.last_mut() {
            Some(last) if last.bold == word.bold => last.text.push_str(&piece),
            _ => runs.push(TextRun {
                text: piece,
                bold: word.bold,
            }),
        }
    }
    runs
}

/// Width of `text` in points
fn text_width(text: &str, bold: bool, size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| char_width(c, bold)).sum();
    units as f32 * size / 1000.0
}

/// Helvetica advance widths for printable ASCII, in 1/1000 em
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

fn char_width(c: char, bold: bool) -> u32 {
    let table = if bold { &HELVETICA_BOLD } else { &HELVETICA };
    let code = c as u32;
    if (0x20..0x7F).contains(&code) {
        table[(code - 0x20) as usize] as u32
    } else {
        556
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_count(bytes: &[u8]) -> usize {
        lopdf::Document::load_mem(bytes).unwrap().get_pages().len()
    }

    #[test]
    fn test_renders_loadable_pdf() {
        let bytes = render_pdf("**Section:**\n- **A:** one\n- plain\nEnd.").unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert_eq!(page_count(&bytes), 1);
    }

    #[test]
    fn test_long_report_flows_onto_more_pages() {
        let report: String = (0..120)
            .map(|i| format!("- **Item {}:** PowerEdge R760 with dual Xeon processors and 24 NVMe bays\n", i))
            .collect();
        let bytes = render_pdf(&report).unwrap();
        assert!(page_count(&bytes) > 1);
    }

    #[test]
    fn test_same_text_same_page_count() {
        let report = "**Needs:**\n- **Workload:** VDI\nThanks.";
        assert_eq!(
            page_count(&render_pdf(report).unwrap()),
            page_count(&render_pdf(report).unwrap())
        );
    }

    #[test]
    fn test_wrap_keeps_bold_runs_and_spacing() {
        let runs = vec![TextRun::bold("Bar:"), TextRun::plain(" baz qux")];
        assert_eq!(
            wrap(&runs, 10.0, 500.0),
            vec![vec![TextRun::bold("Bar:"), TextRun::plain(" baz qux")]]
        );
    }

    #[test]
    fn test_wrap_breaks_at_width() {
        let runs = vec![TextRun::plain("alpha beta gamma delta")];
        // no two of these words fit in 30pt at 10pt size
        let lines = wrap(&runs, 10.0, 30.0);
        let texts: Vec<String> = lines
            .iter()
            .map(|l| l.iter().map(|r| r.text.as_str()).collect())
            .collect();
        assert_eq!(texts, vec!["alpha", "beta", "gamma", "delta"]);
    }

    #[test]
    fn test_helvetica_widths() {
        assert!((text_width("i", false, 10.0) - 2.22).abs() < 1e-3);
        assert!(text_width("Dell", true, 10.0) > text_width("Dell", false, 10.0));
    }

    #[test]
    fn test_winansi_replaces_unencodable() {
        assert_eq!(winansi("\u{201C}PowerStore\u{201D} \u{2014} caf\u{e9} \u{4e2d}"), "\"PowerStore\" - caf\u{e9} ?");
    }
}
