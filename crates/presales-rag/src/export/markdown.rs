//! Line-oriented parsing of report text into exportable blocks
//!
//! Reports use a small markdown dialect: `**Heading:**` lines, `- ` bullets
//! (optionally led by a bold `**Label:**`), and plain paragraphs. Blank lines
//! carry no meaning and are dropped.

use regex::Regex;
use std::sync::LazyLock;

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*\*(.*?):\*\*$").expect("Invalid regex"));
static LABELED_BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^- \*\*(.+?):\*\*(.*)$").expect("Invalid regex"));
static INLINE_BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("Invalid regex"));

/// A span of text with uniform weight
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub bold: bool,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
        }
    }
}

/// One classified, non-empty report line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportLine {
    /// `**Title:**`
    Heading(String),
    /// `- **Label:** rest`; `rest` is empty or starts with a single space
    LabeledBullet { label: String, rest: String },
    /// `- text`
    Bullet(String),
    /// Anything else
    Paragraph(String),
}

impl ReportLine {
    /// Classify one raw line; blank lines yield `None`
    pub fn parse(raw: &str) -> Option<Self> {
        let line = raw.trim();
        if line.is_empty() {
            return None;
        }

        if let Some(caps) = HEADING.captures(line) {
            return Some(Self::Heading(caps[1].to_string()));
        }

        if let Some(caps) = LABELED_BULLET.captures(line) {
            let rest = caps[2].trim();
            return Some(Self::LabeledBullet {
                label: caps[1].to_string(),
                rest: if rest.is_empty() {
                    String::new()
                } else {
                    format!(" {}", rest)
                },
            });
        }

        if let Some(item) = line.strip_prefix("- ") {
            return Some(Self::Bullet(item.to_string()));
        }

        Some(Self::Paragraph(line.to_string()))
    }

    /// Raw bullet text after the `- ` marker, markers intact
    fn bullet_source(&self) -> Option<String> {
        match self {
            Self::LabeledBullet { label, rest } => Some(format!("**{}:**{}", label, rest)),
            Self::Bullet(text) => Some(text.clone()),
            _ => None,
        }
    }
}

/// Classify every non-empty line of `text`, in order
pub fn parse_report(text: &str) -> Vec<ReportLine> {
    text.lines().filter_map(ReportLine::parse).collect()
}

/// Split `text` on `**bold**` markers into alternating runs
pub fn inline_bold(text: &str) -> Vec<TextRun> {
    let mut runs = Vec::new();
    let mut last = 0;

    for caps in INLINE_BOLD.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            runs.push(TextRun::plain(&text[last..whole.start()]));
        }
        if !inner.as_str().is_empty() {
            runs.push(TextRun::bold(inner.as_str()));
        }
        last = whole.end();
    }

    if last < text.len() {
        runs.push(TextRun::plain(&text[last..]));
    }
    runs
}

/// A laid-out PDF block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flowable {
    Heading(String),
    Paragraph(String),
    /// A group of consecutive bullets rendered as one list
    BulletList(Vec<Vec<TextRun>>),
}

#[derive(Debug)]
enum LayoutState {
    Default,
    Heading,
    BulletAccumulating(Vec<Vec<TextRun>>),
}

/// Groups report lines into PDF flowables.
///
/// Bullets accumulate until a heading, a paragraph, or the end of input,
/// then leave as a single `BulletList`.
#[derive(Debug)]
pub struct PdfLayout {
    state: LayoutState,
    flowables: Vec<Flowable>,
}

impl Default for PdfLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfLayout {
    pub fn new() -> Self {
        Self {
            state: LayoutState::Default,
            flowables: Vec::new(),
        }
    }

    /// Advance the machine by one line.
    ///
    /// Bullets extend or open a list. Any other line first closes an open
    /// list, then emits its own block.
    pub fn push(&mut self, line: ReportLine) {
        let state = std::mem::replace(&mut self.state, LayoutState::Default);
        let item = line.bullet_source().map(|source| inline_bold(&source));

        self.state = match (state, item, line) {
            (LayoutState::BulletAccumulating(mut items), Some(item), _) => {
                items.push(item);
                LayoutState::BulletAccumulating(items)
            }
            (LayoutState::Default | LayoutState::Heading, Some(item), _) => {
                LayoutState::BulletAccumulating(vec![item])
            }
            (state, None, ReportLine::Heading(title)) => {
                self.close(state);
                self.flowables.push(Flowable::Heading(title));
                LayoutState::Heading
            }
            (state, None, ReportLine::Paragraph(text)) => {
                self.close(state);
                self.flowables.push(Flowable::Paragraph(text));
                LayoutState::Default
            }
            // bullet lines always carry an item
            (state, None, ReportLine::LabeledBullet { .. } | ReportLine::Bullet(_)) => state,
        };
    }

    /// Leave `state`, emitting the list it was accumulating
    fn close(&mut self, state: LayoutState) {
        if let LayoutState::BulletAccumulating(items) = state {
            self.flowables.push(Flowable::BulletList(items));
        }
    }

    pub fn finish(mut self) -> Vec<Flowable> {
        let state = std::mem::replace(&mut self.state, LayoutState::Default);
        self.close(state);
        self.flowables
    }
}

/// Lay out `text` as PDF flowables
pub fn layout(text: &str) -> Vec<Flowable> {
    let mut layout = PdfLayout::new();
    for line in parse_report(text) {
        layout.push(line);
    }
    layout.finish()
}
