//! PDF discovery and per-page text extraction

use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::CorpusConfig;
use crate::error::{Error, Result};
use crate::types::PageContent;

/// Loads every PDF below a root directory as page-level records
pub struct DocumentLoader {
    root: PathBuf,
    parallelism: usize,
}

impl DocumentLoader {
    pub fn new(root: impl Into<PathBuf>, parallelism: usize) -> Self {
        Self {
            root: root.into(),
            parallelism: parallelism.max(1),
        }
    }

    pub fn from_config(config: &CorpusConfig) -> Self {
        Self::new(&config.root, config.parallelism())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All `*.pdf` files below the root, recursively, in path order
    pub fn discover(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(&self.root)
            .follow_links(true)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Skipping unreadable path: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file() && is_pdf(entry.path()))
            .map(|entry| entry.into_path())
            .collect();

        files.sort();
        files
    }

    /// Extract pages from every discovered PDF.
    ///
    /// Files are parsed concurrently on the blocking pool. A file that fails
    /// to parse is logged and skipped; the rest still load.
    pub async fn load(&self) -> Vec<PageContent> {
        let files = self.discover();
        tracing::info!(
            "Found {} PDF files under {}",
            files.len(),
            self.root.display()
        );

        let results: Vec<(PathBuf, Result<Vec<PageContent>>)> = stream::iter(files)
            .map(|path| async move {
                let task_path = path.clone();
                let result = tokio::task::spawn_blocking(move || extract_pages(&task_path))
                    .await
                    .unwrap_or_else(|e| Err(Error::internal(format!("PDF task failed: {}", e))));
                (path, result)
            })
            .buffer_unordered(self.parallelism)
            .collect()
            .await;

        let mut pages = Vec::new();
        for (path, result) in results {
            match result {
                Ok(file_pages) => {
                    tracing::debug!("Loaded {} pages from {}", file_pages.len(), path.display());
                    pages.extend(file_pages);
                }
                Err(e) => tracing::warn!("Skipping {}: {}", path.display(), e),
            }
        }

        pages.sort_by(|a, b| {
            a.path
                .cmp(&b.path)
                .then(a.page_number.cmp(&b.page_number))
        });
        pages
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Extract the text of each page of one PDF.
///
/// lopdf gives page boundaries; when it cannot read the file, pdf-extract is
/// tried on the whole document and its output becomes a single page.
pub fn extract_pages(path: &Path) -> Result<Vec<PageContent>> {
    let filename = path.display().to_string();
    let data = std::fs::read(path)?;

    match lopdf::Document::load_mem(&data) {
        Ok(doc) => {
            let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
            let page_count = page_numbers.len() as u32;

            let pages = page_numbers
                .into_iter()
                .filter_map(|number| match doc.extract_text(&[number]) {
                    Ok(text) => Some((number, text)),
                    Err(e) => {
                        tracing::debug!("No text on page {} of {}: {}", number, filename, e);
                        None
                    }
                })
                .filter_map(|(number, text)| {
                    let content = clean_text(&text);
                    (!content.is_empty()).then(|| PageContent {
                        path: path.to_path_buf(),
                        page_number: number,
                        page_count,
                        content,
                    })
                })
                .collect();

            Ok(pages)
        }
        Err(load_err) => {
            tracing::debug!("lopdf could not open {}: {}, trying pdf-extract", filename, load_err);
            let text = pdf_extract::extract_text_from_mem(&data)
                .map_err(|e| Error::file_parse(&filename, e.to_string()))?;
            let content = clean_text(&text);
            if content.is_empty() {
                return Ok(Vec::new());
            }
            Ok(vec![PageContent {
                path: path.to_path_buf(),
                page_number: 1,
                page_count: 1,
                content,
            }])
        }
    }
}

/// Normalize extracted text: drop NULs and ligatures, trim each line, and
/// remove blank runs longer than one empty line.
fn clean_text(text: &str) -> String {
    let text = text
        .replace('\0', "")
        .replace('\u{00A0}', " ")
        .replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl");

    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.lines().map(str::trim_end) {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }

    out.trim().to_string()
}
