//! Text extraction from document files.
//!
//! Extractors read a file page by page and return its paragraphs. Paragraph
//! boundaries (blank lines) are found before whitespace is collapsed, so each
//! returned paragraph is a single line of space-separated words.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;

use tracing::debug;

use crate::error::{RagError, Result};

/// Reads a document and returns its non-empty paragraphs.
///
/// An `Ok` with an empty `Vec` means the document has no extractable text.
/// Callers decide whether an `Err` is fatal; the index writer treats it as a
/// skipped document.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<Vec<String>>;
}

/// Extracts text from PDF files with `pdf-extract`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract(&self, path: &Path) -> Result<Vec<String>> {
        let bytes = std::fs::read(path).map_err(|e| extraction_error(path, e))?;
        let pages = pdf_pages(&bytes).map_err(|message| extraction_error(path, message))?;
        let blank = pages.iter().filter(|p| p.trim().is_empty()).count();
        debug!(document = %path.display(), pages = pages.len(), blank, "extracted pdf text");

        let pages: Vec<&str> = pages.iter().map(String::as_str).collect();
        Ok(paragraphs_from_pages(&pages))
    }
}

/// Extract the text of each page of an in-memory PDF, in page order.
fn pdf_pages(bytes: &[u8]) -> std::result::Result<Vec<String>, String> {
    // The PDF parser panics on some malformed inputs.
    catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem_by_pages(bytes)))
        .map_err(|_| "PDF parser panicked (corrupt file?)".to_string())?
        .map_err(|e| e.to_string())
}

/// Extracts text from plain-text and markdown files, decoding UTF-8 lossily.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, path: &Path) -> Result<Vec<String>> {
        let bytes = std::fs::read(path).map_err(|e| extraction_error(path, e))?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(paragraphs_from_pages(&[text.as_ref()]))
    }
}

/// Chooses an extractor from the file extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileExtractor;

impl TextExtractor for FileExtractor {
    fn extract(&self, path: &Path) -> Result<Vec<String>> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => PdfExtractor.extract(path),
            "txt" | "text" | "md" | "markdown" => PlainTextExtractor.extract(path),
            other => Err(extraction_error(path, format!("unsupported file type '{other}'"))),
        }
    }
}

/// Join page texts and split them into normalized paragraphs.
///
/// Pages that are empty after trimming are skipped. The remaining pages are
/// joined with a newline, split on blank lines, and each paragraph has its
/// whitespace runs collapsed to single spaces.
pub fn paragraphs_from_pages(pages: &[&str]) -> Vec<String> {
    let joined = pages
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in joined.lines() {
        if line.trim().is_empty() {
            push_paragraph(&mut paragraphs, &mut current);
        } else {
            current.extend(line.split_whitespace());
        }
    }
    push_paragraph(&mut paragraphs, &mut current);

    paragraphs
}

fn push_paragraph(paragraphs: &mut Vec<String>, words: &mut Vec<&str>) {
    if !words.is_empty() {
        paragraphs.push(words.join(" "));
        words.clear();
    }
}

fn extraction_error(path: &Path, message: impl ToString) -> RagError {
    RagError::Extraction { document: document_name(path), message: message.to_string() }
}

/// The name under which a document is indexed: its file name.
pub fn document_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
