//! Word-based chunking with overlap.
//!
//! Paragraphs are flattened into one word stream and sliced into windows of
//! `chunk_size` words. Each window starts `chunk_size - overlap` words after
//! the previous one, so consecutive chunks share exactly `overlap` words.
//! The final window always ends at the last word and may be shorter.

use crate::document::Chunk;
use crate::error::{RagError, Result};

/// A strategy for splitting a document's paragraphs into chunk texts.
pub trait Chunker: Send + Sync {
    /// Split paragraphs into chunk strings.
    ///
    /// Returns an empty `Vec` if the paragraphs contain no words.
    fn chunk(&self, paragraphs: &[String]) -> Vec<String>;

    /// Split a document's paragraphs into [`Chunk`]s numbered from 1.
    fn chunk_document(&self, document: &str, paragraphs: &[String]) -> Vec<Chunk> {
        self.chunk(paragraphs)
            .into_iter()
            .enumerate()
            .map(|(i, text)| Chunk {
                document: document.to_string(),
                index: i + 1,
                word_count: text.split_whitespace().count(),
                text,
            })
            .collect()
    }
}

/// Fixed-size word windows with a fixed overlap.
///
/// # Example
///
/// ```rust,ignore
/// use docrag::WordChunker;
///
/// let chunker = WordChunker::new(100, 20)?;
/// let chunks = chunker.chunk(&paragraphs);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordChunker {
    chunk_size: usize,
    overlap: usize,
}

impl WordChunker {
    /// Create a new `WordChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfiguration`] if `overlap >= chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        validate(chunk_size, overlap)?;
        Ok(Self { chunk_size, overlap })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }
}

impl Chunker for WordChunker {
    fn chunk(&self, paragraphs: &[String]) -> Vec<String> {
        let words = word_stream(paragraphs);
        windows(&words, self.chunk_size, self.overlap)
            .into_iter()
            .map(|(start, end)| words[start..end].join(" "))
            .collect()
    }
}

/// Chunk paragraphs into overlapping word windows.
///
/// # Errors
///
/// Returns [`RagError::InvalidConfiguration`] before producing any chunk if
/// `overlap >= chunk_size`.
pub fn chunk_words<S: AsRef<str>>(
    paragraphs: &[S],
    chunk_size: usize,
    overlap: usize,
) -> Result<Vec<String>> {
    validate(chunk_size, overlap)?;
    let words = word_stream(paragraphs);
    Ok(windows(&words, chunk_size, overlap)
        .into_iter()
        .map(|(start, end)| words[start..end].join(" "))
        .collect())
}

fn validate(chunk_size: usize, overlap: usize) -> Result<()> {
    if overlap >= chunk_size {
        return Err(RagError::InvalidConfiguration(format!(
            "chunk overlap ({overlap}) must be less than chunk size ({chunk_size})"
        )));
    }
    Ok(())
}

/// Equivalent to joining the paragraphs with spaces and splitting on whitespace.
fn word_stream<S: AsRef<str>>(paragraphs: &[S]) -> Vec<&str> {
    paragraphs.iter().flat_map(|p| p.as_ref().split_whitespace()).collect()
}

/// Compute `[start, end)` word ranges. Requires `overlap < chunk_size`.
fn windows<T>(words: &[T], chunk_size: usize, overlap: usize) -> Vec<(usize, usize)> {
    let n = words.len();
    let step = chunk_size - overlap;
    let mut ranges = Vec::with_capacity(n.div_ceil(step));
    let mut start = 0;

    while start < n {
        let end = (start + chunk_size).min(n);
        ranges.push((start, end));
        if end == n {
            break;
        }
        start += step;
    }

    ranges
}
