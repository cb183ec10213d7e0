//! Data types for chunks, embedding records, and search results.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A contiguous run of words taken from one document's word stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Name of the owning document (its file name).
    pub document: String,
    /// 1-based position of this chunk within its document.
    pub index: usize,
    /// Number of words in the chunk.
    pub word_count: usize,
    /// The chunk text, words joined with single spaces.
    pub text: String,
}

/// The metadata stored with every indexed vector.
///
/// Carries enough to cite a result without re-reading the source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkPayload {
    /// Name of the source document.
    pub file_name: String,
    /// 1-based chunk sequence number within the document.
    pub chunk_number: usize,
    /// The raw chunk text.
    pub chunk_text: String,
}

impl From<&Chunk> for ChunkPayload {
    fn from(chunk: &Chunk) -> Self {
        Self {
            file_name: chunk.document.clone(),
            chunk_number: chunk.index,
            chunk_text: chunk.text.clone(),
        }
    }
}

/// A chunk's vector and payload, ready to be written to a vector store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    /// Identifier assigned once when the record is created.
    pub id: Uuid,
    /// The embedding of the chunk text.
    pub vector: Vec<f32>,
    /// Citation metadata.
    pub payload: ChunkPayload,
}

impl EmbeddingRecord {
    /// Create a record with a fresh random identifier.
    pub fn new(chunk: &Chunk, vector: Vec<f32>) -> Self {
        Self { id: Uuid::new_v4(), vector, payload: ChunkPayload::from(chunk) }
    }
}

/// A retrieved payload paired with its similarity score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// The point identifier in the vector store.
    pub id: String,
    /// The cosine similarity score (higher is more relevant).
    pub score: f32,
    /// The stored citation metadata.
    pub payload: ChunkPayload,
}
