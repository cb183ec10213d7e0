//! Error types for the `docrag` crate.

use thiserror::Error;

/// Errors that can occur while ingesting or retrieving documents.
#[derive(Debug, Error)]
pub enum RagError {
    /// A document could not be read, decoded, or yielded no usable text.
    ///
    /// The index writer absorbs this variant: the document is logged and
    /// skipped, and indexing of the remaining documents continues.
    #[error("Extraction error ({document}): {message}")]
    Extraction {
        /// The document that failed.
        document: String,
        /// A description of the failure.
        message: String,
    },

    /// Configuration parameters are inconsistent (for example `overlap >= chunk_size`).
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Empty or whitespace-only text was passed to the embedding path.
    #[error("Empty input: cannot embed empty or whitespace-only text")]
    EmptyInput,

    /// An embedding provider call failed.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A vector did not have the dimensionality it was required to have.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The configured dimensionality.
        expected: usize,
        /// The dimensionality actually observed.
        actual: usize,
    },

    /// Embedding a specific chunk failed during ingestion.
    #[error(
        "Embedding failed for chunk {chunk_index} of '{document}' \
         ({indexed} chunks already indexed): {source}"
    )]
    EmbeddingFailure {
        /// The document the chunk belongs to.
        document: String,
        /// 1-based index of the first chunk in the failed embedding call.
        chunk_index: usize,
        /// Number of chunks durably indexed before the failure.
        indexed: usize,
        /// The underlying provider error.
        #[source]
        source: Box<RagError>,
    },

    /// A vector store backend call failed.
    #[error("Vector store error ({backend}): {message}")]
    VectorStore {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The named collection does not exist.
    #[error("Collection '{0}' does not exist")]
    CollectionNotFound(String),

    /// An upsert batch was rejected; indexing stopped at this batch.
    #[error(
        "Index write failed for collection '{collection}' at batch {batch_index} \
         (document '{document}', {indexed} chunks already indexed): {source}"
    )]
    IndexWrite {
        /// The target collection.
        collection: String,
        /// The document whose chunks were in the failing batch (the last one added).
        document: String,
        /// 0-based index of the failing batch within the run.
        batch_index: usize,
        /// Number of chunks durably indexed before the failure.
        indexed: usize,
        /// The underlying vector store error.
        #[source]
        source: Box<RagError>,
    },

    /// An I/O error, typically while scanning a document folder.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RagError {
    /// Number of chunks durably indexed before an indexing run aborted.
    ///
    /// Returns `None` for variants that are not raised mid-run.
    pub fn indexed_before_failure(&self) -> Option<usize> {
        match self {
            RagError::IndexWrite { indexed, .. } | RagError::EmbeddingFailure { indexed, .. } => {
                Some(*indexed)
            }
            _ => None,
        }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
