//! Folder indexing: extract → chunk → embed → batched upsert.
//!
//! Documents are processed one at a time in path order. Within a document the
//! chunk texts are embedded in groups of `embedding_batch_size`, with at most
//! `embedding_concurrency` groups in flight; results are reassembled in chunk
//! order before they enter the upsert batch. Batches are flushed in the order
//! records were produced.

use std::path::Path;
use std::sync::Arc;

use futures::{StreamExt, TryStreamExt, stream};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::chunking::Chunker;
use crate::config::RagConfig;
use crate::discovery::discover_documents;
use crate::document::{Chunk, EmbeddingRecord};
use crate::embedding::{EmbeddingProvider, embed_checked};
use crate::error::{RagError, Result};
use crate::extract::{TextExtractor, document_name};
use crate::vectorstore::{Distance, VectorStore};

/// A document that contributed no chunks to an indexing run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedDocument {
    pub document: String,
    pub reason: String,
}

/// Summary of a completed indexing run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexReport {
    /// Documents that produced at least one chunk.
    pub documents_indexed: usize,
    /// Documents skipped because extraction failed or found no text.
    pub documents_skipped: Vec<SkippedDocument>,
    /// Chunks written to the vector store.
    pub chunks_indexed: usize,
    /// Upsert calls made.
    pub batches_flushed: usize,
}

/// Buffers records until `capacity` is reached.
#[derive(Debug)]
pub struct RecordBatch {
    records: Vec<EmbeddingRecord>,
    capacity: usize,
}

impl RecordBatch {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { records: Vec::with_capacity(capacity), capacity }
    }

    /// Add a record. Returns the full batch once `capacity` records are buffered.
    pub fn push(&mut self, record: EmbeddingRecord) -> Option<Vec<EmbeddingRecord>> {
        self.records.push(record);
        if self.records.len() >= self.capacity { self.take() } else { None }
    }

    /// Drain whatever is buffered, or `None` if nothing is.
    pub fn take(&mut self) -> Option<Vec<EmbeddingRecord>> {
        if self.records.is_empty() {
            return None;
        }
        Some(std::mem::replace(&mut self.records, Vec::with_capacity(self.capacity)))
    }

    /// Number of records currently buffered.
    pub fn pending(&self) -> usize {
        self.records.len()
    }
}

/// Writes the documents of a folder into a vector collection.
///
/// All collaborators are injected, so tests can substitute fakes for the
/// embedding provider and the vector store.
pub struct IndexWriter {
    config: RagConfig,
    extractor: Arc<dyn TextExtractor>,
    chunker: Arc<dyn Chunker>,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
}

impl IndexWriter {
    /// Create a writer over the given collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfiguration`] if `config` fails
    /// [`RagConfig::validate`].
    pub fn new(
        config: RagConfig,
        extractor: Arc<dyn TextExtractor>,
        chunker: Arc<dyn Chunker>,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        vector_store: Arc<dyn VectorStore>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, extractor, chunker, embedding_provider, vector_store })
    }

    /// Create the collection unless it already exists.
    ///
    /// Returns `true` if the collection was created. An existing collection
    /// is left untouched, whatever its dimensionality.
    pub async fn ensure_collection(&self, name: &str, dimensions: usize) -> Result<bool> {
        if self.vector_store.collection_exists(name).await? {
            info!(collection = name, "collection already exists, skipping creation");
            return Ok(false);
        }
        self.vector_store.create_collection(name, dimensions, Distance::Cosine).await?;
        info!(collection = name, dimensions, "created collection");
        Ok(true)
    }

    /// Index every supported document directly inside `folder`.
    ///
    /// Unreadable or empty documents are skipped and listed in the report.
    ///
    /// # Errors
    ///
    /// Aborts on the first systemic failure:
    /// - folder scanning errors ([`RagError::Io`], [`RagError::InvalidConfiguration`])
    /// - [`RagError::EmbeddingFailure`] if a chunk cannot be embedded
    /// - [`RagError::IndexWrite`] if an upsert is rejected
    ///
    /// The last two carry the number of chunks already indexed.
    pub async fn index_documents(
        &self,
        collection: &str,
        folder: impl AsRef<Path>,
    ) -> Result<IndexReport> {
        let folder = folder.as_ref();
        let files = discover_documents(folder, &self.config.extensions)?;
        if files.is_empty() {
            warn!(
                folder = %folder.display(),
                extensions = ?self.config.extensions,
                "no documents found"
            );
        }

        let mut report = IndexReport::default();
        let mut batch = RecordBatch::new(self.config.batch_size);
        let mut last_document = String::new();

        for path in &files {
            let document = document_name(path);
            let paragraphs = match self.extractor.extract(path) {
                Ok(paragraphs) => paragraphs,
                Err(e) => {
                    warn!(document = %document, error = %e, "skipping unreadable document");
                    report
                        .documents_skipped
                        .push(SkippedDocument { document, reason: e.to_string() });
                    continue;
                }
            };

            let chunks = self.chunker.chunk_document(&document, &paragraphs);
            if chunks.is_empty() {
                warn!(document = %document, "skipping document with no extractable text");
                report.documents_skipped.push(SkippedDocument {
                    document,
                    reason: "no extractable text".to_string(),
                });
                continue;
            }

            let records = self.embed_chunks(&chunks, report.chunks_indexed).await?;
            for record in records {
                if let Some(full) = batch.push(record) {
                    self.flush(collection, full, &document, &mut report).await?;
                }
            }

            report.documents_indexed += 1;
            info!(document = %document, chunk_count = chunks.len(), "indexed document");
            last_document = document;
        }

        if let Some(rest) = batch.take() {
            self.flush(collection, rest, &last_document, &mut report).await?;
        }

        info!(
            collection,
            documents = report.documents_indexed,
            skipped = report.documents_skipped.len(),
            chunks = report.chunks_indexed,
            batches = report.batches_flushed,
            "indexing completed"
        );
        Ok(report)
    }

    /// Embed one document's chunks, returning records in chunk order.
    async fn embed_chunks(
        &self,
        chunks: &[Chunk],
        indexed: usize,
    ) -> Result<Vec<EmbeddingRecord>> {
        let provider = self.embedding_provider.as_ref();
        let groups = chunks.chunks(self.config.embedding_batch_size);

        let vectors: Vec<Vec<Vec<f32>>> = stream::iter(groups)
            .map(|group| async move {
                let first = &group[0];
                let texts: Vec<&str> = group.iter().map(|c| c.text.as_str()).collect();
                embed_checked(provider, &texts).await.map_err(|e| {
                    error!(
                        document = %first.document,
                        chunk = first.index,
                        error = %e,
                        "embedding failed"
                    );
                    RagError::EmbeddingFailure {
                        document: first.document.clone(),
                        chunk_index: first.index,
                        indexed,
                        source: Box::new(e),
                    }
                })
            })
            .buffered(self.config.embedding_concurrency)
            .try_collect()
            .await?;

        debug!(chunks = chunks.len(), "embedded chunks");
        Ok(chunks
            .iter()
            .zip(vectors.into_iter().flatten())
            .map(|(chunk, vector)| EmbeddingRecord::new(chunk, vector))
            .collect())
    }

    async fn flush(
        &self,
        collection: &str,
        records: Vec<EmbeddingRecord>,
        document: &str,
        report: &mut IndexReport,
    ) -> Result<()> {
        let batch_index = report.batches_flushed;
        let indexed = report.chunks_indexed;

        self.vector_store.upsert(collection, &records).await.map_err(|e| {
            error!(collection, batch_index, indexed, error = %e, "upsert failed");
            RagError::IndexWrite {
                collection: collection.to_string(),
                document: document.to_string(),
                batch_index,
                indexed,
                source: Box::new(e),
            }
        })?;

        report.batches_flushed += 1;
        report.chunks_indexed += records.len();
        info!(
            collection,
            batch_index,
            count = records.len(),
            indexed = report.chunks_indexed,
            "flushed batch"
        );
        Ok(())
    }
}
