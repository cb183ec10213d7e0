//! Pipeline orchestrator.
//!
//! The [`RagPipeline`] coordinates the indexing workflow (collection setup,
//! folder ingestion) and the query workflow (search, optional threshold) by
//! composing a [`TextExtractor`], a [`Chunker`], an [`EmbeddingProvider`], and
//! a [`VectorStore`].
//!
//! # Example
//!
//! ```rust,ignore
//! use docrag::{InMemoryVectorStore, RagConfig, RagPipeline};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::minilm())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .build()?;
//!
//! pipeline.ensure_collection_and_index("corpus_a", "ALLERG_IA").await?;
//! let results = pipeline.query("corpus_a", "morning wheezing", Some(5), Some(0.7)).await?;
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::chunking::{Chunker, WordChunker};
use crate::config::RagConfig;
use crate::document::SearchResult;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::extract::{FileExtractor, TextExtractor};
use crate::search::{SimilaritySearcher, filter_by_threshold};
use crate::vectorstore::VectorStore;
use crate::writer::{IndexReport, IndexWriter};

/// Result of [`RagPipeline::ensure_collection_and_index`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexOutcome {
    /// Whether the collection was created by this call.
    pub created: bool,
    /// The indexing report, present only when indexing ran.
    pub report: Option<IndexReport>,
}

/// The ingestion and retrieval pipeline.
///
/// Construct one via [`RagPipeline::builder()`].
pub struct RagPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    writer: IndexWriter,
    searcher: SimilaritySearcher,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Return a reference to the vector store.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// Create the collection with the provider's dimensionality unless it exists.
    ///
    /// Returns `true` if the collection was created.
    pub async fn ensure_collection(&self, name: &str) -> Result<bool> {
        let dimensions = self.embedding_provider.dimensions();
        self.writer.ensure_collection(name, dimensions).await.map_err(|e| {
            error!(collection = name, error = %e, "failed to ensure collection");
            e
        })
    }

    /// Index a folder into an existing collection.
    ///
    /// Indexing is at-least-once: running it twice stores every chunk twice
    /// under different identifiers.
    pub async fn index_folder(&self, name: &str, folder: impl AsRef<Path>) -> Result<IndexReport> {
        self.writer.index_documents(name, folder).await
    }

    /// Create the collection and index `folder` into it, only if the
    /// collection did not exist yet.
    pub async fn ensure_collection_and_index(
        &self,
        name: &str,
        folder: impl AsRef<Path>,
    ) -> Result<IndexOutcome> {
        if !self.ensure_collection(name).await? {
            return Ok(IndexOutcome { created: false, report: None });
        }
        let report = self.index_folder(name, folder).await?;
        Ok(IndexOutcome { created: true, report: Some(report) })
    }

    /// Query a collection.
    ///
    /// `top_k` and `threshold` fall back to the configured values. When a
    /// threshold applies, only results scoring strictly above it are kept.
    pub async fn query(
        &self,
        collection: &str,
        text: &str,
        top_k: Option<usize>,
        threshold: Option<f32>,
    ) -> Result<Vec<SearchResult>> {
        let top_k = top_k.unwrap_or(self.config.top_k);
        let results = self.searcher.search(collection, text, top_k).await?;
        let returned = results.len();

        let results = match threshold.or(self.config.similarity_threshold) {
            Some(threshold) => filter_by_threshold(results, threshold),
            None => results,
        };

        info!(collection, top_k, returned, kept = results.len(), "query completed");
        Ok(results)
    }

    /// Names of all collections in the vector store.
    pub async fn list_collections(&self) -> Result<Vec<String>> {
        self.vector_store.list_collections().await
    }

    /// Delete a named collection and everything indexed in it.
    pub async fn delete_collection(&self, name: &str) -> Result<()> {
        self.vector_store.delete_collection(name).await.map_err(|e| {
            error!(collection = name, error = %e, "failed to delete collection");
            e
        })?;
        info!(collection = name, "deleted collection");
        Ok(())
    }

    /// Delete every collection in the vector store, returning their names.
    pub async fn delete_all_collections(&self) -> Result<Vec<String>> {
        let names = self.list_collections().await?;
        for name in &names {
            self.delete_collection(name).await?;
        }
        Ok(names)
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// The embedding provider and vector store are required. The config defaults
/// to [`RagConfig::default`], the extractor to [`FileExtractor`], and the
/// chunker to a [`WordChunker`] built from the config.
///
/// # Example
///
/// ```rust,ignore
/// let pipeline = RagPipeline::builder()
///     .config(RagConfig::sapbert())
///     .embedding_provider(Arc::new(embedder))
///     .vector_store(Arc::new(store))
///     .extractor(Arc::new(PdfExtractor))  // optional
///     .build()?;
/// ```
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    extractor: Option<Arc<dyn TextExtractor>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set the document text extractor.
    pub fn extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Set a custom chunker, replacing the config-derived [`WordChunker`].
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`RagPipeline`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfiguration`] if a required field is
    /// missing or the config fails validation.
    pub fn build(self) -> Result<RagPipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let embedding_provider = self.embedding_provider.ok_or_else(|| {
            RagError::InvalidConfiguration("embedding_provider is required".to_string())
        })?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::InvalidConfiguration("vector_store is required".to_string()))?;
        let extractor = self.extractor.unwrap_or_else(|| Arc::new(FileExtractor));
        let chunker: Arc<dyn Chunker> = match self.chunker {
            Some(chunker) => chunker,
            None => Arc::new(WordChunker::new(config.chunk_size, config.chunk_overlap)?),
        };

        let writer = IndexWriter::new(
            config.clone(),
            extractor,
            chunker,
            embedding_provider.clone(),
            vector_store.clone(),
        )?;
        let searcher = SimilaritySearcher::new(embedding_provider.clone(), vector_store.clone());

        Ok(RagPipeline { config, embedding_provider, vector_store, writer, searcher })
    }
}
