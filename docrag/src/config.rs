//! Configuration for the ingestion and retrieval pipeline.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Configuration parameters for chunking, indexing, and retrieval.
///
/// Chunk sizes are measured in words, not characters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RagConfig {
    /// Maximum number of words per chunk.
    pub chunk_size: usize,
    /// Number of words shared by consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of records sent to the vector store per upsert.
    pub batch_size: usize,
    /// Default number of results returned by a query.
    pub top_k: usize,
    /// Optional relevance threshold; results must score strictly above it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_threshold: Option<f32>,
    /// File extensions considered for indexing, compared case-insensitively.
    pub extensions: Vec<String>,
    /// Number of chunk texts sent per `embed_batch` call during ingestion.
    pub embedding_batch_size: usize,
    /// Maximum number of embedding calls in flight for one document.
    pub embedding_concurrency: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 128,
            chunk_overlap: 50,
            batch_size: 50,
            top_k: 5,
            similarity_threshold: None,
            extensions: vec!["pdf".to_string()],
            embedding_batch_size: 16,
            embedding_concurrency: 4,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Settings used with the 384-dimensional multilingual MiniLM model.
    pub fn minilm() -> Self {
        Self { chunk_size: 128, chunk_overlap: 50, ..Self::default() }
    }

    /// Settings used with the 768-dimensional SapBERT model.
    pub fn sapbert() -> Self {
        Self { chunk_size: 200, chunk_overlap: 75, ..Self::default() }
    }

    /// Load a JSON configuration file. Missing fields take their default values.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Io`] if the file cannot be read and
    /// [`RagError::InvalidConfiguration`] if it cannot be parsed or fails validation.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: RagConfig = serde_json::from_str(&raw).map_err(|e| {
            RagError::InvalidConfiguration(format!("failed to parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfiguration`] if:
    /// - `chunk_size == 0` or `chunk_overlap >= chunk_size`
    /// - `batch_size`, `top_k`, `embedding_batch_size` or `embedding_concurrency` is zero
    /// - `similarity_threshold` lies outside `[-1.0, 1.0]`
    /// - `extensions` is empty
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::InvalidConfiguration(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::InvalidConfiguration(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.batch_size == 0 {
            return Err(RagError::InvalidConfiguration(
                "batch_size must be greater than zero".to_string(),
            ));
        }
        if self.top_k == 0 {
            return Err(RagError::InvalidConfiguration(
                "top_k must be greater than zero".to_string(),
            ));
        }
        if self.embedding_batch_size == 0 || self.embedding_concurrency == 0 {
            return Err(RagError::InvalidConfiguration(
                "embedding_batch_size and embedding_concurrency must be greater than zero"
                    .to_string(),
            ));
        }
        if let Some(threshold) = self.similarity_threshold {
            if !(-1.0..=1.0).contains(&threshold) {
                return Err(RagError::InvalidConfiguration(format!(
                    "similarity_threshold ({threshold}) must be within [-1.0, 1.0]"
                )));
            }
        }
        if self.extensions.is_empty() {
            return Err(RagError::InvalidConfiguration(
                "at least one document extension is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Start from an existing configuration, such as a preset.
    pub fn from_config(config: RagConfig) -> Self {
        Self { config }
    }

    /// Set the maximum chunk size in words.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in words.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of records per upsert.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    /// Set the default number of results returned by a query.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the relevance threshold applied after search.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = Some(threshold);
        self
    }

    /// Replace the set of supported document extensions.
    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Set the number of texts per embedding call during ingestion.
    pub fn embedding_batch_size(mut self, size: usize) -> Self {
        self.config.embedding_batch_size = size;
        self
    }

    /// Set the maximum number of concurrent embedding calls per document.
    pub fn embedding_concurrency(mut self, concurrency: usize) -> Self {
        self.config.embedding_concurrency = concurrency;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
