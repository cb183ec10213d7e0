//! Query-time retrieval: embed → nearest-neighbour search.

use std::sync::Arc;

use tracing::{debug, error};

use crate::document::SearchResult;
use crate::embedding::{EmbeddingProvider, embed_checked};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// Retrieves the chunks nearest to a query.
///
/// The searcher returns the store's raw ranking and never filters;
/// thresholding is applied separately with [`filter_by_threshold`].
pub struct SimilaritySearcher {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
}

impl SimilaritySearcher {
    /// The provider must be the one the collection was indexed with.
    pub fn new(
        embedding_provider: Arc<dyn EmbeddingProvider>,
        vector_store: Arc<dyn VectorStore>,
    ) -> Self {
        Self { embedding_provider, vector_store }
    }

    /// Return at most `top_k` results ordered by descending score.
    ///
    /// An empty collection yields an empty `Vec`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmptyInput`] for a blank query, and propagates
    /// embedding and vector store failures.
    pub async fn search(
        &self,
        collection: &str,
        query_text: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = embed_checked(self.embedding_provider.as_ref(), &[query_text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RagError::Embedding {
                provider: self.embedding_provider.name().to_string(),
                message: "no embedding returned for query".to_string(),
            })?;

        let results =
            self.vector_store.search(collection, &query_embedding, top_k).await.map_err(|e| {
                error!(collection, error = %e, "vector store search failed");
                e
            })?;

        debug!(collection, top_k, result_count = results.len(), "search completed");
        Ok(results)
    }
}

/// Keep only results scoring strictly above `threshold`, preserving order.
pub fn filter_by_threshold(results: Vec<SearchResult>, threshold: f32) -> Vec<SearchResult> {
    results.into_iter().filter(|r| r.score > threshold).collect()
}
