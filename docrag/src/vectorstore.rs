//! Vector store trait for storing and searching embedding records.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::{EmbeddingRecord, SearchResult};
use crate::error::Result;

/// The similarity metric of a collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Distance {
    #[default]
    Cosine,
}

/// A storage backend for embedding records with similarity search.
///
/// Implementations manage named collections of fixed dimensionality. A write
/// that returns `Ok` must be visible to every subsequent search.
///
/// # Example
///
/// ```rust,ignore
/// use docrag::{Distance, InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.create_collection("docs", 384, Distance::Cosine).await?;
/// store.upsert("docs", &records).await?;
/// let results = store.search("docs", &query_embedding, 5).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Whether a collection with this name exists.
    async fn collection_exists(&self, name: &str) -> Result<bool>;

    /// Create a named collection.
    ///
    /// Callers check [`collection_exists`](VectorStore::collection_exists) first.
    async fn create_collection(
        &self,
        name: &str,
        dimensions: usize,
        distance: Distance,
    ) -> Result<()>;

    /// Delete a named collection and all its data.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Names of all collections, sorted.
    async fn list_collections(&self) -> Result<Vec<String>>;

    /// Upsert records into a collection and wait for the write to be acknowledged.
    async fn upsert(&self, collection: &str, records: &[EmbeddingRecord]) -> Result<()>;

    /// Search for the `top_k` records most similar to `vector`.
    ///
    /// Returns results ordered by descending similarity score. An empty
    /// collection yields an empty `Vec`.
    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>>;
}
