//! Qdrant vector store backend.
//!
//! Provides [`QdrantVectorStore`] which implements [`VectorStore`] using
//! the [qdrant-client](https://docs.rs/qdrant-client) crate over gRPC.
//!
//! Each point is keyed by the record's UUID and carries the payload keys
//! `file_name`, `chunk_number` and `chunk_text`.
//!
//! # Example
//!
//! ```rust,ignore
//! use docrag::qdrant::QdrantVectorStore;
//!
//! let store = QdrantVectorStore::new("http://localhost:6334")?;
//! store.create_collection("docs", 384, Distance::Cosine).await?;
//! store.upsert("docs", &records).await?;
//! let results = store.search("docs", &query_embedding, 5).await?;
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance as QdrantDistance, PointStruct, ScoredPoint,
    SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use serde_json::json;
use tracing::{debug, warn};

use crate::document::{ChunkPayload, EmbeddingRecord, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::{Distance, VectorStore};

/// The default gRPC endpoint of a local Qdrant instance.
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";

/// A [`VectorStore`] backed by [Qdrant](https://qdrant.tech/).
pub struct QdrantVectorStore {
    client: Qdrant,
}

impl QdrantVectorStore {
    /// Create a new Qdrant vector store connecting to the given URL.
    pub fn new(url: &str) -> Result<Self> {
        let client = Qdrant::from_url(url).build().map_err(Self::map_err)?;
        Ok(Self { client })
    }

    /// Create a new Qdrant vector store with the default URL (`http://localhost:6334`).
    pub fn default_url() -> Result<Self> {
        Self::new(DEFAULT_QDRANT_URL)
    }

    /// Create a new Qdrant vector store from an existing client.
    pub fn from_client(client: Qdrant) -> Self {
        Self { client }
    }

    fn map_err(e: qdrant_client::QdrantError) -> RagError {
        RagError::VectorStore { backend: "qdrant".to_string(), message: e.to_string() }
    }

    fn distance(distance: Distance) -> QdrantDistance {
        match distance {
            Distance::Cosine => QdrantDistance::Cosine,
        }
    }

    fn to_point(record: &EmbeddingRecord) -> Result<PointStruct> {
        let payload = Payload::try_from(json!({
            "file_name": record.payload.file_name,
            "chunk_number": record.payload.chunk_number,
            "chunk_text": record.payload.chunk_text,
        }))
        .map_err(Self::map_err)?;

        Ok(PointStruct::new(record.id.to_string(), record.vector.clone(), payload))
    }

    fn from_scored(scored: ScoredPoint) -> SearchResult {
        let id = scored
            .id
            .as_ref()
            .and_then(|pid| match &pid.point_id_options {
                Some(PointIdOptions::Uuid(s)) => Some(s.clone()),
                Some(PointIdOptions::Num(n)) => Some(n.to_string()),
                None => None,
            })
            .unwrap_or_default();

        let (payload, missing) = Self::read_payload(&scored.payload);
        if !missing.is_empty() {
            warn!(point = %id, missing = ?missing, "qdrant point is missing payload keys");
        }

        SearchResult { id, score: scored.score, payload }
    }

    /// Read a chunk payload, returning the keys that were absent or mistyped.
    fn read_payload(
        payload: &HashMap<String, QdrantValue>,
    ) -> (ChunkPayload, Vec<&'static str>) {
        let mut missing = Vec::new();
        let file_name = payload.get("file_name").and_then(Self::extract_string);
        if file_name.is_none() {
            missing.push("file_name");
        }
        let chunk_number = payload.get("chunk_number").and_then(Self::extract_usize);
        if chunk_number.is_none() {
            missing.push("chunk_number");
        }
        let chunk_text = payload.get("chunk_text").and_then(Self::extract_string);
        if chunk_text.is_none() {
            missing.push("chunk_text");
        }

        let payload = ChunkPayload {
            file_name: file_name.unwrap_or_default(),
            chunk_number: chunk_number.unwrap_or_default(),
            chunk_text: chunk_text.unwrap_or_default(),
        };
        (payload, missing)
    }

    /// Extract a string from a Qdrant payload value.
    fn extract_string(value: &QdrantValue) -> Option<String> {
        match &value.kind {
            Some(Kind::StringValue(s)) => Some(s.clone()),
            _ => None,
        }
    }

    fn extract_usize(value: &QdrantValue) -> Option<usize> {
        match &value.kind {
            Some(Kind::IntegerValue(n)) => usize::try_from(*n).ok(),
            Some(Kind::DoubleValue(d)) if *d >= 0.0 => Some(*d as usize),
            _ => None,
        }
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    async fn collection_exists(&self, name: &str) -> Result<bool> {
        self.client.collection_exists(name).await.map_err(Self::map_err)
    }

    async fn create_collection(
        &self,
        name: &str,
        dimensions: usize,
        distance: Distance,
    ) -> Result<()> {
        self.client
            .create_collection(CreateCollectionBuilder::new(name).vectors_config(
                VectorParamsBuilder::new(dimensions as u64, Self::distance(distance)),
            ))
            .await
            .map_err(Self::map_err)?;

        debug!(collection = name, dimensions, "created qdrant collection");
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.client.delete_collection(name).await.map_err(Self::map_err)?;
        debug!(collection = name, "deleted qdrant collection");
        Ok(())
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        let response = self.client.list_collections().await.map_err(Self::map_err)?;
        let mut names: Vec<String> = response.collections.into_iter().map(|c| c.name).collect();
        names.sort();
        Ok(names)
    }

    async fn upsert(&self, collection: &str, records: &[EmbeddingRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let points = records.iter().map(Self::to_point).collect::<Result<Vec<_>>>()?;

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await
            .map_err(Self::map_err)?;

        debug!(collection, count = records.len(), "upserted records to qdrant");
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(collection, vector.to_vec(), top_k as u64)
                    .with_payload(true),
            )
            .await
            .map_err(Self::map_err)?;

        debug!(collection, count = response.result.len(), "qdrant search completed");
        Ok(response.result.into_iter().map(Self::from_scored).collect())
    }
}
