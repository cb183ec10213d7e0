//! End-to-end indexing and query tests with fake embedding and storage backends.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use docrag::document::{EmbeddingRecord, SearchResult};
use docrag::embedding::EmbeddingProvider;
use docrag::error::{RagError, Result};
use docrag::inmemory::InMemoryVectorStore;
use docrag::pipeline::RagPipeline;
use docrag::vectorstore::{Distance, VectorStore};
use docrag::{IndexReport, RagConfig, filter_by_threshold};
use tempfile::TempDir;

const DIM: usize = 32;

/// Bag-of-words embedder: each word increments a hashed bucket.
///
/// Texts containing `poison` fail. Each call sleeps a few milliseconds
/// derived from the text so concurrent calls complete out of order.
#[derive(Default)]
struct HashEmbedder {
    calls: AtomicUsize,
}

impl HashEmbedder {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn hash_of(word: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    word.hash(&mut hasher);
    hasher.finish()
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if text.contains("poison") {
            return Err(RagError::Embedding {
                provider: "hash".to_string(),
                message: "model rejected input".to_string(),
            });
        }

        tokio::time::sleep(Duration::from_millis(hash_of(text) % 5)).await;

        let mut vector = vec![0.0f32; DIM];
        for word in text.split_whitespace() {
            vector[(hash_of(word) % DIM as u64) as usize] += 1.0;
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        DIM
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// Wraps an [`InMemoryVectorStore`], recording every upsert and optionally
/// failing the upsert call with the given 0-based number.
#[derive(Default)]
struct RecordingStore {
    inner: InMemoryVectorStore,
    upserts: Mutex<Vec<Vec<(String, usize)>>>,
    fail_on_upsert: Option<usize>,
}

impl RecordingStore {
    fn failing_on(call: usize) -> Self {
        Self { fail_on_upsert: Some(call), ..Self::default() }
    }

    fn batch_sizes(&self) -> Vec<usize> {
        self.upserts.lock().unwrap().iter().map(Vec::len).collect()
    }

    fn upserted(&self) -> Vec<(String, usize)> {
        self.upserts.lock().unwrap().iter().flatten().cloned().collect()
    }
}

#[async_trait]
impl VectorStore for RecordingStore {
    async fn collection_exists(&self, name: &str) -> Result<bool> {
        self.inner.collection_exists(name).await
    }

    async fn create_collection(
        &self,
        name: &str,
        dimensions: usize,
        distance: Distance,
    ) -> Result<()> {
        self.inner.create_collection(name, dimensions, distance).await
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.inner.delete_collection(name).await
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        self.inner.list_collections().await
    }

    async fn upsert(&self, collection: &str, records: &[EmbeddingRecord]) -> Result<()> {
        let call = self.upserts.lock().unwrap().len();
        if self.fail_on_upsert == Some(call) {
            return Err(RagError::VectorStore {
                backend: "recording".to_string(),
                message: "connection reset".to_string(),
            });
        }
        self.inner.upsert(collection, records).await?;
        self.upserts.lock().unwrap().push(
            records
                .iter()
                .map(|r| (r.payload.file_name.clone(), r.payload.chunk_number))
                .collect(),
        );
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        self.inner.search(collection, vector, top_k).await
    }
}

fn words(prefix: &str, n: usize) -> String {
    (0..n).map(|i| format!("{prefix}{i}")).collect::<Vec<_>>().join(" ")
}

fn corpus(files: &[(&str, String)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, contents) in files {
        std::fs::write(dir.path().join(name), contents).unwrap();
    }
    dir
}

fn text_config(chunk_size: usize, overlap: usize, batch_size: usize) -> RagConfig {
    RagConfig::builder()
        .chunk_size(chunk_size)
        .chunk_overlap(overlap)
        .batch_size(batch_size)
        .extensions(["txt"])
        .build()
        .unwrap()
}

fn pipeline(
    config: RagConfig,
    embedder: &Arc<HashEmbedder>,
    store: &Arc<RecordingStore>,
) -> RagPipeline {
    RagPipeline::builder()
        .config(config)
        .embedding_provider(embedder.clone())
        .vector_store(store.clone())
        .build()
        .unwrap()
}

async fn index(pipeline: &RagPipeline, collection: &str, folder: &Path) -> Result<IndexReport> {
    let outcome = pipeline.ensure_collection_and_index(collection, folder).await?;
    assert!(outcome.created);
    Ok(outcome.report.unwrap())
}

#[tokio::test]
async fn empty_document_is_skipped_and_later_documents_are_indexed() {
    let dir = corpus(&[
        ("a.txt", words("a", 12)),
        ("b.txt", "  \n\n \t ".to_string()),
        ("c.txt", words("c", 7)),
    ]);
    let embedder = Arc::new(HashEmbedder::default());
    let store = Arc::new(RecordingStore::default());
    let pipeline = pipeline(text_config(5, 1, 50), &embedder, &store);

    let report = index(&pipeline, "docs", dir.path()).await.unwrap();

    assert_eq!(report.documents_indexed, 2);
    assert_eq!(report.documents_skipped.len(), 1);
    assert_eq!(report.documents_skipped[0].document, "b.txt");
    // 12 words by 5/1: starts 0, 4, 8. 7 words: starts 0, 4.
    assert_eq!(report.chunks_indexed, 5);
    assert_eq!(store.inner.record_count("docs").await, Some(5));

    let files: Vec<String> = store.upserted().into_iter().map(|(file, _)| file).collect();
    assert!(files.iter().all(|f| f != "b.txt"));
    assert!(files.iter().any(|f| f == "c.txt"));
}

#[tokio::test]
async fn unreadable_document_is_skipped() {
    let dir = corpus(&[("a.pdf", "not a pdf".to_string()), ("b.txt", words("b", 3))]);
    let embedder = Arc::new(HashEmbedder::default());
    let store = Arc::new(RecordingStore::default());
    let config = RagConfig::builder().extensions(["pdf", "txt"]).build().unwrap();
    let pipeline = pipeline(config, &embedder, &store);

    let report = index(&pipeline, "docs", dir.path()).await.unwrap();

    assert_eq!(report.documents_indexed, 1);
    assert_eq!(report.documents_skipped[0].document, "a.pdf");
    assert_eq!(report.chunks_indexed, 1);
}

#[tokio::test]
async fn query_on_a_fresh_collection_returns_nothing() {
    let embedder = Arc::new(HashEmbedder::default());
    let store = Arc::new(RecordingStore::default());
    let pipeline = pipeline(RagConfig::default(), &embedder, &store);

    assert!(pipeline.ensure_collection("fresh").await.unwrap());
    let results = pipeline.query("fresh", "shortness of breath", None, None).await.unwrap();
    assert!(results.is_empty());
}

async fn upsert_batch_sizes(word_counts: &[usize], batch_size: usize) -> (usize, Vec<usize>) {
    let files: Vec<(String, String)> = word_counts
        .iter()
        .enumerate()
        .map(|(i, &n)| (format!("doc{i}.txt"), words("w", n)))
        .collect();
    let refs: Vec<(&str, String)> = files.iter().map(|(n, c)| (n.as_str(), c.clone())).collect();
    let dir = corpus(&refs);

    let embedder = Arc::new(HashEmbedder::default());
    let store = Arc::new(RecordingStore::default());
    let pipeline = pipeline(text_config(5, 0, batch_size), &embedder, &store);
    let report = index(&pipeline, "docs", dir.path()).await.unwrap();

    assert_eq!(report.batches_flushed, store.batch_sizes().len());
    (report.chunks_indexed, store.batch_sizes())
}

#[tokio::test]
async fn upsert_calls_follow_the_batch_size() {
    // 22, 13 and 6 words by 5/0: 5 + 3 + 2 = 10 chunks.
    let (n, sizes) = upsert_batch_sizes(&[22, 13, 6], 4).await;
    assert_eq!(n, 10);
    assert_eq!(sizes.len(), n.div_ceil(4));
    assert_eq!(sizes, vec![4, 4, 2]);
}

#[tokio::test]
async fn exact_multiple_of_the_batch_size_ends_with_a_full_batch() {
    // 20 and 20 words by 5/0: 8 chunks.
    let (n, sizes) = upsert_batch_sizes(&[20, 20], 4).await;
    assert_eq!(n, 8);
    assert_eq!(sizes, vec![4, 4]);
}

#[tokio::test]
async fn existing_collection_is_not_reindexed() {
    let dir = corpus(&[("a.txt", words("a", 30))]);
    let embedder = Arc::new(HashEmbedder::default());
    let store = Arc::new(RecordingStore::default());
    store.create_collection("docs", DIM, Distance::Cosine).await.unwrap();
    let pipeline = pipeline(text_config(5, 0, 10), &embedder, &store);

    let outcome = pipeline.ensure_collection_and_index("docs", dir.path()).await.unwrap();

    assert!(!outcome.created);
    assert!(outcome.report.is_none());
    assert_eq!(embedder.calls(), 0);
    assert!(store.batch_sizes().is_empty());
}

#[tokio::test]
async fn forced_reindex_duplicates_chunks() {
    let dir = corpus(&[("a.txt", words("a", 10))]);
    let embedder = Arc::new(HashEmbedder::default());
    let store = Arc::new(RecordingStore::default());
    let pipeline = pipeline(text_config(5, 0, 10), &embedder, &store);

    index(&pipeline, "docs", dir.path()).await.unwrap();
    pipeline.index_folder("docs", dir.path()).await.unwrap();

    assert_eq!(store.inner.record_count("docs").await, Some(4));
}

#[tokio::test]
async fn embedding_failure_aborts_and_reports_progress() {
    let dir = corpus(&[
        ("a.txt", words("a", 20)),
        ("b.txt", format!("poison {}", words("b", 9))),
        ("c.txt", words("c", 5)),
    ]);
    let embedder = Arc::new(HashEmbedder::default());
    let store = Arc::new(RecordingStore::default());
    let pipeline = pipeline(text_config(5, 0, 2), &embedder, &store);

    let err = index(&pipeline, "docs", dir.path()).await.unwrap_err();

    match &err {
        RagError::EmbeddingFailure { document, chunk_index, indexed, source } => {
            assert_eq!(document, "b.txt");
            assert_eq!(*chunk_index, 1);
            assert_eq!(*indexed, 4);
            assert!(matches!(**source, RagError::Embedding { .. }));
        }
        other => panic!("expected EmbeddingFailure, got {other:?}"),
    }
    assert_eq!(err.indexed_before_failure(), Some(4));
    assert!(store.upserted().iter().all(|(file, _)| file == "a.txt"));
}

#[tokio::test]
async fn upsert_failure_reports_the_failing_batch() {
    let dir = corpus(&[("a.txt", words("a", 20))]);
    let embedder = Arc::new(HashEmbedder::default());
    let store = Arc::new(RecordingStore::failing_on(1));
    let pipeline = pipeline(text_config(5, 0, 2), &embedder, &store);

    let err = index(&pipeline, "docs", dir.path()).await.unwrap_err();

    match &err {
        RagError::IndexWrite { collection, document, batch_index, indexed, .. } => {
            assert_eq!(collection, "docs");
            assert_eq!(document, "a.txt");
            assert_eq!(*batch_index, 1);
            assert_eq!(*indexed, 2);
        }
        other => panic!("expected IndexWrite, got {other:?}"),
    }
    assert_eq!(err.indexed_before_failure(), Some(2));
    assert_eq!(store.inner.record_count("docs").await, Some(2));
}

#[tokio::test]
async fn concurrent_embedding_keeps_chunk_order() {
    let dir = corpus(&[("a.txt", words("w", 40)), ("b.txt", words("v", 15))]);
    let embedder = Arc::new(HashEmbedder::default());
    let store = Arc::new(RecordingStore::default());
    let config = RagConfig::builder()
        .chunk_size(5)
        .chunk_overlap(0)
        .batch_size(100)
        .embedding_batch_size(1)
        .embedding_concurrency(8)
        .extensions(["txt"])
        .build()
        .unwrap();
    let pipeline = pipeline(config, &embedder, &store);

    index(&pipeline, "docs", dir.path()).await.unwrap();

    let expected: Vec<(String, usize)> = (1..=8)
        .map(|n| ("a.txt".to_string(), n))
        .chain((1..=3).map(|n| ("b.txt".to_string(), n)))
        .collect();
    assert_eq!(store.upserted(), expected);
    assert_eq!(embedder.calls(), 11);

    let results = pipeline.query("docs", "w10 w11 w12 w13 w14", Some(1), None).await.unwrap();
    assert_eq!(results[0].payload.file_name, "a.txt");
    assert_eq!(results[0].payload.chunk_number, 3);
    assert_eq!(results[0].payload.chunk_text, "w10 w11 w12 w13 w14");
}

#[tokio::test]
async fn blank_query_is_rejected() {
    let embedder = Arc::new(HashEmbedder::default());
    let store = Arc::new(RecordingStore::default());
    let pipeline = pipeline(RagConfig::default(), &embedder, &store);
    pipeline.ensure_collection("docs").await.unwrap();

    let err = pipeline.query("docs", "  \n ", None, None).await.unwrap_err();
    assert!(matches!(err, RagError::EmptyInput));
    assert_eq!(embedder.calls(), 0);
}

#[tokio::test]
async fn threshold_keeps_only_scores_strictly_above() {
    let dir = corpus(&[("a.txt", format!("{} {}", words("a", 10), words("b", 10)))]);
    let embedder = Arc::new(HashEmbedder::default());
    let store = Arc::new(RecordingStore::default());
    let pipeline = pipeline(text_config(5, 2, 10), &embedder, &store);
    index(&pipeline, "docs", dir.path()).await.unwrap();

    let all = pipeline.query("docs", "a3 a4 a5 a6", Some(10), None).await.unwrap();
    assert!(all.len() > 1);
    let cut = all[all.len() / 2].score;

    let kept = pipeline.query("docs", "a3 a4 a5 a6", Some(10), Some(cut)).await.unwrap();
    assert!(kept.iter().all(|r| r.score > cut));
    assert_eq!(kept, filter_by_threshold(all, cut));
}

#[tokio::test]
async fn configured_threshold_applies_when_none_is_given() {
    let dir = corpus(&[("a.txt", words("a", 20))]);
    let embedder = Arc::new(HashEmbedder::default());
    let store = Arc::new(RecordingStore::default());
    let config = RagConfig::builder()
        .chunk_size(5)
        .chunk_overlap(0)
        .similarity_threshold(0.99)
        .extensions(["txt"])
        .build()
        .unwrap();
    let pipeline = pipeline(config, &embedder, &store);
    index(&pipeline, "docs", dir.path()).await.unwrap();

    let results = pipeline.query("docs", "a5 a6 a7 a8 a9", None, None).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].payload.chunk_number, 2);
}

#[tokio::test]
async fn delete_all_collections_empties_the_store() {
    let embedder = Arc::new(HashEmbedder::default());
    let store = Arc::new(RecordingStore::default());
    let pipeline = pipeline(RagConfig::default(), &embedder, &store);
    pipeline.ensure_collection("minilm").await.unwrap();
    pipeline.ensure_collection("sapbert").await.unwrap();

    let deleted = pipeline.delete_all_collections().await.unwrap();

    assert_eq!(deleted, vec!["minilm", "sapbert"]);
    assert!(pipeline.list_collections().await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_folder_is_an_io_error() {
    let embedder = Arc::new(HashEmbedder::default());
    let store = Arc::new(RecordingStore::default());
    let pipeline = pipeline(RagConfig::default(), &embedder, &store);
    pipeline.ensure_collection("docs").await.unwrap();

    let err = pipeline.index_folder("docs", "/nonexistent/docrag/corpus").await.unwrap_err();
    assert!(matches!(err, RagError::Io(_)));
}

#[test]
fn builder_requires_provider_and_store() {
    let err = RagPipeline::builder()
        .vector_store(Arc::new(InMemoryVectorStore::new()))
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, RagError::InvalidConfiguration(_)));

    let err = RagPipeline::builder()
        .embedding_provider(Arc::new(HashEmbedder::default()))
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, RagError::InvalidConfiguration(_)));
}
