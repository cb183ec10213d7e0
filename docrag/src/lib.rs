//! Document ingestion and semantic retrieval.
//!
//! This crate turns a folder of documents into a searchable vector collection
//! and answers top-K similarity queries against it:
//!
//! - **Extraction** ([`TextExtractor`]) reads documents into paragraphs
//! - **Chunking** ([`WordChunker`]) slices the word stream into overlapping windows
//! - **Embedding** ([`EmbeddingProvider`]) maps chunk text to vectors
//! - **Indexing** ([`IndexWriter`]) batches records into a [`VectorStore`]
//! - **Search** ([`SimilaritySearcher`]) embeds a query and ranks chunks by cosine similarity
//!
//! [`RagPipeline`] wires these together behind a builder.
//!
//! # Feature flags
//!
//! | Feature  | Description |
//! |----------|-------------|
//! | `qdrant` | [`qdrant::QdrantVectorStore`] over gRPC |
//! | `ollama` | [`ollama::OllamaEmbeddingProvider`] for a local Ollama server |
//! | `full`   | All of the above |

pub mod chunking;
pub mod config;
pub mod discovery;
pub mod document;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod inmemory;
pub mod pipeline;
pub mod search;
pub mod vectorstore;
pub mod writer;

#[cfg(feature = "ollama")]
pub mod ollama;
#[cfg(feature = "qdrant")]
pub mod qdrant;

pub use chunking::{Chunker, WordChunker, chunk_words};
pub use config::{RagConfig, RagConfigBuilder};
pub use discovery::discover_documents;
pub use document::{Chunk, ChunkPayload, EmbeddingRecord, SearchResult};
pub use embedding::{EmbeddingProvider, check_dimensions, check_embeddable};
pub use error::{RagError, Result};
pub use extract::{
    FileExtractor, PdfExtractor, PlainTextExtractor, TextExtractor, document_name,
    paragraphs_from_pages,
};
pub use inmemory::InMemoryVectorStore;
pub use pipeline::{IndexOutcome, RagPipeline, RagPipelineBuilder};
pub use search::{SimilaritySearcher, filter_by_threshold};
pub use vectorstore::{Distance, VectorStore};
pub use writer::{IndexReport, IndexWriter, RecordBatch, SkippedDocument};
