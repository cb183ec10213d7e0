use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use docrag::ollama::DEFAULT_OLLAMA_URL;
use docrag::qdrant::DEFAULT_QDRANT_URL;

/// Index folders of documents into Qdrant and query them by similarity.
#[derive(Parser, Debug)]
#[command(name = "docrag", version, about = "Document ingestion and semantic retrieval")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// JSON configuration file, replacing the preset's chunking and batching settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Deployment preset: chunking parameters plus default embedding model
    #[arg(long, value_enum, default_value_t = Preset::Minilm, global = true)]
    pub preset: Preset,

    /// Embedding model name (uses the preset or provider default if not set)
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Embedding dimensionality override
    #[arg(long, global = true)]
    pub dimensions: Option<usize>,

    /// Qdrant gRPC endpoint
    #[arg(long, env = "DOCRAG_QDRANT_URL", default_value = DEFAULT_QDRANT_URL, global = true)]
    pub qdrant_url: String,

    /// Ollama server address
    #[arg(long, env = "DOCRAG_OLLAMA_URL", default_value = DEFAULT_OLLAMA_URL, global = true)]
    pub ollama_url: String,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a collection and index a folder into it
    Index(IndexArgs),
    /// Search a collection
    Query(QueryArgs),
    /// Inspect or delete collections
    #[command(subcommand)]
    Collections(CollectionsCommand),
}

#[derive(Args, Debug)]
pub struct IndexArgs {
    /// Target collection
    pub collection: String,

    /// Folder whose documents are indexed (not recursive)
    pub folder: PathBuf,

    /// Index even if the collection already exists (chunks may be duplicated)
    #[arg(long)]
    pub force: bool,

    /// Words per chunk
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Words shared between consecutive chunks
    #[arg(long)]
    pub chunk_overlap: Option<usize>,

    /// Records per upsert
    #[arg(long)]
    pub batch_size: Option<usize>,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Collection to search
    pub collection: String,

    /// Query text
    pub text: String,

    /// Maximum number of results
    #[arg(long, short = 'k')]
    pub top_k: Option<usize>,

    /// Keep only results scoring strictly above this value
    #[arg(long, allow_negative_numbers = true)]
    pub threshold: Option<f32>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum CollectionsCommand {
    /// List collection names
    List,
    /// Delete one collection, or all of them with --all
    Delete {
        /// Collection to delete
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        name: Option<String>,

        /// Delete every collection
        #[arg(long)]
        all: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// 128-word chunks, 50 overlap, 384-dimensional MiniLM
    Minilm,
    /// 200-word chunks, 75 overlap, 768-dimensional SapBERT
    Sapbert,
}

impl Preset {
    /// Default Ollama model for the preset, if one is published under a stable name.
    pub fn ollama_model(self) -> Option<&'static str> {
        match self {
            Preset::Minilm => Some("all-minilm"),
            Preset::Sapbert => None,
        }
    }

    pub fn dimensions(self) -> usize {
        match self {
            Preset::Minilm => 384,
            Preset::Sapbert => 768,
        }
    }
}
