use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use docrag::ollama::OllamaEmbeddingProvider;
use docrag::qdrant::QdrantVectorStore;
use docrag::{
    EmbeddingProvider, IndexReport, RagConfig, RagConfigBuilder, RagPipeline, SearchResult,
};
use tracing::info;

use crate::cli::{
    Cli, CollectionsCommand, Command, GlobalArgs, IndexArgs, Preset, QueryArgs,
};

/// Resolve the configuration: preset, then `--config` file, then index flags.
pub fn resolve_config(global: &GlobalArgs, index: Option<&IndexArgs>) -> Result<RagConfig> {
    let mut config = match &global.config {
        Some(path) => RagConfig::from_json_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => match global.preset {
            Preset::Minilm => RagConfig::minilm(),
            Preset::Sapbert => RagConfig::sapbert(),
        },
    };

    if let Some(args) = index {
        let mut builder = RagConfigBuilder::from_config(config);
        if let Some(size) = args.chunk_size {
            builder = builder.chunk_size(size);
        }
        if let Some(overlap) = args.chunk_overlap {
            builder = builder.chunk_overlap(overlap);
        }
        if let Some(size) = args.batch_size {
            builder = builder.batch_size(size);
        }
        config = builder.build().context("invalid indexing parameters")?;
    }

    Ok(config)
}

/// Build the Ollama embedding provider selected by the global flags.
pub fn build_embedder(global: &GlobalArgs) -> Result<Arc<dyn EmbeddingProvider>> {
    let Some(model) = global.model.as_deref().or(global.preset.ollama_model()) else {
        bail!("the {:?} preset has no default Ollama model; pass --model", global.preset);
    };
    let dimensions = global.dimensions.unwrap_or(global.preset.dimensions());
    Ok(Arc::new(OllamaEmbeddingProvider::new(&global.ollama_url).with_model(model, dimensions)))
}

fn build_pipeline(global: &GlobalArgs, config: RagConfig) -> Result<RagPipeline> {
    let store = QdrantVectorStore::new(&global.qdrant_url)
        .with_context(|| format!("failed to connect to Qdrant at {}", global.qdrant_url))?;
    let pipeline = RagPipeline::builder()
        .config(config)
        .embedding_provider(build_embedder(global)?)
        .vector_store(Arc::new(store))
        .build()?;
    Ok(pipeline)
}

/// Run a parsed command line against Qdrant.
pub async fn run(cli: Cli) -> Result<()> {
    let index_args = match &cli.command {
        Command::Index(args) => Some(args),
        _ => None,
    };
    let config = resolve_config(&cli.global, index_args)?;
    let pipeline = build_pipeline(&cli.global, config)?;
    execute(&pipeline, cli.command).await
}

/// Execute a command against an already-built pipeline.
pub async fn execute(pipeline: &RagPipeline, command: Command) -> Result<()> {
    match command {
        Command::Index(args) => {
            if let Some(report) = index(pipeline, &args).await? {
                print!("{}", format_report(&args.collection, &report));
            }
        }
        Command::Query(args) => {
            let results = query(pipeline, &args).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                print!("{}", format_results(&results));
            }
        }
        Command::Collections(CollectionsCommand::List) => {
            for name in pipeline.list_collections().await? {
                println!("{name}");
            }
        }
        Command::Collections(CollectionsCommand::Delete { name, all }) => {
            let deleted = match name {
                Some(name) if !all => {
                    pipeline.delete_collection(&name).await?;
                    vec![name]
                }
                _ => pipeline.delete_all_collections().await?,
            };
            for name in deleted {
                println!("deleted {name}");
            }
        }
    }
    Ok(())
}

/// Index a folder. Returns `None` if the collection existed and `--force` was not given.
pub async fn index(pipeline: &RagPipeline, args: &IndexArgs) -> Result<Option<IndexReport>> {
    let result = if args.force {
        pipeline.ensure_collection(&args.collection).await?;
        pipeline.index_folder(&args.collection, &args.folder).await.map(Some)
    } else {
        pipeline
            .ensure_collection_and_index(&args.collection, &args.folder)
            .await
            .map(|outcome| outcome.report)
    };

    match result {
        Ok(None) => {
            info!(collection = %args.collection, "collection exists, skipping indexing");
            println!(
                "collection '{}' already exists; use --force to index into it anyway",
                args.collection
            );
            Ok(None)
        }
        Ok(report) => Ok(report),
        Err(e) => match e.indexed_before_failure() {
            Some(indexed) => Err(e).context(format!(
                "indexing into '{}' stopped; {indexed} chunks were indexed before the failure",
                args.collection
            )),
            None => Err(e.into()),
        },
    }
}

/// Query a collection with the arguments' overrides.
pub async fn query(pipeline: &RagPipeline, args: &QueryArgs) -> Result<Vec<SearchResult>> {
    let results = pipeline.query(&args.collection, &args.text, args.top_k, args.threshold).await?;
    Ok(results)
}

pub fn format_report(collection: &str, report: &IndexReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "indexed {} documents into '{collection}': {} chunks in {} batches",
        report.documents_indexed, report.chunks_indexed, report.batches_flushed
    );
    for skipped in &report.documents_skipped {
        let _ = writeln!(out, "  skipped {}: {}", skipped.document, skipped.reason);
    }
    out
}

pub fn format_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "no results\n".to_string();
    }
    let mut out = String::new();
    for (rank, result) in results.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. [{:.4}] {} #{}",
            rank + 1,
            result.score,
            result.payload.file_name,
            result.payload.chunk_number
        );
        let _ = writeln!(out, "   {}", result.payload.chunk_text);
    }
    out
}
