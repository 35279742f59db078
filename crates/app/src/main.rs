mod server;

use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use trip_nexus_core::{
    build_documents, ingest_if_empty, load_dataset, AssistantOptions, Embedder, EmbeddingClient,
    GenerationOptions, HashingEmbedder, IngestionOptions, OllamaEmbedder, OllamaGenerator,
    PollinationsClient, PromptTemplate, QdrantStore, RetrievalOptions, Retriever, Transcript,
    TravelAssistant, DEFAULT_COLLECTION, DEFAULT_DATASET_FILE, DEFAULT_EMBEDDING_DIMENSIONS,
    DEFAULT_EMBEDDING_MODEL, DEFAULT_IMAGE_ENDPOINT, DEFAULT_OLLAMA_URL,
    TRAVEL_CONSULTANT_TEMPLATE,
};

type AppRetriever = Retriever<QdrantStore, EmbeddingClient>;
type AppAssistant = TravelAssistant<AppRetriever, OllamaGenerator, PollinationsClient>;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EmbeddingBackend {
    /// Ollama `/api/embed`
    Ollama,
    /// Offline character-trigram hashing
    Hashing,
}

#[derive(Parser)]
#[command(name = "trip-nexus", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Vacation dataset CSV
    #[arg(long, env = "TRIP_NEXUS_DATASET", default_value = DEFAULT_DATASET_FILE)]
    dataset: PathBuf,

    /// Ollama base URL, used for both chat and embeddings
    #[arg(long, env = "TRIP_NEXUS_OLLAMA_URL", default_value = DEFAULT_OLLAMA_URL)]
    ollama_url: String,

    /// Chat model
    #[arg(long, env = "TRIP_NEXUS_CHAT_MODEL", default_value = "gemma3:latest")]
    chat_model: String,

    /// Sampling temperature
    #[arg(long, env = "TRIP_NEXUS_TEMPERATURE", default_value_t = 0.6)]
    temperature: f32,

    /// Maximum tokens generated per answer
    #[arg(long, env = "TRIP_NEXUS_MAX_TOKENS", default_value_t = 300)]
    max_tokens: u32,

    /// Embedding backend
    #[arg(long, env = "TRIP_NEXUS_EMBEDDER", value_enum, default_value = "ollama")]
    embedder: EmbeddingBackend,

    /// Embedding model served by Ollama
    #[arg(long, env = "TRIP_NEXUS_EMBEDDING_MODEL", default_value = DEFAULT_EMBEDDING_MODEL)]
    embedding_model: String,

    /// Embedding width; must match the collection
    #[arg(long, env = "TRIP_NEXUS_EMBEDDING_DIMENSIONS", default_value_t = DEFAULT_EMBEDDING_DIMENSIONS)]
    embedding_dimensions: usize,

    /// Qdrant base URL
    #[arg(long, env = "TRIP_NEXUS_QDRANT_URL", default_value = "http://localhost:6333")]
    qdrant_url: String,

    /// Qdrant collection
    #[arg(long, env = "TRIP_NEXUS_QDRANT_COLLECTION", default_value = DEFAULT_COLLECTION)]
    qdrant_collection: String,

    /// Documents per insert call during ingestion
    #[arg(long, env = "TRIP_NEXUS_BATCH_SIZE", default_value_t = 500)]
    batch_size: usize,

    /// Records kept after diversity reranking
    #[arg(long, env = "TRIP_NEXUS_TOP_K", default_value_t = 8)]
    top_k: usize,

    /// Candidates fetched before diversity reranking
    #[arg(long, env = "TRIP_NEXUS_FETCH_K", default_value_t = 20)]
    fetch_k: usize,

    /// Relevance/diversity balance, 1.0 = relevance only
    #[arg(long, env = "TRIP_NEXUS_MMR_LAMBDA", default_value_t = 0.5)]
    mmr_lambda: f32,

    /// Minimum words in a query before retrieval runs
    #[arg(long, env = "TRIP_NEXUS_MIN_QUERY_WORDS", default_value_t = 8)]
    min_query_words: usize,

    /// Leave retrieved records out of the prompt
    #[arg(long, env = "TRIP_NEXUS_NO_CONTEXT", default_value_t = false)]
    no_context: bool,

    /// Image generation endpoint; the query becomes the last path segment
    #[arg(long, env = "TRIP_NEXUS_IMAGE_ENDPOINT", default_value = DEFAULT_IMAGE_ENDPOINT)]
    image_endpoint: String,

    /// Image fetch timeout in seconds
    #[arg(long, env = "TRIP_NEXUS_IMAGE_TIMEOUT_SECS", default_value_t = 10)]
    image_timeout_secs: u64,

    /// Skip illustrative images
    #[arg(long, env = "TRIP_NEXUS_NO_IMAGES", default_value_t = false)]
    no_images: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest the dataset if the store is empty, then serve the chat UI.
    Serve {
        /// Listen address
        #[arg(long, env = "TRIP_NEXUS_LISTEN", default_value = "127.0.0.1:8501")]
        listen: SocketAddr,
        /// Drop chat sessions unused for this many seconds
        #[arg(long, env = "TRIP_NEXUS_SESSION_IDLE_SECS", default_value_t = 3_600)]
        session_idle_secs: u64,
        /// Most chat sessions kept at once; the least recently used goes first
        #[arg(long, env = "TRIP_NEXUS_MAX_SESSIONS", default_value_t = 10_000)]
        max_sessions: usize,
    },
    /// Ingest the dataset if the store is empty, then exit.
    Ingest,
    /// Answer a single question on stdout.
    Ask {
        /// Question text
        #[arg(long)]
        query: String,
        /// Write the illustrative image here when one is returned.
        #[arg(long)]
        image_out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "trip-nexus boot"
    );

    let retriever = build_retriever(&cli)?;
    prepare_index(&cli, &retriever).await?;

    match &cli.command {
        Command::Ingest => {
            println!("vector index ready at {}", Utc::now().to_rfc3339());
        }
        Command::Serve {
            listen,
            session_idle_secs,
            max_sessions,
        } => {
            let assistant = build_assistant(&cli, retriever)?;
            let sessions = server::SessionStore::new(
                Duration::from_secs(*session_idle_secs),
                *max_sessions,
            );
            let state = Arc::new(server::AppState::new(Arc::new(assistant), sessions));
            server::serve(*listen, state).await?;
        }
        Command::Ask { query, image_out } => {
            let assistant = build_assistant(&cli, retriever)?;
            let mut transcript = Transcript::new();
            let reply = assistant
                .handle(&mut transcript, query)
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            if reply.retrieval_ran {
                for record in &reply.records {
                    info!(
                        id = record.document.id,
                        destination = %record.document.metadata.destination,
                        score = record.score,
                        "retrieved record"
                    );
                }
            }

            println!("{}", reply.answer);

            match (image_out, reply.image) {
                (Some(path), Some(image)) => {
                    tokio::fs::write(path, &image.bytes).await?;
                    println!("image ({}) written to {}", image.content_type, path.display());
                }
                (Some(_), None) => warn!("no image available for this query"),
                _ => {}
            }
        }
    }

    Ok(())
}

fn build_retriever(cli: &Cli) -> anyhow::Result<AppRetriever> {
    let embedder = match cli.embedder {
        EmbeddingBackend::Ollama => EmbeddingClient::Ollama(
            OllamaEmbedder::new(&cli.ollama_url, &cli.embedding_model, cli.embedding_dimensions)
                .map_err(|error| anyhow::anyhow!(error.to_string()))?,
        ),
        EmbeddingBackend::Hashing => EmbeddingClient::Hashing(HashingEmbedder {
            dimensions: cli.embedding_dimensions,
        }),
    };

    let store = QdrantStore::new(&cli.qdrant_url, &cli.qdrant_collection, embedder.dimensions());
    let options = RetrievalOptions {
        k: cli.top_k,
        fetch_k: cli.fetch_k,
        lambda: cli.mmr_lambda,
    };

    Ok(Retriever::new(store, embedder, options))
}

/// Loads the dataset (fatal when missing) and fills the store only if it is empty.
async fn prepare_index(cli: &Cli, retriever: &AppRetriever) -> anyhow::Result<()> {
    let dataset = load_dataset(&cli.dataset).map_err(|error| anyhow::anyhow!(error.to_string()))?;
    info!(
        path = %cli.dataset.display(),
        rows = dataset.summary.rows,
        checksum = %dataset.summary.checksum,
        "dataset loaded"
    );

    let documents = build_documents(&dataset.records);

    retriever
        .index()
        .ensure_collection()
        .await
        .map_err(|error| anyhow::anyhow!(error.to_string()))?;

    let report = ingest_if_empty(
        retriever.index(),
        retriever.embedder(),
        &documents,
        &IngestionOptions {
            batch_size: cli.batch_size,
        },
    )
    .await
    .map_err(|error| anyhow::anyhow!(error.to_string()))?;

    info!(
        existing = report.existing,
        inserted = report.inserted,
        batches = report.batches,
        skipped = report.skipped,
        "vector index ready"
    );
    Ok(())
}

fn build_assistant(cli: &Cli, retriever: AppRetriever) -> anyhow::Result<AppAssistant> {
    let generator = OllamaGenerator::new(
        &cli.ollama_url,
        GenerationOptions {
            model: cli.chat_model.clone(),
            temperature: cli.temperature,
            max_tokens: cli.max_tokens,
        },
    )
    .map_err(|error| anyhow::anyhow!(error.to_string()))?;

    let images = PollinationsClient::new(
        &cli.image_endpoint,
        Duration::from_secs(cli.image_timeout_secs),
    );

    let prompt = PromptTemplate::new(TRAVEL_CONSULTANT_TEMPLATE, !cli.no_context);
    info!(
        model = generator.model(),
        include_context = prompt.include_context(),
        "generation chain ready"
    );

    Ok(TravelAssistant::new(
        retriever,
        generator,
        images,
        prompt,
        AssistantOptions {
            min_query_words: cli.min_query_words,
            images_enabled: !cli.no_images,
        },
    ))
}
