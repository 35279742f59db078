pub mod assistant;
pub mod dataset;
pub mod embeddings;
pub mod error;
pub mod generation;
pub mod illustration;
pub mod ingest;
pub mod mmr;
pub mod models;
pub mod prompt;
pub mod retrieval;
pub mod stores;
pub mod traits;
pub mod transcript;

pub use assistant::{AssistantOptions, TravelAssistant};
pub use dataset::{
    build_document, build_documents, load_dataset, Dataset, DatasetSummary, DEFAULT_DATASET_FILE,
};
pub use embeddings::{
    Embedder, EmbeddingClient, HashingEmbedder, OllamaEmbedder, DEFAULT_EMBEDDING_DIMENSIONS,
    DEFAULT_EMBEDDING_MODEL,
};
pub use error::{DatasetError, ServiceError};
pub use generation::{OllamaGenerator, DEFAULT_OLLAMA_URL};
pub use illustration::{PollinationsClient, DEFAULT_IMAGE_ENDPOINT, DEFAULT_IMAGE_TIMEOUT};
pub use ingest::{ingest_if_empty, IngestionReport};
pub use models::{
    AssistantReply, ChatTurn, DestinationRecord, DocumentMetadata, GeneratedImage,
    GenerationOptions, IndexedMatch, IngestionOptions, QuickSuggestion, RetrievalOptions,
    RetrievedRecord, Role, TravelDocument, QUICK_SUGGESTIONS,
};
pub use prompt::{PromptTemplate, TRAVEL_CONSULTANT_TEMPLATE};
pub use retrieval::{should_retrieve, Retriever};
pub use stores::{QdrantStore, DEFAULT_COLLECTION};
pub use traits::{DocumentRetriever, ImageSource, TextGenerator, VectorIndex};
pub use transcript::Transcript;
