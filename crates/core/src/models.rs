use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the vacation dataset, every field kept as the text that was read.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DestinationRecord {
    pub destination: String,
    pub location: String,
    pub resort_name: String,
    pub price_inr: String,
    pub rating: String,
    pub facilities: String,
    pub best_season: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub destination: String,
    pub location: String,
    pub price: String,
    pub rating: String,
    pub season: String,
}

/// Searchable blurb for one dataset row. `id` is the row's position in the file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TravelDocument {
    pub id: u64,
    pub content: String,
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedRecord {
    pub document: TravelDocument,
    pub score: f32,
}

/// A nearest-neighbour candidate returned by a vector index, carrying its stored
/// vector so the caller can rerank.
#[derive(Debug, Clone)]
pub struct IndexedMatch {
    pub document: TravelDocument,
    pub score: f32,
    pub vector: Vec<f32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct AssistantReply {
    pub answer: String,
    pub image: Option<GeneratedImage>,
    pub records: Vec<RetrievedRecord>,
    pub retrieval_ran: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickSuggestion {
    pub label: &'static str,
    pub query: &'static str,
}

pub const QUICK_SUGGESTIONS: [QuickSuggestion; 3] = [
    QuickSuggestion {
        label: "Beach Resorts in Goa",
        query: "Best beach resorts in Goa",
    },
    QuickSuggestion {
        label: "Hill Stations in India",
        query: "Top hill stations in India",
    },
    QuickSuggestion {
        label: "Luxury Resorts in Dubai",
        query: "Luxury resorts in Dubai",
    },
];

#[derive(Debug, Clone)]
pub struct IngestionOptions {
    pub batch_size: usize,
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self { batch_size: 500 }
    }
}

#[derive(Debug, Clone)]
pub struct RetrievalOptions {
    pub k: usize,
    pub fetch_k: usize,
    pub lambda: f32,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            k: 8,
            fetch_k: 20,
            lambda: 0.5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: "gemma3:latest".to_string(),
            temperature: 0.6,
            max_tokens: 300,
        }
    }
}
