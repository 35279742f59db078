use crate::traits::VectorIndex;
use crate::{DocumentMetadata, IndexedMatch, ServiceError, TravelDocument};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tracing::info;

pub const DEFAULT_COLLECTION: &str = "vacation_planner_data";

pub struct QdrantStore {
    endpoint: String,
    collection: String,
    client: Client,
    vector_size: usize,
}

impl QdrantStore {
    pub fn new(endpoint: impl Into<String>, collection: impl Into<String>, vector_size: usize) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            collection: collection.into(),
            client: Client::new(),
            vector_size,
        }
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.endpoint, self.collection)
    }

    /// Creates the collection with cosine distance when it does not exist yet.
    pub async fn ensure_collection(&self) -> Result<(), ServiceError> {
        let response = self.client.get(self.collection_url()).send().await?;

        if response.status().is_success() {
            return Ok(());
        }

        if response.status() != StatusCode::NOT_FOUND {
            return Err(backend_error(response.status()));
        }

        info!(collection = %self.collection, size = self.vector_size, "creating qdrant collection");
        let response = self
            .client
            .put(self.collection_url())
            .json(&json!({
                "vectors": {
                    "size": self.vector_size,
                    "distance": "Cosine",
                }
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(backend_error(response.status()));
        }

        Ok(())
    }
}

fn backend_error(status: StatusCode) -> ServiceError {
    ServiceError::BackendResponse {
        backend: "qdrant".to_string(),
        details: status.to_string(),
    }
}

fn payload_str(hit: &Value, pointer: &str) -> String {
    hit.pointer(pointer)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl VectorIndex for QdrantStore {
    async fn count_documents(&self) -> Result<u64, ServiceError> {
        let response = self
            .client
            .post(format!("{}/points/count", self.collection_url()))
            .json(&json!({ "exact": true }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(backend_error(response.status()));
        }

        let parsed: Value = response.json().await?;
        parsed
            .pointer("/result/count")
            .and_then(Value::as_u64)
            .ok_or_else(|| ServiceError::BackendResponse {
                backend: "qdrant".to_string(),
                details: "count response missing result.count".to_string(),
            })
    }

    async fn index_documents(
        &self,
        documents: &[TravelDocument],
        embeddings: &[Vec<f32>],
    ) -> Result<(), ServiceError> {
        if documents.len() != embeddings.len() {
            return Err(ServiceError::Request(format!(
                "embedding count {} doesn't match document count {}",
                embeddings.len(),
                documents.len()
            )));
        }

        let points = documents
            .iter()
            .zip(embeddings.iter())
            .map(|(document, embedding)| {
                if embedding.len() != self.vector_size {
                    return Err(ServiceError::Request(format!(
                        "embedding dimension {} != {}",
                        embedding.len(),
                        self.vector_size
                    )));
                }

                let payload = json!({
                    "content": document.content,
                    "destination": document.metadata.destination,
                    "location": document.metadata.location,
                    "price": document.metadata.price,
                    "rating": document.metadata.rating,
                    "season": document.metadata.season,
                });

                Ok(json!({
                    "id": document.id,
                    "vector": embedding,
                    "payload": payload,
                }))
            })
            .collect::<Result<Vec<_>, ServiceError>>()?;

        if points.is_empty() {
            return Ok(());
        }

        let response = self
            .client
            .put(format!("{}/points?wait=true", self.collection_url()))
            .json(&json!({ "points": points }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(backend_error(response.status()));
        }

        Ok(())
    }

    async fn nearest(
        &self,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<IndexedMatch>, ServiceError> {
        if query_vector.len() != self.vector_size {
            return Err(ServiceError::Request(format!(
                "query vector dim {} is not {}",
                query_vector.len(),
                self.vector_size
            )));
        }

        let response = self
            .client
            .post(format!("{}/points/search", self.collection_url()))
            .json(&json!({
                "vector": query_vector,
                "limit": limit,
                "with_payload": true,
                "with_vector": true,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(backend_error(response.status()));
        }

        let parsed: Value = response.json().await?;
        let hits = parsed
            .pointer("/result")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut result = Vec::new();
        for hit in hits {
            let id = hit
                .pointer("/id")
                .and_then(Value::as_u64)
                .ok_or_else(|| ServiceError::BackendResponse {
                    backend: "qdrant".to_string(),
                    details: format!("search hit without a numeric id: {}", hit["id"]),
                })?;
            let score = hit.pointer("/score").and_then(Value::as_f64).unwrap_or(0.0);
            let vector = hit
                .pointer("/vector")
                .and_then(Value::as_array)
                .map(|values| {
                    values
                        .iter()
                        .filter_map(Value::as_f64)
                        .map(|value| value as f32)
                        .collect()
                })
                .unwrap_or_default();

            result.push(IndexedMatch {
                document: TravelDocument {
                    id,
                    content: payload_str(&hit, "/payload/content"),
                    metadata: DocumentMetadata {
                        destination: payload_str(&hit, "/payload/destination"),
                        location: payload_str(&hit, "/payload/location"),
                        price: payload_str(&hit, "/payload/price"),
                        rating: payload_str(&hit, "/payload/rating"),
                        season: payload_str(&hit, "/payload/season"),
                    },
                },
                score: score as f32,
                vector,
            });
        }

        Ok(result)
    }
}
