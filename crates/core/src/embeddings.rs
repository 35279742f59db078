use crate::ServiceError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_EMBEDDING_MODEL: &str = "mxbai-embed-large";

/// Output width of `mxbai-embed-large`.
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1024;

#[async_trait]
pub trait Embedder {
    fn dimensions(&self) -> usize;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ServiceError>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ServiceError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors.pop().ok_or_else(|| ServiceError::BackendResponse {
            backend: "embedder".to_string(),
            details: "no embedding returned for query".to_string(),
        })
    }
}

/// Embeddings served by an Ollama instance through `/api/embed`.
pub struct OllamaEmbedder {
    client: Client,
    endpoint: Url,
    model: String,
    dimensions: usize,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedder {
    pub fn new(
        base_url: &str,
        model: impl Into<String>,
        dimensions: usize,
    ) -> Result<Self, ServiceError> {
        Ok(Self {
            client: Client::new(),
            endpoint: Url::parse(base_url)?.join("api/embed")?,
            model: model.into(),
            dimensions,
        })
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ServiceError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&EmbedRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::BackendResponse {
                backend: "ollama".to_string(),
                details: response.status().to_string(),
            });
        }

        let parsed: EmbedResponse = response.json().await?;
        if parsed.embeddings.len() != texts.len() {
            return Err(ServiceError::BackendResponse {
                backend: "ollama".to_string(),
                details: format!(
                    "expected {} embeddings, got {}",
                    texts.len(),
                    parsed.embeddings.len()
                ),
            });
        }

        Ok(parsed.embeddings)
    }
}

/// Offline embedder hashing character trigrams into a fixed number of buckets.
/// Lets the assistant run without an embedding service.
#[derive(Debug, Clone, Copy)]
pub struct HashingEmbedder {
    pub dimensions: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self { dimensions: 128 }
    }
}

impl HashingEmbedder {
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.dimensions.max(1)];
        let lowered = text.to_lowercase();
        let chars: Vec<char> = lowered.chars().collect();

        for window in chars.windows(3) {
            let mut hash = 1469598103934665603u64;
            for ch in window {
                let mut buffer = [0u8; 4];
                for byte in ch.encode_utf8(&mut buffer).bytes() {
                    hash ^= byte as u64;
                    hash = hash.wrapping_mul(1099511628211);
                }
            }
            let bucket = (hash % vector.len() as u64) as usize;
            vector[bucket] += 1.0;
        }

        let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }

        vector
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ServiceError> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}

/// Embedding backend picked at startup.
pub enum EmbeddingClient {
    Ollama(OllamaEmbedder),
    Hashing(HashingEmbedder),
}

#[async_trait]
impl Embedder for EmbeddingClient {
    fn dimensions(&self) -> usize {
        match self {
            Self::Ollama(embedder) => embedder.dimensions(),
            Self::Hashing(embedder) => embedder.dimensions(),
        }
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ServiceError> {
        match self {
            Self::Ollama(embedder) => embedder.embed_batch(texts).await,
            Self::Hashing(embedder) => embedder.embed_batch(texts).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Embedder, HashingEmbedder, OllamaEmbedder};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn hashing_embedder_is_deterministic() {
        let embedder = HashingEmbedder::default();
        let first = embedder.embed_text("Beach resorts in Goa");
        let second = embedder.embed_text("Beach resorts in Goa");
        assert_eq!(first, second);
    }

    #[test]
    fn hashing_embedder_outputs_expected_length() {
        let embedder = HashingEmbedder { dimensions: 32 };
        assert_eq!(embedder.embed_text("abc").len(), 32);
        assert_eq!(embedder.embed_text("").len(), 32);
    }

    #[tokio::test]
    async fn ollama_embedder_posts_model_and_inputs() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .and(body_partial_json(json!({
                "model": "mxbai-embed-large",
                "input": ["Goa", "Manali"],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "mxbai-embed-large",
                "embeddings": [[0.1, 0.2], [0.3, 0.4]],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let embedder = OllamaEmbedder::new(&server.uri(), "mxbai-embed-large", 2)
            .expect("valid url");
        let vectors = embedder
            .embed_batch(&["Goa".to_string(), "Manali".to_string()])
            .await
            .expect("embedding should succeed");

        assert_eq!(vectors, vec![vec![0.1, 0.2], vec![0.3, 0.4]]);
    }

    #[tokio::test]
    async fn ollama_embedder_rejects_short_responses() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "embeddings": [[0.1, 0.2]],
            })))
            .mount(&server)
            .await;

        let embedder = OllamaEmbedder::new(&server.uri(), "mxbai-embed-large", 2)
            .expect("valid url");
        let result = embedder
            .embed_batch(&["Goa".to_string(), "Manali".to_string()])
            .await;

        assert!(result.is_err());
    }
}
