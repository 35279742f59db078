use crate::traits::TextGenerator;
use crate::{GenerationOptions, ServiceError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Non-streaming completion against Ollama's `/api/generate`. No retries and no
/// request timeout: a failure goes straight back to the caller.
pub struct OllamaGenerator {
    client: Client,
    endpoint: Url,
    options: GenerationOptions,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: SamplingOptions,
}

#[derive(Serialize)]
struct SamplingOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaGenerator {
    pub fn new(base_url: &str, options: GenerationOptions) -> Result<Self, ServiceError> {
        Ok(Self {
            client: Client::new(),
            endpoint: Url::parse(base_url)?.join("api/generate")?,
            options,
        })
    }

    pub fn model(&self) -> &str {
        &self.options.model
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, ServiceError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&GenerateRequest {
                model: &self.options.model,
                prompt,
                stream: false,
                options: SamplingOptions {
                    temperature: self.options.temperature,
                    num_predict: self.options.max_tokens,
                },
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::BackendResponse {
                backend: "ollama".to_string(),
                details: format!("{status}: {body}"),
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        Ok(parsed.response)
    }
}

#[cfg(test)]
mod tests {
    use super::OllamaGenerator;
    use crate::traits::TextGenerator;
    use crate::{GenerationOptions, ServiceError};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn generator_sends_fixed_sampling_options() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(json!({
                "model": "gemma3:latest",
                "prompt": "Question:\nGoa",
                "stream": false,
                "options": { "num_predict": 300 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "gemma3:latest",
                "response": "- Visit Palolem beach",
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let generator = OllamaGenerator::new(&server.uri(), GenerationOptions::default())
            .expect("valid url");
        let answer = generator.generate("Question:\nGoa").await.expect("generation");

        assert_eq!(answer, "- Visit Palolem beach");
        assert_eq!(generator.model(), "gemma3:latest");
    }

    #[tokio::test]
    async fn model_failure_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
            .mount(&server)
            .await;

        let generator = OllamaGenerator::new(&server.uri(), GenerationOptions::default())
            .expect("valid url");
        let result = generator.generate("anything").await;

        match result {
            Err(ServiceError::BackendResponse { backend, details }) => {
                assert_eq!(backend, "ollama");
                assert!(details.contains("model not loaded"));
            }
            other => panic!("expected backend error, got {other:?}"),
        }
    }
}
