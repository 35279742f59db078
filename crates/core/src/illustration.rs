use crate::traits::ImageSource;
use crate::GeneratedImage;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_IMAGE_ENDPOINT: &str = "https://image.pollinations.ai/prompt";
pub const DEFAULT_IMAGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Text-to-image lookups against a Pollinations-style endpoint, where the prompt
/// is the last path segment.
pub struct PollinationsClient {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl Default for PollinationsClient {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE_ENDPOINT, DEFAULT_IMAGE_TIMEOUT)
    }
}

impl PollinationsClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn image_url(&self, query: &str) -> String {
        format!("{}/{}", self.endpoint, urlencoding::encode(query))
    }

    async fn try_fetch(&self, url: &str) -> Result<Option<GeneratedImage>, reqwest::Error> {
        let response = self.client.get(url).timeout(self.timeout).send().await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if response.status() != StatusCode::OK || !content_type.contains("image") {
            debug!(status = %response.status(), content_type = %content_type, "no usable image");
            return Ok(None);
        }

        let bytes = response.bytes().await?;
        if let Err(error) = image::load_from_memory(&bytes) {
            debug!(content_type = %content_type, error = %error, "image body does not decode");
            return Ok(None);
        }

        Ok(Some(GeneratedImage {
            content_type,
            bytes: bytes.to_vec(),
        }))
    }
}

#[async_trait]
impl ImageSource for PollinationsClient {
    async fn fetch(&self, query: &str) -> Option<GeneratedImage> {
        let url = self.image_url(query);
        match self.try_fetch(&url).await {
            Ok(image) => image,
            Err(error) => {
                warn!(error = %error, "image fetch failed");
                None
            }
        }
    }
}
