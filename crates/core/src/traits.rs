use crate::{GeneratedImage, IndexedMatch, RetrievedRecord, ServiceError, TravelDocument};
use async_trait::async_trait;

#[async_trait]
pub trait VectorIndex {
    async fn count_documents(&self) -> Result<u64, ServiceError>;

    async fn index_documents(
        &self,
        documents: &[TravelDocument],
        embeddings: &[Vec<f32>],
    ) -> Result<(), ServiceError>;

    async fn nearest(
        &self,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<IndexedMatch>, ServiceError>;
}

#[async_trait]
pub trait DocumentRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedRecord>, ServiceError>;
}

#[async_trait]
pub trait TextGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, ServiceError>;
}

/// Best-effort source of illustrative images. Implementations swallow their own
/// failures and answer `None`.
#[async_trait]
pub trait ImageSource {
    async fn fetch(&self, query: &str) -> Option<GeneratedImage>;
}
