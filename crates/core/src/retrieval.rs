use crate::embeddings::Embedder;
use crate::mmr;
use crate::traits::{DocumentRetriever, VectorIndex};
use crate::{RetrievalOptions, RetrievedRecord, ServiceError};
use async_trait::async_trait;
use tracing::debug;

/// Short queries are usually greetings or commands; only longer ones pay for a lookup.
pub fn should_retrieve(query: &str, min_words: usize) -> bool {
    query.split_whitespace().count() >= min_words
}

pub struct Retriever<V, E> {
    index: V,
    embedder: E,
    options: RetrievalOptions,
}

impl<V, E> Retriever<V, E>
where
    V: VectorIndex + Send + Sync,
    E: Embedder + Send + Sync,
{
    pub fn new(index: V, embedder: E, options: RetrievalOptions) -> Self {
        Self {
            index,
            embedder,
            options,
        }
    }

    pub fn index(&self) -> &V {
        &self.index
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }
}

#[async_trait]
impl<V, E> DocumentRetriever for Retriever<V, E>
where
    V: VectorIndex + Send + Sync,
    E: Embedder + Send + Sync,
{
    async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedRecord>, ServiceError> {
        if query.trim().is_empty() {
            return Err(ServiceError::Request("query is empty".to_string()));
        }

        let query_vector = self.embedder.embed(query).await?;
        let fetch_k = self.options.fetch_k.max(self.options.k);
        let candidates = self.index.nearest(&query_vector, fetch_k).await?;

        let vectors: Vec<Vec<f32>> = candidates.iter().map(|hit| hit.vector.clone()).collect();
        let picked = mmr::select(&query_vector, &vectors, self.options.k, self.options.lambda);
        debug!(candidates = candidates.len(), picked = picked.len(), "mmr selection");

        Ok(picked
            .into_iter()
            .filter_map(|position| candidates.get(position))
            .map(|hit| RetrievedRecord {
                document: hit.document.clone(),
                score: hit.score,
            })
            .collect())
    }
}
