use crate::embeddings::Embedder;
use crate::traits::VectorIndex;
use crate::{IngestionOptions, ServiceError, TravelDocument};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionReport {
    pub existing: u64,
    pub inserted: usize,
    pub batches: usize,
    pub skipped: bool,
}

/// Pushes `documents` into the index in file order, one batch per call, but only
/// when the index holds no records yet. A populated index is left untouched even
/// if the dataset changed since it was filled.
pub async fn ingest_if_empty<V, E>(
    index: &V,
    embedder: &E,
    documents: &[TravelDocument],
    options: &IngestionOptions,
) -> Result<IngestionReport, ServiceError>
where
    V: VectorIndex + Sync,
    E: Embedder + Sync,
{
    if options.batch_size == 0 {
        return Err(ServiceError::InvalidArgument(
            "batch size must be positive".to_string(),
        ));
    }

    let existing = index.count_documents().await?;
    info!(existing, "documents already in vector index");

    if existing > 0 {
        info!("using existing vector index, no re-ingestion needed");
        return Ok(IngestionReport {
            existing,
            inserted: 0,
            batches: 0,
            skipped: true,
        });
    }

    let mut inserted = 0usize;
    let mut batches = 0usize;

    for batch in documents.chunks(options.batch_size) {
        let texts: Vec<String> = batch.iter().map(|doc| doc.content.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;
        index.index_documents(batch, &embeddings).await?;

        info!(from = inserted, to = inserted + batch.len(), "inserted batch");
        inserted += batch.len();
        batches += 1;
    }

    info!(inserted, batches, "vector index populated");

    Ok(IngestionReport {
        existing,
        inserted,
        batches,
        skipped: false,
    })
}
