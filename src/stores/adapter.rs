//! The embedding store adapter.
//!
//! [`ChunkStore`] is the single seam between the pipeline and the external
//! world: it embeds chunk text on the write path, forwards every call to
//! the injected [`VectorEngine`] under a timeout, and converts any failure
//! into a [`RetrievalError::Operation`] with a redacted message — full
//! detail goes to the log, not to the caller. No operation ever reports a
//! silent partial success: counts come from what the engine verified, and
//! a failed bulk operation performs no rollback of already-applied
//! external mutations.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::embeddings::EmbeddingProvider;
use crate::schema::{
    AddReport, ChunkMetadata, CollectionStats, DeleteReport, DocumentChunk, MetadataFilter,
};
use crate::types::RetrievalError;

use super::engine::{EngineError, EngineRecord, VectorEngine};

/// A retrieved chunk with its engine-native distance still attached.
///
/// The search stage converts the distance into a relevance score; the
/// adapter does not interpret it.
#[derive(Debug, Clone)]
pub struct ScoredHit {
    /// The chunk's text content.
    pub content: String,
    /// The chunk's metadata, decoded from the engine's opaque form.
    pub metadata: ChunkMetadata,
    /// Cosine distance to the query; smaller means closer.
    pub distance: f32,
}

/// Adapter wrapping the external vector engine and the embedding provider.
#[derive(Clone)]
pub struct ChunkStore {
    engine: Arc<dyn VectorEngine>,
    embedder: Arc<dyn EmbeddingProvider>,
    timeout: Duration,
}

impl ChunkStore {
    /// Creates an adapter with the given engine-call timeout.
    pub fn new(
        engine: Arc<dyn VectorEngine>,
        embedder: Arc<dyn EmbeddingProvider>,
        timeout: Duration,
    ) -> Self {
        Self {
            engine,
            embedder,
            timeout,
        }
    }

    /// The injected embedding provider.
    #[must_use]
    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Runs an engine call under the configured timeout, converting both
    /// engine errors and a hang into a redacted operation failure.
    async fn engine_call<T>(
        &self,
        stage: &'static str,
        call: impl Future<Output = Result<T, EngineError>>,
    ) -> Result<T, RetrievalError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                tracing::error!(stage, error = %err, "vector engine call failed");
                Err(RetrievalError::operation(stage, "vector engine call failed"))
            }
            Err(_) => {
                tracing::error!(
                    stage,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "vector engine call timed out"
                );
                Err(RetrievalError::operation(
                    stage,
                    "vector engine call timed out",
                ))
            }
        }
    }

    /// Embeds and stores a batch of chunks.
    ///
    /// Each chunk's vector is created together with its record; the engine
    /// owns both from then on. An empty batch is a no-op.
    ///
    /// # Errors
    ///
    /// [`RetrievalError::Operation`] when embedding or the engine call
    /// fails; the report then carries zero counts.
    pub async fn add_chunks(&self, chunks: Vec<DocumentChunk>) -> Result<AddReport, RetrievalError> {
        if chunks.is_empty() {
            tracing::debug!("no chunks to add");
            return Ok(AddReport::default());
        }

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.content.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await.map_err(|err| {
            tracing::error!(count = texts.len(), error = %err, "failed to embed chunk batch");
            RetrievalError::operation("ingest", "embedding computation failed")
        })?;
        if vectors.len() != chunks.len() {
            tracing::error!(
                sent = chunks.len(),
                received = vectors.len(),
                "embedding provider returned a mismatched batch"
            );
            return Err(RetrievalError::operation(
                "ingest",
                "embedding computation failed",
            ));
        }

        let mut records = Vec::with_capacity(chunks.len());
        for (chunk, vector) in chunks.into_iter().zip(vectors) {
            let metadata = serde_json::to_value(&chunk.metadata).map_err(|err| {
                tracing::error!(chunk_id = %chunk.metadata.id, error = %err, "failed to encode chunk metadata");
                RetrievalError::operation("ingest", "chunk metadata could not be encoded")
            })?;
            records.push(EngineRecord {
                id: chunk.metadata.id.clone(),
                content: chunk.content,
                metadata,
                vector,
            });
        }

        let ids = self.engine_call("ingest", self.engine.add(records)).await?;
        tracing::info!(added = ids.len(), "added chunks to store");
        Ok(AddReport {
            added: ids.len(),
            ids,
        })
    }

    /// Deletes chunks by id; the report counts what the engine verified.
    ///
    /// # Errors
    ///
    /// [`RetrievalError::Operation`] when the engine call fails.
    pub async fn delete_by_ids(&self, ids: &[String]) -> Result<DeleteReport, RetrievalError> {
        let deleted = self
            .engine_call("delete", self.engine.delete_by_ids(ids))
            .await?;
        tracing::info!(deleted, "deleted chunks by id");
        Ok(DeleteReport { deleted })
    }

    /// Deletes every chunk ingested from the given source document.
    ///
    /// # Errors
    ///
    /// [`RetrievalError::Operation`] when the engine call fails.
    pub async fn delete_by_source(&self, source_id: &str) -> Result<DeleteReport, RetrievalError> {
        let filter = MetadataFilter::by_source(source_id);
        let deleted = self
            .engine_call("delete", self.engine.delete_by_filter(&filter))
            .await?;
        tracing::info!(source_id, deleted, "deleted chunks by source");
        Ok(DeleteReport { deleted })
    }

    /// Runs a nearest-neighbor query, decoding engine hits into typed
    /// chunks with their raw distances.
    ///
    /// # Errors
    ///
    /// [`RetrievalError::Operation`] when the engine call fails or a hit
    /// carries metadata that does not decode.
    pub async fn query(
        &self,
        text: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<ScoredHit>, RetrievalError> {
        let hits = self
            .engine_call("similarity search", self.engine.query(text, k, filter))
            .await?;

        hits.into_iter()
            .map(|hit| {
                let metadata: ChunkMetadata =
                    serde_json::from_value(hit.metadata).map_err(|err| {
                        tracing::error!(chunk_id = %hit.id, error = %err, "engine returned undecodable chunk metadata");
                        RetrievalError::operation(
                            "similarity search",
                            "stored chunk metadata could not be decoded",
                        )
                    })?;
                Ok(ScoredHit {
                    content: hit.content,
                    metadata,
                    distance: hit.distance,
                })
            })
            .collect()
    }

    /// Fetches the embedding vectors for the given chunk ids.
    ///
    /// Absent ids are missing from the map; callers decide whether that is
    /// an error.
    ///
    /// # Errors
    ///
    /// [`RetrievalError::Operation`] when the engine call fails.
    pub async fn embeddings(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, Vec<f32>>, RetrievalError> {
        tracing::debug!(count = ids.len(), "fetching embeddings");
        self.engine_call("embedding fetch", self.engine.vectors_by_ids(ids))
            .await
    }

    /// Removes every chunk in the collection.
    ///
    /// # Errors
    ///
    /// [`RetrievalError::Operation`] when the engine call fails.
    pub async fn clear(&self) -> Result<(), RetrievalError> {
        tracing::warn!("clearing entire collection");
        self.engine_call("clear", self.engine.clear()).await
    }

    /// Snapshot of the backing collection.
    ///
    /// # Errors
    ///
    /// [`RetrievalError::Operation`] when an engine call fails.
    pub async fn stats(&self) -> Result<CollectionStats, RetrievalError> {
        let chunk_count = self.engine_call("stats", self.engine.count()).await?;
        let sources = self.engine_call("stats", self.engine.sources()).await?;
        Ok(CollectionStats {
            chunk_count,
            sources,
            distance_metric: "cosine".to_string(),
            embedder: self.embedder.id().to_string(),
        })
    }
}
