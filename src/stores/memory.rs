//! In-memory reference engine.
//!
//! A brute-force [`VectorEngine`] holding everything in process memory.
//! It exists so the pipeline can run and be tested without a live index;
//! it is not built for large collections.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::embeddings::{EmbeddingProvider, cosine_similarity};
use crate::schema::MetadataFilter;

use super::engine::{EngineError, EngineHit, EngineRecord, VectorEngine};

/// Brute-force in-memory vector engine.
///
/// Queries embed the query text through the injected provider, score every
/// stored record by cosine distance, and return the `k` closest. All
/// mutation goes through an internal `RwLock`; the engine is safe to share
/// across tasks.
pub struct InMemoryVectorEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    records: RwLock<Vec<EngineRecord>>,
}

impl InMemoryVectorEngine {
    /// Creates an empty engine embedding queries through `embedder`.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedder,
            records: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl VectorEngine for InMemoryVectorEngine {
    async fn add(&self, records: Vec<EngineRecord>) -> Result<Vec<String>, EngineError> {
        let ids: Vec<String> = records.iter().map(|record| record.id.clone()).collect();
        self.records.write().extend(records);
        Ok(ids)
    }

    async fn delete_by_ids(&self, ids: &[String]) -> Result<usize, EngineError> {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|record| !ids.contains(&record.id));
        Ok(before - records.len())
    }

    async fn delete_by_filter(&self, filter: &MetadataFilter) -> Result<usize, EngineError> {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|record| !filter.matches_value(&record.metadata));
        Ok(before - records.len())
    }

    async fn query(
        &self,
        text: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<EngineHit>, EngineError> {
        let query_vector =
            self.embedder
                .embed(text)
                .await
                .map_err(|err| EngineError::Backend {
                    reason: err.to_string(),
                })?;

        let records = self.records.read();
        let mut hits: Vec<EngineHit> = Vec::new();
        for record in records.iter() {
            if let Some(filter) = filter {
                if !filter.matches_value(&record.metadata) {
                    continue;
                }
            }
            let similarity = cosine_similarity(&query_vector, &record.vector).ok_or_else(|| {
                EngineError::Backend {
                    reason: format!(
                        "stored vector for '{}' is not comparable to the query vector",
                        record.id
                    ),
                }
            })?;
            hits.push(EngineHit {
                id: record.id.clone(),
                content: record.content.clone(),
                metadata: record.metadata.clone(),
                distance: (1.0 - similarity) as f32,
            });
        }

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(hits)
    }

    async fn vectors_by_ids(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, Vec<f32>>, EngineError> {
        let records = self.records.read();
        Ok(records
            .iter()
            .filter(|record| ids.contains(&record.id))
            .map(|record| (record.id.clone(), record.vector.clone()))
            .collect())
    }

    async fn clear(&self) -> Result<(), EngineError> {
        self.records.write().clear();
        Ok(())
    }

    async fn count(&self) -> Result<usize, EngineError> {
        Ok(self.records.read().len())
    }

    async fn sources(&self) -> Result<Vec<String>, EngineError> {
        let records = self.records.read();
        let mut sources: Vec<String> = records
            .iter()
            .filter_map(|record| {
                record
                    .metadata
                    .get("source_id")
                    .and_then(|value| value.as_str())
                    .map(str::to_string)
            })
            .collect();
        sources.sort_unstable();
        sources.dedup();
        Ok(sources)
    }
}
