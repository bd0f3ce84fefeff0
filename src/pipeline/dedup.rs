//! Near-duplicate removal.
//!
//! Overlapping windows and paraphrased passages can carry the same
//! semantic content; this stage drops the repeats before any context
//! budget is spent on them.
//!
//! The policy is deliberately pairwise, not transitive: the full n×n
//! cosine-similarity matrix is computed over the candidates' embedding
//! vectors, and for every unordered pair `(i, j)` with `i < j` whose
//! similarity exceeds the threshold, the later-indexed member `j` is
//! marked redundant. Chains of near-duplicates are resolved pair by pair —
//! `A ≈ M` and `M ≈ B` with `A ≉ B` drops `M`'s later-indexed partners but
//! never merges the three into a cluster. Re-running the stage on its own
//! output removes nothing further.
//!
//! At `n ≤ 50` candidates the O(n²) comparison cost sits comfortably
//! inside interactive latency, so the matrix is computed sequentially.

use crate::config::DedupConfig;
use crate::embeddings::cosine_similarity;
use crate::schema::SearchResponse;
use crate::stores::ChunkStore;
use crate::types::RetrievalError;

/// Removes near-duplicate candidates from a response.
#[derive(Debug, Clone)]
pub struct Deduplicator {
    threshold: f32,
}

impl Deduplicator {
    /// Creates a deduplicator from its config section.
    #[must_use]
    pub fn new(config: &DedupConfig) -> Self {
        Self {
            threshold: config.duplicate_threshold,
        }
    }

    /// The active similarity threshold.
    #[must_use]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Filters near-duplicates out of `response`, preserving relative
    /// order and updating `total_found`.
    ///
    /// An empty response short-circuits without touching the store. A
    /// missing vector or an incomparable pair is an operation failure,
    /// distinct from the empty-input success.
    ///
    /// # Errors
    ///
    /// [`RetrievalError::Operation`] when the embedding fetch fails, a
    /// candidate has no stored vector, or two vectors cannot be compared.
    pub async fn run(
        &self,
        store: &ChunkStore,
        response: SearchResponse,
    ) -> Result<SearchResponse, RetrievalError> {
        if response.is_empty() {
            tracing::debug!("no results to dedupe");
            return Ok(response);
        }

        let ids = response.chunk_ids();
        tracing::debug!(
            doc_count = ids.len(),
            threshold = self.threshold,
            "computing similarity matrix for deduping"
        );

        let vector_map = store.embeddings(&ids).await?;
        let mut vectors: Vec<&[f32]> = Vec::with_capacity(ids.len());
        for id in &ids {
            let vector = vector_map.get(id).ok_or_else(|| {
                tracing::error!(chunk_id = %id, "candidate has no stored embedding");
                RetrievalError::operation("dedup", "candidate embedding is missing from the store")
            })?;
            vectors.push(vector.as_slice());
        }

        let redundant = self.redundant_indices(&vectors)?;

        let mut response = response;
        if !redundant.is_empty() {
            let mut index = 0;
            response.results.retain(|_| {
                let keep = !redundant[index];
                index += 1;
                keep
            });
            response.total_found = response.results.len();
        }

        tracing::info!(
            removed = redundant.iter().filter(|&&flag| flag).count(),
            remaining = response.total_found,
            "deduping completed"
        );
        Ok(response)
    }

    /// Marks the later-indexed member of every over-threshold pair.
    fn redundant_indices(&self, vectors: &[&[f32]]) -> Result<Vec<bool>, RetrievalError> {
        let n = vectors.len();
        let mut redundant = vec![false; n];
        for i in 0..n {
            for j in (i + 1)..n {
                let similarity = cosine_similarity(vectors[i], vectors[j]).ok_or_else(|| {
                    tracing::error!(
                        left = i,
                        right = j,
                        "candidate embeddings could not be compared"
                    );
                    RetrievalError::operation("dedup", "candidate embeddings are not comparable")
                })?;
                if similarity > f64::from(self.threshold) {
                    redundant[j] = true;
                }
            }
        }
        Ok(redundant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::{EmbeddingProvider, MockEmbeddingProvider};
    use crate::schema::{ChunkMetadata, SearchResult};
    use crate::stores::engine::{EngineRecord, VectorEngine};
    use crate::stores::memory::InMemoryVectorEngine;
    use chrono::Utc;
    use std::sync::Arc;
    use std::time::Duration;

    fn result(id: &str) -> SearchResult {
        SearchResult {
            content: format!("content of {id}"),
            metadata: ChunkMetadata {
                id: id.to_string(),
                source_id: "doc".to_string(),
                chunk_index: 0,
                chunk_size: 10,
                added_at: Utc::now(),
                content_type: None,
            },
            relevance_score: None,
        }
    }

    fn response(ids: &[&str]) -> SearchResponse {
        SearchResponse {
            query: "q".to_string(),
            results: ids.iter().map(|id| result(id)).collect(),
            total_found: ids.len(),
            search_time_ms: 0.0,
        }
    }

    /// Store whose engine holds exactly the given id → vector pairs.
    async fn store_with_vectors(entries: &[(&str, Vec<f32>)]) -> ChunkStore {
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(MockEmbeddingProvider::new());
        let engine = Arc::new(InMemoryVectorEngine::new(embedder.clone()));
        let records: Vec<EngineRecord> = entries
            .iter()
            .map(|(id, vector)| EngineRecord {
                id: (*id).to_string(),
                content: format!("content of {id}"),
                metadata: serde_json::json!({ "source_id": "doc" }),
                vector: vector.clone(),
            })
            .collect();
        engine.add(records).await.unwrap();
        ChunkStore::new(engine, embedder, Duration::from_secs(5))
    }

    fn dedup(threshold: f32) -> Deduplicator {
        Deduplicator::new(&DedupConfig {
            duplicate_threshold: threshold,
        })
    }

    #[tokio::test]
    async fn drops_the_later_member_of_a_duplicate_pair() {
        // a and b point almost the same way; c is orthogonal.
        let store = store_with_vectors(&[
            ("a", vec![1.0, 0.0, 0.0]),
            ("b", vec![0.95, 0.31, 0.0]),
            ("c", vec![0.0, 0.0, 1.0]),
        ])
        .await;

        let deduped = dedup(0.8)
            .run(&store, response(&["a", "b", "c"]))
            .await
            .unwrap();

        assert_eq!(deduped.total_found, 2);
        assert_eq!(deduped.chunk_ids(), vec!["a", "c"]);
    }

    #[tokio::test]
    async fn keep_earliest_survivor_has_the_smaller_index() {
        let store = store_with_vectors(&[
            ("later-dup", vec![1.0, 0.0]),
            ("earlier", vec![0.0, 1.0]),
            ("dup-of-first", vec![0.99, 0.14]),
        ])
        .await;

        let deduped = dedup(0.8)
            .run(&store, response(&["later-dup", "earlier", "dup-of-first"]))
            .await
            .unwrap();

        // "dup-of-first" has the larger index of its pair, so it goes.
        assert_eq!(deduped.chunk_ids(), vec!["later-dup", "earlier"]);
    }

    #[tokio::test]
    async fn dedup_is_idempotent() {
        let store = store_with_vectors(&[
            ("a", vec![1.0, 0.0, 0.0]),
            ("b", vec![0.95, 0.31, 0.0]),
            ("c", vec![0.0, 1.0, 0.0]),
        ])
        .await;
        let stage = dedup(0.8);

        let once = stage.run(&store, response(&["a", "b", "c"])).await.unwrap();
        let twice = stage.run(&store, once.clone()).await.unwrap();

        assert_eq!(once, twice, "second pass must remove nothing");
    }

    #[tokio::test]
    async fn chains_are_resolved_pairwise_not_clustered() {
        // a ≈ m and m ≈ b, but a ≉ b: the middle vector sits between two
        // that are not duplicates of each other.
        let store = store_with_vectors(&[
            ("a", vec![1.0, 0.0]),
            ("b", vec![0.0, 1.0]),
            ("m", vec![0.707, 0.707]),
        ])
        .await;

        let deduped = dedup(0.7)
            .run(&store, response(&["a", "b", "m"]))
            .await
            .unwrap();

        // m is the later index of both pairs, so a and b survive even
        // though each is within threshold of the dropped middle.
        assert_eq!(deduped.chunk_ids(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn empty_response_short_circuits_without_store_access() {
        // A store whose every call would stall: proof the stage never
        // touches it on empty input.
        struct UnreachableEngine;

        #[async_trait::async_trait]
        impl VectorEngine for UnreachableEngine {
            async fn add(
                &self,
                _records: Vec<EngineRecord>,
            ) -> Result<Vec<String>, crate::stores::EngineError> {
                unreachable!("engine must not be called")
            }

            async fn delete_by_ids(
                &self,
                _ids: &[String],
            ) -> Result<usize, crate::stores::EngineError> {
                unreachable!("engine must not be called")
            }

            async fn delete_by_filter(
                &self,
                _filter: &crate::schema::MetadataFilter,
            ) -> Result<usize, crate::stores::EngineError> {
                unreachable!("engine must not be called")
            }

            async fn query(
                &self,
                _text: &str,
                _k: usize,
                _filter: Option<&crate::schema::MetadataFilter>,
            ) -> Result<Vec<crate::stores::EngineHit>, crate::stores::EngineError> {
                unreachable!("engine must not be called")
            }

            async fn vectors_by_ids(
                &self,
                _ids: &[String],
            ) -> Result<std::collections::HashMap<String, Vec<f32>>, crate::stores::EngineError>
            {
                unreachable!("engine must not be called")
            }

            async fn clear(&self) -> Result<(), crate::stores::EngineError> {
                unreachable!("engine must not be called")
            }

            async fn count(&self) -> Result<usize, crate::stores::EngineError> {
                unreachable!("engine must not be called")
            }

            async fn sources(&self) -> Result<Vec<String>, crate::stores::EngineError> {
                unreachable!("engine must not be called")
            }
        }

        let store = ChunkStore::new(
            Arc::new(UnreachableEngine),
            Arc::new(MockEmbeddingProvider::new()),
            Duration::from_secs(5),
        );

        let empty = response(&[]);
        let out = dedup(0.8).run(&store, empty.clone()).await.unwrap();
        assert_eq!(out, empty);
    }

    #[tokio::test]
    async fn missing_embedding_is_an_operation_failure() {
        let store = store_with_vectors(&[("a", vec![1.0, 0.0])]).await;

        let err = dedup(0.8)
            .run(&store, response(&["a", "ghost"]))
            .await
            .unwrap_err();
        assert!(err.is_operation());
    }

    #[tokio::test]
    async fn incomparable_vectors_are_an_operation_failure() {
        let store =
            store_with_vectors(&[("a", vec![1.0, 0.0]), ("b", vec![1.0, 0.0, 0.0])]).await;

        let err = dedup(0.8)
            .run(&store, response(&["a", "b"]))
            .await
            .unwrap_err();
        assert!(err.is_operation());
    }
}
