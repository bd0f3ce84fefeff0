//! Shared fixtures for integration tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use contextsmith::embeddings::{EmbeddingError, EmbeddingProvider};
use contextsmith::schema::MetadataFilter;
use contextsmith::stores::{EngineError, EngineHit, EngineRecord, VectorEngine};

/// Embedding provider that only knows pinned texts.
///
/// Pinning exact vectors makes pairwise similarities in a test scenario
/// explicit instead of emergent: the scenario reads as "these two chunks
/// have cosine similarity 0.85" rather than depending on hash noise.
/// Embedding an unpinned text is an error so typos surface immediately.
pub struct FixtureEmbeddingProvider {
    dimensions: usize,
    pinned: HashMap<String, Vec<f32>>,
}

impl FixtureEmbeddingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            pinned: HashMap::new(),
        }
    }

    #[must_use]
    pub fn pin(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        assert_eq!(vector.len(), self.dimensions, "pinned vector has wrong length");
        self.pinned.insert(text.into(), vector);
        self
    }
}

#[async_trait]
impl EmbeddingProvider for FixtureEmbeddingProvider {
    fn id(&self) -> &str {
        "fixture"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        inputs
            .iter()
            .map(|input| {
                self.pinned
                    .get(input)
                    .cloned()
                    .ok_or_else(|| EmbeddingError::Provider {
                        provider: "fixture".to_string(),
                        reason: format!(
                            "no pinned vector for {:?}…",
                            input.chars().take(40).collect::<String>()
                        ),
                    })
            })
            .collect()
    }
}

/// Engine wrapper counting every query so tests can assert the engine was
/// never contacted.
pub struct CountingEngine {
    inner: Arc<dyn VectorEngine>,
    query_calls: AtomicUsize,
}

impl CountingEngine {
    pub fn new(inner: Arc<dyn VectorEngine>) -> Self {
        Self {
            inner,
            query_calls: AtomicUsize::new(0),
        }
    }

    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VectorEngine for CountingEngine {
    async fn add(&self, records: Vec<EngineRecord>) -> Result<Vec<String>, EngineError> {
        self.inner.add(records).await
    }

    async fn delete_by_ids(&self, ids: &[String]) -> Result<usize, EngineError> {
        self.inner.delete_by_ids(ids).await
    }

    async fn delete_by_filter(&self, filter: &MetadataFilter) -> Result<usize, EngineError> {
        self.inner.delete_by_filter(filter).await
    }

    async fn query(
        &self,
        text: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<EngineHit>, EngineError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.query(text, k, filter).await
    }

    async fn vectors_by_ids(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, Vec<f32>>, EngineError> {
        self.inner.vectors_by_ids(ids).await
    }

    async fn clear(&self) -> Result<(), EngineError> {
        self.inner.clear().await
    }

    async fn count(&self) -> Result<usize, EngineError> {
        self.inner.count().await
    }

    async fn sources(&self) -> Result<Vec<String>, EngineError> {
        self.inner.sources().await
    }
}
