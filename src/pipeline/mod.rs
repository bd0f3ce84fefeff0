//! The retrieval pipeline.
//!
//! Query-time stages form a strict linear chain with a single failure
//! exit:
//!
//! ```text
//! SearchRequest ──► search ──► Deduplicator ──► rerank ──► SearchResponse
//!                     │             │                           │
//!                     └── failure ──┴──────── failure ──────────┘
//!                                   │
//!                       RetrievalError::Operation
//!
//! SearchResponse ──► ContextAssembler ──► prompt for generation
//! ```
//!
//! Each stage's output is the next stage's sole input; there is no retry
//! or backtracking between stages. The query path performs no writes, so
//! a caller that abandons a request simply drops the future — execution
//! stops at the next stage boundary and nothing needs cleaning up.
//!
//! [`RetrievalPipeline`] is the facade callers hold. It owns the adapter,
//! the chunker, and the stage configuration; everything external — the
//! vector engine and the embedding function — is injected at construction
//! so the whole pipeline runs against fakes in tests.

pub mod context;
pub mod dedup;
pub mod rerank;
pub mod search;

use std::sync::Arc;

use crate::config::{ConfigError, RetrievalConfig};
use crate::embeddings::EmbeddingProvider;
use crate::ingestion::Chunker;
use crate::schema::{
    AddReport, CollectionStats, DeleteReport, IngestRequest, SearchRequest, SearchResponse,
};
use crate::stores::{ChunkStore, VectorEngine};
use crate::types::RetrievalError;

pub use context::{AssembledContext, ContextAssembler};
pub use dedup::Deduplicator;
pub use rerank::rerank;

/// The exposed surface of the retrieval core.
#[derive(Clone)]
pub struct RetrievalPipeline {
    store: ChunkStore,
    chunker: Chunker,
    dedup: Deduplicator,
    assembler: ContextAssembler,
}

impl RetrievalPipeline {
    /// Wires the pipeline against an engine and an embedding provider.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when any config section is invalid; this is
    /// fatal and never retried.
    pub fn new(
        engine: Arc<dyn VectorEngine>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: RetrievalConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let chunker = Chunker::new(config.chunking.clone())?;
        let store = ChunkStore::new(engine, embedder, config.search.engine_timeout);
        Ok(Self {
            store,
            chunker,
            dedup: Deduplicator::new(&config.dedup),
            assembler: ContextAssembler::new(config.context.clone()),
        })
    }

    /// The underlying store adapter, for callers that need direct access.
    #[must_use]
    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    /// Chunks, embeds, and persists a raw document.
    ///
    /// # Errors
    ///
    /// [`RetrievalError::Operation`] when embedding or the engine call
    /// fails; already-applied external mutations are not rolled back.
    pub async fn ingest(
        &self,
        text: &str,
        request: &IngestRequest,
    ) -> Result<AddReport, RetrievalError> {
        let chunks = self.chunker.chunk(text, request);
        self.store.add_chunks(chunks).await
    }

    /// Runs the query-time stages: search, dedup, rerank.
    ///
    /// The request is validated before any stage runs; the engine is never
    /// contacted for a malformed request.
    ///
    /// # Errors
    ///
    /// [`RetrievalError::Validation`] for a malformed request,
    /// [`RetrievalError::Operation`] when a stage fails. On failure the
    /// remaining stages do not run.
    pub async fn search(&self, request: SearchRequest) -> Result<SearchResponse, RetrievalError> {
        request.validate()?;

        let response = search::execute(&self.store, &request).await?;
        let response = self.dedup.run(&self.store, response).await?;
        Ok(rerank(response))
    }

    /// Renders a search response into the generation prompt, honoring the
    /// configured budget policy when enabled.
    #[must_use]
    pub fn build_context(&self, response: &SearchResponse) -> AssembledContext {
        if self.assembler.config().enforce_budget {
            self.assembler.assemble_bounded(response)
        } else {
            self.assembler.assemble(response)
        }
    }

    /// Deletes chunks by id.
    ///
    /// # Errors
    ///
    /// [`RetrievalError::Operation`] when the engine call fails.
    pub async fn delete_by_ids(&self, ids: &[String]) -> Result<DeleteReport, RetrievalError> {
        self.store.delete_by_ids(ids).await
    }

    /// Deletes every chunk ingested from a source document.
    ///
    /// # Errors
    ///
    /// [`RetrievalError::Operation`] when the engine call fails.
    pub async fn delete_by_source(&self, source_id: &str) -> Result<DeleteReport, RetrievalError> {
        self.store.delete_by_source(source_id).await
    }

    /// Removes every chunk in the collection.
    ///
    /// # Errors
    ///
    /// [`RetrievalError::Operation`] when the engine call fails.
    pub async fn clear(&self) -> Result<(), RetrievalError> {
        self.store.clear().await
    }

    /// Snapshot of the backing collection.
    ///
    /// # Errors
    ///
    /// [`RetrievalError::Operation`] when an engine call fails.
    pub async fn stats(&self) -> Result<CollectionStats, RetrievalError> {
        self.store.stats().await
    }
}
