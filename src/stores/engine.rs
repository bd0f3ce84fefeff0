//! The consumed vector-engine contract.
//!
//! Everything the crate needs from a nearest-neighbor engine, and nothing
//! more: add, delete, query, fetch vectors, wipe, plus the two read-only
//! calls the collection stats are built from. Engines rank however they
//! like internally; the contract only fixes the shape of what crosses the
//! boundary.
//!
//! Distances follow the cosine convention: smaller means closer. The
//! search stage owns the conversion into a higher-is-better relevance
//! score.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::MetadataFilter;

/// A failure reported by the backing engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine could not be reached.
    #[error("vector engine unavailable: {reason}")]
    Unavailable {
        /// Human-readable reason.
        reason: String,
    },

    /// The engine rejected or failed the request.
    #[error("vector engine backend error: {reason}")]
    Backend {
        /// Human-readable reason.
        reason: String,
    },
}

/// A chunk as the engine stores it: text, opaque metadata, and its vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineRecord {
    /// Unique chunk identifier.
    pub id: String,
    /// The chunk's text content.
    pub content: String,
    /// Chunk metadata, opaque to the engine.
    pub metadata: serde_json::Value,
    /// The chunk's embedding vector, co-lifecycled with the record.
    pub vector: Vec<f32>,
}

/// A ranked candidate returned by [`VectorEngine::query`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineHit {
    /// Unique chunk identifier.
    pub id: String,
    /// The chunk's text content.
    pub content: String,
    /// Chunk metadata, opaque to the engine.
    pub metadata: serde_json::Value,
    /// Cosine distance to the query; smaller means closer.
    pub distance: f32,
}

/// The add/delete/query contract of the externally owned vector index.
///
/// Implementations are responsible for their own concurrency safety; the
/// pipeline only ever calls through a shared reference.
#[async_trait]
pub trait VectorEngine: Send + Sync {
    /// Stores records with their vectors, returning the stored ids in
    /// input order.
    async fn add(&self, records: Vec<EngineRecord>) -> Result<Vec<String>, EngineError>;

    /// Removes the records with the given ids, returning how many existed.
    async fn delete_by_ids(&self, ids: &[String]) -> Result<usize, EngineError>;

    /// Removes every record whose metadata matches the filter, returning
    /// how many were removed.
    async fn delete_by_filter(&self, filter: &MetadataFilter) -> Result<usize, EngineError>;

    /// Returns up to `k` candidates ranked closest-first.
    async fn query(
        &self,
        text: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<EngineHit>, EngineError>;

    /// Fetches the stored vectors for the given ids; absent ids are simply
    /// missing from the returned map.
    async fn vectors_by_ids(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, Vec<f32>>, EngineError>;

    /// Removes every record in the collection.
    async fn clear(&self) -> Result<(), EngineError>;

    /// Total number of stored records.
    async fn count(&self) -> Result<usize, EngineError>;

    /// Distinct source identifiers present in the collection.
    async fn sources(&self) -> Result<Vec<String>, EngineError>;
}
