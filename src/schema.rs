//! Data model shared across the pipeline stages.
//!
//! A [`DocumentChunk`] is the atomic unit of storage and retrieval: a
//! bounded text window plus its [`ChunkMetadata`]. Chunks are immutable once
//! created and live in the external vector engine together with their
//! embedding vectors.
//!
//! A query flows through the stages as a [`SearchResponse`]; every stage
//! returns a transformed response whose result list only shrinks (dedup) or
//! reorders (rerank), never grows, and whose `total_found` always equals the
//! list length.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::RetrievalError;

/// Smallest permitted result count for a search request.
pub const K_MIN: usize = 1;
/// Largest permitted result count for a search request.
pub const K_MAX: usize = 50;
/// Result count used by [`SearchRequest::new`].
pub const K_DEFAULT: usize = 5;

// ── Chunks ─────────────────────────────────────────────────────────────

/// Metadata attached to every stored chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Unique identifier, generated at ingestion.
    pub id: String,
    /// Identifier of the source document this chunk was cut from.
    pub source_id: String,
    /// Zero-based position of the chunk within its source.
    pub chunk_index: usize,
    /// Chunk length in characters.
    pub chunk_size: usize,
    /// Ingestion timestamp.
    pub added_at: DateTime<Utc>,
    /// Media type of the source, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// A bounded text window derived from a source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// The window's text content.
    pub content: String,
    /// Metadata tagged by the chunker.
    pub metadata: ChunkMetadata,
}

/// Per-document parameters for an ingestion call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRequest {
    /// Identifier the chunks will carry as their source.
    pub source_id: String,
    /// Media type recorded on each chunk, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl IngestRequest {
    /// Creates a request for the given source identifier.
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            content_type: None,
        }
    }

    /// Records the source's media type on every produced chunk.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

// ── Filters ────────────────────────────────────────────────────────────

/// Structured filter over chunk metadata.
///
/// Set fields are ANDed together; an empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataFilter {
    /// Match chunks from this source document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    /// Match chunks with this media type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl MetadataFilter {
    /// Filter on a single source document.
    pub fn by_source(source_id: impl Into<String>) -> Self {
        Self {
            source_id: Some(source_id.into()),
            content_type: None,
        }
    }

    /// Returns `true` when no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.source_id.is_none() && self.content_type.is_none()
    }

    /// Evaluates the filter against typed metadata.
    #[must_use]
    pub fn matches(&self, metadata: &ChunkMetadata) -> bool {
        if let Some(source_id) = &self.source_id {
            if metadata.source_id != *source_id {
                return false;
            }
        }
        if let Some(content_type) = &self.content_type {
            if metadata.content_type.as_deref() != Some(content_type.as_str()) {
                return false;
            }
        }
        true
    }

    /// Evaluates the filter against the opaque JSON form engines store.
    #[must_use]
    pub fn matches_value(&self, metadata: &serde_json::Value) -> bool {
        if let Some(source_id) = &self.source_id {
            if metadata.get("source_id").and_then(|v| v.as_str()) != Some(source_id.as_str()) {
                return false;
            }
        }
        if let Some(content_type) = &self.content_type {
            if metadata.get("content_type").and_then(|v| v.as_str())
                != Some(content_type.as_str())
            {
                return false;
            }
        }
        true
    }
}

// ── Search ─────────────────────────────────────────────────────────────

/// A similarity-search request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// The query text.
    pub query: String,
    /// Number of candidates to retrieve, within `[K_MIN, K_MAX]`.
    pub k: usize,
    /// Optional metadata restriction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<MetadataFilter>,
    /// When `false`, results carry no relevance scores.
    pub include_scores: bool,
}

impl SearchRequest {
    /// Creates a request with `k = K_DEFAULT` and no filter.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            k: K_DEFAULT,
            filter: None,
            include_scores: false,
        }
    }

    /// Sets the candidate count.
    #[must_use]
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Restricts candidates by metadata.
    #[must_use]
    pub fn with_filter(mut self, filter: MetadataFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Requests relevance scores on the results.
    #[must_use]
    pub fn with_scores(mut self) -> Self {
        self.include_scores = true;
        self
    }

    /// Rejects malformed requests before any stage runs.
    ///
    /// # Errors
    ///
    /// [`RetrievalError::Validation`] when `k` falls outside
    /// `[K_MIN, K_MAX]` or the query text is blank.
    pub fn validate(&self) -> Result<(), RetrievalError> {
        if self.k < K_MIN || self.k > K_MAX {
            return Err(RetrievalError::validation(format!(
                "k must lie within [{K_MIN}, {K_MAX}], got {}",
                self.k
            )));
        }
        if self.query.trim().is_empty() {
            return Err(RetrievalError::validation("query text is empty"));
        }
        Ok(())
    }
}

/// A single retrieved fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// The chunk's text content.
    pub content: String,
    /// The chunk's metadata.
    pub metadata: ChunkMetadata,
    /// Normalized relevance, higher meaning closer; present on all results
    /// of a response or on none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f32>,
}

/// The transient, request-scoped result of a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// The query that produced these results.
    pub query: String,
    /// Retrieved fragments, in ranking order.
    pub results: Vec<SearchResult>,
    /// Always equals `results.len()`.
    pub total_found: usize,
    /// Wall-clock duration of the engine call, in milliseconds.
    pub search_time_ms: f64,
}

impl SearchResponse {
    /// Returns `true` when the response holds no results.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Chunk ids in current result order.
    #[must_use]
    pub fn chunk_ids(&self) -> Vec<String> {
        self.results
            .iter()
            .map(|result| result.metadata.id.clone())
            .collect()
    }
}

// ── Operation reports ──────────────────────────────────────────────────

/// Outcome of a bulk add.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddReport {
    /// Number of chunks the engine verified as stored.
    pub added: usize,
    /// Ids of the stored chunks, in input order.
    pub ids: Vec<String>,
}

/// Outcome of a delete operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteReport {
    /// Number of chunks the engine verified as removed.
    pub deleted: usize,
}

/// Snapshot of the backing collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionStats {
    /// Total stored chunks.
    pub chunk_count: usize,
    /// Distinct source identifiers.
    pub sources: Vec<String>,
    /// Distance metric of the backing engine.
    pub distance_metric: String,
    /// Identifier of the embedding provider.
    pub embedder: String,
}
