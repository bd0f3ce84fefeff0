//! Pipeline configuration.
//!
//! All tunables live in an explicitly constructed [`RetrievalConfig`] value
//! that is threaded through constructors — there is no process-wide settings
//! singleton. Defaults are compiled in; loading values from files or the
//! environment is the caller's concern.
//!
//! Validation happens once, at pipeline construction, and a violation is
//! fatal: [`ConfigError`] is never retried.
//!
//! ```rust
//! use contextsmith::config::RetrievalConfig;
//!
//! let config = RetrievalConfig::default();
//! assert!(config.validate().is_ok());
//! assert_eq!(config.chunking.chunk_size, 1000);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::{K_MAX, K_MIN};

/// Tolerance when checking that the search weights sum to 1.0.
const WEIGHT_SUM_TOLERANCE: f32 = 1e-3;

// ── ConfigError ────────────────────────────────────────────────────────

/// A configuration violation, fatal at construction.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Overlap must leave a positive stride between windows.
    #[error("chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})")]
    ChunkSizing {
        /// Configured window size.
        chunk_size: usize,
        /// Configured window overlap.
        chunk_overlap: usize,
    },

    /// The window size must respect the configured bounds.
    #[error("chunk_size ({chunk_size}) must lie within [{min_chunk_size}, {max_chunk_size}]")]
    ChunkBounds {
        /// Configured window size.
        chunk_size: usize,
        /// Smallest permitted chunk.
        min_chunk_size: usize,
        /// Largest permitted chunk.
        max_chunk_size: usize,
    },

    /// The duplicate threshold is a cosine similarity and must be in [0, 1].
    #[error("duplicate_threshold ({value}) must lie within [0.0, 1.0]")]
    Threshold {
        /// The rejected value.
        value: f32,
    },

    /// Semantic and keyword search weights must sum to 1.0.
    #[error("search weights must sum to 1.0, got {total}")]
    SearchWeights {
        /// The rejected sum.
        total: f32,
    },

    /// The default result count must itself be a valid `k`.
    #[error("default_k ({default_k}) must lie within [{min}, {max}]")]
    DefaultK {
        /// The rejected default.
        default_k: usize,
        /// Lower bound on `k`.
        min: usize,
        /// Upper bound on `k`.
        max: usize,
    },
}

// ── Section configs ────────────────────────────────────────────────────

/// Windowing parameters for the ingestion chunker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Window size in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive windows in characters.
    pub chunk_overlap: usize,
    /// Minimum size of the final window when more than one is produced.
    pub min_chunk_size: usize,
    /// Upper bound on `chunk_size`.
    pub max_chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            min_chunk_size: 100,
            max_chunk_size: 2000,
        }
    }
}

impl ChunkingConfig {
    /// Distance between consecutive window starts.
    ///
    /// Only meaningful on a validated config, where it is positive.
    #[must_use]
    pub fn stride(&self) -> usize {
        self.chunk_size.saturating_sub(self.chunk_overlap)
    }

    /// Checks the windowing preconditions.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ChunkSizing`] when the overlap is not smaller than the
    /// window, [`ConfigError::ChunkBounds`] when the window size falls
    /// outside `[min_chunk_size, max_chunk_size]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::ChunkSizing {
                chunk_size: self.chunk_size,
                chunk_overlap: self.chunk_overlap,
            });
        }
        if self.chunk_size < self.min_chunk_size || self.chunk_size > self.max_chunk_size {
            return Err(ConfigError::ChunkBounds {
                chunk_size: self.chunk_size,
                min_chunk_size: self.min_chunk_size,
                max_chunk_size: self.max_chunk_size,
            });
        }
        Ok(())
    }
}

/// Similarity-search parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Result count used when a request does not specify one.
    pub default_k: usize,
    /// Upper bound on a single vector-engine call; a hung engine surfaces
    /// as a failure instead of stalling the pipeline.
    pub engine_timeout: Duration,
    /// Weight of the semantic (vector) signal in hybrid scoring.
    pub semantic_weight: f32,
    /// Weight of the keyword signal in hybrid scoring.
    pub keyword_weight: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_k: 5,
            engine_timeout: Duration::from_secs(30),
            semantic_weight: 0.7,
            keyword_weight: 0.3,
        }
    }
}

impl SearchConfig {
    /// Checks weight and default-k invariants.
    ///
    /// # Errors
    ///
    /// [`ConfigError::SearchWeights`] when the weights do not sum to 1.0,
    /// [`ConfigError::DefaultK`] when the default result count is not a
    /// valid `k`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let total = self.semantic_weight + self.keyword_weight;
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::SearchWeights { total });
        }
        if self.default_k < K_MIN || self.default_k > K_MAX {
            return Err(ConfigError::DefaultK {
                default_k: self.default_k,
                min: K_MIN,
                max: K_MAX,
            });
        }
        Ok(())
    }
}

/// Near-duplicate detection parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Cosine similarity above which two candidates are duplicates.
    pub duplicate_threshold: f32,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            duplicate_threshold: 0.8,
        }
    }
}

impl DedupConfig {
    /// Checks that the threshold is a valid cosine similarity.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Threshold`] when the value is outside `[0.0, 1.0]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.duplicate_threshold) {
            return Err(ConfigError::Threshold {
                value: self.duplicate_threshold,
            });
        }
        Ok(())
    }
}

/// Context assembly parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Character budget for the assembled context block.
    pub max_context_chars: usize,
    /// When `true`, the pipeline trims the assembled context to the budget
    /// before handing it back; when `false`, the caller enforces its own
    /// policy against the exposed length.
    pub enforce_budget: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_context_chars: 4000,
            enforce_budget: false,
        }
    }
}

// ── RetrievalConfig ────────────────────────────────────────────────────

/// Aggregate configuration for the retrieval pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Ingestion windowing.
    pub chunking: ChunkingConfig,
    /// Similarity search.
    pub search: SearchConfig,
    /// Near-duplicate removal.
    pub dedup: DedupConfig,
    /// Context assembly.
    pub context: ContextConfig,
}

impl RetrievalConfig {
    /// Validates every section.
    ///
    /// # Errors
    ///
    /// The first [`ConfigError`] encountered, checking chunking, search,
    /// then dedup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chunking.validate()?;
        self.search.validate()?;
        self.dedup.validate()?;
        Ok(())
    }
}
