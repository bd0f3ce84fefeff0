//! The embedding seam.
//!
//! Text-to-vector conversion is an external capability: the pipeline only
//! ever sees it through the [`EmbeddingProvider`] trait, so tests and demos
//! run against the deterministic [`MockEmbeddingProvider`] instead of a live
//! model endpoint.

use std::hash::{DefaultHasher, Hash, Hasher};

use async_trait::async_trait;
use thiserror::Error;

/// An error from the embedding capability.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The provider could not produce embeddings.
    #[error("embedding provider '{provider}' failed: {reason}")]
    Provider {
        /// Provider identifier.
        provider: String,
        /// Human-readable reason.
        reason: String,
    },

    /// The provider returned a different number of vectors than requested.
    #[error("embedding batch size mismatch: sent {sent}, received {received}")]
    BatchMismatch {
        /// Inputs sent.
        sent: usize,
        /// Vectors received.
        received: usize,
    },
}

/// Converts text into fixed-length embedding vectors.
///
/// Implementations must be pure: the same input always yields the same
/// vector, and every vector has exactly [`dimensions`](Self::dimensions)
/// components.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Identifier used in stats and diagnostics (e.g. `"mock"`).
    fn id(&self) -> &str;

    /// Length of every produced vector.
    fn dimensions(&self) -> usize;

    /// Embeds a batch of inputs, preserving order.
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddingError`] when the provider cannot complete.
    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embeds a single input.
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddingError`] when the provider cannot complete.
    async fn embed(&self, input: &str) -> Result<Vec<f32>, EmbeddingError> {
        let inputs = [input.to_string()];
        let mut vectors = self.embed_batch(&inputs).await?;
        vectors.pop().ok_or(EmbeddingError::BatchMismatch {
            sent: 1,
            received: 0,
        })
    }
}

// ── Vector geometry ────────────────────────────────────────────────────

/// Cosine similarity between two vectors.
///
/// Accumulates in `f64` for stability. Returns `None` when the vectors
/// cannot be compared: mismatched lengths, empty input, or a zero-norm
/// vector.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let x64 = f64::from(x);
        let y64 = f64::from(y);
        dot += x64 * y64;
        norm_a += x64 * x64;
        norm_b += y64 * y64;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom <= f64::EPSILON {
        return None;
    }
    Some(dot / denom)
}

// ── Mock provider ──────────────────────────────────────────────────────

/// Deterministic, hash-seeded provider for tests and offline runs.
///
/// Identical text always yields the identical unit vector; different text
/// yields a different one with overwhelming probability. The vectors carry
/// no semantic signal — they only satisfy the provider contract.
#[derive(Debug, Clone)]
pub struct MockEmbeddingProvider {
    dimensions: usize,
}

impl MockEmbeddingProvider {
    /// Default vector length for the mock.
    pub const DEFAULT_DIMENSIONS: usize = 32;

    /// Creates a provider producing 32-dimensional vectors.
    #[must_use]
    pub fn new() -> Self {
        Self::with_dimensions(Self::DEFAULT_DIMENSIONS)
    }

    /// Creates a provider with a custom vector length.
    #[must_use]
    pub fn with_dimensions(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn vector_for(&self, input: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        input.hash(&mut hasher);
        // xorshift over the hash gives a stable pseudo-random fill.
        let mut state = hasher.finish() | 1;
        let mut vector = Vec::with_capacity(self.dimensions);
        for _ in 0..self.dimensions {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let unit = (state >> 11) as f32 / (1u64 << 53) as f32;
            vector.push(unit * 2.0 - 1.0);
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    fn id(&self) -> &str {
        "mock"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(inputs.iter().map(|input| self.vector_for(input)).collect())
    }
}
