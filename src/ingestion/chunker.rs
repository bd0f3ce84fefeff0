//! Deterministic sliding-window chunker.
//!
//! The chunker cuts text into overlapping fixed-size windows measured in
//! characters (Unicode scalar values). Window boundaries are a pure function
//! of the input text and the [`ChunkingConfig`]: identical input always
//! yields identical boundaries.
//!
//! For text of length `L` with window size `S` and overlap `O` (`O < S`),
//! window `i + 1` starts `S − O` characters after window `i`, every window
//! is at most `S` characters, and the chunk count is
//! `ceil((L − O) / (S − O))`. The final window may be shorter than `S`; when
//! it would fall below `min_chunk_size` (only possible when the overlap is
//! smaller than the minimum) it is widened backward, trading a larger
//! overlap with its predecessor for the minimum length.

use chrono::Utc;
use uuid::Uuid;

use crate::config::{ChunkingConfig, ConfigError};
use crate::schema::{ChunkMetadata, DocumentChunk, IngestRequest};

/// Splits raw text into overlapping windows and tags them with metadata.
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    /// Creates a chunker, validating the windowing preconditions.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `chunk_overlap >= chunk_size` or the
    /// window size falls outside its configured bounds.
    pub fn new(config: ChunkingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The active windowing configuration.
    #[must_use]
    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Cuts text into windows without tagging metadata.
    ///
    /// Empty text yields no windows.
    #[must_use]
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        if total == 0 {
            return Vec::new();
        }

        let size = self.config.chunk_size;
        let stride = self.config.stride();

        let mut windows: Vec<(usize, usize)> = Vec::new();
        let mut start = 0;
        loop {
            let end = usize::min(start + size, total);
            windows.push((start, end));
            if end == total {
                break;
            }
            start += stride;
        }

        // A runt final window is widened backward to the minimum length;
        // only its overlap with the predecessor grows.
        if windows.len() > 1 {
            let (last_start, last_end) = windows[windows.len() - 1];
            if last_end - last_start < self.config.min_chunk_size {
                let prev_start = windows[windows.len() - 2].0;
                let widened = last_end
                    .saturating_sub(self.config.min_chunk_size)
                    .max(prev_start + 1);
                windows.last_mut().expect("windows is non-empty").0 = widened;
            }
        }

        windows
            .into_iter()
            .map(|(window_start, window_end)| chars[window_start..window_end].iter().collect())
            .collect()
    }

    /// Cuts text into windows and tags each with fresh metadata: a unique
    /// id, its sequence index, the source identifier, its character size,
    /// and a shared ingestion timestamp.
    #[must_use]
    pub fn chunk(&self, text: &str, request: &IngestRequest) -> Vec<DocumentChunk> {
        let windows = self.split_text(text);
        let added_at = Utc::now();

        let chunks: Vec<DocumentChunk> = windows
            .into_iter()
            .enumerate()
            .map(|(chunk_index, content)| {
                let chunk_size = content.chars().count();
                DocumentChunk {
                    content,
                    metadata: ChunkMetadata {
                        id: Uuid::new_v4().to_string(),
                        source_id: request.source_id.clone(),
                        chunk_index,
                        chunk_size,
                        added_at,
                        content_type: request.content_type.clone(),
                    },
                }
            })
            .collect();

        tracing::debug!(
            source_id = %request.source_id,
            chunk_count = chunks.len(),
            chunk_size = self.config.chunk_size,
            chunk_overlap = self.config.chunk_overlap,
            "chunked document"
        );
        chunks
    }
}
