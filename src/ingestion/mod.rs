//! Turning raw documents into storable chunks.
//!
//! Ingestion is the write half of the system: raw text is cut into
//! overlapping windows by the [`Chunker`], tagged with metadata, and handed
//! to the store adapter for embedding and persistence.

pub mod chunker;

pub use chunker::Chunker;
