//! ```text
//! Raw text ──► ingestion::Chunker ──► DocumentChunk batch
//!                                          │
//!                          embeddings::EmbeddingProvider
//!                                          │
//!                stores::ChunkStore::add_chunks ──► VectorEngine (external)
//!
//! Query ──► pipeline::search ──► pipeline::Deduplicator ──► pipeline::rerank
//!                                                                │
//!                            pipeline::ContextAssembler ◄────────┘
//!                                          │
//!                          prompt handed to generation (external)
//! ```
//!
//! # contextsmith
//!
//! A retrieval pipeline for RAG applications: deterministic sliding-window
//! chunking, similarity-search orchestration, near-duplicate removal,
//! stable reranking, and budget-aware context assembly.
//!
//! The vector index and the embedding function are external collaborators,
//! injected behind the [`stores::VectorEngine`] and
//! [`embeddings::EmbeddingProvider`] traits; the crate ships an in-memory
//! reference engine and a deterministic mock provider so everything runs
//! without live infrastructure.
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use contextsmith::config::RetrievalConfig;
//! use contextsmith::embeddings::MockEmbeddingProvider;
//! use contextsmith::pipeline::RetrievalPipeline;
//! use contextsmith::schema::{IngestRequest, SearchRequest};
//! use contextsmith::stores::InMemoryVectorEngine;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let embedder = Arc::new(MockEmbeddingProvider::new());
//! let engine = Arc::new(InMemoryVectorEngine::new(embedder.clone()));
//! let pipeline = RetrievalPipeline::new(engine, embedder, RetrievalConfig::default())?;
//!
//! pipeline
//!     .ingest("a document worth retrieving later", &IngestRequest::new("notes.md"))
//!     .await?;
//!
//! let response = pipeline
//!     .search(SearchRequest::new("worth retrieving").with_k(3).with_scores())
//!     .await?;
//! let prompt = pipeline.build_context(&response);
//! assert!(prompt.prompt.contains("Question: worth retrieving"));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod embeddings;
pub mod ingestion;
pub mod pipeline;
pub mod schema;
pub mod stores;
pub mod types;

pub use config::{ChunkingConfig, ContextConfig, DedupConfig, RetrievalConfig, SearchConfig};
pub use embeddings::{EmbeddingProvider, MockEmbeddingProvider};
pub use ingestion::Chunker;
pub use pipeline::{AssembledContext, ContextAssembler, Deduplicator, RetrievalPipeline};
pub use schema::{
    AddReport, ChunkMetadata, CollectionStats, DeleteReport, DocumentChunk, IngestRequest,
    MetadataFilter, SearchRequest, SearchResponse, SearchResult,
};
pub use stores::{ChunkStore, InMemoryVectorEngine, VectorEngine};
pub use types::RetrievalError;
