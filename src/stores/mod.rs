//! The storage boundary.
//!
//! The vector index is externally owned: this crate only ever talks to it
//! through the [`VectorEngine`] contract and never assumes anything about
//! its internal ranking or persistence.
//!
//! ```text
//!                  ┌──────────────────────┐
//!                  │  VectorEngine trait  │
//!                  │  (async add/query)   │
//!                  └──────────┬───────────┘
//!                             │
//!              ┌──────────────┼───────────────┐
//!              │              │               │
//!              ▼              ▼               ▼
//!       ┌────────────┐ ┌────────────┐ ┌────────────┐
//!       │  InMemory  │ │  (external)│ │  (external)│
//!       │  reference │ │  pgvector  │ │ sqlite-vec │
//!       └────────────┘ └────────────┘ └────────────┘
//! ```
//!
//! [`ChunkStore`] is the adapter the pipeline uses: it owns the embedding
//! step on the write path, the per-call timeout, and the conversion of
//! engine failures into the crate's error taxonomy.

pub mod adapter;
pub mod engine;
pub mod memory;

pub use adapter::{ChunkStore, ScoredHit};
pub use engine::{EngineError, EngineHit, EngineRecord, VectorEngine};
pub use memory::InMemoryVectorEngine;
