//! # recipevec-core
//!
//! In-memory HNSW approximate nearest neighbor index for recipe embeddings.
//!
//! The index stores fixed-dimension `f32` vectors (384-d MiniLM ingredient
//! embeddings in production), answers approximate k-nearest-neighbor queries,
//! and can check its own structural invariants. It has no async dependencies
//! and no persistence: an external storage layer replays vectors at start-up.

/// Global configuration constants: limits, defaults, and tuning parameters.
pub mod config;
/// Error type and crate `Result` alias.
pub mod error;
/// Recall measurement against exact search.
pub mod eval;
/// HNSW approximate nearest neighbor index: graph structure, search, insertion, and distance metrics.
pub mod hnsw;
/// `Arc<RwLock<_>>` handle for sharing a collection across threads.
pub mod shared;

pub use error::{HnswError, Result};
pub use hnsw::{
    DistanceMetric, HnswCollection, HnswConfig, NeighborSelection, NodeId, ScoredNode,
    VerificationReport,
};
pub use shared::SharedCollection;
