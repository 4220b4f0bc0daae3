//! Hierarchical Navigable Small World (HNSW) approximate nearest neighbor index.
//!
//! Nodes live in a single arena and refer to each other by [`NodeId`]. Every
//! layer is an undirected graph: links are always symmetric, no node exceeds
//! its degree cap after an insertion returns, and every layer stays connected.
//! Layer 0 holds all nodes; each higher layer is a subset of the one below.

/// Distance metrics: cosine and euclidean.
pub mod distance;
/// Ordered candidate/result frontier keyed by node id and distance.
pub mod frontier;
/// HNSW graph structure, configuration, and level generation.
pub mod graph;
/// HNSW insertion with symmetric linking and connectivity-preserving pruning.
pub mod insert;
/// Arena node: stored vector plus per-level neighbor lists.
pub mod node;
/// HNSW search: single-layer search, layered KNN, and exact scan.
pub mod search;
/// Structural verification and Graphviz export.
pub mod verify;
/// Generation-based visited set for efficient graph traversal.
pub mod visited;

pub use distance::DistanceMetric;
pub use frontier::{NodeDistanceSet, ScoredNode};
pub use graph::{HnswCollection, HnswConfig, NeighborSelection};
pub use node::{Node, NodeId};
pub use verify::VerificationReport;
