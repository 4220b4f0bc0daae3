//! Global configuration constants for recipevec.
//!
//! All tuning defaults and input validation limits are defined here.
//! These are compile-time constants; per-collection configuration is handled by
//! [`HnswConfig`](crate::hnsw::HnswConfig) and the CLI arguments in `recipevec-cli`.

/// Default number of bidirectional links per HNSW node above layer 0.
///
/// Higher values improve recall but increase memory and build time.
/// Typical range: 4–64. Default: 16.
pub const HNSW_DEFAULT_M: usize = 16;

/// Default ef parameter during HNSW index construction.
///
/// Controls the size of the candidate frontier explored while inserting.
/// Higher values produce a better graph but slow down build time.
pub const HNSW_DEFAULT_EF_CONSTRUCTION: usize = 40;

/// Default ef parameter during HNSW search.
///
/// Controls the size of the result frontier kept at layer 0.
/// Higher values improve recall at the cost of latency.
pub const HNSW_DEFAULT_EF_SEARCH: usize = 64;

/// Maximum number of layers in the HNSW graph.
pub const HNSW_DEFAULT_MAX_LAYERS: usize = 16;

/// Level generation multiplier for HNSW layer assignment.
///
/// Nodes are assigned to layer `floor(-log2(uniform) * LEVEL_MULTIPLIER)`.
/// With 0.3 roughly one node in ten reaches layer 1, one in a hundred layer 2.
pub const HNSW_DEFAULT_LEVEL_MULTIPLIER: f64 = 0.3;

/// Default seed for the level generator. Identical seeds and insertion order
/// produce identical graphs.
pub const HNSW_DEFAULT_SEED: u64 = 13;

/// Embedding dimension produced by the MiniLM ingredient encoder.
pub const RECIPE_EMBEDDING_DIMENSION: usize = 384;

/// Maximum allowed embedding dimension.
pub const MAX_DIMENSION: usize = 4096;

/// Default number of random vectors built by the CLI driver.
pub const DEFAULT_BUILD_COUNT: usize = 10_000;

/// Default dimension of the CLI driver's random vectors.
pub const DEFAULT_BUILD_DIMENSION: usize = 128;

/// Default number of results per query in the CLI driver.
pub const DEFAULT_K: usize = 10;

/// Default number of random recall queries in the CLI driver.
pub const DEFAULT_QUERY_COUNT: usize = 100;

/// Default duration (seconds) of the CLI throughput phase. 0 = disabled.
pub const DEFAULT_THROUGHPUT_SECS: u64 = 5;
