//! Error type shared by every index operation.
//!
//! Argument and range errors are caller mistakes and leave the collection untouched.
//! [`HnswError::InvariantViolation`] means the graph structure is no longer trustworthy;
//! the collection refuses further work afterwards with [`HnswError::Corrupted`].

/// Errors returned by the HNSW collection.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HnswError {
    /// A vector's length differs from the collection dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A zero-length vector was supplied.
    #[error("vector must not be empty")]
    EmptyVector,

    /// Construction parameters are unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A layer index outside `0..layers` was requested.
    #[error("level {level} out of range: graph has {layers} layers")]
    LevelOutOfRange { level: usize, layers: usize },

    /// The arena cannot hold another node id.
    #[error("collection is full: at most {max} nodes")]
    CapacityExceeded { max: usize },

    /// The graph broke one of its structural invariants during an operation.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// A previous operation hit an invariant violation; the graph is unusable.
    #[error("collection is corrupted by an earlier invariant violation")]
    Corrupted,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HnswError>;
