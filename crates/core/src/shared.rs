//! Thread-safe handle around an [`HnswCollection`].
//!
//! The collection itself is single-writer and unsynchronized. [`SharedCollection`]
//! puts it behind a `parking_lot::RwLock` so one writer and many readers can share
//! it across threads. Results are returned owned so no lock guard escapes.

use crate::error::Result;
use crate::hnsw::{HnswCollection, HnswConfig, NodeId, ScoredNode, VerificationReport};
use parking_lot::RwLock;
use std::sync::Arc;

/// Cloneable handle to a collection guarded by a read-write lock.
///
/// Cloning produces a new handle to the same collection.
#[derive(Debug, Clone)]
pub struct SharedCollection {
    inner: Arc<RwLock<HnswCollection>>,
}

impl SharedCollection {
    /// Creates an empty shared collection.
    pub fn new(dimension: usize, config: HnswConfig) -> Result<Self> {
        Ok(HnswCollection::new(dimension, config)?.into())
    }

    /// Inserts a vector under the write lock.
    pub fn add(&self, vector: &[f32]) -> Result<NodeId> {
        self.inner.write().add(vector)
    }

    /// Approximate search under the read lock.
    pub fn search(&self, query: &[f32], k: usize, ef: usize) -> Result<Vec<ScoredNode>> {
        self.inner.read().search_scored(query, k, ef)
    }

    pub fn search_exact(&self, query: &[f32], k: usize) -> Result<Vec<ScoredNode>> {
        self.inner.read().search_exact_scored(query, k)
    }

    /// Copy of the vector stored as `id`.
    pub fn vector(&self, id: NodeId) -> Option<Vec<f32>> {
        self.inner.read().vector(id).map(<[f32]>::to_vec)
    }

    pub fn verify(&self) -> VerificationReport {
        self.inner.read().verify()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

impl From<HnswCollection> for SharedCollection {
    fn from(collection: HnswCollection) -> Self {
        Self {
            inner: Arc::new(RwLock::new(collection)),
        }
    }
}
