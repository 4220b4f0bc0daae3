//! HNSW graph structure and configuration.
//!
//! [`HnswConfig`] defines tuning parameters (M, M0, ef_construction, metric, selection policy).
//! [`HnswCollection`] owns every node in a single arena, the per-level membership lists
//! and the entry point. Insertion lives in `insert.rs`, queries in `search.rs`,
//! structural checks in `verify.rs`.

use crate::config;
use crate::error::{HnswError, Result};
use crate::hnsw::distance::DistanceMetric;
use crate::hnsw::node::{Node, NodeId};
use crate::hnsw::visited::VisitedSet;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Policy used to choose a node's neighbors from a candidate frontier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NeighborSelection {
    /// Keep the `m` closest candidates.
    #[default]
    Simple,
    /// Diversity-aware selection (Algorithm 4 from the HNSW paper).
    Heuristic {
        /// Add each candidate's own neighbors to the pool before selecting.
        extend_candidates: bool,
        /// Backfill from rejected candidates when fewer than `m` were admitted.
        keep_pruned: bool,
    },
}

/// Configuration parameters for an HNSW collection.
///
/// Controls the trade-off between build speed, search speed, recall, and memory usage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HnswConfig {
    /// Maximum links per node above layer 0.
    pub m: usize,
    /// Maximum links per node at layer 0 (typically `2 * m`).
    pub m_max0: usize,
    /// Candidate frontier size during insertion.
    pub ef_construction: usize,
    /// Maximum number of layers in the graph.
    pub max_layers: usize,
    /// Multiplier applied to `-log2(uniform)` when drawing a node's level.
    pub level_multiplier: f64,
    /// Distance function used for every computation in the collection.
    pub distance_metric: DistanceMetric,
    /// Neighbor selection policy for insertion and pruning.
    #[serde(default)]
    pub selection: NeighborSelection,
    /// Seed for the level generator.
    pub seed: u64,
}

impl Default for HnswConfig {
    fn default() -> Self {
        Self {
            m: config::HNSW_DEFAULT_M,
            m_max0: config::HNSW_DEFAULT_M * 2,
            ef_construction: config::HNSW_DEFAULT_EF_CONSTRUCTION,
            max_layers: config::HNSW_DEFAULT_MAX_LAYERS,
            level_multiplier: config::HNSW_DEFAULT_LEVEL_MULTIPLIER,
            distance_metric: DistanceMetric::Cosine,
            selection: NeighborSelection::Simple,
            seed: config::HNSW_DEFAULT_SEED,
        }
    }
}

impl HnswConfig {
    /// Default configuration with the given `m` and `m_max0 = 2 * m`.
    pub fn with_m(m: usize) -> Self {
        Self {
            m,
            m_max0: m * 2,
            ..Self::default()
        }
    }

    /// Neighbor cap at `level`: `m_max0` at layer 0, `m` above.
    #[inline]
    pub fn max_neighbors(&self, level: usize) -> usize {
        if level == 0 {
            self.m_max0
        } else {
            self.m
        }
    }

    /// Rejects parameter combinations the graph cannot be built with.
    pub fn validate(&self) -> Result<()> {
        // With at most one link per node a layer of three nodes cannot be connected.
        if self.m < 2 {
            return Err(HnswError::InvalidConfig(format!(
                "m must be at least 2, got {}",
                self.m
            )));
        }
        if self.m_max0 < self.m {
            return Err(HnswError::InvalidConfig(format!(
                "m_max0 ({}) must be at least m ({})",
                self.m_max0, self.m
            )));
        }
        if self.ef_construction == 0 {
            return Err(HnswError::InvalidConfig(
                "ef_construction must be at least 1".into(),
            ));
        }
        if self.max_layers == 0 {
            return Err(HnswError::InvalidConfig(
                "max_layers must be at least 1".into(),
            ));
        }
        if !(self.level_multiplier.is_finite() && self.level_multiplier >= 0.0) {
            return Err(HnswError::InvalidConfig(format!(
                "level_multiplier must be a finite non-negative number, got {}",
                self.level_multiplier
            )));
        }
        Ok(())
    }
}

/// In-memory HNSW collection.
///
/// Nodes are stored in an arena indexed by [`NodeId`]; neighbor lists hold ids, so
/// the symmetric links never form ownership cycles. The collection has no internal
/// synchronization: `add` needs `&mut self`, queries need `&self`. Wrap it in a
/// [`SharedCollection`](crate::shared::SharedCollection) to share it across threads.
#[derive(Debug, Clone)]
pub struct HnswCollection {
    pub(crate) config: HnswConfig,
    pub(crate) dimension: usize,
    pub(crate) nodes: Vec<Node>,
    /// `layers[l]` lists the members of layer `l` in insertion order.
    pub(crate) layers: Vec<Vec<NodeId>>,
    pub(crate) entry_point: Option<NodeId>,
    pub(crate) rng: StdRng,
    pub(crate) corrupted: bool,
    /// Traversal marks reused by every insertion.
    pub(crate) scratch: VisitedSet,
}

impl HnswCollection {
    /// Creates an empty collection whose level generator is seeded from `config.seed`.
    pub fn new(dimension: usize, config: HnswConfig) -> Result<Self> {
        let rng = StdRng::seed_from_u64(config.seed);
        Self::with_rng(dimension, config, rng)
    }

    /// Creates an empty collection drawing levels from the supplied generator.
    pub fn with_rng(dimension: usize, config: HnswConfig, rng: StdRng) -> Result<Self> {
        config.validate()?;
        if dimension == 0 {
            return Err(HnswError::InvalidConfig("dimension must be at least 1".into()));
        }
        if dimension > config::MAX_DIMENSION {
            return Err(HnswError::InvalidConfig(format!(
                "dimension {} exceeds the maximum of {}",
                dimension,
                config::MAX_DIMENSION
            )));
        }
        Ok(Self {
            config,
            dimension,
            nodes: Vec::new(),
            layers: Vec::new(),
            entry_point: None,
            rng,
            corrupted: false,
            scratch: VisitedSet::default(),
        })
    }

    /// Creates an empty collection with the default configuration (cosine, M=16, ef_c=40).
    pub fn with_default_config(dimension: usize) -> Result<Self> {
        Self::new(dimension, HnswConfig::default())
    }

    /// Number of nodes in the collection.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn config(&self) -> &HnswConfig {
        &self.config
    }

    /// Number of layers currently in the graph (0 when empty).
    #[inline]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// The node every top-down search starts from.
    #[inline]
    pub fn entry_point(&self) -> Option<NodeId> {
        self.entry_point
    }

    /// Returns `true` once an invariant violation has been detected.
    #[inline]
    pub fn is_corrupted(&self) -> bool {
        self.corrupted
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id as usize)
    }

    /// The stored copy of the vector inserted as `id`.
    #[inline]
    pub fn vector(&self, id: NodeId) -> Option<&[f32]> {
        self.node(id).map(Node::vector)
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Members of layer `level`, or `None` if the layer does not exist.
    pub fn layer(&self, level: usize) -> Option<&[NodeId]> {
        self.layers.get(level).map(Vec::as_slice)
    }

    /// Draw a level for a new node: `floor(-log2(u) * level_multiplier)`, `u` in (0, 1].
    pub(crate) fn random_level(&mut self) -> usize {
        let u: f64 = 1.0 - self.rng.gen::<f64>();
        let level = (-u.log2() * self.config.level_multiplier).floor() as usize;
        level.min(self.config.max_layers - 1)
    }

    /// Validates a caller-supplied vector against the collection.
    pub(crate) fn check_vector(&self, vector: &[f32]) -> Result<()> {
        if self.corrupted {
            return Err(HnswError::Corrupted);
        }
        if vector.is_empty() {
            return Err(HnswError::EmptyVector);
        }
        if vector.len() != self.dimension {
            return Err(HnswError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    /// Distance from `query` to node `id`.
    #[inline]
    pub(crate) fn distance_to(&self, query: &[f32], id: NodeId) -> f32 {
        self.config
            .distance_metric
            .distance(query, self.nodes[id as usize].vector())
    }

    /// Distance between two stored nodes.
    #[inline]
    pub(crate) fn distance_between(&self, a: NodeId, b: NodeId) -> f32 {
        self.distance_to(self.nodes[a as usize].vector(), b)
    }

    /// Adds the undirected edge `a -- b` at `level`.
    pub(crate) fn link(&mut self, a: NodeId, b: NodeId, level: usize) {
        debug_assert_ne!(a, b, "self-loop at level {level}");
        self.nodes[a as usize].connect(b, level);
        self.nodes[b as usize].connect(a, level);
    }

    /// Removes the undirected edge `a -- b` at `level`.
    pub(crate) fn unlink(&mut self, a: NodeId, b: NodeId, level: usize) {
        self.nodes[a as usize].disconnect(b, level);
        self.nodes[b as usize].disconnect(a, level);
    }

    /// Degree of `id` at `level`.
    #[inline]
    pub(crate) fn degree(&self, id: NodeId, level: usize) -> usize {
        self.nodes[id as usize].degree(level)
    }
}

/// Builds an [`HnswError::InvariantViolation`] and logs it.
pub(crate) fn invariant_violation(message: impl Into<String>) -> HnswError {
    let message = message.into();
    tracing::error!("HNSW invariant violation: {}", message);
    HnswError::InvariantViolation(message)
}
