//! Candidate and result frontiers for graph traversal.
//!
//! [`NodeDistanceSet`] is keyed by node identity, not distance: inserting a node that
//! is already present is a no-op. Members are kept ordered by `(distance, id)` so that
//! both extremes can be popped, and the current nearest and furthest are cached for
//! O(1) peeks.

use crate::hnsw::node::NodeId;
use ordered_float::OrderedFloat;
use std::collections::{BTreeSet, HashMap};

/// A node paired with its distance to some query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredNode {
    pub id: NodeId,
    pub distance: f32,
}

impl ScoredNode {
    pub fn new(id: NodeId, distance: f32) -> Self {
        Self { id, distance }
    }

    #[inline]
    fn key(&self) -> (OrderedFloat<f32>, NodeId) {
        (OrderedFloat(self.distance), self.id)
    }
}

/// Deduplicated set of `(node, distance)` pairs with access to both extremes.
#[derive(Debug, Clone, Default)]
pub struct NodeDistanceSet {
    distances: HashMap<NodeId, OrderedFloat<f32>>,
    order: BTreeSet<(OrderedFloat<f32>, NodeId)>,
    nearest: Option<ScoredNode>,
    furthest: Option<ScoredNode>,
}

impl NodeDistanceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            distances: HashMap::with_capacity(capacity),
            ..Self::default()
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.distances.contains_key(&id)
    }

    /// Closest member, if any. O(1).
    #[inline]
    pub fn nearest(&self) -> Option<ScoredNode> {
        self.nearest
    }

    /// Furthest member, if any. O(1).
    #[inline]
    pub fn furthest(&self) -> Option<ScoredNode> {
        self.furthest
    }

    /// Adds `node`. Returns `false` (and changes nothing) if its id is already present.
    pub fn insert(&mut self, node: ScoredNode) -> bool {
        if self.distances.contains_key(&node.id) {
            return false;
        }
        let key = node.key();
        self.distances.insert(node.id, key.0);
        self.order.insert(key);

        if self.nearest.map_or(true, |n| key < n.key()) {
            self.nearest = Some(node);
        }
        if self.furthest.map_or(true, |f| key > f.key()) {
            self.furthest = Some(node);
        }
        true
    }

    /// Adds `node`, then evicts the furthest member while the set exceeds `capacity`.
    /// Returns `true` if `node` is a member afterwards.
    pub fn insert_bounded(&mut self, node: ScoredNode, capacity: usize) -> bool {
        if !self.insert(node) {
            return false;
        }
        while self.len() > capacity {
            self.pop_furthest();
        }
        self.contains(node.id)
    }

    /// Removes `id`, returning its entry if it was present.
    pub fn remove(&mut self, id: NodeId) -> Option<ScoredNode> {
        let distance = self.distances.remove(&id)?;
        self.order.remove(&(distance, id));

        let removed = ScoredNode::new(id, distance.0);
        if self.nearest.is_some_and(|n| n.id == id) {
            self.nearest = self.order.first().map(|&(d, n)| ScoredNode::new(n, d.0));
        }
        if self.furthest.is_some_and(|f| f.id == id) {
            self.furthest = self.order.last().map(|&(d, n)| ScoredNode::new(n, d.0));
        }
        Some(removed)
    }

    /// Removes and returns the closest member.
    pub fn pop_nearest(&mut self) -> Option<ScoredNode> {
        let nearest = self.nearest?;
        self.remove(nearest.id)
    }

    /// Removes and returns the furthest member.
    pub fn pop_furthest(&mut self) -> Option<ScoredNode> {
        let furthest = self.furthest?;
        self.remove(furthest.id)
    }

    /// Members in ascending distance order (ties broken by id).
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = ScoredNode> + '_ {
        self.order.iter().map(|&(d, id)| ScoredNode::new(id, d.0))
    }

    /// Member ids in ascending distance order.
    pub fn ids(&self) -> impl DoubleEndedIterator<Item = NodeId> + '_ {
        self.order.iter().map(|&(_, id)| id)
    }

    /// Consumes the set, returning members in ascending distance order.
    pub fn into_sorted_vec(self) -> Vec<ScoredNode> {
        self.order
            .into_iter()
            .map(|(d, id)| ScoredNode::new(id, d.0))
            .collect()
    }
}

impl FromIterator<ScoredNode> for NodeDistanceSet {
    fn from_iter<I: IntoIterator<Item = ScoredNode>>(iter: I) -> Self {
        let mut set = NodeDistanceSet::new();
        set.extend(iter);
        set
    }
}

impl Extend<ScoredNode> for NodeDistanceSet {
    fn extend<I: IntoIterator<Item = ScoredNode>>(&mut self, iter: I) {
        for node in iter {
            self.insert(node);
        }
    }
}
