//! HNSW search algorithms: single-layer search, layered KNN and brute-force exact search.
//!
//! [`search_layer`] is shared by insertion and querying. Queries descend from the top
//! layer with ef=1 to find a good layer-0 entry, then widen to the caller's ef.

use crate::error::Result;
use crate::hnsw::frontier::{NodeDistanceSet, ScoredNode};
use crate::hnsw::graph::{invariant_violation, HnswCollection};
use crate::hnsw::node::NodeId;
use crate::hnsw::visited::VisitedSet;
use ordered_float::OrderedFloat;
use std::cell::RefCell;
use std::collections::BinaryHeap;

thread_local! {
    /// Thread-local VisitedSet reused across queries on the same thread.
    static SEARCH_VISITED: RefCell<VisitedSet> = RefCell::new(VisitedSet::new(0));
}

/// A result entry for the exact scan. Max-heap by distance, ties by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct ResultEntry {
    distance: OrderedFloat<f32>,
    id: NodeId,
}

/// Greedy best-first search of one layer.
///
/// Expands candidates nearest-first and keeps at most `ef` results, evicting the
/// furthest. Stops once the result set is full and the nearest unexpanded candidate
/// is further than the worst kept result. `visited` is cleared at the start.
pub(crate) fn search_layer(
    collection: &HnswCollection,
    query: &[f32],
    entry_point: NodeId,
    ef: usize,
    level: usize,
    visited: &mut VisitedSet,
) -> NodeDistanceSet {
    let ef = ef.max(1);
    visited.clear();
    visited.ensure_capacity(collection.nodes.len());

    let seed = ScoredNode::new(entry_point, collection.distance_to(query, entry_point));
    visited.insert(entry_point);

    let mut candidates = NodeDistanceSet::new();
    let mut results = NodeDistanceSet::with_capacity(ef + 1);
    candidates.insert(seed);
    results.insert(seed);

    while let Some(current) = candidates.pop_nearest() {
        let worst = results.furthest().map_or(f32::INFINITY, |r| r.distance);
        if results.len() >= ef && current.distance > worst {
            break;
        }

        for &neighbor in collection.nodes[current.id as usize].neighbors(level) {
            if !visited.insert(neighbor) {
                continue;
            }
            let distance = collection.distance_to(query, neighbor);
            let worst = results.furthest().map_or(f32::INFINITY, |r| r.distance);
            if results.len() < ef || distance < worst {
                let scored = ScoredNode::new(neighbor, distance);
                candidates.insert(scored);
                results.insert_bounded(scored, ef);
            }
        }
    }

    results
}

/// Walks down from `top` to `bottom` (inclusive) with ef=1, returning the node
/// nearest to `query` found on layer `bottom`. Returns `entry_point` unchanged
/// when `bottom > top`.
pub(crate) fn greedy_descent(
    collection: &HnswCollection,
    query: &[f32],
    entry_point: NodeId,
    top: usize,
    bottom: usize,
    visited: &mut VisitedSet,
) -> Result<NodeId> {
    let mut current = entry_point;
    for level in (bottom..=top).rev() {
        let nearest = search_layer(collection, query, current, 1, level, visited)
            .nearest()
            .ok_or_else(|| {
                invariant_violation(format!(
                    "layer {level} search from node {current} produced no nearest node"
                ))
            })?;
        current = nearest.id;
    }
    Ok(current)
}

impl HnswCollection {
    /// Approximate k-nearest-neighbor search.
    ///
    /// Returns up to `k` stored vectors in ascending distance order. The layer-0
    /// frontier holds `max(ef, k)` entries; larger `ef` trades latency for recall.
    /// An empty collection yields an empty result.
    pub fn search(&self, query: &[f32], k: usize, ef: usize) -> Result<Vec<&[f32]>> {
        let results = self.search_scored(query, k, ef)?;
        Ok(self.resolve(&results))
    }

    /// Like [`search`](Self::search) but returns node ids with their distances.
    pub fn search_scored(&self, query: &[f32], k: usize, ef: usize) -> Result<Vec<ScoredNode>> {
        self.check_vector(query)?;
        let Some(entry_point) = self.entry_point else {
            if !self.nodes.is_empty() {
                return Err(invariant_violation(format!(
                    "collection holds {} nodes but has no entry point",
                    self.nodes.len()
                )));
            }
            return Ok(Vec::new());
        };
        if k == 0 {
            return Ok(Vec::new());
        }

        SEARCH_VISITED.with(|cell| -> Result<Vec<ScoredNode>> {
            let mut visited = cell.borrow_mut();
            let top = self.layers.len().saturating_sub(1);
            let layer0_entry = greedy_descent(self, query, entry_point, top, 1, &mut visited)?;

            let ef = ef.max(k);
            let mut results =
                search_layer(self, query, layer0_entry, ef, 0, &mut visited).into_sorted_vec();
            results.truncate(k);
            Ok(results)
        })
    }

    /// Exact k-nearest-neighbor search by scanning every node.
    ///
    /// Intended as a correctness oracle for [`search`](Self::search); cost is linear
    /// in the collection size.
    pub fn search_exact(&self, query: &[f32], k: usize) -> Result<Vec<&[f32]>> {
        let results = self.search_exact_scored(query, k)?;
        Ok(self.resolve(&results))
    }

    /// Like [`search_exact`](Self::search_exact) but returns node ids with their distances.
    pub fn search_exact_scored(&self, query: &[f32], k: usize) -> Result<Vec<ScoredNode>> {
        self.check_vector(query)?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let members = self.layers.first().map_or(&[][..], Vec::as_slice);
        let mut heap: BinaryHeap<ResultEntry> = BinaryHeap::with_capacity(k + 1);
        for &id in members {
            let distance = self.distance_to(query, id);
            if heap.len() == k {
                match heap.peek() {
                    Some(worst) if distance >= worst.distance.0 => continue,
                    _ => {
                        heap.pop();
                    }
                }
            }
            heap.push(ResultEntry {
                distance: OrderedFloat(distance),
                id,
            });
        }

        Ok(heap
            .into_sorted_vec()
            .into_iter()
            .map(|r| ScoredNode::new(r.id, r.distance.0))
            .collect())
    }

    fn resolve(&self, results: &[ScoredNode]) -> Vec<&[f32]> {
        results
            .iter()
            .map(|r| self.nodes[r.id as usize].vector())
            .collect()
    }
}
