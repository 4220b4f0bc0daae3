//! HNSW insertion algorithm.
//!
//! Inserts a vector with symmetric links, then prunes any neighbor pushed over its
//! degree cap. Pruning re-wires every dropped neighbor so that no layer ever loses
//! connectivity, and no re-wiring step ever pushes a node over its own cap.

use crate::error::{HnswError, Result};
use crate::hnsw::frontier::{NodeDistanceSet, ScoredNode};
use crate::hnsw::graph::{invariant_violation, HnswCollection, NeighborSelection};
use crate::hnsw::node::{Node, NodeId};
use crate::hnsw::search::{greedy_descent, search_layer};
use crate::hnsw::visited::VisitedSet;
use std::collections::VecDeque;

impl HnswCollection {
    /// Insert a copy of `vector` into the graph and return its id.
    ///
    /// On an invariant violation the collection is marked corrupted and every
    /// later call fails with [`HnswError::Corrupted`].
    pub fn add(&mut self, vector: &[f32]) -> Result<NodeId> {
        self.check_vector(vector)?;
        let result = self.insert_node(vector);
        if matches!(result, Err(HnswError::InvariantViolation(_))) {
            self.corrupted = true;
        }
        result
    }

    fn insert_node(&mut self, vector: &[f32]) -> Result<NodeId> {
        let id = NodeId::try_from(self.nodes.len())
            .ok()
            .filter(|&id| id < NodeId::MAX)
            .ok_or(HnswError::CapacityExceeded {
                max: NodeId::MAX as usize,
            })?;
        let level = self.random_level();

        let Some(entry_point) = self.entry_point else {
            if !self.nodes.is_empty() {
                return Err(invariant_violation(format!(
                    "collection holds {} nodes but has no entry point",
                    self.nodes.len()
                )));
            }
            self.nodes.push(Node::new(id, vector.into(), level));
            self.register(id, level);
            self.entry_point = Some(id);
            tracing::debug!(node = id, level, "first node becomes entry point");
            return Ok(id);
        };

        self.nodes.push(Node::new(id, vector.into(), level));
        let top = self.layers.len() - 1;

        let mut visited = std::mem::take(&mut self.scratch);
        let linked = self.link_new_node(id, vector, level, entry_point, &mut visited);
        self.scratch = visited;
        linked?;

        if level > top {
            self.entry_point = Some(id);
            tracing::debug!(
                node = id,
                level,
                previous_top = top,
                "new node promoted to entry point"
            );
        }
        self.register(id, level);
        Ok(id)
    }

    /// Descends to the node's top layer, then links it on every shared layer top-down.
    fn link_new_node(
        &mut self,
        id: NodeId,
        vector: &[f32],
        level: usize,
        entry_point: NodeId,
        visited: &mut VisitedSet,
    ) -> Result<()> {
        let top = self.layers.len() - 1;

        // Phase 1: greedy descent to the first layer the new node joins
        let mut current_ep = greedy_descent(self, vector, entry_point, top, level + 1, visited)?;

        // Phase 2: link on every shared layer, top-down
        for layer in (0..=level.min(top)).rev() {
            let m_max = self.config.max_neighbors(layer);
            let candidates = search_layer(
                self,
                vector,
                current_ep,
                self.config.ef_construction,
                layer,
                visited,
            );
            let nearest = candidates.nearest().ok_or_else(|| {
                invariant_violation(format!(
                    "layer {layer} search from node {current_ep} returned no candidates"
                ))
            })?;

            let selected = self.select_neighbors(vector, &candidates, m_max, layer, id, true);
            for neighbor in selected {
                self.connect(id, neighbor.id, layer, visited)?;
            }
            current_ep = nearest.id;
        }
        Ok(())
    }

    /// Adds `id` to the membership lists of layers `0..=level`, creating new layers.
    fn register(&mut self, id: NodeId, level: usize) {
        while self.layers.len() <= level {
            tracing::debug!(layer = self.layers.len(), "opening new layer");
            self.layers.push(Vec::new());
        }
        for members in &mut self.layers[..=level] {
            members.push(id);
        }
    }

    /// Links `a -- b` at `level`, then prunes whichever endpoint went over the cap.
    fn connect(
        &mut self,
        a: NodeId,
        b: NodeId,
        level: usize,
        visited: &mut VisitedSet,
    ) -> Result<()> {
        let m_max = self.config.max_neighbors(level);
        self.link(a, b, level);
        for id in [b, a] {
            if self.degree(id, level) <= m_max {
                continue;
            }
            self.refresh_neighbor_connections(id, level, visited)?;
            if self.degree(id, level) > m_max {
                return Err(invariant_violation(format!(
                    "node {id} still has {} neighbors at level {level} after pruning, cap {m_max}",
                    self.degree(id, level)
                )));
            }
        }
        Ok(())
    }

    /// Recomputes `node`'s neighbor list at `level` from its current neighbors and
    /// re-wires every dropped neighbor.
    fn refresh_neighbor_connections(
        &mut self,
        node: NodeId,
        level: usize,
        visited: &mut VisitedSet,
    ) -> Result<()> {
        let m_max = self.config.max_neighbors(level);
        let current = self.nodes[node as usize].neighbors(level);

        if current.contains(&node) {
            return Err(invariant_violation(format!(
                "node {node} is its own neighbor at level {level}"
            )));
        }
        if let Some(&orphan) = current
            .iter()
            .find(|&&n| !self.nodes[n as usize].neighbors(level).contains(&node))
        {
            return Err(invariant_violation(format!(
                "edge {node} -> {orphan} at level {level} has no back-reference"
            )));
        }

        let pool: NodeDistanceSet = current
            .iter()
            .map(|&n| ScoredNode::new(n, self.distance_between(node, n)))
            .collect();
        let base = self.nodes[node as usize].vector();
        let kept: Vec<NodeId> = self
            .select_neighbors(base, &pool, m_max, level, node, false)
            .into_iter()
            .map(|s| s.id)
            .collect();
        if kept.is_empty() {
            return Err(invariant_violation(format!(
                "pruning node {node} at level {level} kept no neighbors"
            )));
        }
        let dropped: Vec<NodeId> = pool.ids().filter(|id| !kept.contains(id)).collect();

        for &removed in &dropped {
            self.unlink(node, removed, level);
            self.rewire(node, removed, &kept, level, visited)?;
        }

        tracing::trace!(
            node,
            level,
            kept = kept.len(),
            dropped = dropped.len(),
            "pruned neighbor list"
        );
        debug_assert!(self.is_symmetric_around(node, level));
        debug_assert!(dropped.iter().all(|&d| self.is_symmetric_around(d, level)));
        Ok(())
    }

    /// Gives `removed`, just unlinked from `node`, a path back into `node`'s component.
    ///
    /// Nothing is done when `removed` is still reachable. Otherwise the unlinked edge
    /// was a bridge and `removed` is attached, in order of preference, to the closest
    /// kept neighbor with spare capacity, to the closest spare node at the shallowest
    /// breadth-first depth from `node`, or by replacing an edge `t -- u` that lies on
    /// a cycle of `node`'s component with `t -- removed`. Every option adds exactly
    /// one edge at `removed`, which lost one, and never raises another node's degree
    /// past the cap. With caps of at least 2 one of them always applies: a component
    /// in which every node is at its cap has more edges than a tree.
    fn rewire(
        &mut self,
        node: NodeId,
        removed: NodeId,
        kept: &[NodeId],
        level: usize,
        visited: &mut VisitedSet,
    ) -> Result<()> {
        let m_max = self.config.max_neighbors(level);
        let removed_neighbors = self.nodes[removed as usize].neighbors(level);
        if kept.iter().any(|k| removed_neighbors.contains(k)) {
            return Ok(());
        }

        let closest = |collection: &Self, ids: &mut dyn Iterator<Item = NodeId>| {
            ids.map(|id| ScoredNode::new(id, collection.distance_between(removed, id)))
                .min_by(|a, b| a.distance.total_cmp(&b.distance))
        };

        let mut spare_kept = kept
            .iter()
            .copied()
            .filter(|&k| k != removed && self.degree(k, level) < m_max);
        if let Some(target) = closest(self, &mut spare_kept) {
            self.link(removed, target.id, level);
            return Ok(());
        }

        // Breadth-first walk of node's component. Records the spare nodes at the
        // shallowest depth holding any, and one non-tree edge.
        visited.clear();
        visited.ensure_capacity(self.nodes.len());
        visited.insert(node);
        let mut queue = VecDeque::from([(node, node, 0usize)]);
        let mut spare: Vec<NodeId> = Vec::new();
        let mut spare_depth = usize::MAX;
        let mut cycle_edge: Option<(NodeId, NodeId)> = None;

        while let Some((u, parent, depth)) = queue.pop_front() {
            for &v in self.nodes[u as usize].neighbors(level) {
                if v == removed {
                    return Ok(());
                }
                if visited.contains(v) {
                    if v != parent && cycle_edge.is_none() {
                        cycle_edge = Some((u, v));
                    }
                    continue;
                }
                visited.insert(v);
                queue.push_back((v, u, depth + 1));
                if self.degree(v, level) < m_max && depth + 1 <= spare_depth {
                    if depth + 1 < spare_depth {
                        spare.clear();
                        spare_depth = depth + 1;
                    }
                    spare.push(v);
                }
            }
        }

        if let Some(target) = closest(self, &mut spare.iter().copied()) {
            self.link(removed, target.id, level);
            return Ok(());
        }

        if let Some((t, u)) = cycle_edge {
            let attach = if t == node {
                u
            } else if u == node {
                t
            } else if self.distance_between(removed, u) < self.distance_between(removed, t) {
                u
            } else {
                t
            };
            tracing::trace!(
                node = removed,
                edge_from = t,
                edge_to = u,
                attach,
                level,
                "component saturated, splicing into a cycle edge"
            );
            self.unlink(t, u, level);
            self.link(removed, attach, level);
            return Ok(());
        }

        if self.degree(node, level) < m_max {
            self.link(removed, node, level);
            return Ok(());
        }

        Err(invariant_violation(format!(
            "no way to reconnect node {removed} to node {node} at level {level} within cap {m_max}"
        )))
    }

    /// Chooses up to `m` neighbors for a node at `base` from `candidates`.
    ///
    /// `exclude` is never selected. `allow_extend` gates candidate-pool extension;
    /// pruning passes select only from the existing neighbor list.
    pub(crate) fn select_neighbors(
        &self,
        base: &[f32],
        candidates: &NodeDistanceSet,
        m: usize,
        level: usize,
        exclude: NodeId,
        allow_extend: bool,
    ) -> Vec<ScoredNode> {
        match self.config.selection {
            NeighborSelection::Simple => candidates
                .iter()
                .filter(|c| c.id != exclude)
                .take(m)
                .collect(),
            NeighborSelection::Heuristic {
                extend_candidates,
                keep_pruned,
            } => self.select_neighbors_heuristic(
                base,
                candidates,
                m,
                level,
                exclude,
                extend_candidates && allow_extend,
                keep_pruned,
            ),
        }
    }

    /// Heuristic neighbor selection (Algorithm 4 from the HNSW paper).
    /// A candidate is admitted only if it is closer to the base than to every
    /// neighbor admitted so far, which spreads edges across directions.
    #[allow(clippy::too_many_arguments)]
    fn select_neighbors_heuristic(
        &self,
        base: &[f32],
        candidates: &NodeDistanceSet,
        m: usize,
        level: usize,
        exclude: NodeId,
        extend_candidates: bool,
        keep_pruned: bool,
    ) -> Vec<ScoredNode> {
        let mut pool = candidates.clone();
        pool.remove(exclude);

        if extend_candidates {
            for candidate in candidates.ids() {
                for &n in self.nodes[candidate as usize].neighbors(level) {
                    if n != exclude && !pool.contains(n) {
                        let distance = self
                            .config
                            .distance_metric
                            .distance(base, self.nodes[n as usize].vector());
                        pool.insert(ScoredNode::new(n, distance));
                    }
                }
            }
        }

        let mut selected: Vec<ScoredNode> = Vec::with_capacity(m);
        let mut discarded = NodeDistanceSet::new();
        while selected.len() < m {
            let Some(candidate) = pool.pop_nearest() else {
                break;
            };
            let is_diverse = selected
                .iter()
                .all(|s| candidate.distance <= self.distance_between(candidate.id, s.id));
            if is_diverse {
                selected.push(candidate);
            } else {
                discarded.insert(candidate);
            }
        }

        if keep_pruned {
            while selected.len() < m {
                let Some(candidate) = discarded.pop_nearest() else {
                    break;
                };
                selected.push(candidate);
            }
        }

        selected
    }

    /// Every edge touching `id` at `level` has its back-reference.
    fn is_symmetric_around(&self, id: NodeId, level: usize) -> bool {
        self.nodes[id as usize]
            .neighbors(level)
            .iter()
            .all(|&n| n != id && self.nodes[n as usize].neighbors(level).contains(&id))
    }
}
