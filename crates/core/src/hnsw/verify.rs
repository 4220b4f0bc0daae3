//! Structural verification and Graphviz export.
//!
//! [`HnswCollection::verify`] walks every layer breadth-first and reports each
//! broken invariant as a readable diagnostic. It is a testing aid and never runs
//! on the query path.

use crate::error::{HnswError, Result};
use crate::hnsw::graph::HnswCollection;
use crate::hnsw::node::NodeId;
use crate::hnsw::visited::VisitedSet;
use std::collections::{HashSet, VecDeque};
use std::fmt::{self, Write as _};

/// Outcome of [`HnswCollection::verify`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationReport {
    errors: Vec<String>,
}

impl VerificationReport {
    /// `true` when no invariant is broken.
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }

    /// One diagnostic per broken invariant.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.passed() {
            return f.write_str("graph verified: no errors");
        }
        writeln!(f, "graph verification failed with {} errors:", self.errors.len())?;
        for error in &self.errors {
            writeln!(f, "  - {error}")?;
        }
        Ok(())
    }
}

impl HnswCollection {
    /// Checks every structural invariant of the graph.
    ///
    /// Per layer: all members reachable from the first member, no node above its
    /// degree cap, every edge mirrored by a back-reference, no self-loops or duplicate
    /// edges. Globally: layer nesting, node levels and entry-point placement.
    pub fn verify(&self) -> VerificationReport {
        let mut errors = Vec::new();
        self.verify_membership(&mut errors);

        let mut visited = VisitedSet::new(self.nodes.len());
        for (level, members) in self.layers.iter().enumerate() {
            if let Some(&start) = members.first() {
                self.verify_layer(level, start, members.len(), &mut visited, &mut errors);
            }
        }

        for error in &errors {
            tracing::warn!("{}", error);
        }
        VerificationReport { errors }
    }

    fn verify_membership(&self, errors: &mut Vec<String>) {
        match self.entry_point {
            None if !self.nodes.is_empty() => errors.push(format!(
                "graph has {} nodes but no entry point",
                self.nodes.len()
            )),
            Some(ep) => match self.node(ep) {
                None => errors.push(format!("entry point {ep} does not exist")),
                Some(node) if node.level() + 1 != self.layers.len() => errors.push(format!(
                    "entry point {ep} has level {} but the graph has {} layers",
                    node.level(),
                    self.layers.len()
                )),
                Some(_) => {}
            },
            None => {}
        }

        let layer0 = self.layers.first().map_or(0, Vec::len);
        if layer0 != self.nodes.len() {
            errors.push(format!(
                "layer 0 has {layer0} members but the collection has {} nodes",
                self.nodes.len()
            ));
        }

        for (level, members) in self.layers.iter().enumerate() {
            if members.is_empty() {
                errors.push(format!("layer {level} has no members"));
            }
            for &id in members {
                match self.node(id) {
                    None => errors.push(format!("layer {level} lists unknown node {id}")),
                    Some(node) if node.level() < level => errors.push(format!(
                        "node {id} is registered at level {level} above its own level {}",
                        node.level()
                    )),
                    Some(_) => {}
                }
            }
            let expected = self.nodes.iter().filter(|n| n.level() >= level).count();
            if expected != members.len() {
                errors.push(format!(
                    "layer {level} has {} members but {expected} nodes reach that level",
                    members.len()
                ));
            }
        }
    }

    fn verify_layer(
        &self,
        level: usize,
        start: NodeId,
        member_count: usize,
        visited: &mut VisitedSet,
        errors: &mut Vec<String>,
    ) {
        let max_neighbors = self.config.max_neighbors(level);
        visited.clear();
        visited.insert(start);
        let mut queue = VecDeque::from([start]);
        let mut reached = 1usize;

        while let Some(id) = queue.pop_front() {
            let neighbors = self.nodes[id as usize].neighbors(level);
            if neighbors.len() > max_neighbors {
                errors.push(format!(
                    "node {id} at level {level} has {} neighbors, exceeding the limit of {max_neighbors}",
                    neighbors.len()
                ));
            }

            for (i, &neighbor) in neighbors.iter().enumerate() {
                if neighbor == id {
                    errors.push(format!("node {id} at level {level} links to itself"));
                    continue;
                }
                if neighbor as usize >= self.nodes.len() {
                    errors.push(format!(
                        "node {id} at level {level} links to unknown node {neighbor}"
                    ));
                    continue;
                }
                if neighbors[..i].contains(&neighbor) {
                    errors.push(format!(
                        "node {id} at level {level} lists neighbor {neighbor} more than once"
                    ));
                }
                if !self.nodes[neighbor as usize].neighbors(level).contains(&id) {
                    errors.push(format!(
                        "node {neighbor} at level {level} does not have a back-reference to {id}"
                    ));
                }
                if visited.insert(neighbor) {
                    reached += 1;
                    queue.push_back(neighbor);
                }
            }
        }

        if reached != member_count {
            errors.push(format!(
                "level {level} is not fully connected: reached {reached} of {member_count} nodes"
            ));
        }
    }

    /// Renders layer `level` as an undirected Graphviz graph.
    ///
    /// Node names are ids in upper-case hex; each edge is labelled with the distance
    /// between its endpoints.
    pub fn to_dot(&self, level: usize) -> Result<String> {
        let members = self.layers.get(level).ok_or(HnswError::LevelOutOfRange {
            level,
            layers: self.layers.len(),
        })?;

        let mut out = String::from("graph HNSW {\n");
        for &id in members {
            let _ = writeln!(out, "    \"{id:X}\";");
        }

        let mut seen: HashSet<(NodeId, NodeId)> = HashSet::new();
        for &id in members {
            for &neighbor in self.nodes[id as usize].neighbors(level) {
                let edge = (id.min(neighbor), id.max(neighbor));
                if !seen.insert(edge) {
                    continue;
                }
                let distance = self.distance_between(id, neighbor);
                let _ = writeln!(
                    out,
                    "    \"{id:X}\" -- \"{neighbor:X}\" [label=\"{distance:.2}\"];"
                );
            }
        }
        out.push_str("}\n");
        Ok(out)
    }
}
