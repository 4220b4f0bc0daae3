//! Graph vertices.
//!
//! Nodes live in a single arena owned by the collection and refer to each other
//! by [`NodeId`], which is also their arena index.

/// Stable node identity, assigned from 0 in insertion order.
pub type NodeId = u32;

/// A graph vertex: an owned vector plus one neighbor list per level it joins.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    vector: Box<[f32]>,
    neighbors: Vec<Vec<NodeId>>,
}

impl Node {
    pub(crate) fn new(id: NodeId, vector: Box<[f32]>, level: usize) -> Self {
        Self {
            id,
            vector,
            neighbors: vec![Vec::new(); level + 1],
        }
    }

    /// The node's identity.
    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The highest level this node participates in.
    #[inline]
    pub fn level(&self) -> usize {
        self.neighbors.len() - 1
    }

    #[inline]
    pub fn vector(&self) -> &[f32] {
        &self.vector
    }

    /// Neighbors at `level`. Levels above the node's own yield an empty slice.
    #[inline]
    pub fn neighbors(&self, level: usize) -> &[NodeId] {
        self.neighbors.get(level).map_or(&[][..], Vec::as_slice)
    }

    /// Number of neighbors at `level`.
    #[inline]
    pub fn degree(&self, level: usize) -> usize {
        self.neighbors(level).len()
    }

    /// Adds `other` at `level` unless already present. Returns `true` if added.
    pub(crate) fn connect(&mut self, other: NodeId, level: usize) -> bool {
        let list = &mut self.neighbors[level];
        if list.contains(&other) {
            return false;
        }
        list.push(other);
        true
    }

    /// Removes `other` from `level`. Returns `true` if it was present.
    pub(crate) fn disconnect(&mut self, other: NodeId, level: usize) -> bool {
        let Some(list) = self.neighbors.get_mut(level) else {
            return false;
        };
        match list.iter().position(|&n| n == other) {
            Some(pos) => {
                list.swap_remove(pos);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbors_above_level_are_empty() {
        let node = Node::new(7, vec![1.0, 2.0].into_boxed_slice(), 1);
        assert_eq!(node.level(), 1);
        assert!(node.neighbors(0).is_empty());
        assert!(node.neighbors(1).is_empty());
        assert!(node.neighbors(2).is_empty());
        assert!(node.neighbors(usize::MAX).is_empty());
    }

    #[test]
    fn test_connect_is_idempotent() {
        let mut node = Node::new(0, vec![0.0].into_boxed_slice(), 0);
        assert!(node.connect(3, 0));
        assert!(!node.connect(3, 0));
        assert_eq!(node.neighbors(0), &[3]);
    }

    #[test]
    fn test_disconnect() {
        let mut node = Node::new(0, vec![0.0].into_boxed_slice(), 0);
        node.connect(1, 0);
        node.connect(2, 0);
        assert!(node.disconnect(1, 0));
        assert!(!node.disconnect(1, 0));
        assert!(!node.disconnect(2, 5));
        assert_eq!(node.neighbors(0), &[2]);
    }
}
