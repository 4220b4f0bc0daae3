//! Generation-stamped visited set for graph traversal.
//!
//! Marks are compared against a generation counter, so `clear()` is O(1) instead of
//! zeroing the array. Used by layer search, verification and re-wiring traversals.

use crate::hnsw::node::NodeId;

/// Visited set over the node arena. Each `clear()` bumps the generation;
/// the array is only zeroed when the u16 counter wraps.
#[derive(Debug, Clone)]
pub struct VisitedSet {
    data: Vec<u16>,
    generation: u16,
}

impl VisitedSet {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0u16; capacity],
            generation: 1,
        }
    }

    /// Reset the set. O(1) amortized: full memset only every 65534 calls.
    pub fn clear(&mut self) {
        if self.generation == u16::MAX {
            self.data.fill(0);
            self.generation = 1;
        } else {
            self.generation += 1;
        }
    }

    /// Grow to cover at least `cap` node ids.
    pub fn ensure_capacity(&mut self, cap: usize) {
        if cap > self.data.len() {
            self.data.resize(cap, 0);
        }
    }

    /// Mark `id` as visited. Returns `true` if it was not visited before.
    #[inline]
    pub fn insert(&mut self, id: NodeId) -> bool {
        let idx = id as usize;
        if self.data[idx] == self.generation {
            false
        } else {
            self.data[idx] = self.generation;
            true
        }
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.data
            .get(id as usize)
            .is_some_and(|&g| g == self.generation)
    }
}

impl Default for VisitedSet {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_clear() {
        let mut vs = VisitedSet::new(100);
        assert!(vs.insert(0));
        assert!(!vs.insert(0));
        assert!(vs.contains(0));
        assert!(vs.insert(50));

        vs.clear();
        assert!(!vs.contains(0));
        assert!(vs.insert(0));
        assert!(vs.insert(50));
    }

    #[test]
    fn test_contains_out_of_range() {
        let vs = VisitedSet::new(4);
        assert!(!vs.contains(10));
    }

    #[test]
    fn test_generation_overflow() {
        let mut vs = VisitedSet::new(10);
        for _ in 0..65534 {
            vs.clear();
        }
        assert_eq!(vs.generation, u16::MAX);
        vs.insert(5);

        vs.clear();
        assert_eq!(vs.generation, 1);
        assert!(vs.insert(5));
    }
}
