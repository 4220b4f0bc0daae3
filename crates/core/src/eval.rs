//! Recall measurement against an exact baseline.

use crate::hnsw::{NodeId, ScoredNode};
use std::collections::HashSet;

/// Number of ids present in both result lists.
pub fn overlap(approx: &[ScoredNode], exact: &[ScoredNode]) -> usize {
    let truth: HashSet<NodeId> = exact.iter().map(|r| r.id).collect();
    approx.iter().filter(|r| truth.contains(&r.id)).count()
}

/// Fraction of the exact result set recovered by the approximate one.
///
/// Returns 1.0 when `exact` is empty: there was nothing to find.
pub fn recall(approx: &[ScoredNode], exact: &[ScoredNode]) -> f32 {
    if exact.is_empty() {
        return 1.0;
    }
    overlap(approx, exact) as f32 / exact.len() as f32
}
