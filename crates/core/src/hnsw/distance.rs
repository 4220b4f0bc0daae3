//! Distance metric implementations for HNSW graph construction and search.
//!
//! A collection picks exactly one metric at construction time and applies it to
//! every distance it computes. Mixing metrics inside one graph breaks the ordering
//! that neighbor selection and search termination rely on.

use crate::error::{HnswError, Result};

/// Number of independent accumulators in the chunked loops below.
const LANES: usize = 8;

/// Distance metric used for vector similarity computation.
///
/// All metrics return a distance value where **lower is better** (more similar).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum DistanceMetric {
    /// Cosine distance: `1 - cosine_similarity`. Range: \[0, 2\].
    /// Any zero-norm input yields 1.0.
    #[default]
    Cosine,
    /// Euclidean (L2) distance. Range: \[0, ∞).
    Euclidean,
}

impl DistanceMetric {
    /// Distance between two vectors of equal length.
    ///
    /// # Panics
    ///
    /// Panics if the lengths differ. Collections validate dimensions at their
    /// public boundary, so a mismatch here is a bug in the caller.
    #[inline]
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        assert_eq!(
            a.len(),
            b.len(),
            "vectors must be of the same length ({} vs {})",
            a.len(),
            b.len()
        );
        match self {
            DistanceMetric::Cosine => cosine_distance(a, b),
            DistanceMetric::Euclidean => euclidean_distance(a, b),
        }
    }

    /// Checked variant of [`distance`](Self::distance) for untrusted input.
    pub fn try_distance(&self, a: &[f32], b: &[f32]) -> Result<f32> {
        if a.len() != b.len() {
            return Err(HnswError::DimensionMismatch {
                expected: a.len(),
                actual: b.len(),
            });
        }
        Ok(self.distance(a, b))
    }
}

/// `1 - dot(a, b) / (|a| * |b|)`, or 1.0 when either norm is zero.
fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = [0.0f32; LANES];
    let mut norm_a = [0.0f32; LANES];
    let mut norm_b = [0.0f32; LANES];

    let chunks_a = a.chunks_exact(LANES);
    let chunks_b = b.chunks_exact(LANES);
    let tail_a = chunks_a.remainder();
    let tail_b = chunks_b.remainder();

    for (ca, cb) in chunks_a.zip(chunks_b) {
        for i in 0..LANES {
            dot[i] += ca[i] * cb[i];
            norm_a[i] += ca[i] * ca[i];
            norm_b[i] += cb[i] * cb[i];
        }
    }

    let mut dot: f32 = dot.iter().sum();
    let mut norm_a: f32 = norm_a.iter().sum();
    let mut norm_b: f32 = norm_b.iter().sum();
    for (&x, &y) in tail_a.iter().zip(tail_b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    // Rounding can push identical vectors a hair below zero.
    (1.0 - dot / (norm_a * norm_b).sqrt()).max(0.0)
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    let mut acc = [0.0f32; LANES];

    let chunks_a = a.chunks_exact(LANES);
    let chunks_b = b.chunks_exact(LANES);
    let tail_a = chunks_a.remainder();
    let tail_b = chunks_b.remainder();

    for (ca, cb) in chunks_a.zip(chunks_b) {
        for i in 0..LANES {
            let d = ca[i] - cb[i];
            acc[i] += d * d;
        }
    }

    let mut sum: f32 = acc.iter().sum();
    for (&x, &y) in tail_a.iter().zip(tail_b) {
        let d = x - y;
        sum += d * d;
    }
    sum.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_identical_is_zero() {
        let a = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        let d = DistanceMetric::Cosine.distance(&a, &a);
        assert!(d.abs() < 1e-6, "self-distance should be ~0, got {d}");
    }

    #[test]
    fn test_cosine_orthogonal_is_one() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        let d = DistanceMetric::Cosine.distance(&a, &b);
        assert!((d - 1.0).abs() < 1e-6, "orthogonal cosine distance = 1.0, got {d}");
    }

    #[test]
    fn test_cosine_opposite_is_two() {
        let a = vec![1.0, -2.0, 0.5];
        let b = vec![-1.0, 2.0, -0.5];
        let d = DistanceMetric::Cosine.distance(&a, &b);
        assert!((d - 2.0).abs() < 1e-5, "opposite cosine distance = 2.0, got {d}");
    }

    #[test]
    fn test_cosine_zero_norm_is_one() {
        let zero = vec![0.0; 12];
        let other: Vec<f32> = (0..12).map(|i| i as f32).collect();
        assert_eq!(DistanceMetric::Cosine.distance(&zero, &other), 1.0);
        assert_eq!(DistanceMetric::Cosine.distance(&other, &zero), 1.0);
        assert_eq!(DistanceMetric::Cosine.distance(&zero, &zero), 1.0);
    }

    #[test]
    fn test_cosine_is_scale_invariant() {
        let a: Vec<f32> = (0..17).map(|i| (i as f32 * 0.37).sin()).collect();
        let b: Vec<f32> = (0..17).map(|i| (i as f32 * 0.11).cos()).collect();
        let scaled: Vec<f32> = a.iter().map(|x| x * 42.0).collect();
        let d1 = DistanceMetric::Cosine.distance(&a, &b);
        let d2 = DistanceMetric::Cosine.distance(&scaled, &b);
        assert!((d1 - d2).abs() < 1e-5, "{d1} vs {d2}");
    }

    #[test]
    fn test_euclidean_distance() {
        let a = vec![0.0, 0.0, 0.0];
        let b = vec![3.0, 4.0, 0.0];
        let d = DistanceMetric::Euclidean.distance(&a, &b);
        assert!((d - 5.0).abs() < 1e-6, "euclidean should be 5, got {d}");
    }

    #[test]
    fn test_chunked_matches_naive() {
        let a: Vec<f32> = (0..37).map(|i| (i as f32).sin()).collect();
        let b: Vec<f32> = (0..37).map(|i| (i as f32 * 0.5).cos()).collect();
        let dot: f32 = a.iter().zip(&b).map(|(x, y)| x * y).sum();
        let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        let naive = 1.0 - dot / (na * nb);
        let d = DistanceMetric::Cosine.distance(&a, &b);
        assert!((d - naive).abs() < 1e-5, "chunked {d} vs naive {naive}");
    }

    #[test]
    #[should_panic(expected = "same length")]
    fn test_mismatched_lengths_panic() {
        DistanceMetric::Cosine.distance(&[1.0, 2.0], &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_try_distance_reports_mismatch() {
        let err = DistanceMetric::Cosine
            .try_distance(&[1.0, 2.0], &[1.0, 2.0, 3.0])
            .unwrap_err();
        assert_eq!(
            err,
            HnswError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        );
    }
}
