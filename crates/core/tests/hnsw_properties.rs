//! End-to-end properties of the HNSW collection on seeded random data.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use recipevec_core::eval::{overlap, recall};
use recipevec_core::{
    DistanceMetric, HnswCollection, HnswConfig, HnswError, NeighborSelection, NodeId,
};

fn random_vectors(n: usize, dim: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect())
        .collect()
}

fn build(vectors: &[Vec<f32>], config: HnswConfig) -> HnswCollection {
    let mut collection = HnswCollection::new(vectors[0].len(), config).unwrap();
    for v in vectors {
        collection.add(v).unwrap();
    }
    collection
}

fn positive_orthant_vectors(n: usize, dim: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| (0..dim).map(|_| rng.gen::<f32>()).collect())
        .collect()
}

/// Inserts every vector and checks the whole graph after each insertion.
fn assert_verified_build(vectors: &[Vec<f32>], config: HnswConfig, label: &str) {
    let mut collection = HnswCollection::new(vectors[0].len(), config.clone()).unwrap();
    for (i, v) in vectors.iter().enumerate() {
        if let Err(e) = collection.add(v) {
            panic!("{label} {config:?}: add #{i} failed: {e}");
        }
        let report = collection.verify();
        assert!(report.passed(), "{label} {config:?}: after add #{i}: {report}");
    }
}

fn stress_configs(metric: DistanceMetric) -> Vec<HnswConfig> {
    let selections = [
        NeighborSelection::Simple,
        NeighborSelection::Heuristic {
            extend_candidates: true,
            keep_pruned: false,
        },
    ];
    let mut configs = Vec::new();
    for m in [2, 3, 4] {
        for selection in selections {
            configs.push(HnswConfig {
                distance_metric: metric,
                selection,
                seed: 7 + m as u64,
                ..HnswConfig::with_m(m)
            });
        }
    }
    configs
}

#[test]
fn test_collinear_points_stay_verified() {
    let points: Vec<Vec<f32>> = (0..150).map(|i| vec![i as f32, 0.0]).collect();
    for config in stress_configs(DistanceMetric::Euclidean) {
        assert_verified_build(&points, config, "collinear");
    }
}

#[test]
fn test_duplicate_vectors_stay_verified() {
    let points = vec![vec![0.25, 0.5, 0.75]; 120];
    for metric in [DistanceMetric::Cosine, DistanceMetric::Euclidean] {
        for config in stress_configs(metric) {
            assert_verified_build(&points, config, "duplicates");
        }
    }
}

#[test]
fn test_zero_vectors_under_cosine_stay_verified() {
    let mut points = vec![vec![0.0; 4]; 60];
    points.extend(positive_orthant_vectors(60, 4, 101));
    points.extend(vec![vec![0.0; 4]; 30]);
    for config in stress_configs(DistanceMetric::Cosine) {
        assert_verified_build(&points, config, "zero vectors");
    }
}

#[test]
fn test_positive_orthant_stays_verified() {
    let points = positive_orthant_vectors(200, 8, 111);
    for config in stress_configs(DistanceMetric::Cosine) {
        assert_verified_build(&points, config, "positive orthant");
    }
}

#[test]
fn test_verify_passes_after_every_add() {
    let configs = [
        HnswConfig::with_m(4),
        HnswConfig {
            selection: NeighborSelection::Heuristic {
                extend_candidates: false,
                keep_pruned: true,
            },
            ..HnswConfig::with_m(4)
        },
        HnswConfig {
            distance_metric: DistanceMetric::Euclidean,
            ..HnswConfig::with_m(2)
        },
    ];
    for config in configs {
        let mut collection = HnswCollection::new(8, config).unwrap();
        for v in random_vectors(250, 8, 11) {
            collection.add(&v).unwrap();
            let report = collection.verify();
            assert!(report.passed(), "after {} inserts: {report}", collection.len());
        }
    }
}

#[test]
fn test_exact_search_matches_brute_force() {
    let vectors = random_vectors(400, 12, 21);
    let collection = build(&vectors, HnswConfig::with_m(6));
    let metric = collection.config().distance_metric;

    for q in random_vectors(20, 12, 22) {
        let mut expected: Vec<(f32, NodeId)> = vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (metric.distance(&q, v), i as NodeId))
            .collect();
        expected.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let exact = collection.search_exact_scored(&q, 10).unwrap();
        let ids: Vec<NodeId> = exact.iter().map(|r| r.id).collect();
        let expected_ids: Vec<NodeId> = expected.iter().take(10).map(|e| e.1).collect();
        assert_eq!(ids, expected_ids);
    }
}

#[test]
fn test_recall_at_four_k() {
    let vectors = random_vectors(2000, 8, 31);
    let collection = build(&vectors, HnswConfig::with_m(8));
    let k = 10;

    let queries = random_vectors(50, 8, 32);
    let mut total = 0.0;
    for q in &queries {
        let approx = collection.search_scored(q, k, 4 * k).unwrap();
        let exact = collection.search_exact_scored(q, k).unwrap();
        total += recall(&approx, &exact);
    }
    let mean = total / queries.len() as f32;
    assert!(mean >= 0.8, "mean recall {mean} below 0.8");
}

#[test]
fn test_recall_grows_with_ef() {
    let vectors = random_vectors(1500, 8, 41);
    let collection = build(&vectors, HnswConfig::with_m(6));
    let queries = random_vectors(40, 8, 42);

    let mean_recall = |ef: usize| {
        let total: f32 = queries
            .iter()
            .map(|q| {
                let approx = collection.search_scored(q, 10, ef).unwrap();
                let exact = collection.search_exact_scored(q, 10).unwrap();
                recall(&approx, &exact)
            })
            .sum();
        total / queries.len() as f32
    };

    let low = mean_recall(10);
    let high = mean_recall(200);
    assert!(high >= low, "recall dropped from {low} to {high}");
    assert!(high >= 0.9, "recall at ef=200 is {high}");
}

#[test]
fn test_thousand_vectors_overlap() {
    let config = HnswConfig {
        ef_construction: 40,
        seed: 1234,
        ..HnswConfig::with_m(4)
    };
    let vectors = random_vectors(1000, 8, 51);
    let collection = build(&vectors, config);

    for (i, q) in random_vectors(30, 8, 52).iter().enumerate() {
        let exact = collection.search_exact_scored(q, 10).unwrap();
        let approx = collection.search_scored(q, 10, 64).unwrap();
        assert_eq!(approx.len(), 10);
        let shared = overlap(&approx, &exact);
        assert!(shared >= 8, "query {i}: only {shared} of 10 exact neighbors found");
    }
}

#[test]
fn test_self_identity_with_full_ef() {
    let vectors = random_vectors(300, 8, 61);
    let collection = build(&vectors, HnswConfig::with_m(4));
    let n = collection.len();

    for (i, v) in vectors.iter().enumerate() {
        let results = collection.search_scored(v, 1, n).unwrap();
        assert_eq!(results.len(), 1);
        assert!(
            results[0].distance < 1e-5,
            "vector {i} found at distance {}",
            results[0].distance
        );
        assert_eq!(collection.vector(results[0].id), Some(v.as_slice()));
    }
}

#[test]
fn test_two_dimensional_scenario() {
    let config = HnswConfig {
        distance_metric: DistanceMetric::Euclidean,
        ..HnswConfig::default()
    };
    let mut collection = HnswCollection::new(2, config).unwrap();
    for p in [[0.0, 0.0], [1.0, 0.0], [10.0, 10.0]] {
        collection.add(&p).unwrap();
    }
    let results = collection.search(&[0.0, 1.0], 1, 4).unwrap();
    let origin: &[f32] = &[0.0, 0.0];
    assert_eq!(results, vec![origin]);
    assert!(collection.verify().passed());
}

#[test]
fn test_empty_collection() {
    let collection = HnswCollection::with_default_config(384).unwrap();
    let query = vec![0.1; 384];
    assert!(collection.search(&query, 10, 64).unwrap().is_empty());
    assert!(collection.search_exact(&query, 10).unwrap().is_empty());
    assert!(collection.verify().passed());
    assert_eq!(collection.layer_count(), 0);
}

#[test]
fn test_argument_errors_leave_collection_usable() {
    let mut collection = build(&random_vectors(20, 4, 71), HnswConfig::with_m(4));
    assert_eq!(
        collection.add(&[1.0; 5]).unwrap_err(),
        HnswError::DimensionMismatch {
            expected: 4,
            actual: 5
        }
    );
    assert_eq!(collection.search(&[], 1, 4).unwrap_err(), HnswError::EmptyVector);
    assert!(!collection.is_corrupted());
    assert_eq!(collection.add(&[0.1, 0.2, 0.3, 0.4]).unwrap(), 20);
}

#[test]
fn test_dot_output_covers_every_layer() {
    let collection = build(&random_vectors(200, 4, 81), HnswConfig::with_m(3));
    for level in 0..collection.layer_count() {
        let dot = collection.to_dot(level).unwrap();
        let members = collection.layer(level).unwrap();
        let declared = dot.lines().filter(|l| l.ends_with("\";")).count();
        assert_eq!(declared, members.len());

        let edges = dot.lines().filter(|l| l.contains(" -- ")).count();
        let degree_sum: usize = members
            .iter()
            .map(|&id| collection.node(id).unwrap().degree(level))
            .sum();
        assert_eq!(edges * 2, degree_sum);
    }
    assert!(matches!(
        collection.to_dot(collection.layer_count()),
        Err(HnswError::LevelOutOfRange { .. })
    ));
}

#[test]
fn test_same_seed_builds_same_graph() {
    let vectors = random_vectors(300, 6, 91);
    let a = build(&vectors, HnswConfig::with_m(4));
    let b = build(&vectors, HnswConfig::with_m(4));
    assert_eq!(a.layer_count(), b.layer_count());
    assert_eq!(a.entry_point(), b.entry_point());
    for level in 0..a.layer_count() {
        assert_eq!(a.to_dot(level).unwrap(), b.to_dot(level).unwrap());
    }
}
