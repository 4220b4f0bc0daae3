use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use recipevec_core::config;
use recipevec_core::eval::recall;
use recipevec_core::{HnswCollection, HnswConfig, NeighborSelection, SharedCollection};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "recipevec",
    about = "Build, verify and benchmark an HNSW collection on random vectors"
)]
struct Args {
    /// Number of random vectors to insert
    #[arg(short = 'n', long, default_value_t = config::DEFAULT_BUILD_COUNT)]
    count: usize,

    /// Vector dimension
    #[arg(short, long, default_value_t = config::DEFAULT_BUILD_DIMENSION)]
    dim: usize,

    /// Maximum links per node above layer 0
    #[arg(long, default_value_t = config::HNSW_DEFAULT_M)]
    m: usize,

    /// Maximum links per node at layer 0 (default: 2 * m)
    #[arg(long)]
    m0: Option<usize>,

    /// Candidate frontier size during insertion
    #[arg(long, default_value_t = config::HNSW_DEFAULT_EF_CONSTRUCTION)]
    ef_construction: usize,

    /// Use diversity-aware neighbor selection instead of the m closest
    #[arg(long, default_value_t = false)]
    heuristic: bool,

    /// Number of random queries for the recall measurement
    #[arg(short, long, default_value_t = config::DEFAULT_QUERY_COUNT)]
    queries: usize,

    /// Results per query
    #[arg(short, long, default_value_t = config::DEFAULT_K)]
    k: usize,

    /// Result frontier size during search
    #[arg(long, default_value_t = config::HNSW_DEFAULT_EF_SEARCH)]
    ef: usize,

    /// Reader threads in the throughput phase
    #[arg(long, default_value_t = 4)]
    threads: usize,

    /// Throughput phase duration in seconds (0 = disabled)
    #[arg(long, default_value_t = config::DEFAULT_THROUGHPUT_SECS)]
    duration_secs: u64,

    /// Directory to write one Graphviz file per layer into
    #[arg(long)]
    dot_dir: Option<PathBuf>,

    /// Seed for both the data generator and the level generator
    #[arg(long, default_value_t = config::HNSW_DEFAULT_SEED)]
    seed: u64,
}

fn random_vector(rng: &mut StdRng, dim: usize) -> Vec<f32> {
    (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("recipevec=info".parse().expect("valid directive literal"))
                .add_directive(
                    "recipevec_core=info"
                        .parse()
                        .expect("valid directive literal"),
                ),
        )
        .init();

    let args = Args::parse();

    let selection = if args.heuristic {
        NeighborSelection::Heuristic {
            extend_candidates: true,
            keep_pruned: true,
        }
    } else {
        NeighborSelection::Simple
    };
    let hnsw_config = HnswConfig {
        m_max0: args.m0.unwrap_or(args.m * 2),
        ef_construction: args.ef_construction,
        selection,
        seed: args.seed,
        ..HnswConfig::with_m(args.m)
    };

    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut collection = HnswCollection::new(args.dim, hnsw_config)?;
    tracing::info!(
        count = args.count,
        dim = args.dim,
        m = args.m,
        ef_construction = args.ef_construction,
        heuristic = args.heuristic,
        "building collection"
    );

    let start = Instant::now();
    for i in 0..args.count {
        collection.add(&random_vector(&mut rng, args.dim))?;
        if (i + 1) % 10_000 == 0 {
            tracing::info!("inserted {}/{}", i + 1, args.count);
        }
    }
    let elapsed = start.elapsed();
    tracing::info!(
        "built {} nodes in {:.2}s ({:.0} inserts/s), {} layers",
        collection.len(),
        elapsed.as_secs_f64(),
        collection.len() as f64 / elapsed.as_secs_f64().max(f64::EPSILON),
        collection.layer_count()
    );

    let report = collection.verify();
    if report.passed() {
        tracing::info!("graph verified");
    } else {
        tracing::error!("{} verification errors", report.errors().len());
    }

    measure_recall(&collection, &mut rng, &args)?;
    measure_self_recall(&collection, &args)?;

    if let Some(ref dir) = args.dot_dir {
        write_dot_files(&collection, dir)?;
    }

    if args.duration_secs > 0 && args.threads > 0 && !collection.is_empty() {
        let queries: Vec<Vec<f32>> = (0..args.queries.max(1))
            .map(|_| random_vector(&mut rng, args.dim))
            .collect();
        measure_throughput(collection.into(), &queries, &args);
    }

    Ok(())
}

/// Mean recall of approximate search against the exact scan over random queries.
fn measure_recall(
    collection: &HnswCollection,
    rng: &mut StdRng,
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    if args.queries == 0 {
        return Ok(());
    }
    let mut total = 0.0f64;
    let start = Instant::now();
    for _ in 0..args.queries {
        let query = random_vector(rng, args.dim);
        let approx = collection.search_scored(&query, args.k, args.ef)?;
        let exact = collection.search_exact_scored(&query, args.k)?;
        total += recall(&approx, &exact) as f64;
    }
    tracing::info!(
        "recall@{} at ef={}: {:.4} over {} queries ({:.2}s)",
        args.k,
        args.ef,
        total / args.queries as f64,
        args.queries,
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Fraction of stored vectors that come back as their own nearest neighbor.
fn measure_self_recall(
    collection: &HnswCollection,
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    if collection.is_empty() {
        return Ok(());
    }
    let mut found = 0usize;
    for node in collection.nodes() {
        let results = collection.search_scored(node.vector(), 1, args.ef)?;
        if results.first().is_some_and(|r| r.id == node.id()) {
            found += 1;
        }
    }
    tracing::info!(
        "self-recall at ef={}: {}/{} ({:.4})",
        args.ef,
        found,
        collection.len(),
        found as f64 / collection.len() as f64
    );
    Ok(())
}

fn write_dot_files(collection: &HnswCollection, dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    for level in 0..collection.layer_count() {
        let Ok(dot) = collection.to_dot(level) else {
            continue;
        };
        let path = dir.join(format!("level_{level}.dot"));
        std::fs::write(&path, dot)?;
        tracing::info!("wrote {}", path.display());
    }
    Ok(())
}

/// Runs `args.threads` readers against a shared collection and reports QPS each second.
fn measure_throughput(shared: SharedCollection, queries: &[Vec<f32>], args: &Args) {
    let completed = AtomicU64::new(0);
    let stop = AtomicBool::new(false);
    let duration = Duration::from_secs(args.duration_secs);

    std::thread::scope(|scope| {
        for t in 0..args.threads {
            let shared = shared.clone();
            let completed = &completed;
            let stop = &stop;
            scope.spawn(move || {
                let mut i = t;
                while !stop.load(Ordering::Relaxed) {
                    let query = &queries[i % queries.len()];
                    if let Err(e) = shared.search(query, args.k, args.ef) {
                        tracing::error!("search failed: {}", e);
                        return;
                    }
                    completed.fetch_add(1, Ordering::Relaxed);
                    i += args.threads;
                }
            });
        }

        let start = Instant::now();
        let mut last = 0u64;
        while start.elapsed() < duration {
            std::thread::sleep(Duration::from_secs(1));
            let now = completed.load(Ordering::Relaxed);
            tracing::info!("{} queries/s", now - last);
            last = now;
        }
        stop.store(true, Ordering::Relaxed);

        let total = completed.load(Ordering::Relaxed);
        tracing::info!(
            "throughput: {} queries in {:.1}s with {} threads ({:.0} QPS)",
            total,
            start.elapsed().as_secs_f64(),
            args.threads,
            total as f64 / start.elapsed().as_secs_f64()
        );
    });
}
