use criterion::{black_box, criterion_group, criterion_main, Criterion};
use erp_clusters::analysis::{max_cluster_mass, ClusterScratch, FormingParams};
use erp_clusters::{Adjacency, ClusterTest, ObservationTensor, Tail};
use ndarray::{Array2, Array3};
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rand_xoshiro::Xoshiro256PlusPlus;

/// Square electrode grid with 4-neighbour adjacency.
fn grid(side: usize) -> Adjacency {
    let names = (0..side * side).map(|i| format!("E{i}")).collect();
    let mut edges = Vec::new();
    for r in 0..side {
        for c in 0..side {
            let i = r * side + c;
            if c + 1 < side {
                edges.push((i, i + 1));
            }
            if r + 1 < side {
                edges.push((i, i + side));
            }
        }
    }
    Adjacency::from_edges(names, edges).unwrap()
}

fn noise(shape: (usize, usize, usize)) -> ObservationTensor {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
    let normal = Normal::new(0.0, 1.0).unwrap();
    ObservationTensor::new(Array3::from_shape_fn(shape, |_| normal.sample(&mut rng)))
}

fn bench_cluster_test(c: &mut Criterion) {
    let mut group = c.benchmark_group("cluster_test");
    group.sample_size(10);

    let adjacency = grid(8);
    let tensor = noise((20, 100, 64));

    group.bench_function("full_run_256_permutations", |b| {
        b.iter(|| {
            // Full pipeline on a 100-sample, 64-channel noise data set.
            let result = ClusterTest::quick().seed(1).run(&tensor, &adjacency).unwrap();
            black_box(result.null.len())
        });
    });

    group.bench_function("full_run_sequential", |b| {
        b.iter(|| {
            let result = ClusterTest::quick().seed(1).n_jobs(1).run(&tensor, &adjacency).unwrap();
            black_box(result.null.len())
        });
    });

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
    let normal = Normal::new(0.0, 2.0).unwrap();
    let map = Array2::from_shape_fn((100, 64), |_| normal.sample(&mut rng));
    let params = FormingParams::new(2.09, Tail::TwoSided);
    let mut scratch = ClusterScratch::new();
    group.bench_function("max_cluster_mass", |b| {
        b.iter(|| black_box(max_cluster_mass(&map, &adjacency, &params, &mut scratch).unwrap()));
    });

    group.finish();
}

criterion_group!(benches, bench_cluster_test);
criterion_main!(benches);
