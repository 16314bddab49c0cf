//! Calibration tests to verify statistical properties.
//!
//! These tests use `ClusterTest::quick()`-sized permutation counts so many
//! trials finish quickly.

use erp_clusters::{Adjacency, ClusterTest, ObservationTensor};
use ndarray::Array3;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rand_xoshiro::Xoshiro256PlusPlus;

fn grid_adjacency() -> Adjacency {
    // 2 x 3 electrode grid.
    let names = (0..6).map(|i| format!("E{i}")).collect();
    Adjacency::from_edges(names, [(0, 1), (1, 2), (3, 4), (4, 5), (0, 3), (1, 4), (2, 5)]).unwrap()
}

fn gaussian_tensor(rng: &mut Xoshiro256PlusPlus, effect: f64) -> ObservationTensor {
    let normal = Normal::new(0.0, 1.0).unwrap();
    ObservationTensor::new(Array3::from_shape_fn((12, 10, 6), |(_, t, u)| {
        let bump = if (4..7).contains(&t) && u < 2 { effect } else { 0.0 };
        bump + normal.sample(rng)
    }))
}

/// Verify the family-wise false positive rate is bounded.
///
/// Run many trials on pure noise and check rejection rate <= 2*alpha.
#[test]
fn fwer_calibration_on_noise() {
    const TRIALS: usize = 200;
    const ALPHA: f64 = 0.05;

    let adjacency = grid_adjacency();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(2024);
    let mut rejections = 0;

    for trial in 0..TRIALS {
        let tensor = gaussian_tensor(&mut rng, 0.0);
        let result = ClusterTest::new()
            .n_permutations(99)
            .cluster_alpha(ALPHA)
            .seed(trial as u64)
            .run(&tensor, &adjacency)
            .unwrap();
        if result.n_significant() > 0 {
            rejections += 1;
        }
    }

    let rejection_rate = rejections as f64 / TRIALS as f64;
    assert!(
        rejection_rate <= 2.0 * ALPHA,
        "FWER {} exceeds 2*alpha={}",
        rejection_rate,
        2.0 * ALPHA
    );
}

/// A large effect is detected almost always.
#[test]
fn power_on_strong_effect() {
    const TRIALS: usize = 20;

    let adjacency = grid_adjacency();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
    let mut detections = 0;

    for trial in 0..TRIALS {
        let tensor = gaussian_tensor(&mut rng, 2.5);
        let result = ClusterTest::new()
            .n_permutations(199)
            .seed(trial as u64)
            .run(&tensor, &adjacency)
            .unwrap();
        let hit = result
            .significant()
            .any(|c| c.cluster.cells.iter().any(|cell| (4..7).contains(&cell.time) && cell.unit < 2));
        if hit {
            detections += 1;
        }
    }

    assert!(detections >= 18, "detected {detections}/{TRIALS}");
}
