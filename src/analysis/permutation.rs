//! Sign-flip permutation null of the maximum cluster mass.
//!
//! Each permutation draws one ±1 sign per subject, recomputes the t map with
//! the same kernel as the observed map, forms clusters with the observed
//! forming parameters and records the largest |mass| (0 when no cluster
//! forms). Taking the maximum over the whole map controls the family-wise
//! error rate across all clusters.
//!
//! Permutation `i` draws its signs from an RNG seeded with
//! `counter_rng_seed(seed, i)`, so the null is identical whether it is
//! computed sequentially or on any number of threads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::clusters::{max_mass_unchecked, ClusterScratch, FormingParams};
use crate::adjacency::Adjacency;
use crate::error::{ClusterError, ConfigurationError, Result};
use crate::statistics::{draw_signs_into, permutation_rng, quantile, TStatKernel};

/// Cooperative cancellation flag shared with a running test.
///
/// Cloning yields a handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; permutations not yet started are abandoned.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Clear a previous cancellation so the flag can be reused.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// How the null distribution is sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermutationPlan {
    /// Number of sign-flip permutations to draw.
    pub n_permutations: usize,
    /// Base seed; permutation `i` uses `counter_rng_seed(seed, i)`.
    pub seed: u64,
    /// Worker count; `Some(1)` runs on the calling thread.
    pub n_jobs: Option<usize>,
}

/// Maximum cluster masses under the sign-flip null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NullDistribution {
    values: Vec<f64>,
    n_requested: usize,
    skipped: usize,
    seed: u64,
}

impl NullDistribution {
    /// Wrap precomputed maxima (all permutations valid).
    pub fn from_values(values: Vec<f64>, seed: u64) -> Self {
        let n_requested = values.len();
        Self {
            values,
            n_requested,
            skipped: 0,
            seed,
        }
    }

    /// Valid maxima in permutation order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of valid permutations.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of permutations requested.
    pub fn n_requested(&self) -> usize {
        self.n_requested
    }

    /// Permutations dropped because their statistic map was not finite.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Fraction of requested permutations that were skipped.
    pub fn skip_rate(&self) -> f64 {
        if self.n_requested == 0 {
            0.0
        } else {
            self.skipped as f64 / self.n_requested as f64
        }
    }

    /// Monte-Carlo p-value of a cluster with the given mass.
    ///
    /// `(1 + #{null >= |mass|}) / (1 + n_valid)`, never 0 and at most 1.
    pub fn p_value(&self, mass: f64) -> f64 {
        let magnitude = mass.abs();
        let exceed = self.values.iter().filter(|&&v| v >= magnitude).count();
        (1 + exceed) as f64 / (1 + self.values.len()) as f64
    }

    /// Smallest |mass| that would be reported at level `alpha`, estimated as
    /// the (1 - alpha) quantile of the null. `None` for an empty null.
    pub fn critical_mass(&self, alpha: f64) -> Option<f64> {
        quantile(&self.values, 1.0 - alpha)
    }
}

enum Draw {
    Mass(f64),
    Skipped,
    Cancelled,
}

/// Per-worker buffers.
struct Workspace {
    signs: Vec<f64>,
    map: Array2<f64>,
    clusters: ClusterScratch,
}

impl Workspace {
    fn new(kernel: &TStatKernel<'_>) -> Self {
        Self {
            signs: vec![1.0; kernel.n_subjects()],
            map: Array2::zeros(kernel.map_dim()),
            clusters: ClusterScratch::new(),
        }
    }
}

struct Job<'a, 'k> {
    kernel: &'a TStatKernel<'k>,
    adjacency: &'a Adjacency,
    params: &'a FormingParams,
    seed: u64,
    cancel: Option<&'a CancellationToken>,
}

impl Job<'_, '_> {
    fn draw(&self, index: usize, ws: &mut Workspace) -> Draw {
        if self.cancel.is_some_and(CancellationToken::is_cancelled) {
            return Draw::Cancelled;
        }
        draw_signs_into(&mut permutation_rng(self.seed, index), &mut ws.signs);
        self.kernel.compute_into(&ws.signs, &mut ws.map);
        if ws.map.iter().any(|v| !v.is_finite()) {
            tracing::debug!(permutation = index, "non-finite statistic map, permutation skipped");
            return Draw::Skipped;
        }
        Draw::Mass(max_mass_unchecked(&ws.map, self.adjacency, self.params, &mut ws.clusters))
    }
}

fn run_sequential(job: &Job<'_, '_>, n: usize) -> Vec<Draw> {
    let mut ws = Workspace::new(job.kernel);
    let mut draws = Vec::with_capacity(n);
    for i in 0..n {
        let draw = job.draw(i, &mut ws);
        let cancelled = matches!(draw, Draw::Cancelled);
        draws.push(draw);
        if cancelled {
            break;
        }
    }
    draws
}

#[cfg(feature = "parallel")]
fn run_parallel(job: &Job<'_, '_>, n: usize, n_jobs: Option<usize>) -> Vec<Draw> {
    crate::thread_pool::install(n_jobs, || {
        (0..n)
            .into_par_iter()
            .map_init(|| Workspace::new(job.kernel), |ws, i| job.draw(i, ws))
            .collect()
    })
}

/// Build the null distribution of maximum cluster mass.
///
/// A permutation whose map is not finite is skipped and counted. With
/// [`TStatKernel`] this only happens when the observed map overflows too,
/// since the per-cell sum of squares does not depend on the signs.
///
/// # Errors
///
/// `SpatialMismatch` if the kernel's unit axis differs from the adjacency.
/// `Cancelled` if `cancel` fires before every permutation has run; no
/// partial null is returned.
pub fn build_null(
    kernel: &TStatKernel<'_>,
    adjacency: &Adjacency,
    params: &FormingParams,
    plan: &PermutationPlan,
    cancel: Option<&CancellationToken>,
) -> Result<NullDistribution> {
    let (_, data_units) = kernel.map_dim();
    if data_units != adjacency.len() {
        return Err(ConfigurationError::SpatialMismatch {
            data_units,
            adjacency_units: adjacency.len(),
        }
        .into());
    }

    let start = Instant::now();
    let n = plan.n_permutations;
    let job = Job {
        kernel,
        adjacency,
        params,
        seed: plan.seed,
        cancel,
    };

    #[cfg(feature = "parallel")]
    let draws = if plan.n_jobs == Some(1) {
        run_sequential(&job, n)
    } else {
        run_parallel(&job, n, plan.n_jobs)
    };
    #[cfg(not(feature = "parallel"))]
    let draws = run_sequential(&job, n);

    let mut values = Vec::with_capacity(n);
    let mut skipped = 0;
    let mut completed = 0;
    let mut cancelled = false;
    for draw in draws {
        match draw {
            Draw::Mass(m) => {
                values.push(m);
                completed += 1;
            }
            Draw::Skipped => {
                skipped += 1;
                completed += 1;
            }
            Draw::Cancelled => cancelled = true,
        }
    }
    if cancelled {
        tracing::info!(completed, requested = n, "permutation run cancelled");
        return Err(ClusterError::Cancelled { completed, requested: n });
    }

    tracing::debug!(
        permutations = n,
        skipped,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "null distribution built"
    );

    Ok(NullDistribution {
        values,
        n_requested: n,
        skipped,
        seed: plan.seed,
    })
}
