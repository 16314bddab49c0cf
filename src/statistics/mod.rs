//! Statistical building blocks.
//!
//! - One-sample t maps and grand averages over contrast tensors
//! - Student-t CDF / inverse CDF for the forming threshold
//! - Counter-seeded sign flips for the permutation null
//! - Quantiles for summarizing the null distribution

mod quantile;
mod signflip;
mod special;
mod tmap;

pub use quantile::{compute_quantile, quantile};
pub use signflip::{counter_rng_seed, draw_signs_into, fresh_seed, permutation_rng, permutation_signs};
pub use special::{ln_gamma, regularized_incomplete_beta, t_cdf, t_ppf};
pub use tmap::{grand_average, one_sample_t, TStatKernel, DEGENERATE_VARIANCE_RTOL};

use crate::config::{Config, Tail};
use crate::error::{ConfigurationError, Result};

/// Cluster-forming t threshold for `n_subjects` under `config`.
///
/// An explicit `t_threshold` wins; otherwise the inverse Student-t CDF with
/// `n_subjects - 1` degrees of freedom is evaluated at `1 - p/2` for every
/// tail.
pub fn forming_threshold(config: &Config, n_subjects: usize) -> Result<f64> {
    if let Some(t) = config.t_threshold {
        return Ok(t);
    }
    if n_subjects < 2 {
        return Err(ConfigurationError::InsufficientSubjects { n_subjects }.into());
    }
    let df = (n_subjects - 1) as f64;
    let threshold = t_ppf(config.tail.threshold_quantile(config.p_threshold), df);
    if !threshold.is_finite() || threshold <= 0.0 {
        return Err(ConfigurationError::InvalidThreshold(threshold).into());
    }
    Ok(threshold)
}

/// Same as [`forming_threshold`] with an explicit tail and p-value.
pub fn threshold_for(p_threshold: f64, tail: Tail, n_subjects: usize) -> Result<f64> {
    let config = Config {
        p_threshold,
        tail,
        ..Config::default()
    };
    forming_threshold(&config, n_subjects)
}
