//! Preflight checks run before any permutation work.
//!
//! # Checks Performed
//!
//! - **Configuration**: value ranges of every [`Config`] field
//! - **Shape**: subjects, empty axes, adjacency size, time axis, finite data
//! - **Budget**: distinct sign patterns and the smallest attainable p-value
//!
//! Configuration and shape failures are fatal errors. Budget findings are
//! [`TestWarning`]s that travel with the result.

mod budget;
mod shape;

pub use budget::{distinct_sign_patterns, permutation_budget_check, skip_rate_check, MAX_SKIP_RATE};
pub use shape::shape_check;

use serde::{Deserialize, Serialize};

use crate::adjacency::Adjacency;
use crate::config::Config;
use crate::error::Result;
use crate::types::ObservationTensor;

/// Non-fatal condition that limits how a result should be read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TestWarning {
    /// More than 5% of permutations produced a non-finite statistic map.
    HighSkipRate {
        /// Permutations skipped.
        skipped: usize,
        /// Permutations requested.
        requested: usize,
    },

    /// More permutations than distinct sign patterns; some are repeats.
    TooManyPermutations {
        /// Permutations requested.
        requested: usize,
        /// `2^n_subjects`.
        distinct: u64,
    },

    /// `1 / (N + 1)` is not below `cluster_alpha`, so nothing can be significant.
    UnreachableAlpha {
        /// Smallest attainable p-value.
        min_p_value: f64,
        /// Configured cutoff.
        cluster_alpha: f64,
    },
}

impl TestWarning {
    /// Human-readable description of the warning.
    pub fn description(&self) -> String {
        match self {
            TestWarning::HighSkipRate { skipped, requested } => format!(
                "{skipped} of {requested} permutations ({:.1}%) produced a non-finite statistic map \
                 and were skipped. The null distribution may be biased.",
                100.0 * *skipped as f64 / (*requested).max(1) as f64
            ),
            TestWarning::TooManyPermutations { requested, distinct } => format!(
                "{requested} permutations requested but only {distinct} distinct sign patterns exist. \
                 Some permutations repeat."
            ),
            TestWarning::UnreachableAlpha {
                min_p_value,
                cluster_alpha,
            } => format!(
                "Smallest attainable p-value {min_p_value:.4} is not below cluster_alpha {cluster_alpha}. \
                 Increase n_permutations."
            ),
        }
    }
}

/// Result of running all preflight checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreflightResult {
    /// Non-fatal findings.
    pub warnings: Vec<TestWarning>,
}

impl PreflightResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if there are any warnings.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Run all preflight checks.
///
/// # Errors
///
/// The first configuration or shape problem found.
pub fn run_all_checks(tensor: &ObservationTensor, adjacency: &Adjacency, config: &Config) -> Result<PreflightResult> {
    config.validate()?;
    shape_check(tensor, adjacency)?;

    let warnings = permutation_budget_check(tensor.n_subjects(), config.n_permutations, config.cluster_alpha);
    for warning in &warnings {
        tracing::warn!("{}", warning.description());
    }
    Ok(PreflightResult { warnings })
}
