//! Permutation budget checks.
//!
//! With `n` subjects there are only `2^n` distinct sign patterns, and with
//! `N` permutations the smallest attainable p-value is `1 / (N + 1)`. Both
//! limit what the test can resolve without making it invalid.

use super::TestWarning;
use crate::analysis::NullDistribution;

/// Skip rates above this fraction are reported.
pub const MAX_SKIP_RATE: f64 = 0.05;

/// Number of distinct sign patterns for `n_subjects`, saturating at `u64::MAX`.
pub fn distinct_sign_patterns(n_subjects: usize) -> u64 {
    u32::try_from(n_subjects)
        .ok()
        .and_then(|n| 1u64.checked_shl(n))
        .filter(|_| n_subjects < 64)
        .unwrap_or(u64::MAX)
}

/// Warnings about the requested number of permutations.
pub fn permutation_budget_check(n_subjects: usize, n_permutations: usize, cluster_alpha: f64) -> Vec<TestWarning> {
    let mut warnings = Vec::new();

    let distinct = distinct_sign_patterns(n_subjects);
    if (n_permutations as u64) > distinct {
        warnings.push(TestWarning::TooManyPermutations {
            requested: n_permutations,
            distinct,
        });
    }

    let min_p_value = 1.0 / (n_permutations as f64 + 1.0);
    if min_p_value >= cluster_alpha {
        warnings.push(TestWarning::UnreachableAlpha {
            min_p_value,
            cluster_alpha,
        });
    }

    warnings
}

/// Warning when too many permutations produced a non-finite map.
///
/// Through [`crate::ClusterTest::run`] this never fires: a permuted map can
/// only overflow where the observed map already did, and a non-finite
/// observed map aborts the run first. It applies to nulls built directly.
pub fn skip_rate_check(null: &NullDistribution) -> Option<TestWarning> {
    let rate = null.skip_rate();
    (rate > MAX_SKIP_RATE).then(|| TestWarning::HighSkipRate {
        skipped: null.skipped(),
        requested: null.n_requested(),
    })
}
