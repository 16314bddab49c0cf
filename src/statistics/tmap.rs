//! One-sample t statistic maps over per-subject contrasts.
//!
//! For each (time, unit) cell:
//!
//! ```text
//! t = mean / (sd / sqrt(n)),   sd with ddof = 1
//! ```
//!
//! which equals `mean / (std_ddof0 / sqrt(n - 1))`. Sums of squares are
//! invariant under sign flips, so [`TStatKernel`] computes them once and every
//! permutation only re-accumulates the signed sums. The observed map is the
//! same kernel evaluated with all signs `+1`, so observed and permuted
//! statistics are computed identically.
//!
//! The centred sum of squares comes from the single-pass `sum_sq - n·mean²`,
//! which loses precision as the spread shrinks relative to the mean. A cell
//! whose coefficient of variation is below about `1e-7` (the square root of
//! [`DEGENERATE_VARIANCE_RTOL`]) is therefore treated as zero-variance and
//! gets `t = 0`, even if its sample sd is not exactly zero. Centre or rescale
//! such data before testing.

use ndarray::{Array2, ArrayView3, Axis, Zip};

use crate::error::{ConfigurationError, Result};
use crate::types::ObservationTensor;

/// Relative tolerance under which a cell's variance counts as zero.
///
/// Compared against `centred_ss / sum_sq`, which is roughly the squared
/// coefficient of variation.
pub const DEGENERATE_VARIANCE_RTOL: f64 = 64.0 * f64::EPSILON;

/// Precomputed state for repeated t-map evaluation under sign flips.
#[derive(Debug, Clone)]
pub struct TStatKernel<'a> {
    data: ArrayView3<'a, f64>,
    sum_sq: Array2<f64>,
}

impl<'a> TStatKernel<'a> {
    /// Prepare the kernel for `tensor`.
    ///
    /// # Errors
    ///
    /// `InsufficientSubjects` when fewer than two subjects are present.
    pub fn new(tensor: &'a ObservationTensor) -> Result<Self> {
        let n_subjects = tensor.n_subjects();
        if n_subjects < 2 {
            return Err(ConfigurationError::InsufficientSubjects { n_subjects }.into());
        }
        let data = tensor.view();
        let sum_sq = data.fold_axis(Axis(0), 0.0, |acc, &x| acc + x * x);
        Ok(Self { data, sum_sq })
    }

    /// Number of subjects.
    pub fn n_subjects(&self) -> usize {
        self.data.dim().0
    }

    /// (times, units) shape of the produced maps.
    pub fn map_dim(&self) -> (usize, usize) {
        self.sum_sq.dim()
    }

    /// Write the t map for the given per-subject signs into `out`.
    ///
    /// Cells whose sums overflow are written as NaN so callers can detect
    /// the failure; zero-variance cells are written as 0.
    ///
    /// # Panics
    ///
    /// Panics if `signs.len()` differs from the number of subjects or `out`
    /// has the wrong shape.
    pub fn compute_into(&self, signs: &[f64], out: &mut Array2<f64>) {
        assert_eq!(signs.len(), self.n_subjects(), "one sign per subject");
        assert_eq!(out.dim(), self.map_dim(), "output map shape");

        out.fill(0.0);
        for (subject, &sign) in self.data.outer_iter().zip(signs) {
            out.scaled_add(sign, &subject);
        }

        let n = self.n_subjects() as f64;
        Zip::from(out).and(&self.sum_sq).for_each(|cell, &ss| {
            *cell = t_from_sums(*cell, ss, n);
        });
    }

    /// The t map with every subject's sign `+1`.
    pub fn observed(&self) -> Array2<f64> {
        let mut out = Array2::zeros(self.map_dim());
        self.compute_into(&vec![1.0; self.n_subjects()], &mut out);
        out
    }
}

/// t from the signed sum and the sum of squares of `n` values.
#[inline]
fn t_from_sums(sum: f64, sum_sq: f64, n: f64) -> f64 {
    if !sum.is_finite() || !sum_sq.is_finite() {
        return f64::NAN;
    }
    let mean = sum / n;
    let centred_ss = sum_sq - n * mean * mean;
    if centred_ss <= DEGENERATE_VARIANCE_RTOL * sum_sq {
        return 0.0;
    }
    let var = centred_ss / (n - 1.0);
    mean / (var / n).sqrt()
}

/// One-sample t map of `tensor` against zero.
pub fn one_sample_t(tensor: &ObservationTensor) -> Result<Array2<f64>> {
    Ok(TStatKernel::new(tensor)?.observed())
}

/// Mean across subjects for every (time, unit) cell.
///
/// # Errors
///
/// `InsufficientSubjects` for an empty tensor.
pub fn grand_average(tensor: &ObservationTensor) -> Result<Array2<f64>> {
    tensor
        .view()
        .mean_axis(Axis(0))
        .ok_or_else(|| ConfigurationError::InsufficientSubjects { n_subjects: 0 }.into())
}
