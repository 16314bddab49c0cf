//! Quantile computation using O(n) selection.
//!
//! Uses `slice.select_nth_unstable_by()` (introselect) so that summarizing a
//! null distribution of many thousands of permutation maxima stays linear.

/// Compute a single quantile from a mutable slice.
///
/// Uses the R-7 definition (linear interpolation between order statistics).
/// The slice is partially reordered as a side effect.
///
/// # Panics
///
/// Panics if `data` is empty or if `p` is outside [0, 1].
pub fn compute_quantile(data: &mut [f64], p: f64) -> f64 {
    assert!(!data.is_empty(), "Cannot compute quantile of empty slice");
    assert!((0.0..=1.0).contains(&p), "Quantile probability must be in [0, 1]");

    let n = data.len();
    if n == 1 {
        return data[0];
    }

    let h = (n - 1) as f64 * p;
    let h_floor = h.floor() as usize;
    let h_frac = h - h.floor();

    if h_floor >= n - 1 {
        let (_, &mut max, _) = data.select_nth_unstable_by(n - 1, |a, b| a.total_cmp(b));
        return max;
    }

    let (_, &mut lower, upper) = data.select_nth_unstable_by(h_floor, |a, b| a.total_cmp(b));
    if h_frac == 0.0 {
        return lower;
    }

    // Smallest element of the upper partition is the next order statistic.
    let upper_min = upper.iter().copied().min_by(|a, b| a.total_cmp(b)).unwrap_or(lower);
    lower + h_frac * (upper_min - lower)
}

/// Quantile of an immutable slice; copies the data once.
///
/// Returns `None` for an empty slice or `p` outside [0, 1].
pub fn quantile(data: &[f64], p: f64) -> Option<f64> {
    if data.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }
    let mut working = data.to_vec();
    Some(compute_quantile(&mut working, p))
}
