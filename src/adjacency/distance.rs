//! Distance-threshold adjacency.

use crate::error::GeometryError;

/// Squared Euclidean distance.
#[inline]
fn dist2(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)
}

/// All pairs `(i, j)`, `i < j`, whose distance is at most `threshold`.
///
/// Compares squared distances, so no square roots are taken.
pub(super) fn edges_within(points: &[[f64; 3]], threshold: f64) -> Result<Vec<(usize, usize)>, GeometryError> {
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(GeometryError::InvalidDistanceThreshold { threshold });
    }
    let limit = threshold * threshold;

    let mut edges = Vec::new();
    for (i, a) in points.iter().enumerate() {
        for (j, b) in points.iter().enumerate().skip(i + 1) {
            if dist2(a, b) <= limit {
                edges.push((i, j));
            }
        }
    }
    Ok(edges)
}
