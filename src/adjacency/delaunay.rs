//! Triangulated sensor neighbours.
//!
//! Sensor positions are flattened onto a plane with an azimuthal equidistant
//! projection about their centroid, then triangulated with Bowyer-Watson.
//! The triangle edges become the adjacency.

use crate::error::GeometryError;

#[derive(Clone, Copy)]
struct Triangle {
    v: [usize; 3],
}

/// Project 3D positions onto the plane around their centroid.
fn project(points: &[[f64; 3]]) -> Vec<[f64; 2]> {
    let n = points.len() as f64;
    let mut centre = [0.0; 3];
    for p in points {
        for k in 0..3 {
            centre[k] += p[k] / n;
        }
    }

    points
        .iter()
        .map(|p| {
            let v = [p[0] - centre[0], p[1] - centre[1], p[2] - centre[2]];
            let r = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
            if r == 0.0 {
                return [0.0, 0.0];
            }
            let theta = (v[2] / r).clamp(-1.0, 1.0).acos();
            let phi = v[1].atan2(v[0]);
            [theta * phi.cos(), theta * phi.sin()]
        })
        .collect()
}

/// Circumcentre and squared radius; degenerate triangles get an infinite radius.
fn circumcircle(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> ([f64; 2], f64) {
    let d = 2.0 * (a[0] * (b[1] - c[1]) + b[0] * (c[1] - a[1]) + c[0] * (a[1] - b[1]));
    if d.abs() < 1e-20 {
        return ([0.0, 0.0], f64::INFINITY);
    }
    let a2 = a[0] * a[0] + a[1] * a[1];
    let b2 = b[0] * b[0] + b[1] * b[1];
    let c2 = c[0] * c[0] + c[1] * c[1];
    let ux = (a2 * (b[1] - c[1]) + b2 * (c[1] - a[1]) + c2 * (a[1] - b[1])) / d;
    let uy = (a2 * (c[0] - b[0]) + b2 * (a[0] - c[0]) + c2 * (b[0] - a[0])) / d;
    let r2 = (a[0] - ux).powi(2) + (a[1] - uy).powi(2);
    ([ux, uy], r2)
}

fn in_circumcircle(tri: &Triangle, pts: &[[f64; 2]], p: [f64; 2]) -> bool {
    let ([ux, uy], r2) = circumcircle(pts[tri.v[0]], pts[tri.v[1]], pts[tri.v[2]]);
    (p[0] - ux).powi(2) + (p[1] - uy).powi(2) < r2
}

/// Delaunay edges `(i, j)` with `i < j` over projected sensor positions.
///
/// # Errors
///
/// `TooFewPositions` for fewer than three points, `DegenerateTriangulation`
/// when the projected points are collinear.
pub(super) fn triangulated_edges(points: &[[f64; 3]]) -> Result<Vec<(usize, usize)>, GeometryError> {
    let n = points.len();
    if n < 3 {
        return Err(GeometryError::TooFewPositions { count: n });
    }

    let mut pts = project(points);

    // Super-triangle scaled to the bounding box so coordinates stay well conditioned.
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
    for p in &pts {
        min_x = min_x.min(p[0]);
        min_y = min_y.min(p[1]);
        max_x = max_x.max(p[0]);
        max_y = max_y.max(p[1]);
    }
    let span = (max_x - min_x).max(max_y - min_y).max(1e-9);
    let mid = [(min_x + max_x) / 2.0, (min_y + max_y) / 2.0];
    pts.push([mid[0] - 20.0 * span, mid[1] - span]);
    pts.push([mid[0], mid[1] + 20.0 * span]);
    pts.push([mid[0] + 20.0 * span, mid[1] - span]);
    let super_vertices = [n, n + 1, n + 2];

    let mut triangles = vec![Triangle { v: super_vertices }];

    for i in 0..n {
        let p = pts[i];

        let mut bad: Vec<usize> = triangles
            .iter()
            .enumerate()
            .filter(|(_, tri)| in_circumcircle(tri, &pts, p))
            .map(|(ti, _)| ti)
            .collect();

        // Boundary of the cavity: edges owned by exactly one bad triangle.
        let mut edge_count: Vec<([usize; 2], usize)> = Vec::new();
        for &ti in &bad {
            let v = triangles[ti].v;
            for e in [[v[0], v[1]], [v[1], v[2]], [v[2], v[0]]] {
                let key = if e[0] < e[1] { e } else { [e[1], e[0]] };
                match edge_count.iter_mut().find(|(k, _)| *k == key) {
                    Some(entry) => entry.1 += 1,
                    None => edge_count.push((key, 1)),
                }
            }
        }

        bad.sort_unstable();
        for &ti in bad.iter().rev() {
            triangles.swap_remove(ti);
        }

        triangles.extend(
            edge_count
                .into_iter()
                .filter(|&(_, count)| count == 1)
                .map(|(e, _)| Triangle { v: [i, e[0], e[1]] }),
        );
    }

    let mut edges: Vec<(usize, usize)> = triangles
        .iter()
        .filter(|tri| !tri.v.iter().any(|v| super_vertices.contains(v)))
        .flat_map(|tri| {
            let [a, b, c] = tri.v;
            [(a.min(b), a.max(b)), (b.min(c), b.max(c)), (a.min(c), a.max(c))]
        })
        .collect();
    if edges.is_empty() {
        return Err(GeometryError::DegenerateTriangulation { count: n });
    }
    edges.sort_unstable();
    edges.dedup();
    Ok(edges)
}
