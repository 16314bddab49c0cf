//! Triangulated cortical surfaces.

use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

/// Cortical hemisphere a surface belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hemisphere {
    /// Left hemisphere.
    Lh,
    /// Right hemisphere.
    Rh,
}

impl Hemisphere {
    fn prefix(self) -> &'static str {
        match self {
            Hemisphere::Lh => "lh",
            Hemisphere::Rh => "rh",
        }
    }
}

/// A triangulated surface restricted to the vertices used as sources.
///
/// `triangles` index into `0..vertex_ids.len()`, i.e. they are already
/// expressed in the order of the source-estimate rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceMesh {
    /// Hemisphere label.
    pub hemisphere: Hemisphere,
    /// Original surface vertex number for each source, used in unit names.
    pub vertex_ids: Vec<usize>,
    /// Triangles as triples of source indices.
    pub triangles: Vec<[usize; 3]>,
}

impl SurfaceMesh {
    /// Surface whose sources are numbered `0..n_vertices`.
    pub fn new(hemisphere: Hemisphere, n_vertices: usize, triangles: Vec<[usize; 3]>) -> Self {
        Self {
            hemisphere,
            vertex_ids: (0..n_vertices).collect(),
            triangles,
        }
    }

    /// Number of source vertices.
    pub fn n_vertices(&self) -> usize {
        self.vertex_ids.len()
    }

    /// Unit names, prefixed with the hemisphere when requested.
    pub(super) fn vertex_names(&self, hemisphere: Option<Hemisphere>) -> Vec<String> {
        match hemisphere {
            Some(h) => self.vertex_ids.iter().map(|v| format!("{}:{v}", h.prefix())).collect(),
            None => self.vertex_ids.iter().map(|v| v.to_string()).collect(),
        }
    }

    /// Edges of the triangles (the 1-skip graph), possibly with duplicates.
    pub(super) fn edges(&self) -> Result<Vec<(usize, usize)>, GeometryError> {
        let n_units = self.n_vertices();
        let mut edges = Vec::with_capacity(self.triangles.len() * 3);
        for &triangle in &self.triangles {
            let [a, b, c] = triangle;
            if let Some(&index) = triangle.iter().find(|&&v| v >= n_units) {
                return Err(GeometryError::IndexOutOfRange { index, n_units });
            }
            if a == b || b == c || a == c {
                return Err(GeometryError::DegenerateTriangle { triangle });
            }
            edges.extend([(a, b), (b, c), (a, c)]);
        }
        Ok(edges)
    }
}
