//! Spatial adjacency between sensors or cortical vertices.
//!
//! The graph is stored in compressed sparse row form so that source spaces
//! with tens of thousands of vertices stay cheap. Construction paths:
//!
//! - [`Adjacency::from_edges`]: explicit edge list
//! - [`Adjacency::from_distance`]: Euclidean distance threshold over 3D positions
//! - [`Adjacency::from_mesh`] / [`Adjacency::from_source_space`]: 1-skip graph of a triangulated surface
//! - [`Adjacency::from_sensors`]: channel-type pick followed by distance or triangulation

mod delaunay;
mod distance;
mod mesh;

pub use mesh::{Hemisphere, SurfaceMesh};

use serde::{Deserialize, Serialize};

use crate::config::{ChannelKind, Connectivity};
use crate::error::GeometryError;

/// A sensor with its channel kind and head-frame position in metres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    /// Channel name.
    pub name: String,
    /// Channel kind used for picking.
    pub kind: ChannelKind,
    /// Position in metres, `None` when no montage provides one.
    pub position: Option<[f64; 3]>,
}

impl Sensor {
    /// Create a sensor with a known position.
    pub fn new(name: impl Into<String>, kind: ChannelKind, position: [f64; 3]) -> Self {
        Self {
            name: name.into(),
            kind,
            position: Some(position),
        }
    }
}

/// Symmetric neighbour relation over spatial units.
///
/// Self-adjacency is implicit and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjacency {
    names: Vec<String>,
    offsets: Vec<usize>,
    neighbors: Vec<usize>,
}

impl Adjacency {
    /// Build from an edge list over `names.len()` units.
    ///
    /// Edges are symmetrized; duplicates and self loops are dropped.
    ///
    /// # Errors
    ///
    /// `IndexOutOfRange` if an edge references a unit that does not exist.
    pub fn from_edges<I>(names: Vec<String>, edges: I) -> Result<Self, GeometryError>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let n_units = names.len();
        let mut lists: Vec<Vec<usize>> = vec![Vec::new(); n_units];

        for (a, b) in edges {
            for index in [a, b] {
                if index >= n_units {
                    return Err(GeometryError::IndexOutOfRange { index, n_units });
                }
            }
            if a == b {
                continue;
            }
            lists[a].push(b);
            lists[b].push(a);
        }

        let mut offsets = Vec::with_capacity(n_units + 1);
        let mut neighbors = Vec::new();
        offsets.push(0);
        for mut list in lists {
            list.sort_unstable();
            list.dedup();
            neighbors.extend_from_slice(&list);
            offsets.push(neighbors.len());
        }

        Ok(Self {
            names,
            offsets,
            neighbors,
        })
    }

    /// Units with no neighbours at all.
    pub fn isolated(names: Vec<String>) -> Self {
        let offsets = vec![0; names.len() + 1];
        Self {
            names,
            offsets,
            neighbors: Vec::new(),
        }
    }

    /// Edge iff the Euclidean distance between positions is <= `threshold`.
    ///
    /// # Errors
    ///
    /// Missing, non-finite or all-origin positions, a length mismatch
    /// between names and positions, or an invalid threshold.
    pub fn from_distance(
        names: Vec<String>,
        positions: &[Option<[f64; 3]>],
        threshold: f64,
    ) -> Result<Self, GeometryError> {
        if names.len() != positions.len() {
            return Err(GeometryError::LengthMismatch {
                names: names.len(),
                positions: positions.len(),
            });
        }
        let points = validate_positions(&names, positions)?;
        let edges = distance::edges_within(&points, threshold)?;
        Self::from_edges(names, edges)
    }

    /// 1-skip graph of a single triangulated surface.
    pub fn from_mesh(mesh: &SurfaceMesh) -> Result<Self, GeometryError> {
        let names = mesh.vertex_names(None);
        let edges = mesh.edges()?;
        Self::from_edges(names, edges)
    }

    /// 1-skip graph of a multi-hemisphere source space.
    ///
    /// Hemispheres are concatenated in order; no edges cross hemispheres.
    pub fn from_source_space(hemispheres: &[SurfaceMesh]) -> Result<Self, GeometryError> {
        let mut names = Vec::new();
        let mut edges = Vec::new();
        for mesh in hemispheres {
            let offset = names.len();
            names.extend(mesh.vertex_names(Some(mesh.hemisphere)));
            edges.extend(mesh.edges()?.into_iter().map(|(a, b)| (a + offset, b + offset)));
        }
        Self::from_edges(names, edges)
    }

    /// Pick sensors of the connectivity's channel kind and connect them.
    ///
    /// The returned unit order is the order of the picked sensors in `sensors`.
    pub fn from_sensors(sensors: &[Sensor], connectivity: &Connectivity) -> Result<Self, GeometryError> {
        let kind = connectivity.kind();
        let picked: Vec<&Sensor> = sensors.iter().filter(|s| s.kind == kind).collect();
        if picked.is_empty() {
            return Err(GeometryError::NoChannelsOfKind {
                kind: kind.to_string(),
            });
        }

        let names: Vec<String> = picked.iter().map(|s| s.name.clone()).collect();
        let positions: Vec<Option<[f64; 3]>> = picked.iter().map(|s| s.position).collect();

        match *connectivity {
            Connectivity::Distance { threshold, .. } => Self::from_distance(names, &positions, threshold),
            Connectivity::ChannelType(_) => {
                let points = validate_positions(&names, &positions)?;
                let edges = delaunay::triangulated_edges(&points)?;
                Self::from_edges(names, edges)
            }
        }
    }

    /// Number of spatial units.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether there are no units.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Unit names in axis order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Sorted neighbours of `unit`.
    pub fn neighbors(&self, unit: usize) -> &[usize] {
        &self.neighbors[self.offsets[unit]..self.offsets[unit + 1]]
    }

    /// Whether `a` and `b` are distinct neighbours.
    pub fn are_adjacent(&self, a: usize, b: usize) -> bool {
        a != b && self.neighbors(a).binary_search(&b).is_ok()
    }

    /// Number of undirected edges.
    pub fn n_edges(&self) -> usize {
        self.neighbors.len() / 2
    }

    /// Undirected edges with `a < b`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.len()).flat_map(move |a| {
            self.neighbors(a)
                .iter()
                .copied()
                .filter(move |&b| a < b)
                .map(move |b| (a, b))
        })
    }
}

/// Reject missing, non-finite and all-origin positions.
fn validate_positions(names: &[String], positions: &[Option<[f64; 3]>]) -> Result<Vec<[f64; 3]>, GeometryError> {
    let mut points = Vec::with_capacity(positions.len());
    for (name, position) in names.iter().zip(positions) {
        let p = position.ok_or_else(|| GeometryError::MissingPosition { name: name.clone() })?;
        if !p.iter().all(|c| c.is_finite()) {
            return Err(GeometryError::NonFinitePosition { name: name.clone() });
        }
        points.push(p);
    }

    const ORIGIN_TOL: f64 = 1e-12;
    if points.iter().all(|p| p.iter().all(|c| c.abs() <= ORIGIN_TOL)) {
        return Err(GeometryError::DegeneratePositions { count: points.len() });
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("U{i}")).collect()
    }

    #[test]
    fn edges_are_symmetric_and_deduplicated() {
        let adj = Adjacency::from_edges(names(3), [(0, 1), (1, 0), (1, 2), (2, 2)]).unwrap();
        assert_eq!(adj.neighbors(0), &[1]);
        assert_eq!(adj.neighbors(1), &[0, 2]);
        assert_eq!(adj.neighbors(2), &[1]);
        assert_eq!(adj.n_edges(), 2);
        assert!(!adj.are_adjacent(2, 2));
        assert_eq!(adj.edges().collect::<Vec<_>>(), vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn out_of_range_edge_is_rejected() {
        let err = Adjacency::from_edges(names(2), [(0, 5)]).unwrap_err();
        assert_eq!(err, GeometryError::IndexOutOfRange { index: 5, n_units: 2 });
    }

    #[test]
    fn sensors_are_picked_by_kind() {
        let sensors = vec![
            Sensor::new("Fz", ChannelKind::Eeg, [0.0, 0.05, 0.08]),
            Sensor::new("HEOG", ChannelKind::Eog, [0.0, 0.0, 0.0]),
            Sensor::new("Cz", ChannelKind::Eeg, [0.0, 0.0, 0.09]),
        ];
        let connectivity = Connectivity::Distance {
            kind: ChannelKind::Eeg,
            threshold: 0.1,
        };
        let adj = Adjacency::from_sensors(&sensors, &connectivity).unwrap();
        assert_eq!(adj.names(), &["Fz".to_string(), "Cz".to_string()]);
        assert!(adj.are_adjacent(0, 1));
    }

    #[test]
    fn collinear_montage_is_not_silently_empty() {
        let sensors = vec![
            Sensor::new("Fz", ChannelKind::Eeg, [0.0, 0.09, 0.0]),
            Sensor::new("Cz", ChannelKind::Eeg, [0.0, 0.0, 0.09]),
            Sensor::new("Pz", ChannelKind::Eeg, [0.0, -0.09, 0.0]),
        ];
        let err = Adjacency::from_sensors(&sensors, &Connectivity::default()).unwrap_err();
        assert_eq!(err, GeometryError::DegenerateTriangulation { count: 3 });
    }

    #[test]
    fn missing_kind_is_reported() {
        let sensors = vec![Sensor::new("HEOG", ChannelKind::Eog, [0.01, 0.0, 0.0])];
        let err = Adjacency::from_sensors(&sensors, &Connectivity::default()).unwrap_err();
        assert_eq!(err, GeometryError::NoChannelsOfKind { kind: "eeg".into() });
    }

    #[test]
    fn missing_and_degenerate_positions_are_reported() {
        let err = Adjacency::from_distance(names(2), &[Some([0.1, 0.0, 0.0]), None], 0.04).unwrap_err();
        assert_eq!(err, GeometryError::MissingPosition { name: "U1".into() });

        let err = Adjacency::from_distance(names(2), &[Some([0.0; 3]), Some([0.0; 3])], 0.04).unwrap_err();
        assert_eq!(err, GeometryError::DegeneratePositions { count: 2 });

        let err =
            Adjacency::from_distance(names(2), &[Some([f64::NAN, 0.0, 0.0]), Some([0.1, 0.0, 0.0])], 0.04)
                .unwrap_err();
        assert_eq!(err, GeometryError::NonFinitePosition { name: "U0".into() });
    }

    #[test]
    fn isolated_units_have_no_neighbours() {
        let adj = Adjacency::isolated(names(4));
        assert_eq!(adj.len(), 4);
        assert!((0..4).all(|u| adj.neighbors(u).is_empty()));
    }
}
