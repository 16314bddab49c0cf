//! Cluster formation over the space x time product graph.
//!
//! Candidate cells are those whose statistic crosses the forming threshold.
//! Two candidates belong to the same cluster when a path of candidates joins
//! them where each step either moves along a spatial adjacency edge at the
//! same time sample, or stays on the same unit and moves at most `max_step`
//! samples in time.
//!
//! Positive and negative excursions are labelled in two independent
//! union-find passes, so clusters of opposite sign never merge even when
//! they touch.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::adjacency::Adjacency;
use crate::config::{MassStatistic, Tail};
use crate::error::{ConfigurationError, Result};
use crate::types::{Cell, Polarity};

const NONE: usize = usize::MAX;

/// Parameters of cluster formation, fixed for a whole test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormingParams {
    /// Forming threshold in t units (> 0).
    pub threshold: f64,
    /// Which pools are formed.
    pub tail: Tail,
    /// Largest time gap connecting a unit to itself.
    pub max_step: usize,
    /// Cluster-level statistic.
    pub mass: MassStatistic,
}

impl FormingParams {
    /// Sum-mass, 4-connected formation at `threshold`.
    pub fn new(threshold: f64, tail: Tail) -> Self {
        Self {
            threshold,
            tail,
            max_step: 1,
            mass: MassStatistic::Sum,
        }
    }

    fn pools(&self) -> impl Iterator<Item = Polarity> + '_ {
        [Polarity::Positive, Polarity::Negative].into_iter().filter(|p| match p {
            Polarity::Positive => self.tail.includes_positive(),
            Polarity::Negative => self.tail.includes_negative(),
        })
    }

    #[inline]
    fn is_candidate(&self, value: f64, polarity: Polarity) -> bool {
        match polarity {
            Polarity::Positive => value > self.threshold,
            Polarity::Negative => value < -self.threshold,
        }
    }

    #[inline]
    fn contribution(&self, value: f64, polarity: Polarity) -> f64 {
        match self.mass {
            MassStatistic::Sum => value,
            MassStatistic::Size => polarity.sign(),
        }
    }
}

/// A connected set of supra-threshold cells of one polarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Sign of the excursion.
    pub polarity: Polarity,
    /// Member cells, sorted by (time, unit).
    pub cells: Vec<Cell>,
    /// Signed cluster mass (sum of t, or size signed by polarity).
    pub mass: f64,
}

impl Cluster {
    /// Number of member cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the cluster has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// |mass|, the value compared against the null distribution.
    pub fn magnitude(&self) -> f64 {
        self.mass.abs()
    }

    /// Whether `cell` is a member.
    pub fn contains(&self, cell: Cell) -> bool {
        self.cells.binary_search(&cell).is_ok()
    }

    /// First and last time sample covered.
    pub fn time_span(&self) -> Option<(usize, usize)> {
        let first = self.cells.first()?.time;
        let last = self.cells.last()?.time;
        Some((first, last))
    }

    /// Distinct spatial units involved, ascending.
    pub fn units(&self) -> Vec<usize> {
        let mut units: Vec<usize> = self.cells.iter().map(|c| c.unit).collect();
        units.sort_unstable();
        units.dedup();
        units
    }

    /// Boolean (time x unit) membership mask.
    pub fn mask(&self, n_times: usize, n_units: usize) -> Array2<bool> {
        let mut mask = Array2::from_elem((n_times, n_units), false);
        for cell in &self.cells {
            if let Some(m) = mask.get_mut([cell.time, cell.unit]) {
                *m = true;
            }
        }
        mask
    }
}

/// Reusable buffers for repeated labelling (one per worker).
#[derive(Debug, Default, Clone)]
pub struct ClusterScratch {
    slot: Vec<usize>,
    cells: Vec<usize>,
    parent: Vec<usize>,
    mass: Vec<f64>,
}

impl ClusterScratch {
    /// Empty buffers; they grow on first use.
    pub fn new() -> Self {
        Self::default()
    }
}

fn find(parent: &mut [usize], mut x: usize) -> usize {
    while parent[x] != x {
        parent[x] = parent[parent[x]]; // path halving
        x = parent[x];
    }
    x
}

/// Merge two sets; the smaller index becomes the root so labelling is deterministic.
fn union(parent: &mut [usize], a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra < rb {
        parent[rb] = ra;
    } else if rb < ra {
        parent[ra] = rb;
    }
}

/// Label one polarity pool. Afterwards `scratch.cells` holds candidate flat
/// indices in ascending order and `scratch.parent` their union-find forest.
fn label_pool(
    tmap: &Array2<f64>,
    adjacency: &Adjacency,
    params: &FormingParams,
    polarity: Polarity,
    scratch: &mut ClusterScratch,
) {
    let (n_times, n_units) = tmap.dim();
    scratch.slot.clear();
    scratch.slot.resize(n_times * n_units, NONE);
    scratch.cells.clear();

    for ((t, u), &value) in tmap.indexed_iter() {
        if params.is_candidate(value, polarity) {
            let flat = t * n_units + u;
            scratch.slot[flat] = scratch.cells.len();
            scratch.cells.push(flat);
        }
    }

    scratch.parent.clear();
    scratch.parent.extend(0..scratch.cells.len());

    for i in 0..scratch.cells.len() {
        let flat = scratch.cells[i];
        let (t, u) = (flat / n_units, flat % n_units);

        // Spatial neighbours at the same time; symmetric, so v < u suffices.
        for &v in adjacency.neighbors(u).iter().take_while(|&&v| v < u) {
            let j = scratch.slot[t * n_units + v];
            if j != NONE {
                union(&mut scratch.parent, i, j);
            }
        }

        // Same unit at earlier samples.
        for step in 1..=params.max_step.min(t) {
            let j = scratch.slot[(t - step) * n_units + u];
            if j != NONE {
                union(&mut scratch.parent, i, j);
            }
        }
    }
}

fn check_dims(tmap: &Array2<f64>, adjacency: &Adjacency) -> Result<()> {
    if tmap.ncols() != adjacency.len() {
        return Err(ConfigurationError::SpatialMismatch {
            data_units: tmap.ncols(),
            adjacency_units: adjacency.len(),
        }
        .into());
    }
    Ok(())
}

/// Form all clusters of `tmap`.
///
/// Positive clusters come first, then negative; within a pool clusters are
/// ordered by their first cell. No candidates yields an empty list.
///
/// # Errors
///
/// `SpatialMismatch` if the map's unit axis differs from the adjacency.
pub fn form_clusters(tmap: &Array2<f64>, adjacency: &Adjacency, params: &FormingParams) -> Result<Vec<Cluster>> {
    check_dims(tmap, adjacency)?;
    let n_units = tmap.ncols();
    let mut scratch = ClusterScratch::new();
    let mut clusters = Vec::new();

    for polarity in params.pools() {
        label_pool(tmap, adjacency, params, polarity, &mut scratch);
        let first = clusters.len();
        let mut cluster_of = vec![NONE; scratch.cells.len()];

        for i in 0..scratch.cells.len() {
            let root = find(&mut scratch.parent, i);
            if cluster_of[root] == NONE {
                cluster_of[root] = clusters.len();
                clusters.push(Cluster {
                    polarity,
                    cells: Vec::new(),
                    mass: 0.0,
                });
            }
            let flat = scratch.cells[i];
            let (t, u) = (flat / n_units, flat % n_units);
            let cluster = &mut clusters[cluster_of[root]];
            cluster.cells.push(Cell::new(t, u));
            cluster.mass += params.contribution(tmap[[t, u]], polarity);
        }
        debug_assert!(clusters[first..].iter().all(|c| !c.is_empty()));
    }

    Ok(clusters)
}

/// Largest |mass| over all clusters of `tmap`, or 0 when none form.
///
/// Accumulates masses in the same cell order as [`form_clusters`], so the
/// result equals the largest [`Cluster::magnitude`] bit for bit.
///
/// # Errors
///
/// `SpatialMismatch` if the map's unit axis differs from the adjacency.
pub fn max_cluster_mass(
    tmap: &Array2<f64>,
    adjacency: &Adjacency,
    params: &FormingParams,
    scratch: &mut ClusterScratch,
) -> Result<f64> {
    check_dims(tmap, adjacency)?;
    Ok(max_mass_unchecked(tmap, adjacency, params, scratch))
}

/// [`max_cluster_mass`] for callers that have already matched the map
/// against the adjacency.
pub(super) fn max_mass_unchecked(
    tmap: &Array2<f64>,
    adjacency: &Adjacency,
    params: &FormingParams,
    scratch: &mut ClusterScratch,
) -> f64 {
    let n_units = tmap.ncols();
    let mut max_mass = 0.0_f64;

    for polarity in params.pools() {
        label_pool(tmap, adjacency, params, polarity, scratch);
        scratch.mass.clear();
        scratch.mass.resize(scratch.cells.len(), 0.0);

        for i in 0..scratch.cells.len() {
            let root = find(&mut scratch.parent, i);
            let flat = scratch.cells[i];
            scratch.mass[root] += params.contribution(tmap[[flat / n_units, flat % n_units]], polarity);
        }
        for i in 0..scratch.cells.len() {
            if scratch.parent[i] == i {
                max_mass = max_mass.max(scratch.mass[i].abs());
            }
        }
    }

    max_mass
}

/// Number of cells crossing the threshold in the pools selected by `tail`.
pub fn count_candidates(tmap: &Array2<f64>, threshold: f64, tail: Tail) -> usize {
    let params = FormingParams::new(threshold, tail);
    params
        .pools()
        .map(|polarity| tmap.iter().filter(|&&v| params.is_candidate(v, polarity)).count())
        .sum()
}
