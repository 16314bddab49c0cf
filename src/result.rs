//! Test result types and related structures.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::analysis::{NullDistribution, ScoredCluster};
use crate::config::{MassStatistic, Tail};
use crate::preflight::TestWarning;
use crate::types::{Cell, Polarity};

/// Complete result of a cluster-based permutation test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterTestResult {
    /// Observed t map (time x unit).
    pub t_obs: Array2<f64>,

    /// Cluster-forming threshold in t units.
    pub threshold: f64,

    /// Observed clusters ordered by p-value, then |mass|, then first cell.
    pub clusters: Vec<ScoredCluster>,

    /// Max-mass null distribution.
    pub null: NullDistribution,

    /// Non-fatal findings from preflight and the permutation loop.
    pub warnings: Vec<TestWarning>,

    /// Metadata for reporting and reproduction.
    pub metadata: Metadata,
}

/// Run parameters and input description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Base seed of the sign-flip sequence (drawn fresh if none was configured).
    pub seed: u64,
    pub n_subjects: usize,
    pub n_times: usize,
    pub n_units: usize,
    /// Permutations requested.
    pub n_permutations: usize,
    pub tail: Tail,
    pub cluster_alpha: f64,
    pub max_step: usize,
    pub mass: MassStatistic,
    /// Names of the spatial units, in tensor order.
    pub unit_names: Vec<String>,
    /// Time axis in seconds, if the tensor carried one.
    pub times: Option<Vec<f64>>,
    /// Wall-clock time of the whole test.
    pub runtime_secs: f64,
}

/// Flat description of one cluster for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    /// Position in the sorted cluster list.
    pub rank: usize,
    pub polarity: Polarity,
    pub mass: f64,
    pub p_value: f64,
    pub significant: bool,
    /// Number of member cells.
    pub n_cells: usize,
    /// First and last sample index.
    pub samples: (usize, usize),
    /// First and last sample in seconds, when a time axis is known.
    pub time_window: Option<(f64, f64)>,
    /// Names of the units involved, in tensor order.
    pub units: Vec<String>,
    /// Cell with the largest |t|.
    pub peak: Cell,
    /// t at the peak cell.
    pub peak_t: f64,
}

impl ClusterTestResult {
    /// Clusters with `p < cluster_alpha`, most significant first.
    pub fn significant(&self) -> impl Iterator<Item = &ScoredCluster> {
        self.clusters.iter().filter(|c| c.significant)
    }

    /// Number of significant clusters.
    pub fn n_significant(&self) -> usize {
        self.significant().count()
    }

    /// Smallest cluster p-value, or `None` when no cluster formed.
    pub fn min_p_value(&self) -> Option<f64> {
        self.clusters.first().map(|c| c.p_value)
    }

    /// Membership mask of the cluster at `rank`.
    pub fn mask(&self, rank: usize) -> Option<Array2<bool>> {
        let (n_times, n_units) = self.t_obs.dim();
        self.clusters.get(rank).map(|c| c.cluster.mask(n_times, n_units))
    }

    /// Summaries of every cluster, in result order.
    pub fn summaries(&self) -> Vec<ClusterSummary> {
        self.clusters
            .iter()
            .enumerate()
            .filter_map(|(rank, c)| self.summarize(rank, c))
            .collect()
    }

    fn summarize(&self, rank: usize, scored: &ScoredCluster) -> Option<ClusterSummary> {
        let cluster = &scored.cluster;
        let samples = cluster.time_span()?;

        let mut peak = *cluster.cells.first()?;
        let mut peak_t = self.t_obs.get([peak.time, peak.unit]).copied()?;
        for &cell in &cluster.cells[1..] {
            let t = self.t_obs.get([cell.time, cell.unit]).copied().unwrap_or(0.0);
            if t.abs() > peak_t.abs() {
                peak = cell;
                peak_t = t;
            }
        }

        let time_window = self
            .metadata
            .times
            .as_ref()
            .and_then(|times| Some((*times.get(samples.0)?, *times.get(samples.1)?)));

        let units = cluster
            .units()
            .into_iter()
            .map(|u| {
                self.metadata
                    .unit_names
                    .get(u)
                    .cloned()
                    .unwrap_or_else(|| u.to_string())
            })
            .collect();

        Some(ClusterSummary {
            rank,
            polarity: cluster.polarity,
            mass: cluster.mass,
            p_value: scored.p_value,
            significant: scored.significant,
            n_cells: cluster.len(),
            samples,
            time_window,
            units,
            peak,
            peak_t,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Cluster;
    use ndarray::array;

    fn result() -> ClusterTestResult {
        let cluster = Cluster {
            polarity: Polarity::Negative,
            cells: vec![Cell::new(1, 0), Cell::new(1, 1), Cell::new(2, 1)],
            mass: -10.0,
        };
        ClusterTestResult {
            t_obs: array![[0.0, 0.0], [-3.0, -4.0], [0.0, -3.0]],
            threshold: 2.0,
            clusters: vec![ScoredCluster {
                cluster,
                p_value: 0.01,
                significant: true,
            }],
            null: NullDistribution::from_values(vec![1.0; 99], 3),
            warnings: vec![],
            metadata: Metadata {
                seed: 3,
                n_subjects: 12,
                n_times: 3,
                n_units: 2,
                n_permutations: 99,
                tail: Tail::TwoSided,
                cluster_alpha: 0.05,
                max_step: 1,
                mass: MassStatistic::Sum,
                unit_names: vec!["Fz".into(), "Cz".into()],
                times: Some(vec![-0.1, 0.0, 0.1]),
                runtime_secs: 0.0,
            },
        }
    }

    #[test]
    fn summary_describes_cluster() {
        let summaries = result().summaries();
        assert_eq!(summaries.len(), 1);
        let s = &summaries[0];
        assert_eq!(s.samples, (1, 2));
        assert_eq!(s.time_window, Some((0.0, 0.1)));
        assert_eq!(s.units, vec!["Fz".to_string(), "Cz".to_string()]);
        assert_eq!(s.peak, Cell::new(1, 1));
        assert_eq!(s.peak_t, -4.0);
        assert_eq!(s.n_cells, 3);
    }

    #[test]
    fn significant_filter_and_mask() {
        let r = result();
        assert_eq!(r.n_significant(), 1);
        assert_eq!(r.min_p_value(), Some(0.01));
        assert_eq!(
            r.mask(0).unwrap(),
            array![[false, false], [true, true], [false, true]]
        );
        assert!(r.mask(1).is_none());
    }
}
