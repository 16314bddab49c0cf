//! Cluster p-values against the max-mass null.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::clusters::Cluster;
use super::permutation::NullDistribution;

/// A cluster with its corrected p-value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCluster {
    #[serde(flatten)]
    pub cluster: Cluster,
    /// `(1 + #{null >= |mass|}) / (1 + n_valid)`.
    pub p_value: f64,
    /// `p_value < alpha`.
    pub significant: bool,
}

/// Score every cluster and order them by p-value, then |mass| (largest
/// first), then first member cell.
pub fn score_clusters(clusters: Vec<Cluster>, null: &NullDistribution, alpha: f64) -> Vec<ScoredCluster> {
    let mut scored: Vec<ScoredCluster> = clusters
        .into_iter()
        .map(|cluster| {
            let p_value = null.p_value(cluster.mass);
            ScoredCluster {
                significant: p_value < alpha,
                p_value,
                cluster,
            }
        })
        .collect();
    scored.sort_by(compare);
    scored
}

fn compare(a: &ScoredCluster, b: &ScoredCluster) -> Ordering {
    a.p_value
        .total_cmp(&b.p_value)
        .then_with(|| b.cluster.magnitude().total_cmp(&a.cluster.magnitude()))
        .then_with(|| a.cluster.cells.first().cmp(&b.cluster.cells.first()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Cell, Polarity};

    fn cluster(mass: f64, first: Cell) -> Cluster {
        Cluster {
            polarity: if mass >= 0.0 { Polarity::Positive } else { Polarity::Negative },
            cells: vec![first],
            mass,
        }
    }

    #[test]
    fn orders_by_p_then_mass_then_position() {
        let null = NullDistribution::from_values(vec![5.0, 10.0, 15.0, 20.0], 0);
        let scored = score_clusters(
            vec![
                cluster(6.0, Cell::new(0, 0)),
                cluster(-30.0, Cell::new(2, 1)),
                cluster(25.0, Cell::new(1, 0)),
                cluster(7.0, Cell::new(0, 3)),
                cluster(7.0, Cell::new(0, 1)),
            ],
            &null,
            0.25,
        );
        let masses: Vec<f64> = scored.iter().map(|s| s.cluster.mass).collect();
        assert_eq!(masses, vec![-30.0, 25.0, 7.0, 7.0, 6.0]);
        assert_eq!(scored[2].cluster.cells[0], Cell::new(0, 1));
        assert_eq!(scored[0].p_value, 0.2);
        assert!(scored[0].significant);
        assert_eq!(scored[2].p_value, 0.8);
        assert!(!scored[2].significant);
    }

    #[test]
    fn p_values_are_bounded() {
        let null = NullDistribution::from_values(vec![1.0; 99], 0);
        let scored = score_clusters(vec![cluster(1e9, Cell::new(0, 0)), cluster(0.5, Cell::new(1, 0))], &null, 0.05);
        assert_eq!(scored[0].p_value, 0.01);
        assert_eq!(scored[1].p_value, 1.0);
    }

    #[test]
    fn significance_is_strict() {
        // p == alpha is not significant.
        let null = NullDistribution::from_values(vec![0.0; 19], 0);
        let scored = score_clusters(vec![cluster(3.0, Cell::new(0, 0))], &null, 0.05);
        assert_eq!(scored[0].p_value, 0.05);
        assert!(!scored[0].significant);
    }
}
