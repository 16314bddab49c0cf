//! JSON serialization for cluster test results.

use crate::result::ClusterTestResult;

/// Serialize a ClusterTestResult to a compact JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails. Non-finite floats are written as
/// `null` by serde_json, so this only fails on I/O-like writer errors.
pub fn to_json(result: &ClusterTestResult) -> Result<String, serde_json::Error> {
    serde_json::to_string(result)
}

/// Serialize a ClusterTestResult to a pretty-printed JSON string.
///
/// # Errors
///
/// See [`to_json`].
pub fn to_json_pretty(result: &ClusterTestResult) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Cluster, NullDistribution, ScoredCluster};
    use crate::config::{MassStatistic, Tail};
    use crate::preflight::TestWarning;
    use crate::result::Metadata;
    use crate::types::{Cell, Polarity};
    use ndarray::array;

    fn make_test_result() -> ClusterTestResult {
        ClusterTestResult {
            t_obs: array![[4.0, 3.5], [0.2, -0.1]],
            threshold: 2.26,
            clusters: vec![ScoredCluster {
                cluster: Cluster {
                    polarity: Polarity::Positive,
                    cells: vec![Cell::new(0, 0), Cell::new(0, 1)],
                    mass: 7.5,
                },
                p_value: 0.02,
                significant: true,
            }],
            null: NullDistribution::from_values(vec![0.0, 3.0, 2.5], 17),
            warnings: vec![TestWarning::TooManyPermutations {
                requested: 1024,
                distinct: 1024,
            }],
            metadata: Metadata {
                seed: 17,
                n_subjects: 10,
                n_times: 2,
                n_units: 2,
                n_permutations: 3,
                tail: Tail::TwoSided,
                cluster_alpha: 0.05,
                max_step: 1,
                mass: MassStatistic::Sum,
                unit_names: vec!["C3".into(), "C4".into()],
                times: None,
                runtime_secs: 0.25,
            },
        }
    }

    #[test]
    fn test_to_json() {
        let json = to_json(&make_test_result()).unwrap();
        assert!(json.contains("\"threshold\":2.26"));
        assert!(json.contains("\"p_value\":0.02"));
        assert!(json.contains("\"polarity\":\"positive\""));
        assert!(json.contains("\"kind\":\"too_many_permutations\""));
        assert!(json.contains("\"tail\":0"));
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json_pretty(&make_test_result()).unwrap();
        assert!(json.contains('\n'));
        assert!(json.contains("\"seed\": 17"));
    }

    #[test]
    fn json_round_trips() {
        let result = make_test_result();
        let back: ClusterTestResult = serde_json::from_str(&to_json(&result).unwrap()).unwrap();
        assert_eq!(back, result);
    }
}
