//! Configuration parsing and result serialization.

use erp_clusters::output::{format_result, to_json, to_json_pretty};
use erp_clusters::{
    Adjacency, ChannelKind, ClusterError, ClusterTest, ClusterTestResult, Config, ConfigurationError, Connectivity,
    MassStatistic, ObservationTensor, Tail,
};
use ndarray::Array3;

#[test]
fn config_file_drives_the_test() {
    let config = Config::from_json_str(
        r#"{
            "p_threshold": 0.01,
            "n_permutations": 300,
            "tail": 1,
            "cluster_alpha": 0.05,
            "connectivity": { "method": "distance", "threshold": 0.05 },
            "seed": 11,
            "mass": "size"
        }"#,
    )
    .unwrap();
    assert_eq!(config.tail, Tail::Positive);
    assert_eq!(config.mass, MassStatistic::Size);
    assert_eq!(
        config.connectivity,
        Connectivity::Distance {
            kind: ChannelKind::Eeg,
            threshold: 0.05
        }
    );

    let tensor = ObservationTensor::new(Array3::from_shape_fn((10, 4, 3), |(s, t, u)| {
        if t == 2 && u != 1 {
            3.0 + 0.2 * (s % 4) as f64
        } else if s % 2 == 0 {
            0.5
        } else {
            -0.5
        }
    }));
    let adjacency = Adjacency::from_edges(vec!["A".into(), "B".into(), "C".into()], [(0, 1), (1, 2)]).unwrap();
    let result = ClusterTest::with_config(config).run(&tensor, &adjacency).unwrap();

    // Units 0 and 2 are not neighbours, so they form separate size-1 clusters.
    assert_eq!(result.clusters.len(), 2);
    assert!(result.clusters.iter().all(|c| c.cluster.mass == 1.0));
    assert_eq!(result.metadata.seed, 11);
}

#[test]
fn named_connectivity_and_defaults() {
    let config = Config::from_json_str(r#"{ "connectivity": "eeg" }"#).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn bad_config_is_rejected() {
    assert!(matches!(
        Config::from_json_str(r#"{ "tail": 2 }"#),
        Err(ClusterError::Configuration(ConfigurationError::Parse(_)))
    ));
    assert!(Config::from_json_str(r#"{ "n_permutation": 10 }"#).is_err());

    let tensor = ObservationTensor::new(Array3::zeros((5, 2, 1)));
    let adjacency = Adjacency::isolated(vec!["A".into()]);
    let err = ClusterTest::new().cluster_alpha(1.5).run(&tensor, &adjacency).unwrap_err();
    assert!(matches!(
        err,
        ClusterError::Configuration(ConfigurationError::InvalidProbability { name: "cluster_alpha", .. })
    ));
}

#[test]
fn result_json_round_trip_and_report() {
    let tensor = ObservationTensor::new(Array3::from_shape_fn((10, 3, 2), |(s, t, _)| {
        if t == 1 {
            4.0 + 0.1 * (s % 3) as f64
        } else if s % 2 == 0 {
            1.0
        } else {
            -1.0
        }
    }))
    .with_times(vec![0.0, 0.004, 0.008])
    .unwrap();
    let adjacency = Adjacency::from_edges(vec!["Cz".into(), "Pz".into()], [(0, 1)]).unwrap();
    let result = ClusterTest::new()
        .n_permutations(200)
        .seed(5)
        .run(&tensor, &adjacency)
        .unwrap();

    let json = to_json(&result).unwrap();
    let back: ClusterTestResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back, result);
    assert!(to_json_pretty(&result).unwrap().contains("\"unit_names\""));

    colored::control::set_override(false);
    let report = format_result(&result);
    assert!(report.contains("Found 1 significant cluster(s)"), "{report}");
    assert!(report.contains("Time window: 4.0 ms to 4.0 ms"), "{report}");
    assert!(report.contains("Units involved: Cz, Pz"), "{report}");
}
