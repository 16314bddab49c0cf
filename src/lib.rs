//! # erp-clusters
//!
//! Cluster-based spatio-temporal permutation tests for event-related
//! potentials, in sensor space (electrodes) and source space (cortical
//! surface vertices).
//!
//! Given per-subject contrasts (condition A minus condition B) indexed
//! (subject, time, unit), the test:
//! - computes a one-sample t map across subjects
//! - groups supra-threshold cells into clusters that are contiguous in space
//!   and time, separately for positive and negative excursions
//! - compares each cluster's mass with the distribution of the largest
//!   cluster mass under random sign flips of the subjects
//!
//! The resulting cluster p-values control the family-wise error rate across
//! all time points and units.
//!
//! ## Quick Start
//!
//! ```ignore
//! use erp_clusters::{Adjacency, ClusterTest, ObservationTensor};
//!
//! let tensor = ObservationTensor::from_subjects(&per_subject_contrasts)?
//!     .with_times(times)?;
//! let adjacency = Adjacency::from_distance(names, &positions, 0.04)?;
//!
//! let result = ClusterTest::new().seed(42).run(&tensor, &adjacency)?;
//! println!("{}", erp_clusters::output::format_result(&result));
//! ```
//!
//! ## Sensor and source space
//!
//! The same test runs over any [`Adjacency`]. Sensor adjacency comes from a
//! distance threshold or a triangulation of the sensor layout
//! ([`Adjacency::from_sensors`]); source-space adjacency comes from the
//! triangle mesh of one or both hemispheres ([`Adjacency::from_source_space`]).

#![warn(clippy::all)]

mod config;
mod error;
mod result;
#[cfg(feature = "parallel")]
mod thread_pool;
mod types;

// Functional modules
pub mod adjacency;
pub mod analysis;
pub mod output;
pub mod preflight;
pub mod statistics;

// Re-exports for public API
pub use adjacency::{Adjacency, Hemisphere, Sensor, SurfaceMesh};
pub use analysis::{CancellationToken, Cluster, NullDistribution, ScoredCluster};
pub use cluster_test::ClusterTest;
pub use config::{ChannelKind, Config, Connectivity, MassStatistic, Tail, DEFAULT_DISTANCE_THRESHOLD};
pub use error::{ClusterError, ConfigurationError, GeometryError, Result};
pub use preflight::TestWarning;
pub use result::{ClusterSummary, ClusterTestResult, Metadata};
pub use statistics::{grand_average, one_sample_t};
pub use types::{Cell, ObservationTensor, Polarity};

/// Run a cluster test with default settings and the given seed.
///
/// Equivalent to `ClusterTest::new().seed(seed).run(tensor, adjacency)`.
pub fn cluster_test(tensor: &ObservationTensor, adjacency: &Adjacency, seed: u64) -> Result<ClusterTestResult> {
    ClusterTest::new().seed(seed).run(tensor, adjacency)
}
