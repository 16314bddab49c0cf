//! Error types for cluster permutation testing.
//!
//! Every fatal condition is detected before the permutation loop starts:
//! bad geometry aborts adjacency construction, bad inputs or configuration
//! abort in preflight. Numerical trouble inside a single permutation is not
//! an error; it is counted and reported through [`crate::TestWarning`].

use thiserror::Error;

/// Top-level error for a cluster permutation test.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Spatial geometry could not produce a valid adjacency.
    #[error("geometry error: {0}")]
    Geometry(#[from] GeometryError),

    /// Inputs or configuration are inconsistent with each other.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The caller cancelled the run; no partial null distribution is returned.
    #[error("cluster test cancelled after {completed} of {requested} permutations")]
    Cancelled {
        /// Permutations that had finished when cancellation was observed.
        completed: usize,
        /// Permutations requested.
        requested: usize,
    },
}

/// Invalid or missing spatial geometry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// A unit has no position at all.
    #[error("no position for channel '{name}'")]
    MissingPosition {
        /// Unit name.
        name: String,
    },

    /// A unit position has a NaN or infinite coordinate.
    #[error("non-finite position for channel '{name}'")]
    NonFinitePosition {
        /// Unit name.
        name: String,
    },

    /// Every position sits at the origin, which means no montage was applied.
    #[error("no finite channel positions: all {count} positions are at the origin (is a montage set?)")]
    DegeneratePositions {
        /// Number of positions inspected.
        count: usize,
    },

    /// No unit of the requested channel kind exists.
    #[error("no channels of type '{kind}' found")]
    NoChannelsOfKind {
        /// Requested channel kind.
        kind: String,
    },

    /// Triangulation needs at least three points.
    #[error("triangulated adjacency needs at least 3 channel positions, got {count}")]
    TooFewPositions {
        /// Number of usable positions.
        count: usize,
    },

    /// Projected positions are collinear, so no triangle connects them.
    #[error("sensor positions are collinear: triangulating {count} channels produced no neighbours")]
    DegenerateTriangulation {
        /// Number of positions triangulated.
        count: usize,
    },

    /// Distance threshold is negative or not finite.
    #[error("distance threshold must be finite and >= 0, got {threshold}")]
    InvalidDistanceThreshold {
        /// Offending threshold.
        threshold: f64,
    },

    /// An edge or triangle references a unit outside the unit list.
    #[error("index {index} out of range for {n_units} spatial units")]
    IndexOutOfRange {
        /// Offending index.
        index: usize,
        /// Number of units.
        n_units: usize,
    },

    /// A triangle repeats a vertex.
    #[error("degenerate triangle {triangle:?} in mesh")]
    DegenerateTriangle {
        /// Offending triangle.
        triangle: [usize; 3],
    },

    /// Names and positions disagree in length.
    #[error("{names} unit names but {positions} positions")]
    LengthMismatch {
        /// Number of names.
        names: usize,
        /// Number of positions.
        positions: usize,
    },
}

/// Inconsistent inputs or configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// A one-sample statistic needs at least two subjects.
    #[error("at least 2 subjects are required for a one-sample test, got {n_subjects}")]
    InsufficientSubjects {
        /// Subjects supplied.
        n_subjects: usize,
    },

    /// Spatial axis of the data does not match the adjacency.
    #[error("data has {data_units} spatial units but adjacency has {adjacency_units}")]
    SpatialMismatch {
        /// Units in the observation tensor.
        data_units: usize,
        /// Units in the adjacency graph.
        adjacency_units: usize,
    },

    /// Subjects do not share one (time, unit) grid.
    #[error("subject {subject} has shape {found:?}, expected {expected:?}")]
    RaggedSubjects {
        /// Index of the first offending subject.
        subject: usize,
        /// Shape of subject 0.
        expected: (usize, usize),
        /// Shape of the offending subject.
        found: (usize, usize),
    },

    /// Time axis length does not match the number of samples.
    #[error("time axis has {times} entries but data has {samples} samples")]
    TimeAxisMismatch {
        /// Entries in the time axis.
        times: usize,
        /// Samples in the data.
        samples: usize,
    },

    /// Time or spatial axis is empty.
    #[error("observation tensor has an empty axis: shape {shape:?}")]
    EmptyAxis {
        /// Tensor shape (subjects, times, units).
        shape: (usize, usize, usize),
    },

    /// An observation is NaN or infinite.
    #[error("observation at (subject {subject}, time {time}, unit {unit}) is not finite")]
    NonFiniteObservation {
        /// Subject index.
        subject: usize,
        /// Time index.
        time: usize,
        /// Unit index.
        unit: usize,
    },

    /// The observed statistic map overflowed.
    #[error("observed statistic map has {cells} non-finite cells")]
    NonFiniteStatistic {
        /// Number of non-finite cells.
        cells: usize,
    },

    /// Tail must be -1, 0 or 1.
    #[error("tail must be -1, 0 or 1, got {0}")]
    InvalidTail(i64),

    /// A probability parameter is outside (0, 1).
    #[error("{name} must be in (0, 1), got {value}")]
    InvalidProbability {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    /// Explicit t threshold must be finite and positive.
    #[error("t_threshold must be finite and > 0, got {0}")]
    InvalidThreshold(f64),

    /// At least one permutation is required.
    #[error("n_permutations must be >= 1")]
    NoPermutations,

    /// max_step must be at least 1.
    #[error("max_step must be >= 1")]
    InvalidMaxStep,

    /// n_jobs must be at least 1 when given.
    #[error("n_jobs must be >= 1 when set")]
    InvalidJobs,

    /// Unknown channel type name.
    #[error("unknown channel type '{0}'")]
    UnknownChannelKind(String),

    /// Configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Parse(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = ClusterError> = std::result::Result<T, E>;
