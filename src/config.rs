//! Configuration for cluster permutation tests.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ClusterError, ConfigurationError};

/// Configuration options for [`crate::ClusterTest`].
///
/// Deserializes from the `stats` block of an analysis configuration:
///
/// ```
/// use erp_clusters::Config;
///
/// let cfg = Config::from_json_str(r#"{
///     "p_threshold": 0.01,
///     "n_permutations": 2000,
///     "tail": 0,
///     "cluster_alpha": 0.05,
///     "connectivity": { "method": "distance", "threshold": 0.05 },
///     "seed": 42
/// }"#).unwrap();
/// assert_eq!(cfg.n_permutations, 2000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Per-cell p-value converted into the cluster-forming t threshold
    /// (default: 0.05).
    pub p_threshold: f64,

    /// Explicit forming threshold in t units; overrides `p_threshold`.
    pub t_threshold: Option<f64>,

    /// Number of sign-flip permutations (default: 1024).
    pub n_permutations: usize,

    /// Which excursions form clusters (default: two-sided).
    pub tail: Tail,

    /// Significance cutoff on cluster p-values (default: 0.05).
    pub cluster_alpha: f64,

    /// How sensor adjacency is derived (default: triangulation of EEG channels).
    pub connectivity: Connectivity,

    /// Seed for the sign-flip sequence. `None` draws a fresh seed, which is
    /// recorded in the result.
    pub seed: Option<u64>,

    /// Largest time gap that still connects a unit to itself (default: 1).
    pub max_step: usize,

    /// Cluster-level summary statistic (default: sum of t).
    pub mass: MassStatistic,

    /// Worker threads for the permutation loop. `None` uses the shared pool.
    pub n_jobs: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            p_threshold: 0.05,
            t_threshold: None,
            n_permutations: 1024,
            tail: Tail::TwoSided,
            cluster_alpha: 0.05,
            connectivity: Connectivity::default(),
            seed: None,
            max_step: 1,
            mass: MassStatistic::Sum,
            n_jobs: None,
        }
    }
}

impl Config {
    /// Parse a JSON configuration block. Missing keys take their defaults.
    pub fn from_json_str(s: &str) -> Result<Self, ClusterError> {
        serde_json::from_str(s).map_err(|e| ConfigurationError::Parse(e.to_string()).into())
    }

    /// Check value ranges that do not depend on the data.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        check_probability("p_threshold", self.p_threshold)?;
        check_probability("cluster_alpha", self.cluster_alpha)?;
        if let Some(t) = self.t_threshold {
            if !t.is_finite() || t <= 0.0 {
                return Err(ConfigurationError::InvalidThreshold(t));
            }
        }
        if self.n_permutations == 0 {
            return Err(ConfigurationError::NoPermutations);
        }
        if self.max_step == 0 {
            return Err(ConfigurationError::InvalidMaxStep);
        }
        if self.n_jobs == Some(0) {
            return Err(ConfigurationError::InvalidJobs);
        }
        Ok(())
    }
}

fn check_probability(name: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidProbability { name, value })
    }
}

/// Direction of the test.
///
/// Serialized as the integers -1, 0 and 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Tail {
    /// Only negative excursions (`tail = -1`).
    Negative,
    /// Positive and negative excursions in separate pools (`tail = 0`).
    #[default]
    TwoSided,
    /// Only positive excursions (`tail = 1`).
    Positive,
}

impl Tail {
    /// Upper-tail probability used to derive the forming threshold.
    ///
    /// Always `1 - p/2`: a one-sided test keeps the two-sided threshold and
    /// only drops the pool of the other sign.
    pub fn threshold_quantile(self, p_threshold: f64) -> f64 {
        1.0 - p_threshold / 2.0
    }

    /// Whether positive clusters are formed.
    pub fn includes_positive(self) -> bool {
        matches!(self, Tail::TwoSided | Tail::Positive)
    }

    /// Whether negative clusters are formed.
    pub fn includes_negative(self) -> bool {
        matches!(self, Tail::TwoSided | Tail::Negative)
    }
}

impl TryFrom<i64> for Tail {
    type Error = ConfigurationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Tail::Negative),
            0 => Ok(Tail::TwoSided),
            1 => Ok(Tail::Positive),
            other => Err(ConfigurationError::InvalidTail(other)),
        }
    }
}

impl From<Tail> for i64 {
    fn from(tail: Tail) -> Self {
        match tail {
            Tail::Negative => -1,
            Tail::TwoSided => 0,
            Tail::Positive => 1,
        }
    }
}

/// Cluster-level summary statistic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MassStatistic {
    /// Sum of t over member cells.
    #[default]
    Sum,
    /// Number of member cells, signed by polarity.
    Size,
}

/// Channel type used to pick sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// Electroencephalography.
    Eeg,
    /// Magnetometer.
    Mag,
    /// Gradiometer.
    Grad,
    /// Electrooculography.
    Eog,
    /// Electrocardiography.
    Ecg,
    /// Electromyography.
    Emg,
    /// Stimulus/trigger channel.
    Stim,
    /// Anything else.
    Misc,
}

impl ChannelKind {
    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            ChannelKind::Eeg => "eeg",
            ChannelKind::Mag => "mag",
            ChannelKind::Grad => "grad",
            ChannelKind::Eog => "eog",
            ChannelKind::Ecg => "ecg",
            ChannelKind::Emg => "emg",
            ChannelKind::Stim => "stim",
            ChannelKind::Misc => "misc",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eeg" => Ok(ChannelKind::Eeg),
            "mag" => Ok(ChannelKind::Mag),
            "grad" => Ok(ChannelKind::Grad),
            "eog" => Ok(ChannelKind::Eog),
            "ecg" => Ok(ChannelKind::Ecg),
            "emg" => Ok(ChannelKind::Emg),
            "stim" => Ok(ChannelKind::Stim),
            "misc" => Ok(ChannelKind::Misc),
            _ => Err(ConfigurationError::UnknownChannelKind(s.to_string())),
        }
    }
}

/// Default distance threshold in metres.
pub const DEFAULT_DISTANCE_THRESHOLD: f64 = 0.04;

/// How sensor adjacency is derived.
///
/// In a configuration file this is either a channel-type string (`"eeg"`),
/// meaning triangulated neighbours among channels of that type, or
/// `{ "method": "distance", "threshold": 0.04 }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ConnectivitySpec", into = "ConnectivitySpec")]
pub enum Connectivity {
    /// Delaunay neighbours among channels of this kind.
    ChannelType(ChannelKind),
    /// Channels of `kind` within `threshold` metres of each other.
    Distance {
        /// Channel kind to pick.
        kind: ChannelKind,
        /// Maximum neighbour distance in metres.
        threshold: f64,
    },
}

impl Default for Connectivity {
    fn default() -> Self {
        Connectivity::ChannelType(ChannelKind::Eeg)
    }
}

impl Connectivity {
    /// Channel kind this connectivity picks.
    pub fn kind(&self) -> ChannelKind {
        match *self {
            Connectivity::ChannelType(kind) | Connectivity::Distance { kind, .. } => kind,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ConnectivitySpec {
    Named(String),
    Method(MethodSpec),
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
enum MethodSpec {
    Distance {
        #[serde(default = "default_threshold")]
        threshold: f64,
        #[serde(default = "default_kind", skip_serializing_if = "is_eeg")]
        ch_type: String,
    },
}

fn default_threshold() -> f64 {
    DEFAULT_DISTANCE_THRESHOLD
}

fn default_kind() -> String {
    ChannelKind::Eeg.as_str().to_string()
}

fn is_eeg(kind: &str) -> bool {
    kind == ChannelKind::Eeg.as_str()
}

impl TryFrom<ConnectivitySpec> for Connectivity {
    type Error = ConfigurationError;

    fn try_from(spec: ConnectivitySpec) -> Result<Self, Self::Error> {
        match spec {
            ConnectivitySpec::Named(name) => Ok(Connectivity::ChannelType(name.parse()?)),
            ConnectivitySpec::Method(MethodSpec::Distance { threshold, ch_type }) => Ok(Connectivity::Distance {
                kind: ch_type.parse()?,
                threshold,
            }),
        }
    }
}

impl From<Connectivity> for ConnectivitySpec {
    fn from(c: Connectivity) -> Self {
        match c {
            Connectivity::ChannelType(kind) => ConnectivitySpec::Named(kind.as_str().to_string()),
            Connectivity::Distance { kind, threshold } => ConnectivitySpec::Method(MethodSpec::Distance {
                threshold,
                ch_type: kind.as_str().to_string(),
            }),
        }
    }
}
