//! Cluster-level inference.
//!
//! 1. **Cluster formation** ([`clusters`]): union-find labelling of
//!    supra-threshold cells over the space x time graph
//! 2. **Permutation null** ([`permutation`]): max cluster mass under random
//!    sign flips of the subjects
//! 3. **Significance** ([`significance`]): family-wise corrected p-values

mod clusters;
mod permutation;
mod significance;

pub use clusters::{count_candidates, form_clusters, max_cluster_mass, Cluster, ClusterScratch, FormingParams};
pub use permutation::{build_null, CancellationToken, NullDistribution, PermutationPlan};
pub use significance::{score_clusters, ScoredCluster};
