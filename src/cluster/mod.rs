//! Divide-and-merge spectral clustering pipeline.
//!
//! The pipeline is split into small, separately testable stages:
//!
//! - [`stats`]: per-frame affinity-mass statistics in one pass
//! - [`eigen`]: second-eigenvector estimation by power iteration
//! - [`cut`]: linear-time minimum-conductance prefix cut
//! - [`objective`]: merge-or-keep scoring of a proposed split
//! - [`spectral`]: the recursive orchestrator tying the stages together
//!
//! Most callers only need [`SpectralClustering`]; the stage types are
//! exported for custom eigenvector strategies and for verifying cuts.

pub mod cut;
pub mod eigen;
pub mod objective;
pub mod spectral;
pub mod stats;

pub use cut::conductance_at;
pub use eigen::{NormalizedPower, RinvPower, SecondEigenvector};
pub use objective::Objective;
pub use spectral::{CancelToken, ClusterResult, SpectralClustering};
pub use stats::AffinityStats;
