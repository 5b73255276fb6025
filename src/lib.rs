//! # eigencut
//!
//! Divide-and-merge spectral clustering over row-major data matrices.
//!
//! The engine recursively bipartitions a dataset by an approximate second
//! eigenvector of the normalized row-affinity operator, then decides
//! bottom-up whether each split is worth keeping, so the number of clusters
//! falls out of the data instead of being passed in. The affinity matrix is
//! never materialized: all spectral work runs against `A·Aᵀ` implicitly,
//! in time linear in the stored entries of the data per power-iteration
//! pass.
//!
//! Dense [`ndarray`] matrices work out of the box; CSR matrices from
//! [`sprs`](https://docs.rs/sprs) are supported behind the `sparse` feature
//! (on by default), and the `parallel` feature runs the two recursion
//! branches on rayon.
//!
//! ```
//! use eigencut::matrix::dense_from_rows;
//! use eigencut::SpectralClustering;
//!
//! let data = dense_from_rows(&[
//!     vec![1.0, 0.0],
//!     vec![1.0, 0.0],
//!     vec![0.0, 1.0],
//!     vec![0.0, 1.0],
//! ])?;
//!
//! let result = SpectralClustering::new().with_seed(7).fit_predict(&data)?;
//! assert_eq!(result.num_clusters, 2);
//! # Ok::<(), eigencut::Error>(())
//! ```
//!
//! Based on the divide-and-merge methodology of Cheng, Kannan, Vempala and
//! Wang (2006) and the spectral bipartitioning analysis of Kannan, Vempala
//! and Vetta (2000).

pub mod cluster;
pub mod error;
pub mod matrix;

pub use cluster::{
    CancelToken, ClusterResult, NormalizedPower, Objective, RinvPower, SecondEigenvector,
    SpectralClustering,
};
pub use error::{Error, Result};
pub use matrix::{MaskedView, RowMatrix};
