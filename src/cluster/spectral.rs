//! Divide-and-merge spectral clustering.
//!
//! Top-down, the engine recursively bipartitions the data: estimate the
//! second eigenvector of the implicit normalized affinity operator, sort
//! rows by it, take the minimum-conductance prefix cut, recurse into both
//! sides. Bottom-up, every frame compares the objective of keeping its two
//! subtrees against collapsing them into one cluster, so the recursion
//! decides the number of clusters on its own.
//!
//! The matrix is never copied: each frame works through a [`MaskedView`]
//! over the caller's matrix, with row normalization folded into shared scale
//! factors. Numerical degeneracies (rows without affinity mass, non-finite
//! eigenvector estimates) degrade the affected frame to a single cluster
//! instead of propagating NaN or aborting sibling subtrees.
//!
//! Intended for non-negative data (e.g. term or feature count vectors),
//! where row dot products are cosine similarities after normalization.
//!
//! # Example
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
//! let result = SpectralClustering::new().with_seed(42).fit_predict(&data)?;
//! assert_eq!(result.num_clusters, 2);
//! # Ok::<(), eigencut::Error>(())
//! ```
//!
//! # References
//!
//! - Cheng, Kannan, Vempala, Wang (2006). "A Divide-and-Merge Methodology
//!   for Clustering"

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, warn};
use rand::prelude::*;

use super::cut::min_conductance_cut;
use super::eigen::{NormalizedPower, SecondEigenvector};
use super::objective::{kmeans_objective, merged_objective, split_objective, Objective};
use super::stats::AffinityStats;
use crate::error::{Error, Result};
use crate::matrix::{unit_scales, MaskedView, ParallelSafe, RowMatrix};

/// Final clustering: one 0-based cluster id per input row, ids contiguous
/// in `[0, num_clusters)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterResult {
    /// Cluster id per row, in input row order.
    pub assignments: Vec<usize>,
    /// Number of distinct clusters.
    pub num_clusters: usize,
}

impl ClusterResult {
    fn single(num_rows: usize) -> Self {
        ClusterResult {
            assignments: vec![0; num_rows],
            num_clusters: 1,
        }
    }
}

/// Cooperative cancellation for long runs; checked once per recursive call.
///
/// Power iteration and the cut scan are linear in non-zeros but the
/// recursion can still be costly on dense high-dimensional data, so callers
/// may bound wall-clock time by cancelling from another thread.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; the running fit returns [`Error::Cancelled`].
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Divide-and-merge spectral clustering configuration and runner.
#[derive(Clone, Debug)]
pub struct SpectralClustering<S = NormalizedPower> {
    /// Intra-cluster dissimilarity weight; `beta = 1 - alpha`.
    alpha: f64,
    /// Recursion depth bound (at most `2^max` clusters); `None` lets the
    /// merge objective terminate the recursion naturally.
    max_clusters: Option<usize>,
    /// Random seed for the power-iteration initialization.
    seed: Option<u64>,
    /// Objective driving merge-or-keep decisions.
    objective: Objective,
    /// Optional cancellation token.
    cancel: Option<CancelToken>,
    /// Second-eigenvector strategy.
    strategy: S,
}

impl SpectralClustering<NormalizedPower> {
    /// Create a clusterer with the default weights and the generalized
    /// normalized-affinity eigenvector strategy.
    pub fn new() -> Self {
        SpectralClustering {
            alpha: 0.4,
            max_clusters: None,
            seed: None,
            objective: Objective::RelaxedCorrelation,
            cancel: None,
            strategy: NormalizedPower,
        }
    }
}

impl Default for SpectralClustering<NormalizedPower> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: SecondEigenvector + ParallelSafe> SpectralClustering<S> {
    /// Set the intra-cluster weight `alpha` (must be in `(0, 1)`);
    /// the inter-cluster weight is `1 - alpha`.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Bound the recursion depth, capping the result at `2^max` clusters.
    pub fn with_max_clusters(mut self, max: usize) -> Self {
        self.max_clusters = Some(max);
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Choose the merge-or-keep objective.
    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = objective;
        self
    }

    /// Attach a cancellation token.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Swap in a different second-eigenvector strategy.
    pub fn with_strategy<T: SecondEigenvector + ParallelSafe>(
        self,
        strategy: T,
    ) -> SpectralClustering<T> {
        SpectralClustering {
            alpha: self.alpha,
            max_clusters: self.max_clusters,
            seed: self.seed,
            objective: self.objective,
            cancel: self.cancel,
            strategy,
        }
    }

    /// Cluster the rows of `matrix`.
    ///
    /// The matrix is borrowed for the whole call and never copied; rows are
    /// normalized to unit self-dot-product through shared scale factors.
    /// Returns one contiguous 0-based cluster id per row.
    pub fn fit_predict<M: RowMatrix + ParallelSafe>(&self, matrix: &M) -> Result<ClusterResult> {
        let n = matrix.rows();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(Error::InvalidParameter {
                name: "alpha",
                message: "must be in (0, 1)",
            });
        }

        let seed = self.seed.unwrap_or_else(|| rand::rng().random());
        let mut rng = StdRng::seed_from_u64(seed);
        debug!(
            "spectral clustering {} rows x {} columns (seed {seed})",
            n,
            matrix.columns()
        );

        let scales = unit_scales(matrix);
        let rows: Vec<usize> = (0..n).collect();
        let result = self.cluster_recursive(matrix, &scales, &rows, 0, &mut rng)?;
        debug!("created {} clusters", result.num_clusters);
        Ok(result)
    }

    /// One frame of the divide-and-merge recursion over `rows` (backing
    /// indices into `base`).
    fn cluster_recursive<M: RowMatrix + ParallelSafe>(
        &self,
        base: &M,
        scales: &[f64],
        rows: &[usize],
        depth: usize,
        rng: &mut StdRng,
    ) -> Result<ClusterResult> {
        if let Some(token) = &self.cancel {
            if token.is_cancelled() {
                return Err(Error::Cancelled);
            }
        }

        let n = rows.len();
        if n <= 1 {
            return Ok(ClusterResult::single(n));
        }
        if self.max_clusters.is_some_and(|max| depth >= max) {
            return Ok(ClusterResult::single(n));
        }

        let view = MaskedView::new(base, rows, scales);
        let stats = AffinityStats::compute(&view)?;
        if !(stats.p_sum.is_finite() && stats.p_sum > 0.0) {
            warn!("no affinity mass across {n} rows at depth {depth}; keeping one cluster");
            return Ok(ClusterResult::single(n));
        }

        let v = self.strategy.second_eigenvector(&view, &stats, rng);
        if v.iter().any(|x| !x.is_finite()) {
            warn!("eigenvector estimate degenerated at depth {depth}; keeping one cluster");
            return Ok(ClusterResult::single(n));
        }

        // Stable ascending sort by eigenvector value; ties resolve to the
        // lower row index.
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| v[a].total_cmp(&v[b]));

        let sorted_rows: Vec<usize> = order.iter().map(|&i| rows[i]).collect();
        let sorted_rho: Vec<f64> = order.iter().map(|&i| stats.rho[i]).collect();
        let sorted = MaskedView::new(base, &sorted_rows, scales);

        let (cut, cut_conductance) =
            min_conductance_cut(&sorted, &sorted_rho, stats.p_sum, &stats.row_sums);
        if cut == 0 || cut >= n {
            // Structurally impossible given the scan's candidate range.
            warn!("degenerate cut at depth {depth}; forcing merge");
            return Ok(ClusterResult::single(n));
        }
        debug!(
            "depth {depth}: splitting {n} rows into {cut}-{} (conductance {cut_conductance:.4})",
            n - cut
        );

        let (left_rows, right_rows) = sorted_rows.split_at(cut);

        // Children get forked RNGs so sequential and parallel execution
        // produce identical assignments.
        let mut left_rng = StdRng::seed_from_u64(rng.random());
        let mut right_rng = StdRng::seed_from_u64(rng.random());

        #[cfg(feature = "parallel")]
        let (left_result, right_result) = {
            let (l, r) = rayon::join(
                || self.cluster_recursive(base, scales, left_rows, depth + 1, &mut left_rng),
                || self.cluster_recursive(base, scales, right_rows, depth + 1, &mut right_rng),
            );
            (l?, r?)
        };
        #[cfg(not(feature = "parallel"))]
        let (left_result, right_result) = (
            self.cluster_recursive(base, scales, left_rows, depth + 1, &mut left_rng)?,
            self.cluster_recursive(base, scales, right_rows, depth + 1, &mut right_rng)?,
        );

        let left_view = MaskedView::new(base, left_rows, scales);
        let right_view = MaskedView::new(base, right_rows, scales);

        let merge = match self.objective {
            Objective::RelaxedCorrelation => {
                let beta = 1.0 - self.alpha;
                let split = split_objective(
                    self.alpha,
                    beta,
                    &left_result.assignments,
                    left_result.num_clusters,
                    &left_view,
                    &right_result.assignments,
                    right_result.num_clusters,
                    &right_view,
                    stats.p_sum,
                    n,
                );
                let merged = merged_objective(self.alpha, n, stats.p_sum);
                merged < split
            }
            Objective::KMeans => {
                let split = kmeans_objective(
                    &left_result.assignments,
                    left_result.num_clusters,
                    &left_view,
                ) + kmeans_objective(
                    &right_result.assignments,
                    right_result.num_clusters,
                    &right_view,
                );
                let merged = kmeans_objective(&vec![0usize; n], 1, &view);
                merged >= split
            }
        };

        if merge {
            debug!("combining subtrees at depth {depth}");
            return Ok(ClusterResult::single(n));
        }
        debug!("maintaining subtrees at depth {depth}");

        // Remap positional child assignments back through the sort order;
        // right-side ids are offset past the left side's clusters.
        let mut assignments = vec![0usize; n];
        for (pos, &local) in order.iter().enumerate() {
            assignments[local] = if pos < cut {
                left_result.assignments[pos]
            } else {
                right_result.assignments[pos - cut] + left_result.num_clusters
            };
        }
        Ok(ClusterResult {
            assignments,
            num_clusters: left_result.num_clusters + right_result.num_clusters,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::eigen::RinvPower;
    use crate::matrix::dense_from_rows;
    use ndarray::Array2;

    /// Two well-separated pairs: rows 0,1 identical, rows 2,3 identical,
    /// zero similarity across.
    fn two_pairs() -> Array2<f64> {
        dense_from_rows(&[
            vec![1.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![0.0, 1.0],
        ])
        .unwrap()
    }

    fn assert_pair_split(result: &ClusterResult) {
        assert_eq!(result.num_clusters, 2);
        assert_eq!(result.assignments.len(), 4);
        assert_eq!(result.assignments[0], result.assignments[1]);
        assert_eq!(result.assignments[2], result.assignments[3]);
        assert_ne!(result.assignments[0], result.assignments[2]);
    }

    #[test]
    fn test_single_row_single_cluster() {
        let m = dense_from_rows(&[vec![1.0, 2.0]]).unwrap();
        let result = SpectralClustering::new().fit_predict(&m).unwrap();
        assert_eq!(result.assignments, vec![0]);
        assert_eq!(result.num_clusters, 1);
    }

    #[test]
    fn test_two_pairs_end_to_end() {
        let m = two_pairs();
        let result = SpectralClustering::new()
            .with_seed(42)
            .fit_predict(&m)
            .unwrap();
        assert_pair_split(&result);
    }

    #[test]
    fn test_two_pairs_rinv_strategy() {
        let m = two_pairs();
        let result = SpectralClustering::new()
            .with_strategy(RinvPower)
            .with_seed(42)
            .fit_predict(&m)
            .unwrap();
        assert_pair_split(&result);
    }

    #[test]
    fn test_two_pairs_kmeans_objective() {
        let m = two_pairs();
        let result = SpectralClustering::new()
            .with_objective(Objective::KMeans)
            .with_seed(42)
            .fit_predict(&m)
            .unwrap();
        assert_pair_split(&result);
    }

    #[test]
    fn test_row_magnitudes_do_not_matter() {
        // Same directions as two_pairs with arbitrary magnitudes; the
        // shared unit scales must give the identical split.
        let m = dense_from_rows(&[
            vec![3.0, 0.0],
            vec![0.5, 0.0],
            vec![0.0, 7.0],
            vec![0.0, 2.0],
        ])
        .unwrap();
        let result = SpectralClustering::new()
            .with_seed(42)
            .fit_predict(&m)
            .unwrap();
        assert_pair_split(&result);
    }

    #[test]
    fn test_identical_rows_merge_to_one_cluster() {
        // Merge dominates any spurious split of indistinguishable rows.
        let m = dense_from_rows(&vec![vec![1.0, 1.0]; 5]).unwrap();
        let result = SpectralClustering::new()
            .with_seed(7)
            .fit_predict(&m)
            .unwrap();
        assert_eq!(result.num_clusters, 1);
        assert_eq!(result.assignments, vec![0; 5]);
    }

    #[test]
    fn test_deterministic_with_seed() {
        let m = dense_from_rows(&[
            vec![1.0, 0.2, 0.0],
            vec![0.9, 0.3, 0.1],
            vec![0.0, 0.1, 1.0],
            vec![0.1, 0.0, 0.8],
            vec![0.5, 0.5, 0.5],
        ])
        .unwrap();
        let a = SpectralClustering::new()
            .with_seed(99)
            .fit_predict(&m)
            .unwrap();
        let b = SpectralClustering::new()
            .with_seed(99)
            .fit_predict(&m)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_assignments_contiguous() {
        let m = two_pairs();
        let result = SpectralClustering::new()
            .with_seed(5)
            .fit_predict(&m)
            .unwrap();
        for id in 0..result.num_clusters {
            assert!(result.assignments.contains(&id), "cluster id {id} unused");
        }
        for &a in &result.assignments {
            assert!(a < result.num_clusters);
        }
    }

    #[test]
    fn test_empty_input() {
        let m = Array2::<f64>::zeros((0, 2));
        assert!(matches!(
            SpectralClustering::new().fit_predict(&m),
            Err(Error::EmptyInput)
        ));
    }

    #[test]
    fn test_invalid_alpha() {
        let m = two_pairs();
        let result = SpectralClustering::new().with_alpha(1.5).fit_predict(&m);
        assert!(matches!(result, Err(Error::InvalidParameter { .. })));
    }

    #[test]
    fn test_max_clusters_zero_forces_single_cluster() {
        let m = two_pairs();
        let result = SpectralClustering::new()
            .with_max_clusters(0)
            .with_seed(42)
            .fit_predict(&m)
            .unwrap();
        assert_eq!(result.num_clusters, 1);
    }

    #[test]
    fn test_all_zero_rows_degrade_to_single_cluster() {
        let m = Array2::<f64>::zeros((3, 4));
        let result = SpectralClustering::new()
            .with_seed(1)
            .fit_predict(&m)
            .unwrap();
        assert_eq!(result.num_clusters, 1);
    }

    #[test]
    fn test_cancelled_token() {
        let m = two_pairs();
        let token = CancelToken::new();
        token.cancel();
        let result = SpectralClustering::new()
            .with_cancel_token(token)
            .fit_predict(&m);
        assert_eq!(result, Err(Error::Cancelled));
    }

    #[cfg(feature = "sparse")]
    #[test]
    fn test_sparse_and_dense_backings_agree() {
        let dense = two_pairs();
        let mut tri = sprs::TriMat::<f64>::new((4, 2));
        tri.add_triplet(0, 0, 1.0);
        tri.add_triplet(1, 0, 1.0);
        tri.add_triplet(2, 1, 1.0);
        tri.add_triplet(3, 1, 1.0);
        let csr = tri.to_csr();

        let a = SpectralClustering::new()
            .with_seed(42)
            .fit_predict(&dense)
            .unwrap();
        let b = SpectralClustering::new()
            .with_seed(42)
            .fit_predict(&csr)
            .unwrap();
        assert_eq!(a, b);
    }
}
