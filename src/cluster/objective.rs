//! Split-versus-merge objective evaluation.
//!
//! After both subtrees of a cut come back, the engine decides whether the
//! bipartition earned its keep. The relaxed correlation objective weighs
//! intra-cluster *dissimilarity* against inter-cluster *similarity*; lower
//! is better, and a subtree whose merged score undercuts its split score is
//! collapsed to one cluster. The k-means objective is the similarity of each
//! row to its cluster's mean centroid; higher is better, so the comparison
//! flips.
//!
//! Intra-cluster scores use an online centroid formulation: for each row,
//! `size_so_far - dot(row, running_centroid)` is exactly the row's summed
//! dissimilarity (1 - sim) against every earlier member, so the total comes
//! out of one pass with no pairwise loop.

use crate::matrix::{add_row_into, RowMatrix};

/// Which objective drives the merge-or-keep decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Objective {
    /// Relaxed correlation: `alpha·intra_dissimilarity + beta·inter_similarity`,
    /// minimized.
    #[default]
    RelaxedCorrelation,
    /// Similarity of rows to their cluster's mean centroid, maximized.
    KMeans,
}

/// Total intra-cluster dissimilarity of a clustering, in
/// O(stored entries of `matrix`).
///
/// `assignments` are positional cluster ids in `[0, num_clusters)`; rows
/// must have unit self-dot-product.
pub(crate) fn intra_cluster_score<M: RowMatrix>(
    assignments: &[usize],
    matrix: &M,
    num_clusters: usize,
) -> f64 {
    let cols = matrix.columns();
    let mut centroids: Vec<Option<Vec<f64>>> = vec![None; num_clusters];
    let mut sizes = vec![0usize; num_clusters];

    let mut score = 0.0;
    for (i, &a) in assignments.iter().enumerate() {
        match &mut centroids[a] {
            None => {
                let mut c = vec![0.0; cols];
                add_row_into(matrix, i, &mut c);
                centroids[a] = Some(c);
            }
            Some(c) => {
                score += sizes[a] as f64 - matrix.dot_row(i, c);
                add_row_into(matrix, i, c);
            }
        }
        sizes[a] += 1;
    }
    score
}

/// Relaxed correlation objective for keeping a bipartition, with child
/// clusterings applied inside each side.
#[allow(clippy::too_many_arguments)]
pub(crate) fn split_objective<L: RowMatrix, R: RowMatrix>(
    alpha: f64,
    beta: f64,
    left_assignments: &[usize],
    left_clusters: usize,
    left: &L,
    right_assignments: &[usize],
    right_clusters: usize,
    right: &R,
    p_sum: f64,
    num_rows: usize,
) -> f64 {
    let intra = intra_cluster_score(left_assignments, left, left_clusters)
        + intra_cluster_score(right_assignments, right, right_clusters);
    // (p_sum - n)/2 is the total off-diagonal similarity mass; whatever is
    // not intra-cluster dissimilarity is counted as crossing similarity.
    let inter = (p_sum - num_rows as f64) / 2.0 - intra;
    alpha * intra + beta * inter
}

/// Relaxed correlation objective for collapsing the frame to one cluster.
pub(crate) fn merged_objective(alpha: f64, num_rows: usize, p_sum: f64) -> f64 {
    let n = num_rows as f64;
    alpha * (n * (n + 1.0) / 2.0 - p_sum / 2.0)
}

/// K-means style objective: summed similarity of each row to its cluster's
/// mean centroid. Higher is better.
pub(crate) fn kmeans_objective<M: RowMatrix>(
    assignments: &[usize],
    num_clusters: usize,
    matrix: &M,
) -> f64 {
    let cols = matrix.columns();
    let mut centroids = vec![vec![0.0; cols]; num_clusters];
    let mut sizes = vec![0usize; num_clusters];
    for (i, &a) in assignments.iter().enumerate() {
        add_row_into(matrix, i, &mut centroids[a]);
        sizes[a] += 1;
    }
    for (c, &size) in centroids.iter_mut().zip(&sizes) {
        if size > 0 {
            let inv = 1.0 / size as f64;
            for v in c.iter_mut() {
                *v *= inv;
            }
        }
    }

    let mut score = 0.0;
    for (i, &a) in assignments.iter().enumerate() {
        score += matrix.dot_row(i, &centroids[a]);
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::dense_from_rows;
    use ndarray::Array2;

    fn two_pairs() -> Array2<f64> {
        dense_from_rows(&[
            vec![1.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![0.0, 1.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_intra_score_identical_rows_is_zero() {
        let m = dense_from_rows(&vec![vec![1.0, 0.0]; 4]).unwrap();
        let score = intra_cluster_score(&[0, 0, 0, 0], &m, 1);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_intra_score_counts_cross_pair_dissimilarity() {
        // Rows 0,1 identical, row 2 orthogonal, all one cluster:
        // row 1 adds 1 - 1 = 0, row 2 adds 2 - 0 = 2.
        let m = dense_from_rows(&[vec![1.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        let score = intra_cluster_score(&[0, 0, 0], &m, 1);
        assert_eq!(score, 2.0);
    }

    #[test]
    fn test_intra_score_respects_assignments() {
        // Orthogonal row in its own cluster contributes nothing.
        let m = dense_from_rows(&[vec![1.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        let score = intra_cluster_score(&[0, 0, 1], &m, 2);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_split_beats_merge_for_separated_pairs() {
        // p_sum = 8 for the two orthogonal pairs. Splitting pairs apart:
        // intra 0, inter (8-4)/2 = 2, objective 0.6·2 = 1.2. Merged:
        // 0.4·(10 - 4) = 2.4. Keep the split.
        let left = dense_from_rows(&[vec![1.0, 0.0], vec![1.0, 0.0]]).unwrap();
        let right = dense_from_rows(&[vec![0.0, 1.0], vec![0.0, 1.0]]).unwrap();

        let split = split_objective(
            0.4,
            0.6,
            &[0, 0],
            1,
            &left,
            &[0, 0],
            1,
            &right,
            8.0,
            4,
        );
        let merged = merged_objective(0.4, 4, 8.0);
        assert!((split - 1.2).abs() < 1e-9);
        assert!((merged - 2.4).abs() < 1e-9);
        assert!(merged >= split);
    }

    #[test]
    fn test_merge_beats_split_for_identical_rows() {
        // Five identical rows, p_sum = 25. Any split leaves intra 0 and
        // inter 10, costing 6.0; merging costs 0.4·(15 - 12.5) = 1.0.
        let left = dense_from_rows(&vec![vec![1.0, 0.0]; 2]).unwrap();
        let right = dense_from_rows(&vec![vec![1.0, 0.0]; 3]).unwrap();

        let split = split_objective(
            0.4,
            0.6,
            &[0, 0],
            1,
            &left,
            &[0, 0, 0],
            1,
            &right,
            25.0,
            5,
        );
        let merged = merged_objective(0.4, 5, 25.0);
        assert!((split - 6.0).abs() < 1e-9);
        assert!((merged - 1.0).abs() < 1e-9);
        assert!(merged < split);
    }

    #[test]
    fn test_kmeans_objective_mean_centroids() {
        let m = two_pairs();
        // One cluster: centroid [0.5, 0.5], each row dots to 0.5.
        assert!((kmeans_objective(&[0, 0, 0, 0], 1, &m) - 2.0).abs() < 1e-9);
        // Pairs apart: each row dots 1.0 with its own centroid.
        assert!((kmeans_objective(&[0, 0, 1, 1], 2, &m) - 4.0).abs() < 1e-9);
    }
}
