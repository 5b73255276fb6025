//! Affinity-mass statistics for one recursion frame.
//!
//! With rows normalized to unit self-dot-product, the dot product of two
//! rows *is* their similarity, and the dot of a row against the column sums
//! is that row's total similarity mass against the whole frame. So every
//! affinity statistic the engine needs comes out of one pass over the data,
//! without touching a single pairwise entry.

use crate::error::{Error, Result};
use crate::matrix::{column_sums, RowMatrix};

/// Row-sum vector, per-row affinity mass, and total affinity mass of a
/// matrix.
#[derive(Clone, Debug)]
pub struct AffinityStats {
    /// Sum of all rows: one total per column (length = columns).
    pub row_sums: Vec<f64>,
    /// `rho[i] = row_i · row_sums`, row `i`'s similarity mass against the
    /// full frame (its own unit self-similarity included). Non-negative for
    /// non-negative data.
    pub rho: Vec<f64>,
    /// `Σ rho[i]`, the total pairwise-affinity mass.
    pub p_sum: f64,
}

impl AffinityStats {
    /// Compute statistics in O(stored entries of `matrix`).
    pub fn compute<M: RowMatrix>(matrix: &M) -> Result<Self> {
        let n = matrix.rows();
        if n == 0 {
            return Err(Error::EmptyInput);
        }

        let row_sums = column_sums(matrix);
        let mut rho = Vec::with_capacity(n);
        let mut p_sum = 0.0;
        for r in 0..n {
            let dot = matrix.dot_row(r, &row_sums);
            p_sum += dot;
            rho.push(dot);
        }

        Ok(AffinityStats {
            row_sums,
            rho,
            p_sum,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{unit_scales, MaskedView};
    use ndarray::array;

    #[test]
    fn test_stats_orthogonal_unit_rows() {
        let m = array![[1.0, 0.0], [0.0, 1.0]];
        let stats = AffinityStats::compute(&m).unwrap();

        assert_eq!(stats.row_sums, vec![1.0, 1.0]);
        // Orthogonal rows see only their own self-similarity.
        assert_eq!(stats.rho, vec![1.0, 1.0]);
        assert_eq!(stats.p_sum, 2.0);
    }

    #[test]
    fn test_stats_scaling_matches_prenormalized() {
        // A view with unit scales over unnormalized rows must reproduce the
        // statistics of the explicitly normalized matrix.
        let raw = array![[3.0, 0.0], [0.0, 4.0]];
        let scales = unit_scales(&raw);
        let rows = vec![0, 1];
        let view = MaskedView::new(&raw, &rows, &scales);

        let stats = AffinityStats::compute(&view).unwrap();
        assert_eq!(stats.rho, vec![1.0, 1.0]);
        assert_eq!(stats.p_sum, 2.0);
    }

    #[test]
    fn test_stats_identical_rows() {
        // Five identical unit rows: every row's mass against the frame is 5,
        // total mass 25.
        let one = 1.0 / 2.0_f64.sqrt();
        let rows: Vec<Vec<f64>> = (0..5).map(|_| vec![one, one]).collect();
        let m = crate::matrix::dense_from_rows(&rows).unwrap();

        let stats = AffinityStats::compute(&m).unwrap();
        for &r in &stats.rho {
            assert!((r - 5.0).abs() < 1e-9);
        }
        assert!((stats.p_sum - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_stats_empty_matrix() {
        let m = ndarray::Array2::<f64>::zeros((0, 3));
        assert!(matches!(
            AffinityStats::compute(&m),
            Err(Error::EmptyInput)
        ));
    }
}
