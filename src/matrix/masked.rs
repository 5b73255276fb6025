//! Non-copying row projections.
//!
//! Recursive bipartitioning never copies the data matrix. Each frame of the
//! recursion works through a [`MaskedView`]: a slice of backing-row indices
//! plus per-row scale factors, layered over the top-level matrix. Masks are
//! kept *flat* — a view always indexes the base matrix directly, so a
//! sub-partition of a partition is just a shorter index slice, not a nested
//! view type.

use super::RowMatrix;

/// A read-only projection exposing a subset (and permutation) of a backing
/// matrix's rows, with a per-backing-row scale factor applied to every
/// value.
///
/// The scale factors are indexed by *backing* row and are shared by every
/// view over the same matrix; the engine uses them to normalize each row to
/// unit self-dot-product once, up front.
#[derive(Clone, Copy, Debug)]
pub struct MaskedView<'a, M> {
    base: &'a M,
    rows: &'a [usize],
    scales: &'a [f64],
}

impl<'a, M: RowMatrix> MaskedView<'a, M> {
    /// Create a view of `base` exposing `rows` (backing indices, in order)
    /// with `scales[backing_row]` applied to each row's values.
    pub fn new(base: &'a M, rows: &'a [usize], scales: &'a [f64]) -> Self {
        debug_assert_eq!(scales.len(), base.rows());
        debug_assert!(rows.iter().all(|&r| r < base.rows()));
        MaskedView { base, rows, scales }
    }

    /// Backing-matrix index of view row `row`.
    pub fn base_index(&self, row: usize) -> usize {
        self.rows[row]
    }
}

impl<M: RowMatrix> RowMatrix for MaskedView<'_, M> {
    fn rows(&self) -> usize {
        self.rows.len()
    }

    fn columns(&self) -> usize {
        self.base.columns()
    }

    fn for_each_nonzero<F: FnMut(usize, f64)>(&self, row: usize, mut f: F) {
        let b = self.rows[row];
        let s = self.scales[b];
        if s == 0.0 {
            return;
        }
        self.base.for_each_nonzero(b, |c, v| f(c, v * s));
    }
}

/// A view applying one extra diagonal factor per row, indexed by *view* row.
///
/// Used by the Rinv-specialized eigenvector strategy, which runs its power
/// iteration on the matrix with each row pre-multiplied by `1/sqrt(rho)`.
#[derive(Clone, Copy, Debug)]
pub struct ScaledRows<'a, M> {
    base: &'a M,
    factors: &'a [f64],
}

impl<'a, M: RowMatrix> ScaledRows<'a, M> {
    pub fn new(base: &'a M, factors: &'a [f64]) -> Self {
        debug_assert_eq!(factors.len(), base.rows());
        ScaledRows { base, factors }
    }
}

impl<M: RowMatrix> RowMatrix for ScaledRows<'_, M> {
    fn rows(&self) -> usize {
        self.base.rows()
    }

    fn columns(&self) -> usize {
        self.base.columns()
    }

    fn for_each_nonzero<F: FnMut(usize, f64)>(&self, row: usize, mut f: F) {
        let s = self.factors[row];
        if s == 0.0 {
            return;
        }
        self.base.for_each_nonzero(row, |c, v| f(c, v * s));
    }
}

/// Per-row factors that normalize every row of `matrix` to unit
/// self-dot-product. All-zero rows get factor 0 and contribute nothing
/// downstream.
pub fn unit_scales<M: RowMatrix>(matrix: &M) -> Vec<f64> {
    (0..matrix.rows())
        .map(|r| {
            let mut sq = 0.0;
            matrix.for_each_nonzero(r, |_, v| sq += v * v);
            if sq > 0.0 {
                1.0 / sq.sqrt()
            } else {
                0.0
            }
        })
        .collect()
}
