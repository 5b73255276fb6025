//! Row-addressable matrix abstraction.
//!
//! The clustering engine never materializes an n×n affinity matrix. Every
//! pass it makes is expressed through two primitives on the *data* matrix:
//! visiting the stored entries of one row, and dotting one row against a
//! dense vector. Both cost O(stored entries of the row), which is what keeps
//! the eigenvector estimation and the conductance scan linear in the number
//! of non-zeros.
//!
//! Backings provided here:
//!
//! - [`ndarray::Array2<f64>`] for dense data
//! - [`sprs::CsMat<f64>`] (feature `sparse`, CSR layout) for sparse data
//! - [`MaskedView`] / [`ScaledRows`] in [`masked`] for non-copying
//!   row-subset and row-rescaled projections of either

pub mod masked;

pub use masked::{unit_scales, MaskedView, ScaledRows};

use crate::error::{Error, Result};
use ndarray::Array2;

/// A read-only, row-addressable matrix.
///
/// Implementations must report a consistent shape: every column index passed
/// to the visitor in [`RowMatrix::for_each_nonzero`] is below
/// [`RowMatrix::columns`].
pub trait RowMatrix {
    /// Number of rows.
    fn rows(&self) -> usize;

    /// Number of columns.
    fn columns(&self) -> usize;

    /// Visit the stored `(column, value)` entries of row `row`.
    ///
    /// Dense backings may visit every column; sparse backings visit only
    /// non-zeros. Entry order within a row is unspecified.
    fn for_each_nonzero<F: FnMut(usize, f64)>(&self, row: usize, f: F);

    /// Dot product of row `row` with a dense vector, linear in the number
    /// of stored entries of the row.
    fn dot_row(&self, row: usize, dense: &[f64]) -> f64 {
        let mut dot = 0.0;
        self.for_each_nonzero(row, |c, v| dot += v * dense[c]);
        dot
    }
}

/// Marker bound for inputs that cross threads.
///
/// With the `parallel` feature the left and right subtrees of every split
/// recurse on rayon, so matrix backings and eigenvector strategies must be
/// `Sync`. Without the feature this bound is satisfied by every type.
#[cfg(feature = "parallel")]
pub trait ParallelSafe: Sync {}
#[cfg(feature = "parallel")]
impl<T: Sync> ParallelSafe for T {}

#[cfg(not(feature = "parallel"))]
pub trait ParallelSafe {}
#[cfg(not(feature = "parallel"))]
impl<T> ParallelSafe for T {}

impl RowMatrix for Array2<f64> {
    fn rows(&self) -> usize {
        self.nrows()
    }

    fn columns(&self) -> usize {
        self.ncols()
    }

    fn for_each_nonzero<F: FnMut(usize, f64)>(&self, row: usize, mut f: F) {
        for (c, &v) in self.row(row).iter().enumerate() {
            if v != 0.0 {
                f(c, v);
            }
        }
    }
}

/// CSR-backed sparse input. The matrix must be in row-major (CSR) layout;
/// convert with `to_csr` first if needed.
#[cfg(feature = "sparse")]
impl RowMatrix for sprs::CsMat<f64> {
    fn rows(&self) -> usize {
        self.rows()
    }

    fn columns(&self) -> usize {
        self.cols()
    }

    fn for_each_nonzero<F: FnMut(usize, f64)>(&self, row: usize, mut f: F) {
        debug_assert!(self.is_csr(), "sparse input must be CSR");
        if let Some(row_vec) = self.outer_view(row) {
            for (c, &v) in row_vec.iter() {
                f(c, v);
            }
        }
    }
}

/// Build a dense matrix from row vectors, checking that every row has the
/// same dimension.
pub fn dense_from_rows(rows: &[Vec<f64>]) -> Result<Array2<f64>> {
    if rows.is_empty() {
        return Err(Error::EmptyInput);
    }
    let d = rows[0].len();
    let mut flat: Vec<f64> = Vec::with_capacity(rows.len() * d);
    for row in rows {
        if row.len() != d {
            return Err(Error::DimensionMismatch {
                expected: d,
                found: row.len(),
            });
        }
        flat.extend_from_slice(row);
    }
    Array2::from_shape_vec((rows.len(), d), flat).map_err(|e| Error::Other(e.to_string()))
}

/// Sum of all rows, one total per column.
pub fn column_sums<M: RowMatrix>(matrix: &M) -> Vec<f64> {
    let mut sums = vec![0.0; matrix.columns()];
    for r in 0..matrix.rows() {
        add_row_into(matrix, r, &mut sums);
    }
    sums
}

/// `out[c] += row[c]` for the stored entries of row `r`.
pub(crate) fn add_row_into<M: RowMatrix>(matrix: &M, r: usize, out: &mut [f64]) {
    matrix.for_each_nonzero(r, |c, v| out[c] += v);
}

/// `out[c] -= row[c]` for the stored entries of row `r`.
pub(crate) fn sub_row_from<M: RowMatrix>(matrix: &M, r: usize, out: &mut [f64]) {
    matrix.for_each_nonzero(r, |c, v| out[c] -= v);
}

/// Dense-dense dot product.
pub(crate) fn dot_dense(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// `Aᵀ v`, iterating each row's stored entries once.
pub(crate) fn transpose_times<M: RowMatrix>(matrix: &M, v: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; matrix.columns()];
    for r in 0..matrix.rows() {
        let vr = v[r];
        matrix.for_each_nonzero(r, |c, val| out[c] += val * vr);
    }
    out
}

/// `out = A dense`, one dot product per row.
pub(crate) fn times_into<M: RowMatrix>(matrix: &M, dense: &[f64], out: &mut [f64]) {
    for r in 0..matrix.rows() {
        out[r] = matrix.dot_row(r, dense);
    }
}
