//! Minimum-conductance cut of an eigenvector-sorted matrix.
//!
//! Once rows are sorted by the second-eigenvector estimate, the best
//! bipartition is a prefix/suffix split. Conductance of a boundary is the
//! cross-partition affinity over the smaller side's affinity mass; the scan
//! below maintains the cross term incrementally, so moving one row across
//! the boundary costs O(stored entries of that row) and the whole scan is
//! linear in the non-zeros of the matrix.

use crate::matrix::{add_row_into, dot_dense, sub_row_from, RowMatrix};

/// Find the boundary with minimum conductance in one linear pass.
///
/// `sorted` is the eigenvector-ordered frame with unit-self-dot rows,
/// `sorted_rho` its per-row affinity mass in the same order, `p_sum` the
/// total mass, and `row_sums` the frame's column totals. Returns the
/// boundary (left-partition size, always in `[1, n-1]` so both partitions
/// are non-empty) together with its conductance; candidates `1..=n-2` are
/// scanned and ties keep the first boundary encountered.
pub(crate) fn min_conductance_cut<M: RowMatrix>(
    sorted: &M,
    sorted_rho: &[f64],
    p_sum: f64,
    row_sums: &[f64],
) -> (usize, f64) {
    let n = sorted.rows();
    debug_assert!(n >= 2);
    debug_assert_eq!(sorted_rho.len(), n);

    // x accumulates the left partition's row sum, y the right's. Start with
    // row 0 on the left and everything else on the right.
    let mut x = vec![0.0; sorted.columns()];
    add_row_into(sorted, 0, &mut x);
    let mut y = row_sums.to_vec();
    for (yc, xc) in y.iter_mut().zip(&x) {
        *yc -= xc;
    }

    let mut rho_x = sorted_rho[0];
    let mut rho_y = p_sum - rho_x;
    let mut u = dot_dense(&x, &y);

    let mut min_conductance = conductance(u, rho_x, rho_y);
    let mut cut = 1;

    for i in 1..n - 2 {
        // Cross-term update for moving row i from right to left. Both dots
        // are taken before the move, so y still contains row i and its unit
        // self-similarity must be backed out.
        let xv = sorted.dot_row(i, &x);
        let yv = sorted.dot_row(i, &y);
        u = u - xv + yv - 1.0;

        add_row_into(sorted, i, &mut x);
        sub_row_from(sorted, i, &mut y);
        rho_x += sorted_rho[i];
        rho_y -= sorted_rho[i];

        let c = conductance(u, rho_x, rho_y);
        if c < min_conductance {
            min_conductance = c;
            cut = i + 1;
        }
    }
    (cut, min_conductance)
}

/// From-scratch conductance of boundary `k` (left-partition size), for
/// verifying the incremental scan.
pub fn conductance_at<M: RowMatrix>(
    sorted: &M,
    sorted_rho: &[f64],
    p_sum: f64,
    k: usize,
) -> f64 {
    let n = sorted.rows();
    assert!(k >= 1 && k < n);

    let mut x = vec![0.0; sorted.columns()];
    let mut y = vec![0.0; sorted.columns()];
    let mut rho_x = 0.0;
    for i in 0..k {
        add_row_into(sorted, i, &mut x);
        rho_x += sorted_rho[i];
    }
    for i in k..n {
        add_row_into(sorted, i, &mut y);
    }
    conductance(dot_dense(&x, &y), rho_x, p_sum - rho_x)
}

fn conductance(u: f64, rho_x: f64, rho_y: f64) -> f64 {
    let m = rho_x.min(rho_y);
    if m > 0.0 {
        u / m
    } else {
        // A side with no affinity mass at all is never a useful cut.
        f64::INFINITY
    }
}
