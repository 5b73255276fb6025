//! Approximate second eigenvector of the normalized affinity operator.
//!
//! For a data matrix A with unit-self-dot rows, the affinity matrix is
//! A Aᵀ — never formed here. Its normalized operator has a known dominant
//! eigenvector (derived from `rho`), so an approximation to the *second*
//! eigenvector falls out of power iteration: repeatedly strip the dominant
//! component from a random vector, then apply the operator through a pair of
//! sparse matrix–vector products (Aᵀ then A) interleaved with diagonal
//! rescalings. O(log n) passes suffice because only the resulting *ordering*
//! of entries is consumed downstream, not the eigenvector itself.
//!
//! Two operator normalizations are provided, selected by injection:
//! [`NormalizedPower`] (the D R⁻¹ A Aᵀ D⁻¹ form) and [`RinvPower`] (rows
//! pre-scaled by 1/√rho).
//!
//! # References
//!
//! - Cheng, Kannan, Vempala, Wang (2006). "A Divide-and-Merge Methodology
//!   for Clustering"
//! - Kannan, Vempala, Vetta (2000). "On Clusterings: Good, Bad and Spectral"

use rand::prelude::*;

use super::stats::AffinityStats;
use crate::matrix::{dot_dense, times_into, transpose_times, RowMatrix, ScaledRows};

/// Strategy seam for estimating the second eigenvector of the implicit
/// normalized affinity operator of a matrix.
pub trait SecondEigenvector {
    /// Estimate the second eigenvector. Only the relative ordering of the
    /// returned entries is meaningful.
    ///
    /// Rows of `matrix` must have unit self-dot-product and `stats` must
    /// describe `matrix`. Entries with `rho == 0` receive no operator mass
    /// and come back as zero contributions, never NaN.
    fn second_eigenvector<M: RowMatrix>(
        &self,
        matrix: &M,
        stats: &AffinityStats,
        rng: &mut StdRng,
    ) -> Vec<f64>;
}

/// Power iteration on the generalized normalized affinity operator
/// Q = D R⁻¹ A Aᵀ D⁻¹, where R = diag(rho) and D = diag(√(rho/pSum)).
///
/// The vector pi·D⁻¹ approximates Q's first eigenvector; each pass
/// orthonormalizes against it before applying Q through four sparse
/// substeps.
#[derive(Clone, Copy, Debug, Default)]
pub struct NormalizedPower;

impl SecondEigenvector for NormalizedPower {
    fn second_eigenvector<M: RowMatrix>(
        &self,
        matrix: &M,
        stats: &AffinityStats,
        rng: &mut StdRng,
    ) -> Vec<f64> {
        let n = matrix.rows();

        // pi is rho normalized to a distribution; d = sqrt(pi). Rows with
        // zero mass keep zeros everywhere.
        let mut d = vec![0.0; n];
        let mut pi_d_inv = vec![0.0; n];
        for i in 0..n {
            let pi = stats.rho[i] / stats.p_sum;
            if pi > 0.0 {
                d[i] = pi.sqrt();
                pi_d_inv[i] = pi / d[i];
            }
        }

        let mut v: Vec<f64> = (0..n).map(|_| rng.random::<f64>()).collect();
        for _ in 0..power_passes(n) {
            orthonormalize(&mut v, &pi_d_inv);

            // v <- D⁻¹ v
            for i in 0..n {
                if d[i] != 0.0 {
                    v[i] /= d[i];
                }
            }
            // v <- A (Aᵀ v)
            let w = transpose_times(matrix, &v);
            times_into(matrix, &w, &mut v);
            // v <- D R⁻¹ v
            for i in 0..n {
                v[i] = if stats.rho[i] > 0.0 {
                    v[i] * d[i] / stats.rho[i]
                } else {
                    0.0
                };
            }
        }
        v
    }
}

/// Power iteration with rows pre-scaled by diag(1/√rho), applied
/// through a [`ScaledRows`] view. The dominant direction here is
/// `rho[i]/√rho[i]`.
#[derive(Clone, Copy, Debug, Default)]
pub struct RinvPower;

impl SecondEigenvector for RinvPower {
    fn second_eigenvector<M: RowMatrix>(
        &self,
        matrix: &M,
        stats: &AffinityStats,
        rng: &mut StdRng,
    ) -> Vec<f64> {
        let n = matrix.rows();

        let mut r_inv = vec![0.0; n];
        let mut base = vec![0.0; n];
        for i in 0..n {
            if stats.rho[i] > 0.0 {
                r_inv[i] = 1.0 / stats.rho[i].sqrt();
                base[i] = stats.rho[i] * r_inv[i];
            }
        }
        let scaled = ScaledRows::new(matrix, &r_inv);

        let mut v: Vec<f64> = (0..n).map(|_| rng.random::<f64>()).collect();
        for _ in 0..power_passes(n) {
            orthonormalize(&mut v, &base);
            let w = transpose_times(&scaled, &v);
            times_into(&scaled, &w, &mut v);
        }
        v
    }
}

/// Number of power-iteration passes: ⌈log2(n)⌉, at least one.
fn power_passes(n: usize) -> usize {
    ((n as f64).log2().ceil() as usize).max(1)
}

/// Strip the `base` component out of `v` by adjusting `v[0]`, then rescale.
///
/// The rescale divides by the *squared* norm, matching the reference
/// behavior; magnitude never affects the ordering consumed downstream. A
/// zero `base[0]` or a zero norm contributes nothing instead of producing
/// NaN.
pub(crate) fn orthonormalize(v: &mut [f64], base: &[f64]) {
    let mut dot = dot_dense(v, base) - v[0] * base[0];
    if base[0] != 0.0 {
        dot /= base[0];
        v[0] -= dot;
    }
    let norm_sq = dot_dense(v, v);
    if norm_sq > 0.0 {
        let s = 1.0 / norm_sq;
        for x in v.iter_mut() {
            *x *= s;
        }
    }
}
