//! Finite-difference Jacobians shared by the implicit ODE solvers.
//!
//! Both routines take the residual function as a fallible closure so the
//! caller's evaluation error (for example a NaN check on the right-hand
//! side) propagates unchanged.
//!
//! # Step size
//!
//! Column `j` is perturbed by `δ_j = sqrt(ε · max(1e-5, |x_j|))`.
//!
//! # Banded grouping
//!
//! For a banded Jacobian with `ml` sub- and `mu` super-diagonals, columns
//! `j` and `j + ml + mu + 1` never touch the same row. Perturbing every
//! column in the residue class `j ≡ g (mod ml + mu + 1)` together recovers
//! the full band with `ml + mu + 1` evaluations instead of `n`.

use crate::linalg::{BandedMatrix, DenseMatrix};

fn perturbation(xj: f64) -> f64 {
    (f64::EPSILON * xj.abs().max(1e-5)).sqrt()
}

/// Forward-difference dense Jacobian `J[i][j] = ∂f_i/∂x_j`.
///
/// # Arguments
///
/// * `f` - Residual function
/// * `x` - Point at which to differentiate
/// * `fx` - `f(x)`, already evaluated by the caller
/// * `jac` - Output matrix, `n x n` with `n = x.len()`
///
/// # Returns
///
/// The number of calls made to `f`.
pub fn dense_jacobian<F, E>(
    f: &mut F,
    x: &[f64],
    fx: &[f64],
    jac: &mut DenseMatrix,
) -> Result<usize, E>
where
    F: FnMut(&[f64]) -> Result<Vec<f64>, E>,
{
    let n = x.len();
    debug_assert_eq!(jac.dim(), n);
    let mut xp = x.to_vec();

    for j in 0..n {
        let delta = perturbation(x[j]);
        xp[j] = x[j] + delta;
        let fp = f(&xp)?;
        xp[j] = x[j];
        // Use the representable step to cancel rounding in x + delta
        let h = (x[j] + delta) - x[j];
        for i in 0..n {
            jac.set(i, j, (fp[i] - fx[i]) / h);
        }
    }
    Ok(n)
}

/// Forward-difference banded Jacobian using column grouping.
///
/// Only entries inside the band of `jac` are written; the caller asserts
/// that `∂f_i/∂x_j` vanishes outside it.
///
/// # Returns
///
/// The number of calls made to `f` (`min(n, ml + mu + 1)`).
pub fn banded_jacobian<F, E>(
    f: &mut F,
    x: &[f64],
    fx: &[f64],
    jac: &mut BandedMatrix,
) -> Result<usize, E>
where
    F: FnMut(&[f64]) -> Result<Vec<f64>, E>,
{
    let n = x.len();
    debug_assert_eq!(jac.dim(), n);
    let width = (jac.ml() + jac.mu() + 1).min(n);
    let mut xp = x.to_vec();
    let mut steps = vec![0.0; n];

    for group in 0..width {
        for j in (group..n).step_by(width) {
            let delta = perturbation(x[j]);
            xp[j] = x[j] + delta;
            steps[j] = xp[j] - x[j];
        }
        let fp = f(&xp)?;
        for j in (group..n).step_by(width) {
            xp[j] = x[j];
            for i in jac.row_range(j) {
                jac.set(i, j, (fp[i] - fx[i]) / steps[j]);
            }
        }
    }
    Ok(width)
}
