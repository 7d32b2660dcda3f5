//! Factorization trait shared by the dense and banded kernels.

use super::error::LinalgResult;

/// A factorized square matrix that can solve `A x = b` repeatedly.
///
/// The implicit ODE stepper factorizes its iteration matrix once per step
/// size and then runs every Newton correction through this trait, so it does
/// not care whether the system was stored dense or banded.
pub trait LuFactors {
    /// Dimension of the factorized system.
    fn dim(&self) -> usize;

    /// Overwrite `b` with the solution of `A x = b`.
    fn solve_in_place(&self, b: &mut [f64]) -> LinalgResult<()>;

    /// Solve `A x = b`, returning `x`.
    fn solve(&self, b: &[f64]) -> LinalgResult<Vec<f64>> {
        let mut x = b.to_vec();
        self.solve_in_place(&mut x)?;
        Ok(x)
    }

    /// Floating-point multiply/add pairs spent in the factorization.
    fn flops(&self) -> usize;
}
