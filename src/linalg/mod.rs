//! Linear algebra kernels for the implicit ODE solver.
//!
//! Two LU factorizations share the [`LuFactors`] interface:
//!
//! | Type | Storage | Cost |
//! |------|---------|------|
//! | [`DenseLu`] | `n x n` row-major | `O(n³)` |
//! | [`BandedLu`] | `2·ml + mu + 1` diagonals | `O(n · ml · (ml + mu))` |
//!
//! [`solve_banded`] is the direct entry point for a one-off banded solve.

pub mod banded;
pub mod dense;
pub mod error;
pub mod traits;

pub use banded::{BandedLu, BandedMatrix, solve_banded};
pub use dense::{DenseLu, DenseMatrix, solve_dense};
pub use error::{LinalgError, LinalgResult};
pub use traits::LuFactors;
