//! Numerical quadrature (integration) methods.
//!
//! # Available Methods
//!
//! | Method | Input | Accuracy |
//! |--------|-------|----------|
//! | [`quad`] | Function, finite or infinite interval | Adaptive to tolerance |
//! | [`nquad`], [`dblquad`], [`tplquad`] | Function of several variables | Nested adaptive |
//! | [`trapezoid`] | Sampled data, any spacing | O(h²) |
//! | [`simpson`] | Sampled data, any spacing | O(h⁴) uniform, exact for quadratics |
//! | [`romb`] | `2^k + 1` equally spaced samples | Richardson extrapolated |
//! | [`romberg`] | Smooth function, finite interval | Extrapolated to tolerance |
//!
//! # Choosing a Method
//!
//! - **Sampled data**: [`simpson`] for smooth data, [`trapezoid`] for
//!   piecewise-linear data, [`romb`] when the grid has `2^k + 1` points
//! - **Functions**: [`quad`], which also handles unbounded intervals and
//!   integrable endpoint singularities
//! - **Several variables**: [`nquad`] with bounds listed innermost first

mod adaptive;
mod context;
mod nested;
mod romberg;
mod simpson;
mod transform;
mod trapezoid;

pub use adaptive::{QuadOptions, QuadResult, Subinterval, quad, quad_with_args};
pub use nested::{Bound, dblquad, nquad, tplquad};
pub use romberg::{RombergOptions, romb, romb_samples, romberg};
pub use simpson::{simpson, simpson_uniform};
pub use trapezoid::{cumulative_trapezoid, trapezoid, trapezoid_uniform};
