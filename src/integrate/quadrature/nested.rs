//! Nested multi-dimensional quadrature.
//!
//! An `n`-dimensional integral is computed as `n` nested adaptive
//! quadratures. The outermost level integrates the function "run the
//! remaining inner integral at this outer value", so every outer integrand
//! evaluation triggers a full inner adaptive solve.
//!
//! Bounds are listed innermost first, and the integrand receives its
//! arguments in the same order: `f(&[x_inner, ..., x_outer])`.
//!
//! # Error estimate
//!
//! The reported error at each level is that level's own error plus the
//! largest error returned by any inner solve it triggered. This compounds
//! roughly across levels and is an approximation, not a bound.

use std::cell::Cell;
use std::fmt;

use super::adaptive::{QuadOptions, QuadResult, integrate_adaptive};
use super::context::EvalContext;
use crate::integrate::error::{IntegrateError, IntegrateResult};

/// Integration limits of one nesting level.
pub enum Bound<'a> {
    /// Constant limits.
    Fixed(f64, f64),
    /// Limits computed from the already-bound outer variables, given
    /// innermost first.
    Dynamic(Box<dyn Fn(&[f64]) -> (f64, f64) + 'a>),
}

impl<'a> Bound<'a> {
    /// Limits that depend on the outer variables.
    pub fn dynamic<G>(limits: G) -> Self
    where
        G: Fn(&[f64]) -> (f64, f64) + 'a,
    {
        Self::Dynamic(Box::new(limits))
    }

    fn resolve(&self, outer: &[f64]) -> (f64, f64) {
        match self {
            Self::Fixed(a, b) => (*a, *b),
            Self::Dynamic(limits) => limits(outer),
        }
    }
}

impl fmt::Debug for Bound<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(a, b) => f.debug_tuple("Fixed").field(a).field(b).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl From<(f64, f64)> for Bound<'_> {
    fn from((a, b): (f64, f64)) -> Self {
        Self::Fixed(a, b)
    }
}

/// Integrate over `bounds.len()` dimensions by nested adaptive quadrature.
///
/// # Arguments
///
/// * `f` - Integrand, called with `[x_0, ..., x_{n-1}]`, innermost first
/// * `bounds` - One [`Bound`] per variable, innermost first
/// * `options` - Tolerances and caps, applied at every level
///
/// The evaluation budget and deadline in `options` cover the whole nested
/// call. `neval` counts calls to `f`.
///
/// # Errors
///
/// [`IntegrateError::InvalidInput`] for empty `bounds` or invalid options,
/// otherwise whatever the inner quadratures raise.
///
/// # Example
///
/// ```
/// use numint::integrate::{nquad, Bound, QuadOptions};
///
/// // ∫₀¹ ∫₀² (x + 10y) dx dy = 12
/// let result = nquad(
///     |p: &[f64]| p[0] + 10.0 * p[1],
///     &[Bound::Fixed(0.0, 2.0), Bound::Fixed(0.0, 1.0)],
///     &QuadOptions::default(),
/// )
/// .unwrap();
/// assert!((result.integral - 12.0).abs() < 1e-10);
/// ```
pub fn nquad<F>(f: F, bounds: &[Bound<'_>], options: &QuadOptions) -> IntegrateResult<QuadResult>
where
    F: Fn(&[f64]) -> f64,
{
    options.validate()?;
    if bounds.is_empty() {
        return Err(IntegrateError::InvalidInput {
            context: "nquad: at least one bound is required".to_string(),
        });
    }

    let ctx = EvalContext::new(options);
    let mut result = integrate_level(&f, bounds, bounds.len() - 1, &[], options, &ctx)?;
    result.neval = ctx.neval();
    result.partition.clear();
    Ok(result)
}

fn integrate_level<F>(
    f: &F,
    bounds: &[Bound<'_>],
    level: usize,
    outer: &[f64],
    options: &QuadOptions,
    ctx: &EvalContext,
) -> IntegrateResult<QuadResult>
where
    F: Fn(&[f64]) -> f64,
{
    let (a, b) = bounds[level].resolve(outer);
    let bind = |x: f64| {
        let mut point = Vec::with_capacity(outer.len() + 1);
        point.push(x);
        point.extend_from_slice(outer);
        point
    };

    if level == 0 {
        let g = |x: f64| -> IntegrateResult<f64> {
            ctx.record();
            Ok(f(&bind(x)))
        };
        return integrate_adaptive(&g, a, b, options, ctx);
    }

    let max_inner_error = Cell::new(0.0_f64);
    let inner_converged = Cell::new(true);
    let g = |x: f64| -> IntegrateResult<f64> {
        let inner = integrate_level(f, bounds, level - 1, &bind(x), options, ctx)?;
        max_inner_error.set(max_inner_error.get().max(inner.error));
        if !inner.converged {
            inner_converged.set(false);
        }
        Ok(inner.integral)
    };

    let mut result = integrate_adaptive(&g, a, b, options, ctx)?;
    result.error += max_inner_error.get();
    result.converged &= inner_converged.get();
    Ok(result)
}

/// Double integral `∫_a^b ∫_{g(y)}^{h(y)} f(x, y) dx dy`.
///
/// `inner` limits the `x` integral and may depend on `y`.
///
/// # Example
///
/// ```
/// use numint::integrate::{dblquad, Bound, QuadOptions};
///
/// // ∫₀^½ ∫₀^{1−2y} x·y dx dy = 1/96
/// let result = dblquad(
///     |x, y| x * y,
///     (0.0, 0.5),
///     Bound::dynamic(|outer: &[f64]| (0.0, 1.0 - 2.0 * outer[0])),
///     &QuadOptions::default(),
/// )
/// .unwrap();
/// assert!((result.integral - 1.0 / 96.0).abs() < 1e-12);
/// ```
pub fn dblquad<F>(
    f: F,
    outer: (f64, f64),
    inner: Bound<'_>,
    options: &QuadOptions,
) -> IntegrateResult<QuadResult>
where
    F: Fn(f64, f64) -> f64,
{
    nquad(|p| f(p[0], p[1]), &[inner, outer.into()], options)
}

/// Triple integral `∫_a^b ∫_{middle(z)} ∫_{inner(y, z)} f(x, y, z) dx dy dz`.
pub fn tplquad<F>(
    f: F,
    outer: (f64, f64),
    middle: Bound<'_>,
    inner: Bound<'_>,
    options: &QuadOptions,
) -> IntegrateResult<QuadResult>
where
    F: Fn(f64, f64, f64) -> f64,
{
    nquad(|p| f(p[0], p[1], p[2]), &[inner, middle, outer.into()], options)
}
