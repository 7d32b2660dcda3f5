//! Adaptive Gauss-Kronrod quadrature.
//!
//! Each cell of the partition is integrated with the embedded G7-K15 pair
//! (7-point Gauss, 15-point Kronrod). The Kronrod value is the estimate and
//! `|K15 − G7|` its error. Cells that miss their share of the tolerance are
//! bisected.
//!
//! Subdivision runs on an explicit LIFO worklist instead of call recursion,
//! so depth is bounded by [`QuadOptions::max_depth`] rather than by the
//! stack. Cells are processed left to right and the final partition comes out
//! ordered.
//!
//! # Acceptance
//!
//! With `I` the running total and `tol = max(atol, rtol·|I|)`, a cell of
//! width `w` on a domain of width `W` is accepted when its error is at most
//! `tol · w / W`. Subdivision also stops as soon as the summed error of all
//! cells is at most `tol`, which lets integrable endpoint singularities
//! converge even though their cells never meet the width-scaled share.
//!
//! # Caps
//!
//! Hitting [`QuadOptions::limit`], [`QuadOptions::max_depth`],
//! [`QuadOptions::max_evals`] or [`QuadOptions::deadline`] is not an error:
//! the best estimate comes back with `converged = false`.

use std::time::Instant;

use log::{debug, warn};

use super::context::{EvalContext, StopReason};
use super::transform::Domain;
use crate::integrate::error::{IntegrateError, IntegrateResult};

// Kronrod nodes (15 points, including 7 Gauss points)
const XGK: [f64; 15] = [
    -0.9914553711208126,
    -0.9491079123427585,
    -0.8648644233597691,
    -0.7415311855993944,
    -0.5860872354676911,
    -0.4058451513773972,
    -0.2077849550078985,
    0.0,
    0.2077849550078985,
    0.4058451513773972,
    0.5860872354676911,
    0.7415311855993944,
    0.8648644233597691,
    0.9491079123427585,
    0.9914553711208126,
];

const WGK: [f64; 15] = [
    0.022935322010529224,
    0.063_092_092_629_978_56,
    0.10479001032225018,
    0.14065325971552592,
    0.169_004_726_639_267_9,
    0.190_350_578_064_785_4,
    0.20443294007529889,
    0.20948214108472782,
    0.20443294007529889,
    0.190_350_578_064_785_4,
    0.169_004_726_639_267_9,
    0.14065325971552592,
    0.10479001032225018,
    0.063_092_092_629_978_56,
    0.022935322010529224,
];

// Gauss weights for the odd-indexed Kronrod nodes
const WG: [f64; 7] = [
    0.129_484_966_168_869_7,
    0.27970539148927664,
    0.381_830_050_505_118_9,
    0.417_959_183_673_469_4,
    0.381_830_050_505_118_9,
    0.27970539148927664,
    0.129_484_966_168_869_7,
];

/// Options for adaptive quadrature.
#[derive(Debug, Clone)]
pub struct QuadOptions {
    /// Absolute tolerance (default: 1.49e-8)
    pub atol: f64,
    /// Relative tolerance (default: 1.49e-8)
    pub rtol: f64,
    /// Maximum number of cells in the partition (default: 200)
    pub limit: usize,
    /// Maximum bisection depth of any cell (default: 50)
    pub max_depth: usize,
    /// Integrand evaluation budget, checked between cells
    pub max_evals: Option<usize>,
    /// Wall-clock deadline, checked between cells
    pub deadline: Option<Instant>,
}

impl Default for QuadOptions {
    fn default() -> Self {
        Self {
            atol: 1.49e-8,
            rtol: 1.49e-8,
            limit: 200,
            max_depth: 50,
            max_evals: None,
            deadline: None,
        }
    }
}

impl QuadOptions {
    /// Set absolute and relative tolerances.
    pub fn with_tolerances(mut self, atol: f64, rtol: f64) -> Self {
        self.atol = atol;
        self.rtol = rtol;
        self
    }

    /// Set the maximum number of cells.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Set the maximum bisection depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the integrand evaluation budget.
    pub fn with_max_evals(mut self, max_evals: usize) -> Self {
        self.max_evals = Some(max_evals);
        self
    }

    /// Set a wall-clock deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Check the options for consistency.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrateError::InvalidInput`] for negative or non-finite
    /// tolerances, `atol == rtol == 0`, or `limit == 0`.
    pub fn validate(&self) -> IntegrateResult<()> {
        for (name, value) in [("atol", self.atol), ("rtol", self.rtol)] {
            if !value.is_finite() || value < 0.0 {
                return Err(IntegrateError::InvalidInput {
                    context: format!("quad: {name} must be finite and non-negative, got {value}"),
                });
            }
        }
        if self.atol == 0.0 && self.rtol == 0.0 {
            return Err(IntegrateError::InvalidInput {
                context: "quad: atol and rtol cannot both be zero".to_string(),
            });
        }
        if self.limit == 0 {
            return Err(IntegrateError::InvalidInput {
                context: "quad: limit must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// One cell of the final partition.
///
/// Bounds are in the integration variable actually used: the original `x`
/// for finite intervals, the substituted `t` for unbounded ones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Subinterval {
    pub a: f64,
    pub b: f64,
    /// K15 estimate on this cell
    pub estimate: f64,
    /// `|K15 − G7|` on this cell
    pub error: f64,
    /// Number of bisections from the root cell
    pub depth: usize,
}

/// Result of adaptive quadrature.
#[derive(Debug, Clone)]
pub struct QuadResult {
    /// Computed integral value
    pub integral: f64,
    /// Estimated absolute error (sum of cell errors, always ≥ 0)
    pub error: f64,
    /// Number of integrand evaluations
    pub neval: usize,
    /// Whether every tolerance was met without hitting a cap
    pub converged: bool,
    /// Final ordered partition; empty for nested results and `a == b`
    pub partition: Vec<Subinterval>,
}

impl QuadResult {
    fn empty(neval: usize) -> Self {
        Self {
            integral: 0.0,
            error: 0.0,
            neval,
            converged: true,
            partition: Vec::new(),
        }
    }
}

/// Adaptive Gauss-Kronrod quadrature.
///
/// # Arguments
///
/// * `f` - Function to integrate
/// * `a` - Lower bound, may be `f64::NEG_INFINITY`
/// * `b` - Upper bound, may be `f64::INFINITY`
/// * `options` - Quadrature options
///
/// `a > b` integrates over `[b, a]` and negates; `a == b` gives exactly zero.
///
/// # Returns
///
/// A [`QuadResult`] containing the integral, error estimate, and diagnostics.
///
/// # Errors
///
/// - [`IntegrateError::InvalidInput`] for invalid options
/// - [`IntegrateError::InvalidInterval`] for NaN bounds
/// - [`IntegrateError::EvaluationError`] if `f` returns NaN or infinity
///
/// # Example
///
/// ```
/// use numint::integrate::{quad, QuadOptions};
///
/// // Integrate exp(-x^2) over the real line = sqrt(pi)
/// let result = quad(
///     |x: f64| (-x * x).exp(),
///     f64::NEG_INFINITY,
///     f64::INFINITY,
///     &QuadOptions::default(),
/// )
/// .unwrap();
/// assert!((result.integral - std::f64::consts::PI.sqrt()).abs() < 1e-8);
/// assert!(result.converged);
/// ```
pub fn quad<F>(f: F, a: f64, b: f64, options: &QuadOptions) -> IntegrateResult<QuadResult>
where
    F: Fn(f64) -> f64,
{
    options.validate()?;
    let ctx = EvalContext::new(options);
    let g = |x: f64| -> IntegrateResult<f64> {
        ctx.record();
        Ok(f(x))
    };
    integrate_adaptive(&g, a, b, options, &ctx)
}

/// Adaptive quadrature of an integrand with extra parameters.
///
/// `args` is passed unchanged to every call of `f`.
///
/// # Example
///
/// ```
/// use numint::integrate::{quad_with_args, QuadOptions};
///
/// // ∫₀¹ (a·x² + b) dx with a = 2, b = 1
/// let f = |x: f64, p: &(f64, f64)| p.0 * x * x + p.1;
/// let result = quad_with_args(f, 0.0, 1.0, &(2.0, 1.0), &QuadOptions::default()).unwrap();
/// assert!((result.integral - 5.0 / 3.0).abs() < 1e-12);
/// ```
pub fn quad_with_args<F, A>(
    f: F,
    a: f64,
    b: f64,
    args: &A,
    options: &QuadOptions,
) -> IntegrateResult<QuadResult>
where
    F: Fn(f64, &A) -> f64,
    A: ?Sized,
{
    quad(|x| f(x, args), a, b, options)
}

/// Core engine shared by [`quad`] and the nested composer.
///
/// `f` is fallible so inner quadratures can propagate their errors. The
/// caller owns `ctx` and records evaluations in `f`.
pub(crate) fn integrate_adaptive<F>(
    f: &F,
    a: f64,
    b: f64,
    options: &QuadOptions,
    ctx: &EvalContext,
) -> IntegrateResult<QuadResult>
where
    F: Fn(f64) -> IntegrateResult<f64>,
{
    if a.is_nan() || b.is_nan() {
        return Err(IntegrateError::InvalidInterval {
            a,
            b,
            context: "quad: bounds must not be NaN".to_string(),
        });
    }
    if a == b {
        return Ok(QuadResult::empty(ctx.neval()));
    }
    if a > b {
        let mut result = integrate_adaptive(f, b, a, options, ctx)?;
        result.integral = -result.integral;
        for cell in &mut result.partition {
            cell.estimate = -cell.estimate;
        }
        return Ok(result);
    }

    let domain = Domain::new(a, b);
    let (lo, hi) = domain.t_bounds();
    let total_width = hi - lo;

    let root = eval_cell(f, &domain, lo, hi, 0)?;
    let mut running_total = root.estimate;
    let mut running_error = root.error;
    let mut pending = vec![root];
    let mut accepted: Vec<Subinterval> = Vec::new();
    let mut stop: Option<StopReason> = None;
    let mut depth_capped = false;

    while let Some(cell) = pending.pop() {
        let tol = options.atol.max(options.rtol * running_total.abs());
        if cell.error <= tol * (cell.b - cell.a) / total_width || running_error <= tol {
            accepted.push(cell);
            continue;
        }

        if cell.depth >= options.max_depth {
            debug!(
                "quad: cell [{:e}, {:e}] at depth {} not refined further",
                cell.a, cell.b, cell.depth
            );
            depth_capped = true;
            accepted.push(cell);
            continue;
        }

        let cells = accepted.len() + pending.len() + 1;
        let reason = if cells >= options.limit {
            Some(StopReason::Limit)
        } else {
            ctx.exhausted()
        };
        if let Some(reason) = reason {
            stop = Some(reason);
            accepted.push(cell);
            while let Some(rest) = pending.pop() {
                accepted.push(rest);
            }
            break;
        }

        let mid = 0.5 * (cell.a + cell.b);
        let left = eval_cell(f, &domain, cell.a, mid, cell.depth + 1)?;
        let right = eval_cell(f, &domain, mid, cell.b, cell.depth + 1)?;
        running_total += left.estimate + right.estimate - cell.estimate;
        running_error += left.error + right.error - cell.error;
        pending.push(right);
        pending.push(left);
    }

    let integral: f64 = accepted.iter().map(|c| c.estimate).sum();
    let error: f64 = accepted.iter().map(|c| c.error).sum();
    let tol = options.atol.max(options.rtol * integral.abs());
    if stop.is_none() && depth_capped && error > tol {
        stop = Some(StopReason::Depth);
    }

    if let Some(reason) = stop {
        warn!(
            "quad on [{}, {}]: {} after {} cells; estimate {:e} with error {:.2e}",
            a,
            b,
            reason,
            accepted.len(),
            integral,
            error
        );
    }

    Ok(QuadResult {
        integral,
        error,
        neval: ctx.neval(),
        converged: stop.is_none(),
        partition: accepted,
    })
}

/// Apply G7-K15 on `[lo, hi]` in the substituted variable.
fn eval_cell<F>(f: &F, domain: &Domain, lo: f64, hi: f64, depth: usize) -> IntegrateResult<Subinterval>
where
    F: Fn(f64) -> IntegrateResult<f64>,
{
    let center = 0.5 * (lo + hi);
    let half_width = 0.5 * (hi - lo);

    let mut fvals = [0.0; 15];
    for (i, &node) in XGK.iter().enumerate() {
        let (x, jac) = domain.map(center + half_width * node);
        if !jac.is_finite() {
            // Node rounded onto a singular endpoint of the substitution
            continue;
        }
        let fx = f(x)?;
        let value = fx * jac;
        if !value.is_finite() {
            return Err(IntegrateError::EvaluationError {
                at: x,
                context: format!(
                    "integrand on subinterval [{:e}, {:e}]",
                    domain.x_at(lo),
                    domain.x_at(hi)
                ),
            });
        }
        fvals[i] = value;
    }

    let kronrod: f64 = fvals.iter().zip(WGK.iter()).map(|(v, w)| v * w).sum::<f64>() * half_width;
    let gauss: f64 = WG
        .iter()
        .enumerate()
        .map(|(i, w)| w * fvals[2 * i + 1])
        .sum::<f64>()
        * half_width;

    Ok(Subinterval {
        a: lo,
        b: hi,
        estimate: kronrod,
        error: (kronrod - gauss).abs(),
        depth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;
    use std::time::Duration;

    #[test]
    fn test_quad_polynomial() {
        // Integrate x^4 from 0 to 1 = 0.2
        let result = quad(|x| x.powi(4), 0.0, 1.0, &QuadOptions::default()).unwrap();
        assert!((result.integral - 0.2).abs() < 1e-10);
        assert!(result.converged);
        assert_eq!(result.neval, 15);
    }

    #[test]
    fn test_quad_exp() {
        let result = quad(|x| x.exp(), 0.0, 1.0, &QuadOptions::default()).unwrap();
        let exact = std::f64::consts::E - 1.0;
        assert!((result.integral - exact).abs() < 1e-10);
        assert!(result.converged);
    }

    #[test]
    fn test_quad_oscillatory() {
        // Exact: (1 - cos(10*pi)) / 10 = 0
        let result = quad(|x| (10.0 * x).sin(), 0.0, PI, &QuadOptions::default()).unwrap();
        assert!(result.integral.abs() < 1e-8);
        assert!(result.converged);
    }

    #[test]
    fn test_quad_with_peak() {
        let result = quad(
            |x| 1.0 / (1.0 + 100.0 * (x - 0.5).powi(2)),
            0.0,
            1.0,
            &QuadOptions::default(),
        )
        .unwrap();
        let exact = 2.0 * 5.0_f64.atan() / 10.0;
        assert!(
            (result.integral - exact).abs() < 1e-9,
            "got {}, expected {}",
            result.integral,
            exact
        );
        assert!(result.partition.len() > 1);
    }

    #[test]
    fn test_quad_endpoint_singularity() {
        // ∫₀¹ 1/√x dx = 2
        let result = quad(|x| 1.0 / x.sqrt(), 0.0, 1.0, &QuadOptions::default()).unwrap();
        assert!(result.converged);
        assert!((result.integral - 2.0).abs() < 1e-7, "got {}", result.integral);
    }

    #[test]
    fn test_partition_invariants() {
        let result = quad(|x| (3.0 * x).cos() * x, -1.0, 2.5, &QuadOptions::default()).unwrap();
        let cells = &result.partition;
        assert_eq!(cells.first().unwrap().a, -1.0);
        assert_eq!(cells.last().unwrap().b, 2.5);
        for pair in cells.windows(2) {
            assert_eq!(pair[0].b, pair[1].a);
        }
        let sum: f64 = cells.iter().map(|c| c.estimate).sum();
        let err: f64 = cells.iter().map(|c| c.error).sum();
        assert_eq!(sum, result.integral);
        assert_eq!(err, result.error);
        assert!(result.error >= 0.0);
    }

    #[test]
    fn test_reversed_and_empty_interval() {
        let opts = QuadOptions::default();
        let forward = quad(|x| x * x, 0.0, 3.0, &opts).unwrap();
        let backward = quad(|x| x * x, 3.0, 0.0, &opts).unwrap();
        assert_eq!(backward.integral, -forward.integral);
        assert_eq!(backward.error, forward.error);

        let empty = quad(|x| x * x, 1.5, 1.5, &opts).unwrap();
        assert_eq!(empty.integral, 0.0);
        assert_eq!(empty.neval, 0);
        assert!(empty.converged);
    }

    #[test]
    fn test_semi_infinite() {
        // ∫₀^∞ e^{-x} dx = 1, ∫_{-∞}^0 e^{x} dx = 1
        let opts = QuadOptions::default();
        let upper = quad(|x| (-x).exp(), 0.0, f64::INFINITY, &opts).unwrap();
        assert!((upper.integral - 1.0).abs() < 1e-9);
        let lower = quad(|x| x.exp(), f64::NEG_INFINITY, 0.0, &opts).unwrap();
        assert!((lower.integral - 1.0).abs() < 1e-9);
        // Reversed infinite interval
        let rev = quad(|x| (-x).exp(), f64::INFINITY, 0.0, &opts).unwrap();
        assert!((rev.integral + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_limit_returns_best_estimate() {
        let opts = QuadOptions::default().with_limit(3);
        let result = quad(|x| (50.0 * x).sin().abs(), 0.0, 10.0, &opts).unwrap();
        assert!(!result.converged);
        assert!(result.partition.len() <= 3);
        assert!(result.error > 0.0);
    }

    #[test]
    fn test_max_depth_zero() {
        let opts = QuadOptions::default().with_max_depth(0);
        let result = quad(|x| 1.0 / x.sqrt(), 0.0, 1.0, &opts).unwrap();
        assert!(!result.converged);
        assert_eq!(result.partition.len(), 1);
    }

    #[test]
    fn test_eval_budget_and_deadline() {
        let opts = QuadOptions::default().with_max_evals(30);
        let result = quad(|x| (40.0 * x).sin().abs(), 0.0, 10.0, &opts).unwrap();
        assert!(!result.converged);
        assert!(result.neval <= 30 + 30);

        let past = Instant::now() - Duration::from_millis(1);
        let opts = QuadOptions::default().with_deadline(past);
        let result = quad(|x| (40.0 * x).sin().abs(), 0.0, 10.0, &opts).unwrap();
        assert!(!result.converged);
        assert_eq!(result.neval, 15);
    }

    #[test]
    fn test_nan_integrand_reports_location() {
        let err = quad(|x| if x > 0.7 { f64::NAN } else { x }, 0.0, 1.0, &QuadOptions::default())
            .unwrap_err();
        match err {
            IntegrateError::EvaluationError { at, context } => {
                assert!(at > 0.7);
                assert!(context.contains("subinterval"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_invalid_options() {
        let f = |x: f64| x;
        assert!(quad(f, 0.0, 1.0, &QuadOptions::default().with_limit(0)).is_err());
        assert!(quad(f, 0.0, 1.0, &QuadOptions::default().with_tolerances(0.0, 0.0)).is_err());
        assert!(quad(f, 0.0, 1.0, &QuadOptions::default().with_tolerances(-1.0, 1e-8)).is_err());
        assert!(matches!(
            quad(f, f64::NAN, 1.0, &QuadOptions::default()),
            Err(IntegrateError::InvalidInterval { .. })
        ));
    }

    #[test]
    fn test_quad_with_args() {
        let result = quad_with_args(
            |x, p: &[f64]| p[0] * x * x + p[1],
            0.0,
            1.0,
            &[2.0, 1.0][..],
            &QuadOptions::default(),
        )
        .unwrap();
        assert!((result.integral - 5.0 / 3.0).abs() < 1e-12);
    }
}
