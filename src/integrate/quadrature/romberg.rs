//! Romberg integration: Richardson extrapolation of the trapezoidal rule.
//!
//! Both entry points build the same triangular table
//!
//! ```text
//! R[i][0] = trapezoid with 2^i intervals
//! R[i][j] = R[i][j-1] + (R[i][j-1] − R[i-1][j-1]) / (4^j − 1)
//! ```
//!
//! [`romb`] and [`romb_samples`] work on a fixed `2^k + 1` sample series and
//! return `R[k][k]`. [`romberg`] evaluates a function, adding rows until two
//! consecutive diagonal entries agree.

use log::warn;

use super::adaptive::QuadResult;
use super::trapezoid::{validate_samples, validate_spacing, validate_values};
use crate::integrate::error::{IntegrateError, IntegrateResult};

/// Number of halvings `k` for a `2^k + 1` sample count.
fn halvings(name: &str, n: usize) -> IntegrateResult<u32> {
    let intervals = n.saturating_sub(1);
    if intervals == 0 || !intervals.is_power_of_two() {
        return Err(IntegrateError::InvalidInput {
            context: format!("{name}: need 2^k + 1 samples, got {n}"),
        });
    }
    Ok(intervals.trailing_zeros())
}

/// Romberg integration of `2^k + 1` samples spaced `dx` apart.
///
/// # Errors
///
/// [`IntegrateError::InvalidInput`] if the sample count is not `2^k + 1`
/// (for example 10), `dx` is not positive, or a sample is not finite.
///
/// # Example
///
/// ```
/// use numint::integrate::romb;
///
/// // 17 samples of exp on [0, 1]
/// let y: Vec<f64> = (0..17).map(|i| (i as f64 / 16.0).exp()).collect();
/// let result = romb(&y, 1.0 / 16.0).unwrap();
/// assert!((result - (std::f64::consts::E - 1.0)).abs() < 1e-12);
/// ```
pub fn romb(y: &[f64], dx: f64) -> IntegrateResult<f64> {
    validate_values("romb", y, 2)?;
    validate_spacing("romb", dx)?;
    let k = halvings("romb", y.len())? as usize;

    let n = y.len();
    let intervals = n - 1;
    let mut prev = vec![0.0; k + 1];
    let mut curr = vec![0.0; k + 1];

    let mut h = intervals as f64 * dx;
    prev[0] = 0.5 * h * (y[0] + y[n - 1]);

    for i in 1..=k {
        let stride = intervals >> i;
        h *= 0.5;
        let midpoints: f64 = (stride..intervals).step_by(2 * stride).map(|m| y[m]).sum();
        curr[0] = 0.5 * prev[0] + h * midpoints;
        extrapolate(&prev, &mut curr, i);
        std::mem::swap(&mut prev, &mut curr);
    }

    Ok(prev[k])
}

/// Romberg integration of `2^k + 1` equally spaced samples.
///
/// # Errors
///
/// [`IntegrateError::InvalidInput`] for a bad sample count, unequal spacing,
/// decreasing `x` or non-finite values.
pub fn romb_samples(y: &[f64], x: &[f64]) -> IntegrateResult<f64> {
    validate_samples("romb_samples", y, x, 2, true)?;
    halvings("romb_samples", y.len())?;

    let n = x.len();
    let dx = (x[n - 1] - x[0]) / (n - 1) as f64;
    if let Some(i) = x
        .windows(2)
        .position(|w| ((w[1] - w[0]) - dx).abs() > 1e-10 * dx.abs().max(1.0))
    {
        return Err(IntegrateError::InvalidInput {
            context: format!(
                "romb_samples: samples must be equally spaced (x[{}] - x[{}] = {}, expected {})",
                i + 1,
                i,
                x[i + 1] - x[i],
                dx
            ),
        });
    }
    romb(y, dx)
}

/// Fill `curr[1..=row]` from `curr[0]` and the previous row.
fn extrapolate(prev: &[f64], curr: &mut [f64], row: usize) {
    let mut factor = 1.0;
    for j in 1..=row {
        factor *= 4.0;
        curr[j] = curr[j - 1] + (curr[j - 1] - prev[j - 1]) / (factor - 1.0);
    }
}

/// Options for function-driven Romberg integration.
#[derive(Debug, Clone)]
pub struct RombergOptions {
    /// Relative tolerance (default: 1.48e-8)
    pub rtol: f64,
    /// Absolute tolerance (default: 1.48e-8)
    pub atol: f64,
    /// Maximum number of table rows (default: 20, capped at 30)
    pub max_levels: usize,
}

impl Default for RombergOptions {
    fn default() -> Self {
        Self {
            rtol: 1.48e-8,
            atol: 1.48e-8,
            max_levels: 20,
        }
    }
}

impl RombergOptions {
    /// Set absolute and relative tolerances.
    pub fn with_tolerances(mut self, atol: f64, rtol: f64) -> Self {
        self.atol = atol;
        self.rtol = rtol;
        self
    }

    /// Set the maximum number of table rows.
    pub fn with_max_levels(mut self, max_levels: usize) -> Self {
        self.max_levels = max_levels;
        self
    }

    pub fn validate(&self) -> IntegrateResult<()> {
        if !(self.atol >= 0.0 && self.rtol >= 0.0 && self.atol.is_finite() && self.rtol.is_finite()) {
            return Err(IntegrateError::InvalidInput {
                context: "romberg: tolerances must be finite and non-negative".to_string(),
            });
        }
        if self.max_levels < 2 {
            return Err(IntegrateError::InvalidInput {
                context: format!("romberg: max_levels must be at least 2, got {}", self.max_levels),
            });
        }
        Ok(())
    }
}

/// Romberg integration of a function on a finite interval.
///
/// Doubles the number of trapezoid intervals each row until
/// `|R[k][k] − R[k−1][k−1]| ≤ atol + rtol·|R[k][k]|`.
///
/// # Returns
///
/// A [`QuadResult`] with an empty partition. `converged` is `false` when
/// `max_levels` rows were not enough.
///
/// # Errors
///
/// - [`IntegrateError::InvalidInput`] for invalid options
/// - [`IntegrateError::InvalidInterval`] for non-finite bounds
/// - [`IntegrateError::EvaluationError`] if `f` returns NaN or infinity
///
/// # Example
///
/// ```
/// use numint::integrate::{romberg, RombergOptions};
///
/// let result = romberg(|x: f64| x.exp(), 0.0, 1.0, &RombergOptions::default()).unwrap();
/// assert!((result.integral - (std::f64::consts::E - 1.0)).abs() < 1e-10);
/// assert!(result.converged);
/// ```
pub fn romberg<F>(f: F, a: f64, b: f64, options: &RombergOptions) -> IntegrateResult<QuadResult>
where
    F: Fn(f64) -> f64,
{
    options.validate()?;
    if !a.is_finite() || !b.is_finite() {
        return Err(IntegrateError::InvalidInterval {
            a,
            b,
            context: "romberg: bounds must be finite".to_string(),
        });
    }
    if a == b {
        return Ok(QuadResult {
            integral: 0.0,
            error: 0.0,
            neval: 0,
            converged: true,
            partition: Vec::new(),
        });
    }
    if a > b {
        let mut result = romberg(f, b, a, options)?;
        result.integral = -result.integral;
        return Ok(result);
    }

    let eval = |x: f64| -> IntegrateResult<f64> {
        let v = f(x);
        if v.is_finite() {
            Ok(v)
        } else {
            Err(IntegrateError::EvaluationError {
                at: x,
                context: format!("romberg integrand on [{a}, {b}]"),
            })
        }
    };

    let levels = options.max_levels.min(30);
    let mut prev = vec![0.0; levels];
    let mut curr = vec![0.0; levels];
    let mut neval = 2;
    let mut h = b - a;
    prev[0] = 0.5 * h * (eval(a)? + eval(b)?);
    let mut error = f64::INFINITY;

    for k in 1..levels {
        h *= 0.5;
        let new_points = 1usize << (k - 1);
        let mut sum = 0.0;
        for i in 0..new_points {
            sum += eval(a + (2 * i + 1) as f64 * h)?;
        }
        neval += new_points;

        curr[0] = 0.5 * prev[0] + h * sum;
        extrapolate(&prev, &mut curr, k);

        error = (curr[k] - prev[k - 1]).abs();
        if error <= options.atol + options.rtol * curr[k].abs() {
            return Ok(QuadResult {
                integral: curr[k],
                error,
                neval,
                converged: true,
                partition: Vec::new(),
            });
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    warn!(
        "romberg on [{}, {}]: no convergence after {} rows (error {:.2e})",
        a, b, levels, error
    );
    Ok(QuadResult {
        integral: prev[levels - 1],
        error,
        neval,
        converged: false,
        partition: Vec::new(),
    })
}
