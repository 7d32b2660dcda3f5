//! Step size control shared by all ODE methods.

use crate::integrate::error::{IntegrateError, IntegrateResult};

/// Step size controller for adaptive methods.
#[derive(Debug, Clone)]
pub struct StepSizeController {
    /// Safety factor (default: 0.9)
    pub safety: f64,
    /// Minimum scale factor (default: 0.2)
    pub min_factor: f64,
    /// Maximum scale factor (default: 5.0)
    pub max_factor: f64,
}

impl Default for StepSizeController {
    fn default() -> Self {
        Self {
            safety: 0.9,
            min_factor: 0.2,
            max_factor: 5.0,
        }
    }
}

impl StepSizeController {
    /// Compute the new step size based on error estimate.
    ///
    /// # Arguments
    /// * `h` - Current step size
    /// * `err` - Normalized error (should be <= 1 for step acceptance)
    /// * `order` - Order of the error estimator
    pub fn compute_step(&self, h: f64, err: f64, order: usize) -> (f64, bool) {
        let accept = err <= 1.0;

        let exponent = 1.0 / (order as f64 + 1.0);
        let factor = if err == 0.0 {
            self.max_factor
        } else if err.is_finite() {
            self.safety * (1.0 / err).powf(exponent)
        } else {
            self.min_factor
        };

        let factor = factor.clamp(self.min_factor, self.max_factor);

        // Don't increase step size after rejection
        let factor = if accept { factor } else { factor.min(1.0) };

        (h * factor, accept)
    }
}

/// Scaled max-norm of a local error estimate.
///
/// `max_i |err_i| / (atol + rtol · max(|y_old_i|, |y_new_i|))`; a step is
/// acceptable when this is at most one.
pub fn compute_error_norm(y_old: &[f64], y_new: &[f64], err: &[f64], rtol: f64, atol: f64) -> f64 {
    y_old
        .iter()
        .zip(y_new)
        .zip(err)
        .map(|((yo, yn), e)| e.abs() / (atol + rtol * yo.abs().max(yn.abs())))
        .fold(0.0, f64::max)
}

/// Compute initial step size using the algorithm from Hairer & Wanner.
///
/// Costs one right-hand side evaluation, taken `direction` (±1) from `t0`.
/// Returns a magnitude. If that evaluation is non-finite the first
/// guess is returned and the step controller takes over.
#[allow(clippy::too_many_arguments)]
pub fn compute_initial_step<R>(
    rhs: &R,
    t0: f64,
    y0: &[f64],
    f0: &[f64],
    order: usize,
    rtol: f64,
    atol: f64,
    direction: f64,
) -> IntegrateResult<f64>
where
    R: Fn(f64, &[f64]) -> IntegrateResult<Vec<f64>>,
{
    let n = y0.len() as f64;
    let sc: Vec<f64> = y0.iter().map(|y| atol + rtol * y.abs()).collect();
    let rms = |v: &mut dyn Iterator<Item = f64>| (v.map(|x| x * x).sum::<f64>() / n).sqrt();

    let d0 = rms(&mut y0.iter().zip(&sc).map(|(y, s)| y / s));
    let d1 = rms(&mut f0.iter().zip(&sc).map(|(f, s)| f / s));

    let h0 = if d0 < 1e-5 || d1 < 1e-5 {
        1e-6
    } else {
        0.01 * d0 / d1
    };

    // Explicit Euler point for the second derivative
    let y1: Vec<f64> = y0.iter().zip(f0).map(|(y, f)| y + direction * h0 * f).collect();
    let f1 = match rhs(t0 + direction * h0, &y1) {
        Ok(f1) => f1,
        Err(IntegrateError::EvaluationError { .. }) => return Ok(h0),
        Err(e) => return Err(e),
    };
    let d2 = rms(&mut f1.iter().zip(f0).zip(&sc).map(|((a, b), s)| (a - b) / s)) / h0;

    let h1 = if d1.max(d2) <= 1e-15 {
        (h0 * 1e-3).max(1e-6)
    } else {
        (0.01 / d1.max(d2)).powf(1.0 / (order as f64 + 1.0))
    };

    Ok((100.0 * h0).min(h1))
}
