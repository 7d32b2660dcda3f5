//! Bogacki-Shampine RK23 method.

#![allow(clippy::needless_range_loop)]

use crate::integrate::error::IntegrateResult;
use crate::integrate::ode::solver::StepResult;
use crate::integrate::ode::step_control::compute_error_norm;

// Bogacki-Shampine coefficients
const C2: f64 = 0.5;
const C3: f64 = 0.75;

const A21: f64 = 0.5;
const A32: f64 = 0.75;

// 3rd order weights, also the last stage row
const B1: f64 = 2.0 / 9.0;
const B2: f64 = 1.0 / 3.0;
const B3: f64 = 4.0 / 9.0;

// Error weights (3rd - 2nd order)
const E1: f64 = -5.0 / 72.0;
const E2: f64 = 1.0 / 12.0;
const E3: f64 = 1.0 / 9.0;
const E4: f64 = -1.0 / 8.0;

/// One Bogacki-Shampine step of size `h` from `(t, y)`.
///
/// Three new evaluations; the last is reused as the next step's `k1`.
pub(crate) fn rk23_step<R>(
    rhs: &R,
    t: f64,
    y: &[f64],
    k1: &[f64],
    h: f64,
    rtol: f64,
    atol: f64,
) -> IntegrateResult<StepResult>
where
    R: Fn(f64, &[f64]) -> IntegrateResult<Vec<f64>>,
{
    let n = y.len();
    let mut y_stage = vec![0.0; n];

    for i in 0..n {
        y_stage[i] = y[i] + h * A21 * k1[i];
    }
    let k2 = rhs(t + C2 * h, &y_stage)?;

    for i in 0..n {
        y_stage[i] = y[i] + h * A32 * k2[i];
    }
    let k3 = rhs(t + C3 * h, &y_stage)?;

    let mut y3 = vec![0.0; n];
    for i in 0..n {
        y3[i] = y[i] + h * (B1 * k1[i] + B2 * k2[i] + B3 * k3[i]);
    }
    let k4 = rhs(t + h, &y3)?;

    let mut y_err = vec![0.0; n];
    for i in 0..n {
        y_err[i] = h * (E1 * k1[i] + E2 * k2[i] + E3 * k3[i] + E4 * k4[i]);
    }

    let error_norm = compute_error_norm(y, &y3, &y_err, rtol, atol);
    Ok(StepResult::solved(t + h, y3, k4, error_norm))
}
