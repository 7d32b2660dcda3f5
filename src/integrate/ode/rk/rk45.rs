//! Dormand-Prince RK45 method.

#![allow(clippy::needless_range_loop)]

use crate::integrate::error::IntegrateResult;
use crate::integrate::ode::solver::StepResult;
use crate::integrate::ode::step_control::compute_error_norm;

// Dormand-Prince coefficients
const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;

// 5th order weights
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;

// Error weights (5th - 4th order)
const E1: f64 = 71.0 / 57600.0;
const E3: f64 = -71.0 / 16695.0;
const E4: f64 = 71.0 / 1920.0;
const E5: f64 = -17253.0 / 339200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

/// One Dormand-Prince step of size `h` from `(t, y)`.
///
/// `k1` is `f(t, y)`. Six new evaluations; the last one is `f(t + h, y_new)`
/// and is handed back as `f_new` for the next step (FSAL).
pub(crate) fn rk45_step<R>(
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
        y_stage[i] = y[i] + h * (A31 * k1[i] + A32 * k2[i]);
    }
    let k3 = rhs(t + C3 * h, &y_stage)?;

    for i in 0..n {
        y_stage[i] = y[i] + h * (A41 * k1[i] + A42 * k2[i] + A43 * k3[i]);
    }
    let k4 = rhs(t + C4 * h, &y_stage)?;

    for i in 0..n {
        y_stage[i] = y[i] + h * (A51 * k1[i] + A52 * k2[i] + A53 * k3[i] + A54 * k4[i]);
    }
    let k5 = rhs(t + C5 * h, &y_stage)?;

    for i in 0..n {
        y_stage[i] =
            y[i] + h * (A61 * k1[i] + A62 * k2[i] + A63 * k3[i] + A64 * k4[i] + A65 * k5[i]);
    }
    let k6 = rhs(t + h, &y_stage)?;

    let mut y5 = vec![0.0; n];
    for i in 0..n {
        y5[i] = y[i] + h * (B1 * k1[i] + B3 * k3[i] + B4 * k4[i] + B5 * k5[i] + B6 * k6[i]);
    }

    // FSAL
    let k7 = rhs(t + h, &y5)?;

    let mut y_err = vec![0.0; n];
    for i in 0..n {
        y_err[i] =
            h * (E1 * k1[i] + E3 * k3[i] + E4 * k4[i] + E5 * k5[i] + E6 * k6[i] + E7 * k7[i]);
    }

    let error_norm = compute_error_norm(y, &y5, &y_err, rtol, atol);
    Ok(StepResult::solved(t + h, y5, k7, error_norm))
}
