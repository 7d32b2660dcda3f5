//! Singly diagonally implicit Runge-Kutta method of order 4(3).
//!
//! The five-stage, L-stable, stiffly accurate SDIRK of Hairer & Wanner
//! (Solving ODEs II, Table IV.6.5) with diagonal γ = 1/4. Each stage solves
//!
//! ```text
//! k_i = f(t + c_i h, y + h Σ_{j<i} a_ij k_j + h γ k_i)
//! ```
//!
//! by simplified Newton iteration with the matrix `I − hγJ`. One Jacobian is
//! formed per accepted point and one LU per distinct step size, shared by
//! all stages and rejected attempts at that point.

#![allow(clippy::needless_range_loop)]

use log::debug;

use super::solver::{StepResult, reject_non_finite};
use super::step_control::compute_error_norm;
use super::types::{JacobianSpec, ODEOptions};
use crate::common::{banded_jacobian, dense_jacobian};
use crate::integrate::error::{IntegrateError, IntegrateResult};
use crate::linalg::{BandedLu, BandedMatrix, DenseLu, DenseMatrix, LinalgError, LuFactors};

const STAGES: usize = 5;
const GAMMA: f64 = 0.25;

const C: [f64; STAGES] = [0.25, 0.75, 11.0 / 20.0, 0.5, 1.0];

// Strictly lower part of the stage matrix; the diagonal is GAMMA
const A: [[f64; STAGES]; STAGES] = [
    [0.0, 0.0, 0.0, 0.0, 0.0],
    [0.5, 0.0, 0.0, 0.0, 0.0],
    [17.0 / 50.0, -1.0 / 25.0, 0.0, 0.0, 0.0],
    [371.0 / 1360.0, -137.0 / 2720.0, 15.0 / 544.0, 0.0, 0.0],
    [25.0 / 24.0, -49.0 / 48.0, 125.0 / 16.0, -85.0 / 12.0, 0.0],
];

// 4th order weights, equal to the last row (stiffly accurate)
const B: [f64; STAGES] = [25.0 / 24.0, -49.0 / 48.0, 125.0 / 16.0, -85.0 / 12.0, 0.25];

// B minus the embedded 3rd order weights (59/48, -17/96, 225/32, -85/12, 0)
const E: [f64; STAGES] = [-3.0 / 16.0, -27.0 / 32.0, 25.0 / 32.0, 0.0, 0.25];

/// Jacobian storage matching the declared structure.
enum Jacobian {
    Dense(DenseMatrix),
    Banded(BandedMatrix),
}

/// LU of `I − hγJ` for one step size.
struct IterationMatrix {
    h: f64,
    factors: Box<dyn LuFactors>,
}

/// Stepper state carried between steps.
pub(crate) struct Sdirk4 {
    spec: Option<JacobianSpec>,
    jac: Jacobian,
    jac_current: bool,
    lu: Option<IterationMatrix>,
    pub(crate) njev: usize,
    pub(crate) nlu: usize,
}

impl Sdirk4 {
    /// Allocate Jacobian storage for an `n`-dimensional system.
    ///
    /// Fails with [`IntegrateError::Linalg`] when a banded spec does not fit
    /// `n`.
    pub(crate) fn new(n: usize, spec: Option<JacobianSpec>) -> IntegrateResult<Self> {
        let jac = match &spec {
            Some(JacobianSpec::Banded { ml, mu, .. }) => {
                Jacobian::Banded(BandedMatrix::zeros(n, *ml, *mu)?)
            }
            _ => Jacobian::Dense(DenseMatrix::zeros(n)),
        };
        Ok(Self {
            spec,
            jac,
            jac_current: false,
            lu: None,
            njev: 0,
            nlu: 0,
        })
    }

    /// Mark the Jacobian stale after the solver moved to a new point.
    pub(crate) fn advance(&mut self) {
        self.jac_current = false;
    }

    pub(crate) fn propose_step<R>(
        &mut self,
        rhs: &R,
        t: f64,
        y: &[f64],
        f0: &[f64],
        h: f64,
        options: &ODEOptions,
    ) -> IntegrateResult<StepResult>
    where
        R: Fn(f64, &[f64]) -> IntegrateResult<Vec<f64>>,
    {
        self.ensure_jacobian(rhs, t, y, f0)?;

        let matrix = match self.lu.take() {
            Some(m) if m.h == h => m,
            _ => match self.factorize(h) {
                Ok(m) => {
                    self.nlu += 1;
                    m
                }
                Err(LinalgError::Singular { column }) => {
                    debug!("SDIRK4: I - hγJ singular in column {} at t = {}, h = {:.3e}", column, t, h);
                    return Ok(StepResult::newton_failure(t + h));
                }
                Err(e) => return Err(e.into()),
            },
        };

        // A non-finite stage value is a diverged Newton iterate
        let result = reject_non_finite(
            self.integrate_stages(rhs, t, y, f0, h, options, matrix.factors.as_ref()),
            |fault| {
                debug!("SDIRK4: {} (h = {:.3e})", fault, h);
                StepResult::newton_failure(t + h).with_fault(fault)
            },
        );
        self.lu = Some(matrix);
        result
    }

    fn ensure_jacobian<R>(&mut self, rhs: &R, t: f64, y: &[f64], f0: &[f64]) -> IntegrateResult<()>
    where
        R: Fn(f64, &[f64]) -> IntegrateResult<Vec<f64>>,
    {
        if self.jac_current {
            return Ok(());
        }

        let mut fd = |x: &[f64]| rhs(t, x);
        match (&self.spec, &mut self.jac) {
            (Some(JacobianSpec::Dense(jac_fn)), Jacobian::Dense(jac)) => {
                jac.fill_zero();
                jac_fn(t, y, jac);
                check_finite(jac.as_slice(), t)?;
            }
            (Some(JacobianSpec::Banded { jac: Some(jac_fn), .. }), Jacobian::Banded(jac)) => {
                jac.fill_zero();
                jac_fn(t, y, jac);
                check_finite(jac.as_slice(), t)?;
            }
            (_, Jacobian::Banded(jac)) => {
                banded_jacobian(&mut fd, y, f0, jac)?;
            }
            (_, Jacobian::Dense(jac)) => {
                dense_jacobian(&mut fd, y, f0, jac)?;
            }
        }

        self.njev += 1;
        self.jac_current = true;
        self.lu = None;
        Ok(())
    }

    fn factorize(&self, h: f64) -> Result<IterationMatrix, LinalgError> {
        let hg = h * GAMMA;
        let factors: Box<dyn LuFactors> = match &self.jac {
            Jacobian::Dense(jac) => {
                let n = jac.dim();
                let mut m = DenseMatrix::zeros(n);
                for i in 0..n {
                    for j in 0..n {
                        let delta = if i == j { 1.0 } else { 0.0 };
                        m.set(i, j, delta - hg * jac.get(i, j));
                    }
                }
                Box::new(DenseLu::factorize(m)?)
            }
            Jacobian::Banded(jac) => {
                let mut m = BandedMatrix::zeros(jac.dim(), jac.ml(), jac.mu())?;
                for j in 0..jac.dim() {
                    for i in jac.row_range(j) {
                        let delta = if i == j { 1.0 } else { 0.0 };
                        m.set(i, j, delta - hg * jac.get(i, j));
                    }
                }
                Box::new(BandedLu::factorize(&m)?)
            }
        };
        Ok(IterationMatrix { h, factors })
    }

    #[allow(clippy::too_many_arguments)]
    fn integrate_stages<R>(
        &self,
        rhs: &R,
        t: f64,
        y: &[f64],
        f0: &[f64],
        h: f64,
        options: &ODEOptions,
        lu: &dyn LuFactors,
    ) -> IntegrateResult<StepResult>
    where
        R: Fn(f64, &[f64]) -> IntegrateResult<Vec<f64>>,
    {
        let n = y.len();
        let hg = h * GAMMA;
        let scale: Vec<f64> = y.iter().map(|v| options.atol + options.rtol * v.abs()).collect();

        let mut ks: Vec<Vec<f64>> = Vec::with_capacity(STAGES);
        let mut stage_y = vec![0.0; n];

        for s in 0..STAGES {
            let ts = t + C[s] * h;
            let mut base = y.to_vec();
            for (j, kj) in ks.iter().enumerate() {
                for m in 0..n {
                    base[m] += h * A[s][j] * kj[m];
                }
            }

            let mut k = ks.last().map_or_else(|| f0.to_vec(), Clone::clone);
            let mut converged = false;
            let mut prev_norm = f64::INFINITY;

            for _ in 0..options.max_newton_iter {
                for m in 0..n {
                    stage_y[m] = base[m] + hg * k[m];
                }
                let fy = rhs(ts, &stage_y)?;
                let mut delta: Vec<f64> = fy.iter().zip(&k).map(|(f, k)| f - k).collect();
                lu.solve_in_place(&mut delta)?;

                let mut norm: f64 = 0.0;
                for m in 0..n {
                    k[m] += delta[m];
                    norm = norm.max((hg * delta[m]).abs() / scale[m]);
                }

                if norm <= options.newton_tol {
                    converged = true;
                    break;
                }
                if norm >= prev_norm {
                    break;
                }
                prev_norm = norm;
            }

            if !converged {
                debug!(
                    "SDIRK4: Newton did not converge in stage {} at t = {}, h = {:.3e}",
                    s + 1,
                    t,
                    h
                );
                return Ok(StepResult::newton_failure(t + h));
            }
            ks.push(k);
        }

        let mut y_new = y.to_vec();
        let mut err = vec![0.0; n];
        for (s, ks) in ks.iter().enumerate() {
            for m in 0..n {
                y_new[m] += h * B[s] * ks[m];
                err[m] += h * E[s] * ks[m];
            }
        }
        // Damp the stiff components of the estimate
        lu.solve_in_place(&mut err)?;

        let error_norm = compute_error_norm(y, &y_new, &err, options.rtol, options.atol);
        let f_new = if error_norm <= 1.0 {
            rhs(t + h, &y_new)?
        } else {
            ks[STAGES - 1].clone()
        };
        Ok(StepResult::solved(t + h, y_new, f_new, error_norm))
    }
}

fn check_finite(values: &[f64], t: f64) -> IntegrateResult<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(idx) => Err(IntegrateError::EvaluationError {
            at: t,
            context: format!("Jacobian storage entry {idx} is not finite"),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrate::ode::types::ODEMethod;

    fn options() -> ODEOptions {
        ODEOptions::with_method(ODEMethod::SDIRK4).tolerances(1e-6, 1e-9)
    }

    #[test]
    fn test_tableau_consistency() {
        for s in 0..STAGES {
            let row: f64 = A[s].iter().sum::<f64>() + GAMMA;
            assert!((row - C[s]).abs() < 1e-14, "row {} sums to {}", s, row);
        }
        assert!((B.iter().sum::<f64>() - 1.0).abs() < 1e-14);
        assert!(E.iter().sum::<f64>().abs() < 1e-14);
        // Stiffly accurate: last row equals the weights
        for j in 0..STAGES - 1 {
            assert_eq!(A[STAGES - 1][j], B[j]);
        }
    }

    #[test]
    fn test_single_step_linear_decay() {
        let rhs = |_t: f64, y: &[f64]| -> IntegrateResult<Vec<f64>> { Ok(vec![-y[0]]) };
        let mut stepper = Sdirk4::new(1, None).unwrap();
        let step = stepper
            .propose_step(&rhs, 0.0, &[1.0], &[-1.0], 0.1, &options())
            .unwrap();
        assert!(step.newton_converged);
        assert!((step.y_new[0] - (-0.1_f64).exp()).abs() < 1e-6);
        assert_eq!(stepper.njev, 1);
        assert_eq!(stepper.nlu, 1);

        // Same point and step size reuse both
        stepper
            .propose_step(&rhs, 0.0, &[1.0], &[-1.0], 0.1, &options())
            .unwrap();
        assert_eq!(stepper.njev, 1);
        assert_eq!(stepper.nlu, 1);

        // New step size refactorizes, new point re-evaluates the Jacobian
        stepper
            .propose_step(&rhs, 0.0, &[1.0], &[-1.0], 0.05, &options())
            .unwrap();
        assert_eq!(stepper.nlu, 2);
        stepper.advance();
        stepper
            .propose_step(&rhs, 0.05, &[0.95], &[-0.95], 0.05, &options())
            .unwrap();
        assert_eq!(stepper.njev, 2);
        assert_eq!(stepper.nlu, 3);
    }

    #[test]
    fn test_stiff_step_is_stable() {
        // y' = -1e6 (y - cos t): a huge step stays bounded near the slow manifold
        let rhs = |t: f64, y: &[f64]| -> IntegrateResult<Vec<f64>> {
            Ok(vec![-1e6 * (y[0] - t.cos())])
        };
        let mut stepper = Sdirk4::new(1, None).unwrap();
        let f0 = rhs(0.0, &[1.0]).unwrap();
        let step = stepper
            .propose_step(&rhs, 0.0, &[1.0], &f0, 0.1, &options())
            .unwrap();
        assert!(step.newton_converged);
        assert!((step.y_new[0] - 0.1_f64.cos()).abs() < 1e-4);
    }

    #[test]
    fn test_analytic_jacobians() {
        let rhs = |_t: f64, y: &[f64]| -> IntegrateResult<Vec<f64>> { Ok(vec![y[1], -y[0]]) };
        let dense = options().dense_jacobian(|_t, _y, jac: &mut DenseMatrix| {
            jac.set(0, 1, 1.0);
            jac.set(1, 0, -1.0);
        });
        let banded = options().banded_jacobian_fn(1, 1, |_t, _y, jac: &mut BandedMatrix| {
            jac.set(0, 1, 1.0);
            jac.set(1, 0, -1.0);
        });

        let mut results = Vec::new();
        for opts in [options(), dense, banded] {
            let mut stepper = Sdirk4::new(2, opts.jacobian.clone()).unwrap();
            let step = stepper
                .propose_step(&rhs, 0.0, &[1.0, 0.0], &[0.0, -1.0], 0.1, &opts)
                .unwrap();
            assert!(step.newton_converged);
            results.push(step.y_new);
        }
        for r in &results[1..] {
            assert!((r[0] - results[0][0]).abs() < 1e-8);
            assert!((r[1] - results[0][1]).abs() < 1e-8);
        }
        assert!((results[0][0] - 0.1_f64.cos()).abs() < 1e-5);
    }

    #[test]
    fn test_non_finite_jacobian_is_evaluation_error() {
        let rhs = |_t: f64, y: &[f64]| -> IntegrateResult<Vec<f64>> { Ok(vec![-y[0]]) };
        let opts = options().dense_jacobian(|_t, _y, jac: &mut DenseMatrix| {
            jac.set(0, 0, f64::NAN);
        });
        let mut stepper = Sdirk4::new(1, opts.jacobian.clone()).unwrap();
        let result = stepper.propose_step(&rhs, 0.0, &[1.0], &[-1.0], 0.1, &opts);
        assert!(matches!(result, Err(IntegrateError::EvaluationError { .. })));
    }

    #[test]
    fn test_non_finite_stage_is_newton_failure() {
        // ln y is undefined below zero; the first stage iterate lands at 3 - 5.5
        let rhs = |t: f64, y: &[f64]| -> IntegrateResult<Vec<f64>> {
            let v = -y[0].ln();
            if v.is_finite() {
                Ok(vec![v])
            } else {
                Err(IntegrateError::EvaluationError {
                    at: t,
                    context: "ln of a negative state".to_string(),
                })
            }
        };
        let f0 = rhs(0.0, &[3.0]).unwrap();
        let mut stepper = Sdirk4::new(1, None).unwrap();
        let step = stepper
            .propose_step(&rhs, 0.0, &[3.0], &f0, 20.0, &options())
            .unwrap();
        assert!(!step.newton_converged);
        assert!(matches!(step.fault, Some(IntegrateError::EvaluationError { .. })));
        // The factorization is kept for a retry at the same size
        assert_eq!(stepper.nlu, 1);
    }

    #[test]
    fn test_backward_step() {
        let rhs = |_t: f64, y: &[f64]| -> IntegrateResult<Vec<f64>> { Ok(vec![-y[0]]) };
        let mut stepper = Sdirk4::new(1, None).unwrap();
        let step = stepper
            .propose_step(&rhs, 1.0, &[1.0], &[-1.0], -0.1, &options())
            .unwrap();
        assert!(step.newton_converged);
        assert!((step.t_new - 0.9).abs() < 1e-15);
        assert!((step.y_new[0] - 0.1_f64.exp()).abs() < 1e-6);
    }

    #[test]
    fn test_band_wider_than_system() {
        assert!(matches!(
            Sdirk4::new(3, Some(JacobianSpec::Banded { ml: 3, mu: 0, jac: None })),
            Err(IntegrateError::Linalg(LinalgError::InvalidBandSpec { .. }))
        ));
    }
}
