//! Adaptive driver shared by every ODE method.

use std::cell::Cell;
use std::time::Instant;

use log::{debug, trace, warn};

use super::dense_output::{DenseOutput, DenseOutputStep};
use super::rk::{rk23_step, rk45_step};
use super::sdirk::Sdirk4;
use super::step_control::{StepSizeController, compute_initial_step};
use super::types::{ODEMethod, ODEOptions, ODESolution, SolverStatus};
use crate::integrate::error::{IntegrateError, IntegrateResult, IvpError};

/// Outcome of one step attempt.
#[derive(Debug, Clone)]
pub(crate) struct StepResult {
    pub t_new: f64,
    pub y_new: Vec<f64>,
    /// `f(t_new, y_new)` when the step is acceptable.
    pub f_new: Vec<f64>,
    pub error_norm: f64,
    pub newton_converged: bool,
    /// Non-finite evaluation that cut the attempt short.
    pub fault: Option<IntegrateError>,
}

impl StepResult {
    pub(crate) fn solved(t_new: f64, y_new: Vec<f64>, f_new: Vec<f64>, error_norm: f64) -> Self {
        Self {
            t_new,
            y_new,
            f_new,
            error_norm,
            newton_converged: true,
            fault: None,
        }
    }

    pub(crate) fn newton_failure(t_new: f64) -> Self {
        Self {
            t_new,
            y_new: Vec::new(),
            f_new: Vec::new(),
            error_norm: f64::INFINITY,
            newton_converged: false,
            fault: None,
        }
    }

    /// An attempt whose trial point produced NaN or infinity. The infinite
    /// error norm makes the controller shrink by its minimum factor.
    pub(crate) fn non_finite(t_new: f64, fault: IntegrateError) -> Self {
        Self {
            newton_converged: true,
            fault: Some(fault),
            ..Self::newton_failure(t_new)
        }
    }

    pub(crate) fn with_fault(mut self, fault: IntegrateError) -> Self {
        self.fault = Some(fault);
        self
    }
}

/// Turn an [`IntegrateError::EvaluationError`] raised inside a step attempt
/// into a rejected attempt built by `reject`. Other errors pass through.
pub(crate) fn reject_non_finite<F>(
    attempt: IntegrateResult<StepResult>,
    reject: F,
) -> IntegrateResult<StepResult>
where
    F: FnOnce(IntegrateError) -> StepResult,
{
    match attempt {
        Err(fault @ IntegrateError::EvaluationError { .. }) => Ok(reject(fault)),
        other => other,
    }
}

enum Stepper {
    Rk23,
    Rk45,
    Sdirk4(Box<Sdirk4>),
}

impl Stepper {
    fn new(n: usize, options: &ODEOptions) -> IntegrateResult<Self> {
        Ok(match options.method {
            ODEMethod::RK23 => Self::Rk23,
            ODEMethod::RK45 => Self::Rk45,
            ODEMethod::SDIRK4 => Self::Sdirk4(Box::new(Sdirk4::new(n, options.jacobian.clone())?)),
        })
    }

    /// `h` is signed: negative when integrating backward.
    fn propose_step<R>(
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
        match self {
            Self::Rk23 => reject_non_finite(
                rk23_step(rhs, t, y, f0, h, options.rtol, options.atol),
                |fault| StepResult::non_finite(t + h, fault),
            ),
            Self::Rk45 => reject_non_finite(
                rk45_step(rhs, t, y, f0, h, options.rtol, options.atol),
                |fault| StepResult::non_finite(t + h, fault),
            ),
            Self::Sdirk4(s) => s.propose_step(rhs, t, y, f0, h, options),
        }
    }

    fn advance(&mut self) {
        if let Self::Sdirk4(s) = self {
            s.advance();
        }
    }

    /// `(njev, nlu)`
    fn linear_algebra_counts(&self) -> (usize, usize) {
        match self {
            Self::Sdirk4(s) => (s.njev, s.nlu),
            _ => (0, 0),
        }
    }
}

/// Accepted steps collected so far.
struct Trajectory {
    t: Vec<f64>,
    y: Vec<Vec<f64>>,
    dense: Option<DenseOutput>,
    naccept: usize,
    nreject: usize,
    max_error_norm: f64,
}

impl Trajectory {
    fn new(t0: f64, y0: &[f64], keep_dense: bool) -> Self {
        Self {
            t: vec![t0],
            y: vec![y0.to_vec()],
            dense: keep_dense.then(DenseOutput::default),
            naccept: 0,
            nreject: 0,
            max_error_norm: 0.0,
        }
    }

    fn record(&mut self, t: f64, y: &[f64], error_norm: f64) {
        self.t.push(t);
        self.y.push(y.to_vec());
        self.naccept += 1;
        self.max_error_norm = self.max_error_norm.max(error_norm);
    }

    fn finish(self, status: SolverStatus, options: &ODEOptions, counts: [usize; 3]) -> ODESolution {
        let [nfev, njev, nlu] = counts;
        let mut t_eval = Vec::new();
        let mut y_eval = Vec::new();
        for &te in options.t_eval.as_deref().unwrap_or_default() {
            let value = if te == self.t[0] {
                Some(self.y[0].clone())
            } else {
                self.dense.as_ref().and_then(|d| d.eval(te))
            };
            match value {
                Some(v) => {
                    t_eval.push(te);
                    y_eval.push(v);
                }
                None => break,
            }
        }

        ODESolution {
            t: self.t,
            y: self.y,
            t_eval,
            y_eval,
            nfev,
            njev,
            nlu,
            naccept: self.naccept,
            nreject: self.nreject,
            method: options.method,
            max_error_norm: self.max_error_norm,
            status,
            dense: if options.dense_output { self.dense } else { None },
        }
    }
}

/// Solve an initial value problem.
///
/// Main entry point for ODE solving. Solves the system:
///   dy/dt = f(t, y)
///   y(t0) = y0
///
/// # Arguments
///
/// * `f` - Right-hand side function f(t, y) -> dy/dt
/// * `t_span` - Integration interval [t0, t1]; `t1 < t0` integrates backward
/// * `y0` - Initial condition
/// * `options` - Solver options
///
/// # Returns
///
/// An [`ODESolution`] containing the accepted steps, any requested `t_eval`
/// samples and diagnostics.
///
/// # Errors
///
/// Bad input fails immediately without a partial solution:
/// [`IntegrateError::InvalidInput`], [`IntegrateError::InvalidInterval`]
/// (including `t0 == t1`), [`IntegrateError::IncompatibleJacobian`] when a
/// Jacobian is given to an explicit method, and
/// [`IntegrateError::Linalg`] for a band wider than the system.
///
/// Once stepping has started, every failure carries the trajectory accepted
/// so far in [`IvpError::partial`]:
///
/// - [`IntegrateError::EvaluationError`] when a Jacobian produces NaN or
///   infinity, or when `f` keeps doing so until the step can shrink no
///   further. A non-finite value at a trial point only rejects that attempt.
/// - [`IntegrateError::StepSizeTooSmall`] after too many consecutive
///   rejections or when the step falls below `min_step`
/// - [`IntegrateError::MaxStepsExceeded`]
/// - [`IntegrateError::NewtonNonConvergence`] when halving after Newton
///   failures drives the step below `min_step`
/// - [`IntegrateError::DeadlineExceeded`]
///
/// # Example
///
/// ```
/// use numint::integrate::{solve_ivp, ODEOptions};
///
/// // Solve dy/dt = -y, y(0) = 1
/// // Exact solution: y(t) = exp(-t)
/// let result = solve_ivp(
///     |_t, y| vec![-y[0]],
///     [0.0, 5.0],
///     &[1.0],
///     &ODEOptions::default(),
/// ).unwrap();
///
/// let y_final = result.y_final()[0];
/// let exact = (-5.0_f64).exp();
/// assert!((y_final - exact).abs() < 1e-4);
/// ```
pub fn solve_ivp<F>(
    f: F,
    t_span: [f64; 2],
    y0: &[f64],
    options: &ODEOptions,
) -> Result<ODESolution, IvpError>
where
    F: Fn(f64, &[f64]) -> Vec<f64>,
{
    validate_problem(t_span, y0, options)?;

    let n = y0.len();
    let mut stepper = Stepper::new(n, options)?;

    let nfev = Cell::new(0usize);
    let rhs = |t: f64, y: &[f64]| -> IntegrateResult<Vec<f64>> {
        nfev.set(nfev.get() + 1);
        let dy = f(t, y);
        if dy.len() != n {
            return Err(IntegrateError::InvalidInput {
                context: format!(
                    "solve_ivp: right-hand side returned {} components, expected {}",
                    dy.len(),
                    n
                ),
            });
        }
        if let Some(i) = dy.iter().position(|v| !v.is_finite()) {
            return Err(IntegrateError::EvaluationError {
                at: t,
                context: format!("right-hand side component {i} is not finite"),
            });
        }
        Ok(dy)
    };

    let keep_dense = options.dense_output || options.t_eval.is_some();
    let mut trajectory = Trajectory::new(t_span[0], y0, keep_dense);
    let outcome = integrate(&rhs, &mut stepper, t_span, options, &mut trajectory);

    let (njev, nlu) = stepper.linear_algebra_counts();
    let counts = [nfev.get(), njev, nlu];
    match outcome {
        Ok(()) => {
            debug!(
                "{}: reached t = {} in {} steps ({} rejected, {} f evals, {} jacobians, {} LU)",
                options.method,
                t_span[1],
                trajectory.naccept,
                trajectory.nreject,
                counts[0],
                njev,
                nlu
            );
            Ok(trajectory.finish(SolverStatus::Completed, options, counts))
        }
        Err(kind) => {
            warn!("{}: {}", options.method, kind);
            let partial = trajectory.finish(SolverStatus::Failed, options, counts);
            Err(IvpError::with_partial(kind, partial))
        }
    }
}

fn validate_problem(t_span: [f64; 2], y0: &[f64], options: &ODEOptions) -> IntegrateResult<()> {
    options.validate()?;

    let [t0, t1] = t_span;
    if !t0.is_finite() || !t1.is_finite() || t0 == t1 {
        return Err(IntegrateError::InvalidInterval {
            a: t0,
            b: t1,
            context: "solve_ivp: need finite t0 != t1".to_string(),
        });
    }
    let direction = (t1 - t0).signum();

    if y0.is_empty() {
        return Err(IntegrateError::InvalidInput {
            context: "solve_ivp: initial condition cannot be empty".to_string(),
        });
    }
    if let Some(i) = y0.iter().position(|v| !v.is_finite()) {
        return Err(IntegrateError::InvalidInput {
            context: format!("solve_ivp: y0[{i}] is not finite"),
        });
    }

    if let Some(times) = &options.t_eval {
        let inside = |te: f64| direction * (te - t0) >= 0.0 && direction * (t1 - te) >= 0.0;
        if let Some(te) = times.iter().find(|&&te| !inside(te)) {
            return Err(IntegrateError::InvalidInput {
                context: format!("solve_ivp: t_eval entry {te} outside [{t0}, {t1}]"),
            });
        }
        if times.windows(2).any(|w| direction * (w[1] - w[0]) < 0.0) {
            return Err(IntegrateError::InvalidInput {
                context: "solve_ivp: t_eval must run from t0 towards t1".to_string(),
            });
        }
    }

    if options.jacobian.is_some() && !options.method.is_implicit() {
        return Err(IntegrateError::IncompatibleJacobian {
            method: options.method.to_string(),
        });
    }
    Ok(())
}

fn integrate<R>(
    rhs: &R,
    stepper: &mut Stepper,
    t_span: [f64; 2],
    options: &ODEOptions,
    trajectory: &mut Trajectory,
) -> IntegrateResult<()>
where
    R: Fn(f64, &[f64]) -> IntegrateResult<Vec<f64>>,
{
    let [t_start, t_end] = t_span;
    let direction = (t_end - t_start).signum();
    let method = options.method;
    let order = method.error_order();
    let controller = StepSizeController::default();
    let max_step = options.max_step.unwrap_or((t_end - t_start).abs());

    let mut t = t_start;
    let mut y = trajectory.y[0].clone();
    let mut f0 = rhs(t, &y)?;

    // Step magnitude; the sign comes from `direction`
    let mut h = match options.h0 {
        Some(h0) => h0,
        None => compute_initial_step(rhs, t, &y, &f0, order, options.rtol, options.atol, direction)?,
    };
    h = h.min(max_step).max(options.min_step);

    let mut attempts = 0;
    let mut rejections = 0;
    let mut newton_failures = 0;
    let mut rejected_last = false;

    while direction * (t_end - t) > 0.0 {
        if options.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(IntegrateError::DeadlineExceeded {
                t,
                context: format!("{method} after {attempts} step attempts"),
            });
        }
        if attempts >= options.max_steps {
            return Err(IntegrateError::MaxStepsExceeded {
                steps: attempts,
                t,
                context: method.to_string(),
            });
        }
        attempts += 1;

        // Land exactly on the end point
        let remaining = (t_end - t).abs();
        let (h_try, last) = if h >= remaining {
            (remaining, true)
        } else {
            (h, false)
        };

        let mut step = stepper.propose_step(rhs, t, &y, &f0, direction * h_try, options)?;
        let fault = step.fault.take();

        if !step.newton_converged {
            trajectory.nreject += 1;
            newton_failures += 1;
            trace!(
                "{}: Newton failure {} with h = {:.3e} at t = {}",
                method, newton_failures, h_try, t
            );
            h = 0.5 * h_try;
            rejected_last = true;
        } else {
            newton_failures = 0;
            let (h_new, accept) = controller.compute_step(h_try, step.error_norm, order);

            if accept {
                let t_new = if last { t_end } else { step.t_new };
                if let Some(dense) = trajectory.dense.as_mut() {
                    dense.push(DenseOutputStep {
                        t_old: t,
                        t_new,
                        y_old: y.clone(),
                        y_new: step.y_new.clone(),
                        f_old: f0.clone(),
                        f_new: step.f_new.clone(),
                    });
                }
                t = t_new;
                y = step.y_new;
                f0 = step.f_new;
                trajectory.record(t, &y, step.error_norm);
                stepper.advance();

                rejections = 0;
                // No growth right after a rejection
                h = if rejected_last { h_new.min(h_try) } else { h_new };
                rejected_last = false;
            } else {
                trajectory.nreject += 1;
                rejections += 1;
                rejected_last = true;
                trace!(
                    "{}: rejected h = {:.3e} at t = {} (error norm {:.3e})",
                    method, h_try, t, step.error_norm
                );
                if rejections > options.max_rejections {
                    return Err(fault.unwrap_or(IntegrateError::StepSizeTooSmall {
                        step: h_new,
                        t,
                        context: format!("{method}: {rejections} consecutive rejections"),
                    }));
                }
                h = h_new;
            }
        }

        h = h.min(max_step);
        if direction * (t_end - t) > 0.0 && h < options.min_step {
            return Err(stalled(method, t, h, options.min_step, newton_failures, fault));
        }
    }

    Ok(())
}

/// Error for a step that shrank below `min_step`, named after what drove it
/// there.
fn stalled(
    method: ODEMethod,
    t: f64,
    h: f64,
    min_step: f64,
    newton_failures: usize,
    fault: Option<IntegrateError>,
) -> IntegrateError {
    match fault {
        Some(fault) => fault,
        None if newton_failures > 0 => IntegrateError::NewtonNonConvergence {
            t,
            failures: newton_failures,
            context: format!("{method}: step fell below min_step = {min_step:e}"),
        },
        None => IntegrateError::StepSizeTooSmall {
            step: h,
            t,
            context: format!("{method}: step fell below min_step = {min_step:e}"),
        },
    }
}
