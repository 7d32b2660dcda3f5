//! Types for ODE solvers.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use super::dense_output::DenseOutput;
use crate::integrate::error::{IntegrateError, IntegrateResult};
use crate::linalg::{BandedMatrix, DenseMatrix};

/// ODE solver method.
///
/// # Available Methods
///
/// | Method | Order | Stages | Use Case |
/// |--------|-------|--------|----------|
/// | RK23   | 3(2)  | 4      | Fast, lower accuracy |
/// | RK45   | 5(4)  | 7 (FSAL) | General purpose (recommended) |
/// | SDIRK4 | 4(3)  | 5 implicit | Stiff problems |
///
/// # Choosing a Method
///
/// - **RK23**: Use when speed is more important than accuracy, or for getting
///   a rough initial estimate.
/// - **RK45**: The default choice. Works well for most non-stiff problems.
/// - **SDIRK4**: Use when the explicit methods take tiny steps on a smooth
///   solution, the signature of stiffness. Supply a banded Jacobian spec for
///   large systems with local coupling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ODEMethod {
    /// Bogacki-Shampine 3(2).
    RK23,

    /// Dormand-Prince 5(4) (default).
    #[default]
    RK45,

    /// L-stable, stiffly accurate singly diagonally implicit Runge-Kutta
    /// 4(3) with γ = 1/4 (Hairer & Wanner).
    SDIRK4,
}

impl ODEMethod {
    /// Get the order of the method.
    pub fn order(&self) -> usize {
        match self {
            Self::RK23 => 3,
            Self::RK45 => 5,
            Self::SDIRK4 => 4,
        }
    }

    /// Get the error estimator order.
    pub fn error_order(&self) -> usize {
        match self {
            Self::RK23 => 2,
            Self::RK45 => 4,
            Self::SDIRK4 => 3,
        }
    }

    /// Whether each step solves a nonlinear system.
    pub fn is_implicit(&self) -> bool {
        matches!(self, Self::SDIRK4)
    }
}

impl fmt::Display for ODEMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RK23 => "RK23",
            Self::RK45 => "RK45",
            Self::SDIRK4 => "SDIRK4",
        };
        f.write_str(name)
    }
}

/// Callback filling a dense Jacobian `∂f_i/∂y_j` at `(t, y)`.
pub type DenseJacobianFn = Arc<dyn Fn(f64, &[f64], &mut DenseMatrix) + Send + Sync>;

/// Callback filling the band of a banded Jacobian at `(t, y)`.
///
/// The matrix is zeroed before each call; only in-band entries may be set.
pub type BandedJacobianFn = Arc<dyn Fn(f64, &[f64], &mut BandedMatrix) + Send + Sync>;

/// How the implicit solver obtains `∂f/∂y`.
///
/// Leaving [`ODEOptions::jacobian`] at `None` means a dense forward-difference
/// estimate.
#[derive(Clone)]
pub enum JacobianSpec {
    /// Analytic dense Jacobian.
    Dense(DenseJacobianFn),
    /// Banded Jacobian with `ml` sub- and `mu` super-diagonals. Without a
    /// callback the band is estimated with `ml + mu + 1` grouped
    /// finite-difference evaluations.
    Banded {
        ml: usize,
        mu: usize,
        jac: Option<BandedJacobianFn>,
    },
}

impl fmt::Debug for JacobianSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dense(_) => f.write_str("Dense(..)"),
            Self::Banded { ml, mu, jac } => f
                .debug_struct("Banded")
                .field("ml", ml)
                .field("mu", mu)
                .field("analytic", &jac.is_some())
                .finish(),
        }
    }
}

/// Options for ODE solvers.
#[derive(Clone)]
pub struct ODEOptions {
    /// Solver method (default: RK45)
    pub method: ODEMethod,

    /// Relative tolerance (default: 1e-3)
    pub rtol: f64,

    /// Absolute tolerance (default: 1e-6)
    pub atol: f64,

    /// Initial step size magnitude, also for backward solves
    /// (default: auto-computed)
    pub h0: Option<f64>,

    /// Maximum step size (default: the whole span)
    pub max_step: Option<f64>,

    /// Minimum step size (default: 1e-14)
    pub min_step: f64,

    /// Maximum number of step attempts (default: 10000)
    pub max_steps: usize,

    /// Maximum consecutive error-test rejections (default: 50)
    pub max_rejections: usize,

    /// Keep interpolants so the solution can be evaluated anywhere
    /// (default: false)
    pub dense_output: bool,

    /// Times at which to report the solution, inside the span and ordered
    /// in the direction of integration
    pub t_eval: Option<Vec<f64>>,

    /// Jacobian source for implicit methods
    pub jacobian: Option<JacobianSpec>,

    /// Scaled Newton correction accepted as converged (default: 1e-3)
    pub newton_tol: f64,

    /// Newton iterations per stage before the step is rejected and halved;
    /// repeated failures end the solve once the step drops below `min_step`
    /// (default: 10)
    pub max_newton_iter: usize,

    /// Wall-clock deadline, checked between step attempts
    pub deadline: Option<Instant>,
}

impl Default for ODEOptions {
    fn default() -> Self {
        Self {
            method: ODEMethod::default(),
            rtol: 1e-3,
            atol: 1e-6,
            h0: None,
            max_step: None,
            min_step: 1e-14,
            max_steps: 10000,
            max_rejections: 50,
            dense_output: false,
            t_eval: None,
            jacobian: None,
            newton_tol: 1e-3,
            max_newton_iter: 10,
            deadline: None,
        }
    }
}

impl fmt::Debug for ODEOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ODEOptions")
            .field("method", &self.method)
            .field("rtol", &self.rtol)
            .field("atol", &self.atol)
            .field("h0", &self.h0)
            .field("max_step", &self.max_step)
            .field("min_step", &self.min_step)
            .field("max_steps", &self.max_steps)
            .field("max_rejections", &self.max_rejections)
            .field("dense_output", &self.dense_output)
            .field("t_eval", &self.t_eval.as_ref().map(Vec::len))
            .field("jacobian", &self.jacobian)
            .field("newton_tol", &self.newton_tol)
            .field("max_newton_iter", &self.max_newton_iter)
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl ODEOptions {
    /// Create options with specified tolerances.
    pub fn with_tolerances(rtol: f64, atol: f64) -> Self {
        Self {
            rtol,
            atol,
            ..Default::default()
        }
    }

    /// Create options with specified method.
    pub fn with_method(method: ODEMethod) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    /// Set the method.
    pub fn method(mut self, method: ODEMethod) -> Self {
        self.method = method;
        self
    }

    /// Set the tolerances.
    pub fn tolerances(mut self, rtol: f64, atol: f64) -> Self {
        self.rtol = rtol;
        self.atol = atol;
        self
    }

    /// Set the initial step size.
    pub fn initial_step(mut self, h0: f64) -> Self {
        self.h0 = Some(h0);
        self
    }

    /// Set step size bounds.
    pub fn step_bounds(mut self, min: f64, max: f64) -> Self {
        self.min_step = min;
        self.max_step = Some(max);
        self
    }

    /// Set maximum number of step attempts.
    pub fn max_steps(mut self, n: usize) -> Self {
        self.max_steps = n;
        self
    }

    /// Set maximum consecutive error-test rejections.
    pub fn max_rejections(mut self, n: usize) -> Self {
        self.max_rejections = n;
        self
    }

    /// Keep the interpolants for [`ODESolution::sol`].
    pub fn dense_output(mut self, enabled: bool) -> Self {
        self.dense_output = enabled;
        self
    }

    /// Report the solution at these times.
    pub fn t_eval(mut self, times: Vec<f64>) -> Self {
        self.t_eval = Some(times);
        self
    }

    /// Use an analytic dense Jacobian.
    pub fn dense_jacobian<J>(mut self, jac: J) -> Self
    where
        J: Fn(f64, &[f64], &mut DenseMatrix) + Send + Sync + 'static,
    {
        self.jacobian = Some(JacobianSpec::Dense(Arc::new(jac)));
        self
    }

    /// Declare a banded Jacobian, estimated by grouped finite differences.
    pub fn banded_jacobian(mut self, ml: usize, mu: usize) -> Self {
        self.jacobian = Some(JacobianSpec::Banded { ml, mu, jac: None });
        self
    }

    /// Use an analytic banded Jacobian.
    pub fn banded_jacobian_fn<J>(mut self, ml: usize, mu: usize, jac: J) -> Self
    where
        J: Fn(f64, &[f64], &mut BandedMatrix) + Send + Sync + 'static,
    {
        self.jacobian = Some(JacobianSpec::Banded {
            ml,
            mu,
            jac: Some(Arc::new(jac)),
        });
        self
    }

    /// Set the Newton tolerance and iteration cap.
    pub fn newton(mut self, tol: f64, max_iter: usize) -> Self {
        self.newton_tol = tol;
        self.max_newton_iter = max_iter;
        self
    }

    /// Set a wall-clock deadline.
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Check the options for consistency.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrateError::InvalidInput`] naming the first bad field.
    pub fn validate(&self) -> IntegrateResult<()> {
        let invalid = |context: String| Err(IntegrateError::InvalidInput { context });

        if !(self.rtol >= 0.0 && self.rtol.is_finite()) {
            return invalid(format!("rtol must be finite and non-negative, got {}", self.rtol));
        }
        if !(self.atol > 0.0 && self.atol.is_finite()) {
            return invalid(format!("atol must be finite and positive, got {}", self.atol));
        }
        if let Some(h0) = self.h0 {
            if !(h0 > 0.0 && h0.is_finite()) {
                return invalid(format!("h0 must be finite and positive, got {h0}"));
            }
        }
        if let Some(max_step) = self.max_step {
            if !(max_step > 0.0) {
                return invalid(format!("max_step must be positive, got {max_step}"));
            }
        }
        if !(self.min_step >= 0.0 && self.min_step.is_finite()) {
            return invalid(format!("min_step must be finite and non-negative, got {}", self.min_step));
        }
        if self.max_step.is_some_and(|max| max < self.min_step) {
            return invalid("max_step must not be smaller than min_step".to_string());
        }
        if self.max_steps == 0 || self.max_rejections == 0 {
            return invalid("max_steps and max_rejections must be at least 1".to_string());
        }
        if !(self.newton_tol > 0.0 && self.newton_tol.is_finite()) {
            return invalid(format!("newton_tol must be finite and positive, got {}", self.newton_tol));
        }
        if self.max_newton_iter == 0 {
            return invalid("max_newton_iter must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Terminal state of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStatus {
    /// Reached the end of the time span.
    Completed,
    /// Stopped early; the trajectory holds every step accepted before.
    Failed,
}

/// Solution trajectory of an initial value problem.
#[derive(Debug, Clone)]
pub struct ODESolution {
    /// Accepted time points, starting at `t0`
    pub t: Vec<f64>,

    /// Solution at each accepted time point
    pub y: Vec<Vec<f64>>,

    /// Requested output times that were reached
    pub t_eval: Vec<f64>,

    /// Interpolated solution at each entry of `t_eval`
    pub y_eval: Vec<Vec<f64>>,

    /// Number of right-hand side evaluations, finite differences included
    pub nfev: usize,

    /// Number of Jacobian evaluations
    pub njev: usize,

    /// Number of LU factorizations
    pub nlu: usize,

    /// Number of accepted steps
    pub naccept: usize,

    /// Number of rejected step attempts
    pub nreject: usize,

    /// Method used
    pub method: ODEMethod,

    /// Largest scaled error norm among accepted steps (≤ 1)
    pub max_error_norm: f64,

    /// Whether the solve completed
    pub status: SolverStatus,

    pub(crate) dense: Option<DenseOutput>,
}

impl ODESolution {
    /// Whether the solve reached the end of the span.
    pub fn success(&self) -> bool {
        self.status == SolverStatus::Completed
    }

    /// Final state.
    pub fn y_final(&self) -> &[f64] {
        self.y.last().map(Vec::as_slice).unwrap_or_default()
    }

    /// Evaluate the continuous solution at `t`.
    ///
    /// Returns `None` unless the solve ran with `dense_output`, or when `t`
    /// lies outside the integrated range.
    pub fn sol(&self, t: f64) -> Option<Vec<f64>> {
        self.dense.as_ref()?.eval(t)
    }
}
