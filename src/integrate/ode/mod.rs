//! Ordinary differential equation (ODE) solvers.
//!
//! This module provides methods for solving initial value problems (IVPs)
//! of the form dy/dt = f(t, y), y(t0) = y0, forward or backward in time.
//!
//! # Available Methods
//!
//! | Method | Order | Type | Best For |
//! |--------|-------|------|----------|
//! | RK23 | 3(2) | Explicit | Low accuracy, fast |
//! | RK45 | 5(4) | Explicit | General purpose (default) |
//! | SDIRK4 | 4(3) | Implicit, L-stable | Stiff systems |
//!
//! All methods share one adaptive driver: the same step size controller,
//! failure reporting and dense output.
//!
//! # Usage
//!
//! ```
//! use numint::integrate::{solve_ivp, ODEMethod, ODEOptions};
//!
//! // Stiff relaxation towards cos(t); the Jacobian comes from finite differences
//! let opts = ODEOptions::with_method(ODEMethod::SDIRK4).tolerances(1e-6, 1e-9);
//! let result = solve_ivp(
//!     |t, y| vec![-500.0 * (y[0] - t.cos())],
//!     [0.0, 2.0],
//!     &[1.0],
//!     &opts,
//! )
//! .unwrap();
//!
//! assert!((result.y_final()[0] - 2.0_f64.cos()).abs() < 1e-2);
//! assert!(result.njev > 0);
//! ```

mod dense_output;
mod rk;
mod sdirk;
mod solver;
mod step_control;
mod types;

pub use dense_output::{DenseOutput, DenseOutputStep};
pub use solver::solve_ivp;
pub use step_control::{StepSizeController, compute_error_norm, compute_initial_step};
pub use types::{
    BandedJacobianFn, DenseJacobianFn, JacobianSpec, ODEMethod, ODEOptions, ODESolution,
    SolverStatus,
};
