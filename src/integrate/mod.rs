//! Numerical integration and ODE solvers.
//!
//! This module provides numerical methods for:
//! - **Quadrature**: Definite integrals of functions over finite and infinite
//!   intervals, iterated integrals in several variables, and integrals of
//!   sampled data
//! - **ODE Solvers**: Initial value problem solvers for ordinary differential
//!   equations, explicit and implicit
//!
//! # Quadrature Methods
//!
//! - [`quad`] - Adaptive Gauss-Kronrod (G7-K15) quadrature
//! - [`nquad`], [`dblquad`], [`tplquad`] - Nested adaptive quadrature
//! - [`trapezoid`], [`cumulative_trapezoid`] - Trapezoidal rule on samples
//! - [`simpson`] - Simpson's rule on samples, any spacing
//! - [`romb`], [`romberg`] - Romberg integration via Richardson extrapolation
//!
//! # ODE Solvers
//!
//! - [`solve_ivp`] - Main entry point for solving initial value problems
//!
//! ## Available Methods
//!
//! - **RK23**: Bogacki-Shampine 3(2) - Low accuracy, fast
//! - **RK45**: Dormand-Prince 5(4) - General purpose (default)
//! - **SDIRK4**: L-stable implicit 4(3) - Stiff problems, dense or banded
//!   Jacobians
//!
//! # Errors
//!
//! Everything except [`solve_ivp`] returns [`IntegrateResult`]. `solve_ivp`
//! returns [`IvpError`], which wraps an [`IntegrateError`] together with the
//! trajectory accepted before the failure.
//!
//! # Example
//!
//! ```
//! use numint::integrate::{quad, QuadOptions};
//!
//! // ∫₀¹ x² dx = 1/3
//! let result = quad(|x: f64| x * x, 0.0, 1.0, &QuadOptions::default()).unwrap();
//! assert!((result.integral - 1.0 / 3.0).abs() < 1e-12);
//! ```

pub mod error;
pub mod ode;
pub mod quadrature;

pub use error::{IntegrateError, IntegrateResult, IvpError};

pub use ode::{
    JacobianSpec, ODEMethod, ODEOptions, ODESolution, SolverStatus, StepSizeController, solve_ivp,
};

pub use quadrature::{
    Bound, QuadOptions, QuadResult, RombergOptions, Subinterval, cumulative_trapezoid, dblquad,
    nquad, quad, quad_with_args, romb, romb_samples, romberg, simpson, simpson_uniform, tplquad,
    trapezoid, trapezoid_uniform,
};
