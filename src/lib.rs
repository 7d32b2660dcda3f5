//! # numint
//!
//! Numerical integration for Rust: adaptive quadrature, nested
//! multi-dimensional quadrature, sampled-data rules and adaptive
//! initial value problem solvers.
//!
//! ## Modules
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`integrate`] | Quadrature (adaptive, nested, trapezoid, Simpson, Romberg) and ODE solvers |
//! | [`linalg`] | Banded and dense LU factorizations used by the implicit ODE solver |
//! | [`common`] | Finite-difference Jacobians shared by the ODE solvers |
//!
//! ## Example
//!
//! ```
//! use numint::integrate::{QuadOptions, quad};
//!
//! let result = quad(|x: f64| x.sin(), 0.0, std::f64::consts::PI, &QuadOptions::default()).unwrap();
//! assert!(result.converged);
//! assert!((result.integral - 2.0).abs() < 1e-10);
//! ```
//!
//! ## Logging
//!
//! The crate reports non-convergence, step rejections and solver failures
//! through the [`log`] facade. Install any `log`-compatible logger to see them.

pub mod common;
pub mod integrate;
pub mod linalg;
