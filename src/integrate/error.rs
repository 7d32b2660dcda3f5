//! Error types for numerical integration operations.

use thiserror::Error;

use super::ode::ODESolution;
use crate::linalg::LinalgError;

/// Result type for integration operations.
pub type IntegrateResult<T> = Result<T, IntegrateError>;

/// Errors that can occur during numerical integration.
///
/// Quadrature non-convergence is not an error: it is reported through
/// `QuadResult::converged`.
#[derive(Debug, Clone, Error)]
pub enum IntegrateError {
    /// Malformed input detected before any evaluation.
    #[error("invalid input: {context}")]
    InvalidInput { context: String },

    /// Interval endpoints are unusable (NaN bounds, empty time span).
    #[error("invalid interval [{a}, {b}] in {context}")]
    InvalidInterval { a: f64, b: f64, context: String },

    /// A caller closure returned NaN or infinity.
    #[error("{context}: non-finite value at {at:.6e}")]
    EvaluationError { at: f64, context: String },

    /// Step size fell below the minimum or too many consecutive rejections.
    #[error("{context}: step size {step:.2e} too small at t = {t:.6}")]
    StepSizeTooSmall { step: f64, t: f64, context: String },

    /// Maximum number of steps exceeded.
    #[error("{context}: exceeded maximum {steps} steps at t = {t:.6}")]
    MaxStepsExceeded {
        steps: usize,
        t: f64,
        context: String,
    },

    /// Newton iteration kept failing for the implicit stages.
    #[error("{context}: {failures} consecutive Newton failures at t = {t:.6}")]
    NewtonNonConvergence {
        t: f64,
        failures: usize,
        context: String,
    },

    /// A Jacobian was supplied to a method that cannot use it.
    #[error("method {method} is explicit and does not accept a Jacobian")]
    IncompatibleJacobian { method: String },

    /// The wall-clock deadline passed.
    #[error("{context}: deadline exceeded at t = {t:.6}")]
    DeadlineExceeded { t: f64, context: String },

    /// Failure in the linear algebra layer.
    #[error(transparent)]
    Linalg(#[from] LinalgError),
}

/// Hard failure of an IVP solve.
///
/// `partial` holds every step accepted before the failure. It is `None` only
/// when the failure happened during validation, before the first evaluation.
#[derive(Debug, Clone, Error)]
#[error("{kind}")]
pub struct IvpError {
    #[source]
    pub kind: IntegrateError,
    pub partial: Option<Box<ODESolution>>,
}

impl IvpError {
    pub(crate) fn without_partial(kind: IntegrateError) -> Self {
        Self {
            kind,
            partial: None,
        }
    }

    pub(crate) fn with_partial(kind: IntegrateError, partial: ODESolution) -> Self {
        Self {
            kind,
            partial: Some(Box::new(partial)),
        }
    }
}

impl From<IntegrateError> for IvpError {
    fn from(kind: IntegrateError) -> Self {
        Self::without_partial(kind)
    }
}
