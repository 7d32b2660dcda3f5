//! Error types for the linear algebra kernels.

use thiserror::Error;

/// Result type for linear algebra operations.
pub type LinalgResult<T> = Result<T, LinalgError>;

/// Errors raised while building, factorizing or solving a linear system.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LinalgError {
    /// Bandwidths or band storage are inconsistent with the system size.
    #[error("invalid band spec (ml = {ml}, mu = {mu}, n = {n}): {context}")]
    InvalidBandSpec {
        ml: usize,
        mu: usize,
        n: usize,
        context: String,
    },

    /// Operand dimensions do not agree.
    #[error("dimension mismatch: expected {expected}, got {got} ({context})")]
    DimensionMismatch {
        expected: usize,
        got: usize,
        context: String,
    },

    /// A zero pivot was met during elimination.
    #[error("matrix is singular: zero pivot in column {column}")]
    Singular { column: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LinalgError::InvalidBandSpec {
            ml: 3,
            mu: 1,
            n: 2,
            context: "ml must be below n".to_string(),
        };
        assert!(err.to_string().contains("invalid band spec"));
        assert!(err.to_string().contains("ml = 3"));

        let err = LinalgError::Singular { column: 4 };
        assert!(err.to_string().contains("column 4"));
    }
}
