//! Error types for mathematical operations.

use thiserror::Error;

/// A specialized Result type for mathematical operations.
pub type MathResult<T> = Result<T, MathError>;

/// Errors that can occur during mathematical operations.
#[derive(Error, Debug, Clone)]
pub enum MathError {
    /// Scalar root-finding algorithm failed to converge.
    #[error("Convergence failed after {iterations} iterations (residual: {residual:.2e})")]
    ConvergenceFailed {
        /// Number of iterations attempted.
        iterations: u32,
        /// Final residual value.
        residual: f64,
    },

    /// Vector root-finding algorithm failed to converge.
    ///
    /// Carries the last iterate so callers can inspect where the search
    /// stalled instead of retrying blindly.
    #[error("Vector solve failed after {iterations} iterations (residual norm: {residual_norm:.2e})")]
    NonConvergence {
        /// Number of iterations attempted.
        iterations: u32,
        /// Infinity norm of the residual at the last iterate.
        residual_norm: f64,
        /// The last iterate reached before giving up.
        last_iterate: Vec<f64>,
    },

    /// Invalid bracket for root-finding.
    #[error("Invalid bracket: f({a}) = {fa:.2e} and f({b}) = {fb:.2e} have same sign")]
    InvalidBracket {
        /// Lower bound of bracket.
        a: f64,
        /// Upper bound of bracket.
        b: f64,
        /// Function value at a.
        fa: f64,
        /// Function value at b.
        fb: f64,
    },

    /// Division by zero or near-zero value.
    #[error("Division by zero or near-zero value: {value:.2e}")]
    DivisionByZero {
        /// The near-zero value.
        value: f64,
    },

    /// Matrix is singular (not invertible).
    #[error("Singular matrix: cannot solve linear system")]
    SingularMatrix,

    /// Matrix/vector dimensions are incompatible.
    #[error("Incompatible dimensions: ({rows1}x{cols1}) and ({rows2}x{cols2})")]
    DimensionMismatch {
        /// Rows in first operand.
        rows1: usize,
        /// Columns in first operand.
        cols1: usize,
        /// Rows in second operand.
        rows2: usize,
        /// Columns in second operand.
        cols2: usize,
    },

    /// A function evaluation produced NaN or infinity.
    #[error("Non-finite value at x = {x:.6e} in {context}")]
    NonFiniteValue {
        /// Point at which the function was evaluated.
        x: f64,
        /// Operation that hit the non-finite value.
        context: String,
    },

    /// Insufficient data points for operation.
    #[error("Insufficient data: need at least {required}, got {actual}")]
    InsufficientData {
        /// Minimum required points.
        required: usize,
        /// Actual number of points.
        actual: usize,
    },

    /// Invalid input parameter.
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// Description of the invalid input.
        reason: String,
    },
}

impl MathError {
    /// Creates a scalar convergence failed error.
    #[must_use]
    pub fn convergence_failed(iterations: u32, residual: f64) -> Self {
        Self::ConvergenceFailed {
            iterations,
            residual,
        }
    }

    /// Creates a vector non-convergence error.
    #[must_use]
    pub fn non_convergence(iterations: u32, residual_norm: f64, last_iterate: Vec<f64>) -> Self {
        Self::NonConvergence {
            iterations,
            residual_norm,
            last_iterate,
        }
    }

    /// Creates a non-finite value error.
    pub fn non_finite(x: f64, context: impl Into<String>) -> Self {
        Self::NonFiniteValue {
            x,
            context: context.into(),
        }
    }

    /// Creates an invalid input error.
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Creates an insufficient data error.
    #[must_use]
    pub fn insufficient_data(required: usize, actual: usize) -> Self {
        Self::InsufficientData { required, actual }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MathError::convergence_failed(100, 1e-6);
        assert!(err.to_string().contains("100 iterations"));
    }

    #[test]
    fn test_non_convergence_keeps_iterate() {
        let err = MathError::non_convergence(50, 1e-3, vec![0.04, 0.05]);
        if let MathError::NonConvergence { last_iterate, .. } = &err {
            assert_eq!(last_iterate.len(), 2);
        } else {
            panic!("Expected NonConvergence");
        }
    }
}
