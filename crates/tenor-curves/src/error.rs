//! Error types for curve construction and calibration.

use thiserror::Error;

/// Errors from curve construction, lookup and calibration.
#[derive(Error, Debug)]
pub enum CurveError {
    /// A curve name was requested that the bundle does not hold.
    #[error("Curve not found: {name}")]
    CurveNotFound {
        /// The missing curve name.
        name: String,
    },

    /// No discount curve is registered for a currency.
    #[error("No discount curve registered for currency {currency}")]
    DiscountNotRegistered {
        /// The currency code.
        currency: String,
    },

    /// No projection curve is registered for an index.
    #[error("No projection curve registered for index {index}")]
    IndexNotRegistered {
        /// The index name.
        index: String,
    },

    /// Two curves were given the same name.
    #[error("Duplicate curve name: {name}")]
    DuplicateCurve {
        /// The repeated curve name.
        name: String,
    },

    /// More calibration parameters than instruments.
    #[error("Underdetermined system: {nodes} curve nodes but only {instruments} instruments")]
    Underdetermined {
        /// Total node count across all curves being fitted.
        nodes: usize,
        /// Number of calibration instruments.
        instruments: usize,
    },

    /// Curve node times are not strictly increasing.
    #[error("Curve node times must be strictly increasing: {message}")]
    NonMonotonicTimes {
        /// Details about the offending input.
        message: String,
    },

    /// Two parallel inputs disagree in length.
    #[error("Length mismatch: {message}")]
    LengthMismatch {
        /// Details about the mismatched inputs.
        message: String,
    },

    /// An instrument's economic fields are inconsistent.
    #[error("Invalid instrument: {message}")]
    InvalidInstrument {
        /// Details about the offending field.
        message: String,
    },

    /// A calibration request with nothing to fit.
    #[error("Empty calibration request: {message}")]
    EmptyRequest {
        /// What was missing.
        message: String,
    },

    /// The root finder stopped without meeting tolerance.
    #[error(
        "Calibration failed after {iterations} iterations (residual {residual:.3e}): {message}"
    )]
    CalibrationFailure {
        /// Iterations performed.
        iterations: usize,
        /// Residual norm at the last iterate.
        residual: f64,
        /// Further context.
        message: String,
    },

    /// An underlying numerical error.
    #[error("Math error: {0}")]
    Math(#[from] tenor_math::MathError),
}

impl CurveError {
    /// Creates a [`CurveError::CurveNotFound`] error.
    pub fn curve_not_found(name: impl Into<String>) -> Self {
        Self::CurveNotFound { name: name.into() }
    }

    /// Creates a [`CurveError::NonMonotonicTimes`] error.
    pub fn non_monotonic(message: impl Into<String>) -> Self {
        Self::NonMonotonicTimes {
            message: message.into(),
        }
    }

    /// Creates a [`CurveError::LengthMismatch`] error.
    pub fn length_mismatch(message: impl Into<String>) -> Self {
        Self::LengthMismatch {
            message: message.into(),
        }
    }

    /// Creates a [`CurveError::InvalidInstrument`] error.
    pub fn invalid_instrument(message: impl Into<String>) -> Self {
        Self::InvalidInstrument {
            message: message.into(),
        }
    }

    /// Creates a [`CurveError::EmptyRequest`] error.
    pub fn empty_request(message: impl Into<String>) -> Self {
        Self::EmptyRequest {
            message: message.into(),
        }
    }
}

/// Result type alias for curve operations.
pub type CurveResult<T> = Result<T, CurveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CurveError::curve_not_found("USD-OIS");
        assert_eq!(err.to_string(), "Curve not found: USD-OIS");

        let err = CurveError::Underdetermined {
            nodes: 5,
            instruments: 3,
        };
        assert!(err.to_string().contains("5 curve nodes"));
        assert!(err.to_string().contains("3 instruments"));
    }

    #[test]
    fn test_math_error_conversion() {
        let math_err = tenor_math::MathError::SingularMatrix;
        let curve_err: CurveError = math_err.into();
        assert!(matches!(curve_err, CurveError::Math(_)));
    }
}
