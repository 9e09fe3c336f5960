//! Error types for pricing operations.

use thiserror::Error;

/// Errors from option pricing and volatility inversion.
#[derive(Error, Debug)]
pub enum PricingError {
    /// A contract's economic fields are inconsistent.
    #[error("Invalid contract: {message}")]
    InvalidContract {
        /// Details about the offending field.
        message: String,
    },

    /// A model or market parameter is out of its admissible range.
    #[error("Invalid parameter: {message}")]
    InvalidParameter {
        /// Details about the offending parameter.
        message: String,
    },

    /// A target price sits outside its no-arbitrage bounds, so no
    /// volatility can reproduce it.
    #[error(
        "Price {price:.6e} violates no-arbitrage bounds [{lower_bound:.6e}, {upper_bound:.6e}]"
    )]
    NoArbitrageViolated {
        /// The target price.
        price: f64,
        /// Intrinsic value lower bound.
        lower_bound: f64,
        /// Upper bound implied by the payoff.
        upper_bound: f64,
    },

    /// A curve lookup or evaluation failed.
    #[error("Curve error: {0}")]
    Curve(#[from] tenor_curves::CurveError),

    /// An underlying numerical error.
    #[error("Math error: {0}")]
    Math(#[from] tenor_math::MathError),
}

impl PricingError {
    /// Creates a [`PricingError::InvalidContract`] error.
    pub fn invalid_contract(message: impl Into<String>) -> Self {
        Self::InvalidContract {
            message: message.into(),
        }
    }

    /// Creates a [`PricingError::InvalidParameter`] error.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }
}

/// Result type alias for pricing operations.
pub type PricingResult<T> = Result<T, PricingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PricingError::invalid_parameter("volatility must be non-negative");
        assert!(err.to_string().contains("volatility"));

        let err = PricingError::NoArbitrageViolated {
            price: 0.5,
            lower_bound: 0.0,
            upper_bound: 0.05,
        };
        assert!(err.to_string().contains("no-arbitrage"));
    }

    #[test]
    fn test_curve_error_conversion() {
        let curve_err = tenor_curves::CurveError::curve_not_found("USD-OIS");
        let pricing_err: PricingError = curve_err.into();
        assert!(matches!(pricing_err, PricingError::Curve(_)));
    }
}
