//! Volatility smiles.
//!
//! Pricers see a smile through the [`SmileFunction`] trait: a lognormal
//! volatility for any candidate strike. The replication pricer queries
//! strikes far outside quoted ranges, so implementations must return a
//! sensible extrapolated value everywhere, not just between market pillars.

use tenor_math::interpolation::LinearInterpolator;

use crate::error::{PricingError, PricingResult};

/// A volatility smile: lognormal volatility as a function of strike.
pub trait SmileFunction: Send + Sync {
    /// Volatility at `strike`.
    fn volatility(&self, strike: f64) -> f64;
}

/// A strike-independent volatility.
#[derive(Debug, Clone, Copy)]
pub struct FlatSmile {
    volatility: f64,
}

impl FlatSmile {
    /// Creates a flat smile.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::InvalidParameter`] for a negative or
    /// non-finite volatility.
    pub fn new(volatility: f64) -> PricingResult<Self> {
        if !volatility.is_finite() || volatility < 0.0 {
            return Err(PricingError::invalid_parameter(format!(
                "flat volatility must be non-negative, got {volatility}"
            )));
        }
        Ok(Self { volatility })
    }
}

impl SmileFunction for FlatSmile {
    fn volatility(&self, _strike: f64) -> f64 {
        self.volatility
    }
}

/// A smile interpolated linearly between quoted strike pillars, flat
/// beyond the outermost pillars.
#[derive(Debug, Clone)]
pub struct InterpolatedSmile {
    interpolator: LinearInterpolator,
}

impl InterpolatedSmile {
    /// Creates a smile from quoted `(strike, volatility)` pillars.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::InvalidParameter`] for fewer than two
    /// pillars, unsorted strikes or negative volatilities.
    pub fn new(strikes: Vec<f64>, volatilities: Vec<f64>) -> PricingResult<Self> {
        if volatilities.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(PricingError::invalid_parameter(
                "smile volatilities must be non-negative",
            ));
        }
        let interpolator = LinearInterpolator::new(strikes, volatilities)
            .map_err(|e| PricingError::invalid_parameter(e.to_string()))?;
        Ok(Self { interpolator })
    }
}

impl SmileFunction for InterpolatedSmile {
    fn volatility(&self, strike: f64) -> f64 {
        self.interpolator.interpolate(strike)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_flat_smile() {
        let smile = FlatSmile::new(0.25).unwrap();
        assert_relative_eq!(smile.volatility(0.01), 0.25, epsilon = 1e-15);
        assert_relative_eq!(smile.volatility(1.0), 0.25, epsilon = 1e-15);

        assert!(FlatSmile::new(-0.1).is_err());
        assert!(FlatSmile::new(f64::NAN).is_err());
    }

    #[test]
    fn test_interpolated_smile() {
        let smile =
            InterpolatedSmile::new(vec![0.02, 0.04, 0.06], vec![0.30, 0.20, 0.24]).unwrap();

        assert_relative_eq!(smile.volatility(0.03), 0.25, epsilon = 1e-12);
        // Flat wings
        assert_relative_eq!(smile.volatility(0.001), 0.30, epsilon = 1e-12);
        assert_relative_eq!(smile.volatility(0.50), 0.24, epsilon = 1e-12);
    }

    #[test]
    fn test_interpolated_smile_validation() {
        assert!(InterpolatedSmile::new(vec![0.02], vec![0.30]).is_err());
        assert!(InterpolatedSmile::new(vec![0.04, 0.02], vec![0.2, 0.3]).is_err());
        assert!(InterpolatedSmile::new(vec![0.02, 0.04], vec![0.2, -0.3]).is_err());
    }
}
