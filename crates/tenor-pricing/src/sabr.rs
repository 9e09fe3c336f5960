//! SABR lognormal volatility (Hagan et al. 2002).
//!
//! The standard asymptotic expansion of the SABR model's lognormal
//! implied volatility. Used as a parametric smile behind the replication
//! pricer, where its smooth wings matter more than its quoted-pillar fit.

use crate::error::{PricingError, PricingResult};
use crate::smile::SmileFunction;

/// Threshold below which the ATM expansion replaces the general formula.
const ATM_CUTOFF: f64 = 1e-12;

/// A SABR smile at a fixed forward and expiry.
///
/// # Example
///
/// ```rust
/// use tenor_pricing::sabr::SabrSmile;
/// use tenor_pricing::smile::SmileFunction;
///
/// let smile = SabrSmile::new(0.04, 0.5, -0.3, 0.4, 0.05, 2.0).unwrap();
/// let atm = smile.volatility(0.05);
/// assert!(atm > 0.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SabrSmile {
    alpha: f64,
    beta: f64,
    rho: f64,
    nu: f64,
    forward: f64,
    expiry: f64,
}

impl SabrSmile {
    /// Creates a SABR smile.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::InvalidParameter`] unless `alpha > 0`,
    /// `beta` is in `[0, 1]`, `rho` is in `(-1, 1)`, `nu >= 0`, and the
    /// forward and expiry are positive.
    pub fn new(
        alpha: f64,
        beta: f64,
        rho: f64,
        nu: f64,
        forward: f64,
        expiry: f64,
    ) -> PricingResult<Self> {
        if !alpha.is_finite() || alpha <= 0.0 {
            return Err(PricingError::invalid_parameter(format!(
                "SABR alpha must be positive, got {alpha}"
            )));
        }
        if !(0.0..=1.0).contains(&beta) {
            return Err(PricingError::invalid_parameter(format!(
                "SABR beta must be in [0, 1], got {beta}"
            )));
        }
        if !rho.is_finite() || rho.abs() >= 1.0 {
            return Err(PricingError::invalid_parameter(format!(
                "SABR rho must be in (-1, 1), got {rho}"
            )));
        }
        if !nu.is_finite() || nu < 0.0 {
            return Err(PricingError::invalid_parameter(format!(
                "SABR nu must be non-negative, got {nu}"
            )));
        }
        if !forward.is_finite() || forward <= 0.0 || !expiry.is_finite() || expiry <= 0.0 {
            return Err(PricingError::invalid_parameter(
                "SABR forward and expiry must be positive",
            ));
        }
        Ok(Self {
            alpha,
            beta,
            rho,
            nu,
            forward,
            expiry,
        })
    }

    /// The expiry-dependent correction factor shared by the ATM and
    /// general formulas.
    fn correction(&self, fk_pow: f64) -> f64 {
        let omb = 1.0 - self.beta;
        1.0 + self.expiry
            * (omb * omb / 24.0 * self.alpha * self.alpha / (fk_pow * fk_pow)
                + self.rho * self.beta * self.nu * self.alpha / (4.0 * fk_pow)
                + (2.0 - 3.0 * self.rho * self.rho) / 24.0 * self.nu * self.nu)
    }
}

impl SmileFunction for SabrSmile {
    fn volatility(&self, strike: f64) -> f64 {
        // Replication queries strikes down to a tiny fraction of the
        // contract strike; keep the log-moneyness defined there.
        let strike = strike.max(ATM_CUTOFF * self.forward);
        let omb = 1.0 - self.beta;

        if (strike - self.forward).abs() < ATM_CUTOFF * self.forward {
            let f_pow = self.forward.powf(omb);
            return self.alpha / f_pow * self.correction(f_pow);
        }

        let ln_fk = (self.forward / strike).ln();
        let fk_pow = (self.forward * strike).powf(0.5 * omb);
        let denominator = fk_pow
            * (1.0
                + omb * omb / 24.0 * ln_fk * ln_fk
                + omb.powi(4) / 1920.0 * ln_fk.powi(4));

        let z = self.nu / self.alpha * fk_pow * ln_fk;
        let z_over_x = if z.abs() < ATM_CUTOFF {
            1.0
        } else {
            let x = (((1.0 - 2.0 * self.rho * z + z * z).sqrt() + z - self.rho)
                / (1.0 - self.rho))
                .ln();
            z / x
        };

        self.alpha / denominator * z_over_x * self.correction(fk_pow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parameter_validation() {
        assert!(SabrSmile::new(0.0, 0.5, 0.0, 0.3, 0.05, 1.0).is_err());
        assert!(SabrSmile::new(0.04, 1.5, 0.0, 0.3, 0.05, 1.0).is_err());
        assert!(SabrSmile::new(0.04, 0.5, 1.0, 0.3, 0.05, 1.0).is_err());
        assert!(SabrSmile::new(0.04, 0.5, 0.0, -0.3, 0.05, 1.0).is_err());
        assert!(SabrSmile::new(0.04, 0.5, 0.0, 0.3, -0.05, 1.0).is_err());
        assert!(SabrSmile::new(0.04, 0.5, 0.0, 0.3, 0.05, 2.0).is_ok());
    }

    #[test]
    fn test_atm_continuity() {
        let smile = SabrSmile::new(0.04, 0.5, -0.25, 0.4, 0.05, 2.0).unwrap();

        let atm = smile.volatility(0.05);
        let near = smile.volatility(0.05 * (1.0 + 1e-7));

        assert_relative_eq!(atm, near, max_relative = 1e-5);
    }

    #[test]
    fn test_lognormal_degenerate_case() {
        // beta = 1 and nu = 0 collapse SABR to flat Black volatility alpha
        let smile = SabrSmile::new(0.20, 1.0, 0.0, 0.0, 0.05, 1.0).unwrap();

        for strike in [0.01, 0.03, 0.05, 0.10] {
            assert_relative_eq!(smile.volatility(strike), 0.20, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_negative_rho_skew() {
        // Negative correlation tilts volatility up at low strikes
        let smile = SabrSmile::new(0.04, 0.5, -0.5, 0.5, 0.05, 1.0).unwrap();

        assert!(smile.volatility(0.03) > smile.volatility(0.05));
    }
}
