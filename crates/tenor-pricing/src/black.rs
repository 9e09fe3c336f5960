//! Black (1976) forward option pricing and implied volatility.
//!
//! Prices are undiscounted and quoted on the forward: callers scale by
//! the discount factor, notional and accrual themselves. The implied
//! volatility inversion brackets the root with bisection, which is slower
//! than a Newton iteration off vega but never escapes the bracket in the
//! flat-vega wings.

use statrs::distribution::{ContinuousCDF, Normal};
use std::sync::OnceLock;

use tenor_math::solvers::{bisection, SolverConfig};

use crate::error::{PricingError, PricingResult};

/// Upper end of the implied volatility search bracket.
pub const MAX_IMPLIED_VOLATILITY: f64 = 10.0;

/// Residual tolerance for the implied volatility inversion.
const IMPLIED_VOL_TOLERANCE: f64 = 1e-12;

/// Iteration cap for the inversion. Far beyond what halving the bracket
/// needs; hitting it means the target was unpriceable.
const IMPLIED_VOL_MAX_ITERATIONS: u32 = 10_000;

fn standard_normal() -> &'static Normal {
    static NORMAL: OnceLock<Normal> = OnceLock::new();
    NORMAL.get_or_init(|| Normal::new(0.0, 1.0).expect("unit normal parameters are valid"))
}

/// Standard normal cumulative distribution function.
#[must_use]
pub fn norm_cdf(x: f64) -> f64 {
    standard_normal().cdf(x)
}

/// Standard normal density.
#[must_use]
pub fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * std::f64::consts::PI).sqrt()
}

/// Undiscounted Black price of a forward option.
///
/// # Example
///
/// ```rust
/// use tenor_pricing::black::black_price;
///
/// let price = black_price(0.05, 0.05, 1.0, 0.20, true).unwrap();
/// // ATM forward call is worth about 0.4 vol * sqrt(T) * F / sqrt(2 pi)
/// assert!((price - 0.05 * 0.0797).abs() < 1e-4);
/// ```
///
/// # Errors
///
/// Returns [`PricingError::InvalidParameter`] for a non-positive forward,
/// negative strike, negative expiry or negative volatility.
pub fn black_price(
    forward: f64,
    strike: f64,
    expiry: f64,
    volatility: f64,
    is_call: bool,
) -> PricingResult<f64> {
    validate_inputs(forward, strike, expiry, volatility)?;
    Ok(price_unchecked(forward, strike, expiry, volatility, is_call))
}

/// Black vega: sensitivity of the undiscounted price to volatility.
///
/// # Errors
///
/// Returns [`PricingError::InvalidParameter`] for inputs outside the
/// lognormal model's domain.
pub fn black_vega(forward: f64, strike: f64, expiry: f64, volatility: f64) -> PricingResult<f64> {
    validate_inputs(forward, strike, expiry, volatility)?;
    let sigma_root_t = volatility * expiry.sqrt();
    if strike <= 0.0 || sigma_root_t <= 0.0 {
        return Ok(0.0);
    }
    let d1 = ((forward / strike).ln() + 0.5 * sigma_root_t * sigma_root_t) / sigma_root_t;
    Ok(forward * norm_pdf(d1) * expiry.sqrt())
}

/// Inverts the Black formula for the volatility reproducing `price`.
///
/// The root is bracketed in `[0, MAX_IMPLIED_VOLATILITY]` and found by
/// bisection. A price exactly at intrinsic value returns zero volatility.
///
/// # Errors
///
/// - [`PricingError::NoArbitrageViolated`] if the price lies outside the
///   payoff's bounds
/// - [`PricingError::InvalidParameter`] for bad market inputs
pub fn implied_volatility(
    forward: f64,
    strike: f64,
    expiry: f64,
    price: f64,
    is_call: bool,
) -> PricingResult<f64> {
    validate_inputs(forward, strike, expiry, 0.0)?;
    if strike <= 0.0 || expiry <= 0.0 {
        return Err(PricingError::invalid_parameter(
            "implied volatility needs a positive strike and expiry",
        ));
    }
    if !price.is_finite() {
        return Err(PricingError::invalid_parameter("price must be finite"));
    }

    let intrinsic = if is_call {
        (forward - strike).max(0.0)
    } else {
        (strike - forward).max(0.0)
    };
    let upper_bound = if is_call { forward } else { strike };
    if price < intrinsic || price >= upper_bound {
        return Err(PricingError::NoArbitrageViolated {
            price,
            lower_bound: intrinsic,
            upper_bound,
        });
    }
    if price == intrinsic {
        return Ok(0.0);
    }

    let objective = |vol: f64| price_unchecked(forward, strike, expiry, vol, is_call) - price;
    let config = SolverConfig::default()
        .with_tolerance(IMPLIED_VOL_TOLERANCE)
        .with_max_iterations(IMPLIED_VOL_MAX_ITERATIONS);
    let result = bisection(&objective, 0.0, MAX_IMPLIED_VOLATILITY, &config)?;
    Ok(result.root)
}

/// Core Black formula without input validation; callers have already
/// checked the domain.
pub(crate) fn price_unchecked(
    forward: f64,
    strike: f64,
    expiry: f64,
    volatility: f64,
    is_call: bool,
) -> f64 {
    if strike <= 0.0 {
        return if is_call { forward - strike } else { 0.0 };
    }
    let sigma_root_t = volatility * expiry.sqrt();
    if sigma_root_t <= 0.0 {
        return if is_call {
            (forward - strike).max(0.0)
        } else {
            (strike - forward).max(0.0)
        };
    }

    let d1 = ((forward / strike).ln() + 0.5 * sigma_root_t * sigma_root_t) / sigma_root_t;
    let d2 = d1 - sigma_root_t;
    if is_call {
        forward * norm_cdf(d1) - strike * norm_cdf(d2)
    } else {
        strike * norm_cdf(-d2) - forward * norm_cdf(-d1)
    }
}

fn validate_inputs(forward: f64, strike: f64, expiry: f64, volatility: f64) -> PricingResult<()> {
    if !(forward.is_finite() && strike.is_finite() && expiry.is_finite() && volatility.is_finite())
    {
        return Err(PricingError::invalid_parameter(
            "pricing inputs must be finite",
        ));
    }
    if forward <= 0.0 {
        return Err(PricingError::invalid_parameter(format!(
            "forward must be positive, got {forward}"
        )));
    }
    if strike < 0.0 {
        return Err(PricingError::invalid_parameter(format!(
            "strike must be non-negative, got {strike}"
        )));
    }
    if expiry < 0.0 {
        return Err(PricingError::invalid_parameter(format!(
            "expiry must be non-negative, got {expiry}"
        )));
    }
    if volatility < 0.0 {
        return Err(PricingError::invalid_parameter(format!(
            "volatility must be non-negative, got {volatility}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_put_call_parity() {
        let (f, k, t, vol) = (0.045, 0.05, 2.0, 0.25);
        let call = black_price(f, k, t, vol, true).unwrap();
        let put = black_price(f, k, t, vol, false).unwrap();

        assert_relative_eq!(call - put, f - k, epsilon = 1e-14);
    }

    #[test]
    fn test_intrinsic_at_zero_vol() {
        assert_relative_eq!(
            black_price(0.06, 0.05, 1.0, 0.0, true).unwrap(),
            0.01,
            epsilon = 1e-15
        );
        assert_relative_eq!(
            black_price(0.06, 0.05, 1.0, 0.0, false).unwrap(),
            0.0,
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_zero_strike_call_is_forward() {
        assert_relative_eq!(
            black_price(0.05, 0.0, 1.0, 0.3, true).unwrap(),
            0.05,
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(black_price(-0.05, 0.05, 1.0, 0.2, true).is_err());
        assert!(black_price(0.05, -0.01, 1.0, 0.2, true).is_err());
        assert!(black_price(0.05, 0.05, -1.0, 0.2, true).is_err());
        assert!(black_price(0.05, 0.05, 1.0, -0.2, true).is_err());
        assert!(black_price(f64::NAN, 0.05, 1.0, 0.2, true).is_err());
    }

    #[test]
    fn test_implied_volatility_round_trip() {
        let (f, k, t, vol) = (0.05, 0.05, 1.0, 0.20);
        let price = black_price(f, k, t, vol, true).unwrap();

        let implied = implied_volatility(f, k, t, price, true).unwrap();

        assert_relative_eq!(implied, vol, epsilon = 1e-10);
    }

    #[test]
    fn test_implied_volatility_wings() {
        let (f, t, vol) = (0.05, 0.5, 0.35);
        for k in [0.01, 0.03, 0.05, 0.08, 0.15] {
            let price = black_price(f, k, t, vol, false).unwrap();
            // Skip wings priced below the inversion tolerance. The
            // tolerance bounds the price residual, so in the low-vega
            // wings the vol error it allows is tolerance / vega.
            if price > 1e-8 {
                let implied = implied_volatility(f, k, t, price, false).unwrap();
                let vega = black_vega(f, k, t, vol).unwrap();
                let vol_tolerance = (2.0 * IMPLIED_VOL_TOLERANCE / vega).max(1e-10);
                assert_relative_eq!(implied, vol, epsilon = vol_tolerance);
            }
        }
    }

    #[test]
    fn test_no_arbitrage_bounds() {
        // Below intrinsic
        assert!(matches!(
            implied_volatility(0.06, 0.05, 1.0, 0.005, true),
            Err(PricingError::NoArbitrageViolated { .. })
        ));
        // Above the forward
        assert!(matches!(
            implied_volatility(0.05, 0.05, 1.0, 0.06, true),
            Err(PricingError::NoArbitrageViolated { .. })
        ));
    }

    #[test]
    fn test_price_at_intrinsic_gives_zero_vol() {
        let implied = implied_volatility(0.06, 0.05, 1.0, 0.01, true).unwrap();
        assert_eq!(implied, 0.0);
    }

    #[test]
    fn test_vega_matches_bump() {
        let (f, k, t, vol) = (0.05, 0.045, 1.5, 0.22);
        let vega = black_vega(f, k, t, vol).unwrap();

        let bump = 1e-6;
        let up = black_price(f, k, t, vol + bump, true).unwrap();
        let down = black_price(f, k, t, vol - bump, true).unwrap();

        assert_relative_eq!(vega, (up - down) / (2.0 * bump), epsilon = 1e-7);
    }
}
