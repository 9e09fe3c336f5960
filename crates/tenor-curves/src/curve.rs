//! Continuously compounded zero curves.
//!
//! A [`YieldCurve`] maps time (in year fractions) to a zero rate and
//! exposes discount factors `exp(-r(t) * t)` and simply compounded
//! forward rates derived from them. Calibrated curves interpolate a small
//! set of node rates; flat curves carry one rate and are used as known
//! curves that calibration takes as given.

use tenor_math::interpolation::{ExtrapolationPolicy, LinearInterpolator};

use crate::error::{CurveError, CurveResult};

/// Interpolation scheme for a calibrated curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationMethod {
    /// Linear in zero rate, flat beyond the node range.
    #[default]
    LinearFlat,
    /// Linear in zero rate, slope continued beyond the node range.
    LinearExtrapolated,
}

#[derive(Debug, Clone)]
enum CurveData {
    Flat(f64),
    Interpolated(LinearInterpolator),
}

/// A continuously compounded zero curve.
///
/// # Example
///
/// ```rust
/// use tenor_curves::curve::{InterpolationMethod, YieldCurve};
///
/// let curve = YieldCurve::new(
///     vec![1.0, 2.0, 5.0],
///     vec![0.02, 0.025, 0.03],
///     InterpolationMethod::LinearFlat,
/// ).unwrap();
///
/// let df = curve.discount_factor(2.0);
/// assert!((df - (-0.025f64 * 2.0).exp()).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct YieldCurve {
    data: CurveData,
}

impl YieldCurve {
    /// Creates an interpolated curve from node times and zero rates.
    ///
    /// A single node yields a flat curve at that node's rate, which is
    /// what linear interpolation with flat extrapolation degenerates to.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::NonMonotonicTimes`] if there are no nodes,
    /// the times are not strictly increasing or a time is not positive
    /// and finite, and [`CurveError::LengthMismatch`] if the inputs
    /// disagree in length.
    pub fn new(
        times: Vec<f64>,
        zero_rates: Vec<f64>,
        method: InterpolationMethod,
    ) -> CurveResult<Self> {
        if times.len() != zero_rates.len() {
            return Err(CurveError::length_mismatch(format!(
                "{} node times but {} zero rates",
                times.len(),
                zero_rates.len()
            )));
        }
        if times.is_empty() {
            return Err(CurveError::non_monotonic("a curve needs at least one node"));
        }
        if times.iter().any(|t| !t.is_finite() || *t <= 0.0) {
            return Err(CurveError::non_monotonic(
                "node times must be positive and finite",
            ));
        }
        if times.len() == 1 {
            return Ok(Self::flat(zero_rates[0]));
        }

        let policy = match method {
            InterpolationMethod::LinearFlat => ExtrapolationPolicy::Flat,
            InterpolationMethod::LinearExtrapolated => ExtrapolationPolicy::Linear,
        };
        let interpolator = LinearInterpolator::new(times, zero_rates)
            .map_err(|e| CurveError::non_monotonic(e.to_string()))?
            .with_extrapolation(policy);

        Ok(Self {
            data: CurveData::Interpolated(interpolator),
        })
    }

    /// Creates a flat curve with a single zero rate at all maturities.
    #[must_use]
    pub fn flat(zero_rate: f64) -> Self {
        Self {
            data: CurveData::Flat(zero_rate),
        }
    }

    /// Zero rate at time `t`.
    #[must_use]
    pub fn zero_rate(&self, t: f64) -> f64 {
        match &self.data {
            CurveData::Flat(r) => *r,
            CurveData::Interpolated(interp) => interp.interpolate(t),
        }
    }

    /// Discount factor `exp(-r(t) * t)`.
    #[must_use]
    pub fn discount_factor(&self, t: f64) -> f64 {
        (-self.zero_rate(t) * t).exp()
    }

    /// Simply compounded forward rate over `[start, end]` with the given
    /// accrual fraction: `(df(start) / df(end) - 1) / accrual`.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::InvalidInstrument`] for a non-positive
    /// accrual or a reversed period.
    pub fn forward_rate(&self, start: f64, end: f64, accrual: f64) -> CurveResult<f64> {
        if accrual <= 0.0 {
            return Err(CurveError::invalid_instrument(format!(
                "accrual fraction must be positive, got {accrual}"
            )));
        }
        if end <= start {
            return Err(CurveError::invalid_instrument(format!(
                "forward period must be increasing, got [{start}, {end}]"
            )));
        }
        let ratio = self.discount_factor(start) / self.discount_factor(end);
        Ok((ratio - 1.0) / accrual)
    }

    /// Number of nodes; 1 for a flat curve.
    #[must_use]
    pub fn node_count(&self) -> usize {
        match &self.data {
            CurveData::Flat(_) => 1,
            CurveData::Interpolated(interp) => interp.len(),
        }
    }

    /// Node times of an interpolated curve; empty for a flat curve.
    #[must_use]
    pub fn node_times(&self) -> &[f64] {
        match &self.data {
            CurveData::Flat(_) => &[],
            CurveData::Interpolated(interp) => interp.xs(),
        }
    }

    /// Node zero rates of an interpolated curve; empty for a flat curve.
    #[must_use]
    pub fn node_rates(&self) -> &[f64] {
        match &self.data {
            CurveData::Flat(_) => &[],
            CurveData::Interpolated(interp) => interp.ys(),
        }
    }

    /// Sensitivity of the zero rate at `t` to each node rate.
    ///
    /// For a flat curve this is the single weight `[1.0]`.
    #[must_use]
    pub fn node_weights(&self, t: f64) -> Vec<f64> {
        match &self.data {
            CurveData::Flat(_) => vec![1.0],
            CurveData::Interpolated(interp) => interp.node_weights(t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_flat_curve() {
        let curve = YieldCurve::flat(0.05);

        assert_relative_eq!(curve.zero_rate(0.5), 0.05, epsilon = 1e-15);
        assert_relative_eq!(curve.zero_rate(30.0), 0.05, epsilon = 1e-15);
        assert_relative_eq!(
            curve.discount_factor(2.0),
            (-0.1f64).exp(),
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_interpolated_curve() {
        let curve = YieldCurve::new(
            vec![1.0, 2.0],
            vec![0.02, 0.04],
            InterpolationMethod::LinearFlat,
        )
        .unwrap();

        assert_relative_eq!(curve.zero_rate(1.5), 0.03, epsilon = 1e-15);
        // Flat beyond the last node
        assert_relative_eq!(curve.zero_rate(10.0), 0.04, epsilon = 1e-15);
    }

    #[test]
    fn test_forward_rate_flat_curve() {
        // On a flat continuously compounded curve the simple forward over
        // [s, e] is (exp(r * (e - s)) - 1) / tau
        let curve = YieldCurve::flat(0.03);
        let fwd = curve.forward_rate(1.0, 1.5, 0.5).unwrap();

        assert_relative_eq!(fwd, ((0.03f64 * 0.5).exp() - 1.0) / 0.5, epsilon = 1e-14);
    }

    #[test]
    fn test_forward_rate_validation() {
        let curve = YieldCurve::flat(0.03);

        assert!(curve.forward_rate(1.0, 1.5, 0.0).is_err());
        assert!(curve.forward_rate(1.5, 1.0, 0.5).is_err());
    }

    #[test]
    fn test_single_node_curve_is_flat() {
        // Calibrating one instrument against one node must produce a
        // usable curve: linear interpolation over a single node is flat.
        let curve =
            YieldCurve::new(vec![1.0], vec![0.03], InterpolationMethod::LinearFlat).unwrap();

        assert_relative_eq!(curve.zero_rate(0.25), 0.03, epsilon = 1e-15);
        assert_relative_eq!(curve.zero_rate(5.0), 0.03, epsilon = 1e-15);
        assert_eq!(curve.node_count(), 1);
        assert_eq!(curve.node_weights(2.0), vec![1.0]);
    }

    #[test]
    fn test_construction_validation() {
        // No nodes
        assert!(YieldCurve::new(vec![], vec![], InterpolationMethod::LinearFlat).is_err());

        // Mismatched lengths
        assert!(YieldCurve::new(
            vec![1.0, 2.0],
            vec![0.02],
            InterpolationMethod::LinearFlat
        )
        .is_err());

        // Non-increasing times
        assert!(YieldCurve::new(
            vec![2.0, 1.0],
            vec![0.02, 0.03],
            InterpolationMethod::LinearFlat
        )
        .is_err());

        // Non-positive time
        assert!(YieldCurve::new(
            vec![0.0, 1.0],
            vec![0.02, 0.03],
            InterpolationMethod::LinearFlat
        )
        .is_err());
    }

    #[test]
    fn test_node_weights() {
        let curve = YieldCurve::new(
            vec![1.0, 2.0, 3.0],
            vec![0.02, 0.03, 0.04],
            InterpolationMethod::LinearFlat,
        )
        .unwrap();

        let w = curve.node_weights(2.5);
        assert_relative_eq!(w[1], 0.5, epsilon = 1e-12);
        assert_relative_eq!(w[2], 0.5, epsilon = 1e-12);
    }
}
