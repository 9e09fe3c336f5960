//! One-dimensional interpolation.
//!
//! Curve calibration only needs linear interpolation over a small set of
//! knots, but it needs two things a plain interpolator does not usually
//! expose: an explicit extrapolation policy (calibrated curves are queried
//! slightly outside their node range) and the sensitivity of the
//! interpolated value to each node value, which the analytic calibration
//! Jacobian projects instrument sensitivities through.

use crate::error::{MathError, MathResult};

/// Extrapolation policy beyond the knot range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtrapolationPolicy {
    /// Hold the boundary value constant.
    #[default]
    Flat,
    /// Continue the boundary segment's slope.
    Linear,
}

/// Linear interpolation between data points.
///
/// # Example
///
/// ```rust
/// use tenor_math::interpolation::LinearInterpolator;
///
/// let xs = vec![0.0, 1.0, 2.0, 3.0];
/// let ys = vec![0.0, 1.0, 4.0, 9.0];
///
/// let interp = LinearInterpolator::new(xs, ys).unwrap();
/// let y = interp.interpolate(1.5);
/// // y = 2.5 (linear interpolation between (1, 1) and (2, 4))
/// ```
#[derive(Debug, Clone)]
pub struct LinearInterpolator {
    xs: Vec<f64>,
    ys: Vec<f64>,
    extrapolation: ExtrapolationPolicy,
}

impl LinearInterpolator {
    /// Creates a new linear interpolator with flat extrapolation.
    ///
    /// # Arguments
    ///
    /// * `xs` - X coordinates (must be strictly increasing)
    /// * `ys` - Y coordinates
    ///
    /// # Errors
    ///
    /// Returns an error on fewer than 2 points, mismatched lengths, or
    /// non-increasing x values.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> MathResult<Self> {
        if xs.len() < 2 {
            return Err(MathError::insufficient_data(2, xs.len()));
        }
        if xs.len() != ys.len() {
            return Err(MathError::invalid_input(format!(
                "xs and ys must have same length: {} vs {}",
                xs.len(),
                ys.len()
            )));
        }
        for i in 1..xs.len() {
            if xs[i] <= xs[i - 1] {
                return Err(MathError::invalid_input(
                    "x values must be strictly increasing",
                ));
            }
        }

        Ok(Self {
            xs,
            ys,
            extrapolation: ExtrapolationPolicy::Flat,
        })
    }

    /// Sets the extrapolation policy.
    #[must_use]
    pub fn with_extrapolation(mut self, policy: ExtrapolationPolicy) -> Self {
        self.extrapolation = policy;
        self
    }

    /// Number of knots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    /// Returns true if the interpolator has no knots (never, by construction).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Knot abscissae.
    #[must_use]
    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    /// Knot values.
    #[must_use]
    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    /// Finds the index i such that xs[i] <= x < xs[i+1].
    fn find_segment(&self, x: f64) -> usize {
        match self
            .xs
            .binary_search_by(|probe| probe.partial_cmp(&x).unwrap_or(std::cmp::Ordering::Equal))
        {
            Ok(i) => i.min(self.xs.len() - 2),
            Err(i) => (i.saturating_sub(1)).min(self.xs.len() - 2),
        }
    }

    /// Evaluates the interpolant at `x`.
    #[must_use]
    pub fn interpolate(&self, x: f64) -> f64 {
        let n = self.xs.len();

        if self.extrapolation == ExtrapolationPolicy::Flat {
            if x <= self.xs[0] {
                return self.ys[0];
            }
            if x >= self.xs[n - 1] {
                return self.ys[n - 1];
            }
        }

        let i = self.find_segment(x);
        let t = (x - self.xs[i]) / (self.xs[i + 1] - self.xs[i]);
        self.ys[i] + t * (self.ys[i + 1] - self.ys[i])
    }

    /// Sensitivity of the interpolated value at `x` to each node value.
    ///
    /// Returns the weight vector `w` with `y(x) = sum_k w[k] * ys[k]`.
    /// For linear interpolation these are hat functions: at most two
    /// entries are non-zero, and outside the knot range the policy decides
    /// which nodes carry the weight.
    #[must_use]
    pub fn node_weights(&self, x: f64) -> Vec<f64> {
        let n = self.xs.len();
        let mut weights = vec![0.0; n];

        if self.extrapolation == ExtrapolationPolicy::Flat {
            if x <= self.xs[0] {
                weights[0] = 1.0;
                return weights;
            }
            if x >= self.xs[n - 1] {
                weights[n - 1] = 1.0;
                return weights;
            }
        }

        let i = self.find_segment(x);
        let t = (x - self.xs[i]) / (self.xs[i + 1] - self.xs[i]);
        weights[i] = 1.0 - t;
        weights[i + 1] = t;
        weights
    }
}
