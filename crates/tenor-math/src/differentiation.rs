//! Finite-difference differentiation of vector fields.
//!
//! Produces a numerical Jacobian with the same `R^n -> R^{n x n}` contract
//! as an analytic one, so the Newton solver does not care which it is
//! handed. Used both as a calibration fallback and as the cross-check in
//! Jacobian consistency tests.

use nalgebra::{DMatrix, DVector};

use crate::error::MathResult;

/// Default bump size for finite differences.
pub const DEFAULT_FD_STEP: f64 = 1e-6;

/// Finite difference scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FiniteDifferenceType {
    /// One-sided forward difference: `(f(x + h) - f(x)) / h`.
    Forward,
    /// Two-sided central difference: `(f(x + h) - f(x - h)) / 2h`.
    #[default]
    Central,
}

/// Computes Jacobians of vector fields by finite differences.
#[derive(Debug, Clone, Copy)]
pub struct VectorFieldDifferentiator {
    fd_type: FiniteDifferenceType,
    step: f64,
}

impl Default for VectorFieldDifferentiator {
    fn default() -> Self {
        Self {
            fd_type: FiniteDifferenceType::Central,
            step: DEFAULT_FD_STEP,
        }
    }
}

impl VectorFieldDifferentiator {
    /// Creates a differentiator with the given scheme and bump size.
    #[must_use]
    pub fn new(fd_type: FiniteDifferenceType, step: f64) -> Self {
        Self { fd_type, step }
    }

    /// Evaluates the Jacobian of `f` at `x`.
    ///
    /// Row `i`, column `j` holds `d f_i / d x_j`.
    ///
    /// # Errors
    ///
    /// Propagates any evaluation error from `f`.
    pub fn jacobian<F>(&self, f: &F, x: &DVector<f64>) -> MathResult<DMatrix<f64>>
    where
        F: Fn(&DVector<f64>) -> MathResult<DVector<f64>>,
    {
        match self.fd_type {
            FiniteDifferenceType::Forward => self.jacobian_forward(f, x),
            FiniteDifferenceType::Central => self.jacobian_central(f, x),
        }
    }

    fn jacobian_forward<F>(&self, f: &F, x: &DVector<f64>) -> MathResult<DMatrix<f64>>
    where
        F: Fn(&DVector<f64>) -> MathResult<DVector<f64>>,
    {
        let n = x.len();
        let h = self.step;
        let base = f(x)?;
        let mut jac = DMatrix::zeros(base.len(), n);

        for j in 0..n {
            let mut x_up = x.clone();
            x_up[j] += h;
            let f_up = f(&x_up)?;
            jac.set_column(j, &((&f_up - &base) / h));
        }

        Ok(jac)
    }

    fn jacobian_central<F>(&self, f: &F, x: &DVector<f64>) -> MathResult<DMatrix<f64>>
    where
        F: Fn(&DVector<f64>) -> MathResult<DVector<f64>>,
    {
        let n = x.len();
        let h = self.step;
        let mut jac: Option<DMatrix<f64>> = None;

        for j in 0..n {
            let mut x_up = x.clone();
            x_up[j] += h;
            let mut x_down = x.clone();
            x_down[j] -= h;

            let f_up = f(&x_up)?;
            let f_down = f(&x_down)?;
            let column = (&f_up - &f_down) / (2.0 * h);

            let m = column.len();
            jac.get_or_insert_with(|| DMatrix::zeros(m, n))
                .set_column(j, &column);
        }

        Ok(jac.unwrap_or_else(|| DMatrix::zeros(0, 0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quadratic(x: &DVector<f64>) -> MathResult<DVector<f64>> {
        Ok(DVector::from_vec(vec![x[0] * x[0] + x[1], x[0] * x[1]]))
    }

    #[test]
    fn test_central_jacobian() {
        let diff = VectorFieldDifferentiator::default();
        let x = DVector::from_vec(vec![2.0, 3.0]);

        let jac = diff.jacobian(&quadratic, &x).unwrap();

        // Analytic: [[2x0, 1], [x1, x0]]
        assert_relative_eq!(jac[(0, 0)], 4.0, epsilon = 1e-7);
        assert_relative_eq!(jac[(0, 1)], 1.0, epsilon = 1e-7);
        assert_relative_eq!(jac[(1, 0)], 3.0, epsilon = 1e-7);
        assert_relative_eq!(jac[(1, 1)], 2.0, epsilon = 1e-7);
    }

    #[test]
    fn test_forward_jacobian() {
        let diff = VectorFieldDifferentiator::new(FiniteDifferenceType::Forward, 1e-7);
        let x = DVector::from_vec(vec![2.0, 3.0]);

        let jac = diff.jacobian(&quadratic, &x).unwrap();

        // Forward differences are first order; looser tolerance
        assert_relative_eq!(jac[(0, 0)], 4.0, epsilon = 1e-5);
        assert_relative_eq!(jac[(1, 1)], 2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_rectangular_field() {
        // R^1 -> R^3
        let f = |x: &DVector<f64>| Ok(DVector::from_vec(vec![x[0], x[0] * x[0], x[0].exp()]));
        let diff = VectorFieldDifferentiator::default();
        let x = DVector::from_vec(vec![1.0]);

        let jac = diff.jacobian(&f, &x).unwrap();

        assert_eq!(jac.nrows(), 3);
        assert_eq!(jac.ncols(), 1);
        assert_relative_eq!(jac[(2, 0)], 1f64.exp(), epsilon = 1e-6);
    }
}
