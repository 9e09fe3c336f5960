//! Newton root finder for vector-valued functions.

use nalgebra::{DMatrix, DVector};

use crate::error::{MathError, MathResult};
use crate::linear_algebra::solve_linear_system;

/// Configuration for the vector Newton solver.
#[derive(Debug, Clone, Copy)]
pub struct VectorSolverConfig {
    /// Tolerance on the infinity norm of the residual.
    pub tolerance: f64,
    /// Maximum number of Newton iterations.
    pub max_iterations: u32,
    /// Step damping factor in `(0, 1]`; 1.0 is the pure Newton step.
    pub damping: f64,
}

impl Default for VectorSolverConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-12,
            max_iterations: 100,
            damping: 1.0,
        }
    }
}

impl VectorSolverConfig {
    /// Sets the residual tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the maximum iterations.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the damping factor.
    #[must_use]
    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = damping;
        self
    }
}

/// Result of a vector root-finding iteration.
#[derive(Debug, Clone)]
pub struct VectorSolverResult {
    /// The root found.
    pub root: DVector<f64>,
    /// Number of iterations used.
    pub iterations: u32,
    /// Infinity norm of the residual at the root.
    pub residual_norm: f64,
}

/// Newton root finder for systems `F(x) = 0`, `F: R^n -> R^n`.
///
/// Each step solves the linear system `J(x_k) * delta = -F(x_k)` and
/// updates `x_{k+1} = x_k + damping * delta`, terminating when the
/// residual infinity norm falls below tolerance.
///
/// The Jacobian provider is any `R^n -> R^{n x n}` function: analytic
/// sensitivities and the finite-difference Jacobian from
/// [`crate::differentiation`] are interchangeable.
///
/// # Example
///
/// ```rust
/// use nalgebra::{DMatrix, DVector};
/// use tenor_math::solvers::{NewtonVectorSolver, VectorSolverConfig};
///
/// // Solve x0^2 + x1^2 = 2, x0 - x1 = 0 (root at (1, 1))
/// let f = |x: &DVector<f64>| {
///     Ok(DVector::from_vec(vec![
///         x[0] * x[0] + x[1] * x[1] - 2.0,
///         x[0] - x[1],
///     ]))
/// };
/// let jac = |x: &DVector<f64>| {
///     Ok(DMatrix::from_row_slice(2, 2, &[2.0 * x[0], 2.0 * x[1], 1.0, -1.0]))
/// };
///
/// let solver = NewtonVectorSolver::new(VectorSolverConfig::default());
/// let result = solver
///     .find_root(f, jac, &DVector::from_vec(vec![2.0, 0.5]))
///     .unwrap();
/// assert!((result.root[0] - 1.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct NewtonVectorSolver {
    config: VectorSolverConfig,
}

impl NewtonVectorSolver {
    /// Creates a solver with the given configuration.
    #[must_use]
    pub fn new(config: VectorSolverConfig) -> Self {
        Self { config }
    }

    /// Returns the solver configuration.
    #[must_use]
    pub fn config(&self) -> &VectorSolverConfig {
        &self.config
    }

    /// Finds `x` such that `||F(x)||_inf` is below tolerance.
    ///
    /// # Errors
    ///
    /// - [`MathError::SingularMatrix`] if the Jacobian cannot be factored
    /// - [`MathError::NonConvergence`] after the iteration cap, carrying
    ///   the last iterate and residual norm
    /// - [`MathError::NonFiniteValue`] if `F` produces NaN or infinity
    pub fn find_root<F, J>(
        &self,
        f: F,
        jacobian: J,
        x0: &DVector<f64>,
    ) -> MathResult<VectorSolverResult>
    where
        F: Fn(&DVector<f64>) -> MathResult<DVector<f64>>,
        J: Fn(&DVector<f64>) -> MathResult<DMatrix<f64>>,
    {
        let n = x0.len();
        if n == 0 {
            return Err(MathError::invalid_input("Empty starting vector"));
        }

        let mut x = x0.clone();
        let mut fx = f(&x)?;
        self.check_finite(&fx)?;
        let mut residual = fx.amax();

        if residual < self.config.tolerance {
            return Ok(VectorSolverResult {
                root: x,
                iterations: 0,
                residual_norm: residual,
            });
        }

        for iteration in 0..self.config.max_iterations {
            let jac = jacobian(&x)?;
            if jac.nrows() != n || jac.ncols() != n {
                return Err(MathError::DimensionMismatch {
                    rows1: jac.nrows(),
                    cols1: jac.ncols(),
                    rows2: n,
                    cols2: 1,
                });
            }

            // J * delta = -F
            let delta = solve_linear_system(&jac, &(-&fx))?;
            x += self.config.damping * delta;

            fx = f(&x)?;
            self.check_finite(&fx)?;
            residual = fx.amax();

            if residual < self.config.tolerance {
                return Ok(VectorSolverResult {
                    root: x,
                    iterations: iteration + 1,
                    residual_norm: residual,
                });
            }
        }

        Err(MathError::non_convergence(
            self.config.max_iterations,
            residual,
            x.iter().copied().collect(),
        ))
    }

    fn check_finite(&self, fx: &DVector<f64>) -> MathResult<()> {
        if let Some(i) = fx.iter().position(|v| !v.is_finite()) {
            return Err(MathError::non_finite(
                fx[i],
                format!("vector residual component {i}"),
            ));
        }
        Ok(())
    }
}
