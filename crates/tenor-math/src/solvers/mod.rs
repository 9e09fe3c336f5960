//! Root-finding algorithms.
//!
//! This module provides the two solvers the rates core is built on:
//!
//! - [`bisection`]: scalar bracketing solver, used to invert option prices
//!   into implied volatilities
//! - [`NewtonVectorSolver`]: damped Newton iteration for `F(x) = 0` in
//!   `R^n`, used by the curve calibration engine
//!
//! The vector solver is agnostic to how its Jacobian is produced: an
//! analytic `R^n -> R^{n x n}` function and a finite-difference one (see
//! [`crate::differentiation`]) satisfy the same contract.

mod bisection;
mod newton_vector;

pub use bisection::bisection;
pub use newton_vector::{NewtonVectorSolver, VectorSolverConfig, VectorSolverResult};

/// Default tolerance for scalar root-finding.
pub const DEFAULT_TOLERANCE: f64 = 1e-10;

/// Default maximum iterations for scalar root-finding.
pub const DEFAULT_MAX_ITERATIONS: u32 = 100;

/// Configuration for scalar root-finding algorithms.
#[derive(Debug, Clone, Copy)]
pub struct SolverConfig {
    /// Tolerance for convergence (on both residual and bracket width).
    pub tolerance: f64,
    /// Maximum number of iterations.
    pub max_iterations: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl SolverConfig {
    /// Creates a new solver configuration.
    #[must_use]
    pub fn new(tolerance: f64, max_iterations: u32) -> Self {
        Self {
            tolerance,
            max_iterations,
        }
    }

    /// Sets the tolerance.
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
}

/// Result of a scalar root-finding iteration.
#[derive(Debug, Clone, Copy)]
pub struct SolverResult {
    /// The root found.
    pub root: f64,
    /// Number of iterations used.
    pub iterations: u32,
    /// Final residual (function value at root).
    pub residual: f64,
}
