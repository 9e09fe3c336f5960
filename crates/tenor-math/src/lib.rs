//! # Tenor Math
//!
//! Numerical foundations for the Tenor rates library.
//!
//! This crate provides:
//!
//! - **Solvers**: scalar bisection and a damped Newton vector root finder
//! - **Differentiation**: finite-difference Jacobians of vector fields
//! - **Linear Algebra**: LU factorization with explicit singularity detection
//! - **Interpolation**: linear interpolation with node sensitivities
//! - **Integration**: adaptive Runge-Kutta quadrature
//!
//! ## Design Philosophy
//!
//! - **Numerical Stability**: explicit failure modes for singular systems,
//!   invalid brackets and non-finite values
//! - **Diagnosable Failures**: non-convergence errors carry the last
//!   iterate and residual rather than a bare message
//! - **Provider Agnosticism**: analytic and finite-difference Jacobians
//!   share one contract

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::similar_names)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::unreadable_literal)]

pub mod differentiation;
pub mod error;
pub mod integration;
pub mod interpolation;
pub mod linear_algebra;
pub mod solvers;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::differentiation::{FiniteDifferenceType, VectorFieldDifferentiator};
    pub use crate::error::{MathError, MathResult};
    pub use crate::integration::RungeKuttaIntegrator;
    pub use crate::interpolation::{ExtrapolationPolicy, LinearInterpolator};
    pub use crate::solvers::{
        bisection, NewtonVectorSolver, SolverConfig, SolverResult, VectorSolverConfig,
        VectorSolverResult,
    };
}

pub use error::{MathError, MathResult};
