//! # Tenor Curves
//!
//! Multi-curve framework and calibration engine for the Tenor rates
//! library.
//!
//! This crate provides:
//!
//! - **Curves**: continuously compounded zero curves with pluggable
//!   interpolation
//! - **Bundles**: immutable named curve collections with currency and
//!   index registries behind the [`bundle::CurveProvider`] trait
//! - **Instruments**: cash, FRAs, futures, swaps, basis swaps, bonds,
//!   floating rate notes, cross currency swaps and FX forwards, each with
//!   a model quote and analytic curve sensitivities
//! - **Calibration**: a global Newton fit of several curves to market
//!   quotes, with analytic or finite-difference Jacobians
//!
//! ## Design Philosophy
//!
//! - **Fail Before Iterating**: calibration requests validate shapes,
//!   node monotonicity and curve name resolution up front
//! - **Immutable Market Data**: bundles never mutate; the solver rebuilds
//!   them per iterate with shared curve storage
//! - **Provider Agnosticism**: pricers see the [`bundle::CurveProvider`]
//!   trait, not the bundle

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::similar_names)]
#![allow(clippy::unreadable_literal)]

pub mod bundle;
pub mod calibration;
pub mod curve;
pub mod error;
pub mod instruments;
pub mod types;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bundle::{CurveBundle, CurveBundleBuilder, CurveProvider};
    pub use crate::calibration::{
        CalibrationRequest, CalibrationResult, CurveCalibrator, CurveSpec, JacobianMode,
    };
    pub use crate::curve::{InterpolationMethod, YieldCurve};
    pub use crate::error::{CurveError, CurveResult};
    pub use crate::instruments::{CurveSensitivity, FloatingLeg, Instrument};
    pub use crate::types::{Currency, CurrencyAmount};
}

pub use error::{CurveError, CurveResult};
