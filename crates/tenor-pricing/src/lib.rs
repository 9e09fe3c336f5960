//! # Tenor Pricing
//!
//! Option pricing and volatility analytics for the Tenor rates library.
//!
//! This crate provides:
//!
//! - **Black**: undiscounted forward option prices, vega, and a
//!   bracketed implied volatility inversion
//! - **Smiles**: flat, pillar-interpolated and SABR volatility smiles
//!   behind the [`smile::SmileFunction`] trait
//! - **Replication**: present values of in-arrears caps and floors by
//!   static replication over the smile
//!
//! ## Design Philosophy
//!
//! - **Explicit Domains**: pricing functions reject inputs outside the
//!   lognormal model's domain instead of returning NaN
//! - **No-Arbitrage First**: volatility inversion checks price bounds
//!   before iterating
//! - **Soft Tails**: bounded tail truncation in replication is a logged
//!   diagnostic, not a failure

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::similar_names)]
#![allow(clippy::unreadable_literal)]

pub mod black;
pub mod capfloor;
pub mod error;
pub mod sabr;
pub mod smile;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::black::{black_price, black_vega, implied_volatility};
    pub use crate::capfloor::{CapFloor, InArrearsReplicationPricer};
    pub use crate::error::{PricingError, PricingResult};
    pub use crate::sabr::SabrSmile;
    pub use crate::smile::{FlatSmile, InterpolatedSmile, SmileFunction};
}

pub use error::{PricingError, PricingResult};
