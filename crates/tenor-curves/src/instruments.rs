//! Calibration instruments.
//!
//! Each instrument knows its market-quote model value under a curve
//! bundle (the quantity compared against the quoted rate during
//! calibration) and its analytic sensitivity to the zero rates of the
//! curves it touches. Sensitivities are reported in continuous time, as
//! `(time, dV/dy(time))` pairs per curve; the calibration engine projects
//! them onto curve nodes through the interpolator weights.
//!
//! Quote conventions:
//!
//! - cash: simply compounded deposit rate
//! - FRA and futures: simply compounded forward rate
//! - swap: par fixed rate (floating PV over fixed annuity)
//! - basis swap: par spread on the index leg
//! - bond: par coupon
//! - floating rate note: par spread over the index
//! - cross currency swap: par spread on the domestic leg
//! - FX forward: outright forward rate

use std::collections::HashMap;

use crate::bundle::CurveBundle;
use crate::curve::YieldCurve;
use crate::error::{CurveError, CurveResult};

/// Sensitivity of a model value to zero rates, keyed by curve name.
///
/// Each entry is a `(time, dV/dy(time))` pair in no particular order;
/// repeated times are legitimate and additive.
#[derive(Debug, Clone, Default)]
pub struct CurveSensitivity {
    entries: HashMap<String, Vec<(f64, f64)>>,
}

impl CurveSensitivity {
    /// Creates an empty sensitivity map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a sensitivity contribution for `curve` at `time`.
    pub fn add(&mut self, curve: &str, time: f64, value: f64) {
        self.entries
            .entry(curve.to_string())
            .or_default()
            .push((time, value));
    }

    /// Contributions recorded against `curve`; empty if none.
    #[must_use]
    pub fn entries(&self, curve: &str) -> &[(f64, f64)] {
        self.entries.get(curve).map_or(&[], Vec::as_slice)
    }

    /// Names of the curves with recorded contributions.
    pub fn curves(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// One leg of periodic floating payments.
///
/// Period `i` fixes over `[start_times[i], end_times[i]]` with accrual
/// `year_fractions[i]` and pays at `payment_times[i]`.
#[derive(Debug, Clone)]
pub struct FloatingLeg {
    /// Fixing period start times.
    pub start_times: Vec<f64>,
    /// Fixing period end times.
    pub end_times: Vec<f64>,
    /// Payment times.
    pub payment_times: Vec<f64>,
    /// Accrual fractions.
    pub year_fractions: Vec<f64>,
}

impl FloatingLeg {
    /// A regular schedule of `frequency` payments per year out to
    /// `maturity`, paying at period end.
    #[must_use]
    pub fn regular(maturity: f64, frequency: f64) -> Self {
        let n = (maturity * frequency).round().max(1.0) as usize;
        let tau = 1.0 / frequency;
        let start_times: Vec<f64> = (0..n).map(|i| i as f64 * tau).collect();
        let end_times: Vec<f64> = (0..n).map(|i| (i + 1) as f64 * tau).collect();
        Self {
            payment_times: end_times.clone(),
            year_fractions: vec![tau; n],
            start_times,
            end_times,
        }
    }

    /// Quarterly schedule out to `maturity`.
    #[must_use]
    pub fn quarterly(maturity: f64) -> Self {
        Self::regular(maturity, 4.0)
    }

    /// Number of payment periods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.payment_times.len()
    }

    /// True if the leg has no payments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payment_times.is_empty()
    }

    /// Final payment time, or zero for an empty leg.
    #[must_use]
    pub fn maturity(&self) -> f64 {
        self.payment_times.last().copied().unwrap_or(0.0)
    }

    fn validate(&self) -> CurveResult<()> {
        let n = self.start_times.len();
        if n == 0 {
            return Err(CurveError::invalid_instrument("floating leg is empty"));
        }
        if self.end_times.len() != n
            || self.payment_times.len() != n
            || self.year_fractions.len() != n
        {
            return Err(CurveError::length_mismatch(
                "floating leg schedules must have equal lengths",
            ));
        }
        for i in 0..n {
            if self.end_times[i] <= self.start_times[i] {
                return Err(CurveError::invalid_instrument(format!(
                    "fixing period {i} is not increasing"
                )));
            }
            if self.year_fractions[i] <= 0.0 {
                return Err(CurveError::invalid_instrument(format!(
                    "accrual fraction {i} must be positive"
                )));
            }
        }
        Ok(())
    }
}

/// A market instrument used to calibrate curves.
#[derive(Debug, Clone)]
pub enum Instrument {
    /// A cash deposit quoted as a simple rate.
    Cash {
        /// Discounting curve name.
        curve: String,
        /// Deposit maturity.
        maturity: f64,
        /// Accrual fraction for the simple rate.
        year_fraction: f64,
    },
    /// A forward rate agreement quoted as the forward rate.
    ForwardRateAgreement {
        /// Projection curve name.
        forward_curve: String,
        /// Forward period start.
        start: f64,
        /// Forward period end.
        end: f64,
        /// Accrual fraction.
        year_fraction: f64,
    },
    /// An interest rate future quoted as the forward rate, without
    /// convexity adjustment.
    Future {
        /// Projection curve name.
        forward_curve: String,
        /// Underlying period start.
        start: f64,
        /// Underlying period end.
        end: f64,
        /// Accrual fraction.
        year_fraction: f64,
    },
    /// A fixed-for-floating swap quoted as the par fixed rate.
    Swap {
        /// Discounting curve name.
        discount_curve: String,
        /// Projection curve name for the floating leg.
        forward_curve: String,
        /// Fixed leg payment times.
        fixed_payment_times: Vec<f64>,
        /// Fixed leg accrual fractions.
        fixed_year_fractions: Vec<f64>,
        /// Floating leg schedule.
        float_leg: FloatingLeg,
    },
    /// A funding-versus-index basis swap quoted as the par spread added
    /// to the index leg. Both legs share the payment schedule.
    BasisSwap {
        /// Discounting curve name, also projecting the funding leg.
        discount_curve: String,
        /// Projection curve name for the index leg.
        forward_curve: String,
        /// Shared leg schedule.
        leg: FloatingLeg,
    },
    /// A fixed coupon bond quoted as the par coupon.
    Bond {
        /// Discounting curve name.
        curve: String,
        /// Coupon payment times; the last one also pays the principal.
        payment_times: Vec<f64>,
        /// Coupon accrual fractions.
        year_fractions: Vec<f64>,
    },
    /// A floating rate note quoted as the par spread over the index.
    FloatingRateNote {
        /// Discounting curve name.
        discount_curve: String,
        /// Projection curve name.
        forward_curve: String,
        /// Settlement time of the upfront payment.
        settlement_time: f64,
        /// Floating leg schedule; principal returns at its maturity.
        leg: FloatingLeg,
    },
    /// A float-for-float cross currency swap quoted as the par spread on
    /// the domestic leg, with notional exchange at both ends.
    CrossCurrencySwap {
        /// Domestic discounting curve name.
        domestic_discount: String,
        /// Domestic projection curve name.
        domestic_forward: String,
        /// Foreign discounting curve name.
        foreign_discount: String,
        /// Foreign projection curve name.
        foreign_forward: String,
        /// Settlement time of the initial notional exchange.
        settlement_time: f64,
        /// Domestic floating leg.
        domestic_leg: FloatingLeg,
        /// Foreign floating leg.
        foreign_leg: FloatingLeg,
        /// Spot FX rate, domestic units per foreign unit.
        spot_fx: f64,
    },
    /// An FX forward quoted as the outright forward rate.
    FxForward {
        /// Domestic discounting curve name.
        domestic_curve: String,
        /// Foreign discounting curve name.
        foreign_curve: String,
        /// Exchange time.
        payment_time: f64,
        /// Spot FX rate, domestic units per foreign unit.
        spot_fx: f64,
    },
}

impl Instrument {
    /// A cash deposit with accrual equal to its maturity.
    #[must_use]
    pub fn cash(curve: impl Into<String>, maturity: f64) -> Self {
        Instrument::Cash {
            curve: curve.into(),
            maturity,
            year_fraction: maturity,
        }
    }

    /// A FRA over `[start, end]` with accrual `end - start`.
    #[must_use]
    pub fn fra(forward_curve: impl Into<String>, start: f64, end: f64) -> Self {
        Instrument::ForwardRateAgreement {
            forward_curve: forward_curve.into(),
            start,
            end,
            year_fraction: end - start,
        }
    }

    /// A future over `[start, end]` with accrual `end - start`.
    #[must_use]
    pub fn future(forward_curve: impl Into<String>, start: f64, end: f64) -> Self {
        Instrument::Future {
            forward_curve: forward_curve.into(),
            start,
            end,
            year_fraction: end - start,
        }
    }

    /// A swap with semiannual fixed payments and a quarterly floating leg.
    #[must_use]
    pub fn swap(
        discount_curve: impl Into<String>,
        forward_curve: impl Into<String>,
        maturity: f64,
    ) -> Self {
        let fixed = FloatingLeg::regular(maturity, 2.0);
        Instrument::Swap {
            discount_curve: discount_curve.into(),
            forward_curve: forward_curve.into(),
            fixed_payment_times: fixed.payment_times,
            fixed_year_fractions: fixed.year_fractions,
            float_leg: FloatingLeg::quarterly(maturity),
        }
    }

    /// A quarterly funding-versus-index basis swap.
    #[must_use]
    pub fn basis_swap(
        discount_curve: impl Into<String>,
        forward_curve: impl Into<String>,
        maturity: f64,
    ) -> Self {
        Instrument::BasisSwap {
            discount_curve: discount_curve.into(),
            forward_curve: forward_curve.into(),
            leg: FloatingLeg::quarterly(maturity),
        }
    }

    /// A bond with semiannual coupons out to `maturity`.
    #[must_use]
    pub fn bond(curve: impl Into<String>, maturity: f64) -> Self {
        let schedule = FloatingLeg::regular(maturity, 2.0);
        Instrument::Bond {
            curve: curve.into(),
            payment_times: schedule.payment_times,
            year_fractions: schedule.year_fractions,
        }
    }

    /// A quarterly floating rate note settling at `settlement_time`.
    #[must_use]
    pub fn floating_rate_note(
        discount_curve: impl Into<String>,
        forward_curve: impl Into<String>,
        settlement_time: f64,
        maturity: f64,
    ) -> Self {
        Instrument::FloatingRateNote {
            discount_curve: discount_curve.into(),
            forward_curve: forward_curve.into(),
            settlement_time,
            leg: FloatingLeg::quarterly(maturity),
        }
    }

    /// A quarterly float-for-float cross currency swap.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn cross_currency_swap(
        domestic_discount: impl Into<String>,
        domestic_forward: impl Into<String>,
        foreign_discount: impl Into<String>,
        foreign_forward: impl Into<String>,
        settlement_time: f64,
        maturity: f64,
        spot_fx: f64,
    ) -> Self {
        Instrument::CrossCurrencySwap {
            domestic_discount: domestic_discount.into(),
            domestic_forward: domestic_forward.into(),
            foreign_discount: foreign_discount.into(),
            foreign_forward: foreign_forward.into(),
            settlement_time,
            domestic_leg: FloatingLeg::quarterly(maturity),
            foreign_leg: FloatingLeg::quarterly(maturity),
            spot_fx,
        }
    }

    /// An FX forward exchanging at `payment_time`.
    #[must_use]
    pub fn fx_forward(
        domestic_curve: impl Into<String>,
        foreign_curve: impl Into<String>,
        payment_time: f64,
        spot_fx: f64,
    ) -> Self {
        Instrument::FxForward {
            domestic_curve: domestic_curve.into(),
            foreign_curve: foreign_curve.into(),
            payment_time,
            spot_fx,
        }
    }

    /// Names of the curves this instrument prices off.
    #[must_use]
    pub fn curve_names(&self) -> Vec<&str> {
        match self {
            Instrument::Cash { curve, .. } | Instrument::Bond { curve, .. } => vec![curve],
            Instrument::ForwardRateAgreement { forward_curve, .. }
            | Instrument::Future { forward_curve, .. } => vec![forward_curve],
            Instrument::Swap {
                discount_curve,
                forward_curve,
                ..
            }
            | Instrument::BasisSwap {
                discount_curve,
                forward_curve,
                ..
            }
            | Instrument::FloatingRateNote {
                discount_curve,
                forward_curve,
                ..
            } => vec![discount_curve, forward_curve],
            Instrument::CrossCurrencySwap {
                domestic_discount,
                domestic_forward,
                foreign_discount,
                foreign_forward,
                ..
            } => vec![
                domestic_discount,
                domestic_forward,
                foreign_discount,
                foreign_forward,
            ],
            Instrument::FxForward {
                domestic_curve,
                foreign_curve,
                ..
            } => vec![domestic_curve, foreign_curve],
        }
    }

    /// Checks the instrument's economic fields for consistency.
    pub fn validate(&self) -> CurveResult<()> {
        match self {
            Instrument::Cash {
                maturity,
                year_fraction,
                ..
            } => {
                if *maturity <= 0.0 || *year_fraction <= 0.0 {
                    return Err(CurveError::invalid_instrument(
                        "cash maturity and accrual must be positive",
                    ));
                }
            }
            Instrument::ForwardRateAgreement {
                start,
                end,
                year_fraction,
                ..
            }
            | Instrument::Future {
                start,
                end,
                year_fraction,
                ..
            } => {
                if *start < 0.0 || *end <= *start || *year_fraction <= 0.0 {
                    return Err(CurveError::invalid_instrument(
                        "forward period must be increasing with positive accrual",
                    ));
                }
            }
            Instrument::Swap {
                fixed_payment_times,
                fixed_year_fractions,
                float_leg,
                ..
            } => {
                if fixed_payment_times.is_empty() {
                    return Err(CurveError::invalid_instrument("swap fixed leg is empty"));
                }
                if fixed_payment_times.len() != fixed_year_fractions.len() {
                    return Err(CurveError::length_mismatch(
                        "swap fixed payment times and accruals must have equal lengths",
                    ));
                }
                float_leg.validate()?;
            }
            Instrument::BasisSwap { leg, .. } => leg.validate()?,
            Instrument::Bond {
                payment_times,
                year_fractions,
                ..
            } => {
                if payment_times.is_empty() {
                    return Err(CurveError::invalid_instrument("bond has no payments"));
                }
                if payment_times.len() != year_fractions.len() {
                    return Err(CurveError::length_mismatch(
                        "bond payment times and accruals must have equal lengths",
                    ));
                }
            }
            Instrument::FloatingRateNote {
                settlement_time,
                leg,
                ..
            } => {
                if *settlement_time < 0.0 {
                    return Err(CurveError::invalid_instrument(
                        "settlement time must be non-negative",
                    ));
                }
                leg.validate()?;
            }
            Instrument::CrossCurrencySwap {
                settlement_time,
                domestic_leg,
                foreign_leg,
                spot_fx,
                ..
            } => {
                if *settlement_time < 0.0 || *spot_fx <= 0.0 {
                    return Err(CurveError::invalid_instrument(
                        "settlement time must be non-negative and spot FX positive",
                    ));
                }
                domestic_leg.validate()?;
                foreign_leg.validate()?;
            }
            Instrument::FxForward {
                payment_time,
                spot_fx,
                ..
            } => {
                if *payment_time <= 0.0 || *spot_fx <= 0.0 {
                    return Err(CurveError::invalid_instrument(
                        "payment time and spot FX must be positive",
                    ));
                }
            }
        }
        Ok(())
    }

    /// The model value of the market quote under `bundle`.
    pub fn model_value(&self, bundle: &CurveBundle) -> CurveResult<f64> {
        match self {
            Instrument::Cash {
                curve,
                maturity,
                year_fraction,
            } => {
                let df = bundle.curve(curve)?.discount_factor(*maturity);
                Ok((1.0 / df - 1.0) / year_fraction)
            }
            Instrument::ForwardRateAgreement {
                forward_curve,
                start,
                end,
                year_fraction,
            }
            | Instrument::Future {
                forward_curve,
                start,
                end,
                year_fraction,
            } => bundle
                .curve(forward_curve)?
                .forward_rate(*start, *end, *year_fraction),
            Instrument::Swap {
                discount_curve,
                forward_curve,
                fixed_payment_times,
                fixed_year_fractions,
                float_leg,
            } => {
                let disc = bundle.curve(discount_curve)?;
                let proj = bundle.curve(forward_curve)?;
                let float_pv = leg_pv(float_leg, proj, disc);
                let annuity = annuity(fixed_payment_times, fixed_year_fractions, disc);
                Ok(float_pv / annuity)
            }
            Instrument::BasisSwap {
                discount_curve,
                forward_curve,
                leg,
            } => {
                let disc = bundle.curve(discount_curve)?;
                let proj = bundle.curve(forward_curve)?;
                let funding_pv = leg_pv(leg, disc, disc);
                let index_pv = leg_pv(leg, proj, disc);
                let ann = annuity(&leg.payment_times, &leg.year_fractions, disc);
                Ok((funding_pv - index_pv) / ann)
            }
            Instrument::Bond {
                curve,
                payment_times,
                year_fractions,
            } => {
                let disc = bundle.curve(curve)?;
                let maturity = payment_times.last().copied().unwrap_or(0.0);
                let numerator = 1.0 - disc.discount_factor(maturity);
                Ok(numerator / annuity(payment_times, year_fractions, disc))
            }
            Instrument::FloatingRateNote {
                discount_curve,
                forward_curve,
                settlement_time,
                leg,
            } => {
                let disc = bundle.curve(discount_curve)?;
                let proj = bundle.curve(forward_curve)?;
                let numerator = disc.discount_factor(*settlement_time)
                    - disc.discount_factor(leg.maturity())
                    - leg_pv(leg, proj, disc);
                let ann = annuity(&leg.payment_times, &leg.year_fractions, disc);
                Ok(numerator / ann)
            }
            Instrument::CrossCurrencySwap {
                domestic_discount,
                domestic_forward,
                foreign_discount,
                foreign_forward,
                settlement_time,
                domestic_leg,
                foreign_leg,
                spot_fx,
            } => {
                let dom_disc = bundle.curve(domestic_discount)?;
                let dom_proj = bundle.curve(domestic_forward)?;
                let for_disc = bundle.curve(foreign_discount)?;
                let for_proj = bundle.curve(foreign_forward)?;

                let dom_note = note_pv(domestic_leg, *settlement_time, dom_proj, dom_disc);
                let for_note = note_pv(foreign_leg, *settlement_time, for_proj, for_disc);
                let ann = annuity(
                    &domestic_leg.payment_times,
                    &domestic_leg.year_fractions,
                    dom_disc,
                );
                Ok((spot_fx * for_note - dom_note) / ann)
            }
            Instrument::FxForward {
                domestic_curve,
                foreign_curve,
                payment_time,
                spot_fx,
            } => {
                let dom = bundle.curve(domestic_curve)?.discount_factor(*payment_time);
                let forn = bundle.curve(foreign_curve)?.discount_factor(*payment_time);
                Ok(spot_fx * forn / dom)
            }
        }
    }

    /// Analytic sensitivity of the model value to the zero rates of each
    /// curve the instrument touches.
    pub fn sensitivity(&self, bundle: &CurveBundle) -> CurveResult<CurveSensitivity> {
        let mut sens = CurveSensitivity::new();
        match self {
            Instrument::Cash {
                curve,
                maturity,
                year_fraction,
            } => {
                let df = bundle.curve(curve)?.discount_factor(*maturity);
                sens.add(curve, *maturity, maturity / (year_fraction * df));
            }
            Instrument::ForwardRateAgreement {
                forward_curve,
                start,
                end,
                year_fraction,
            }
            | Instrument::Future {
                forward_curve,
                start,
                end,
                year_fraction,
            } => {
                let proj = bundle.curve(forward_curve)?;
                let ratio = proj.discount_factor(*start) / proj.discount_factor(*end);
                sens.add(forward_curve, *start, -start * ratio / year_fraction);
                sens.add(forward_curve, *end, end * ratio / year_fraction);
            }
            Instrument::Swap {
                discount_curve,
                forward_curve,
                fixed_payment_times,
                fixed_year_fractions,
                float_leg,
            } => {
                let disc = bundle.curve(discount_curve)?;
                let proj = bundle.curve(forward_curve)?;
                let ann = annuity(fixed_payment_times, fixed_year_fractions, disc);
                let par = leg_pv(float_leg, proj, disc) / ann;

                leg_pv_gradient(
                    float_leg,
                    forward_curve,
                    proj,
                    discount_curve,
                    disc,
                    1.0 / ann,
                    &mut sens,
                );
                annuity_quotient_gradient(
                    fixed_payment_times,
                    fixed_year_fractions,
                    discount_curve,
                    disc,
                    par / ann,
                    &mut sens,
                );
            }
            Instrument::BasisSwap {
                discount_curve,
                forward_curve,
                leg,
            } => {
                let disc = bundle.curve(discount_curve)?;
                let proj = bundle.curve(forward_curve)?;
                let ann = annuity(&leg.payment_times, &leg.year_fractions, disc);
                let spread = (leg_pv(leg, disc, disc) - leg_pv(leg, proj, disc)) / ann;

                leg_pv_gradient(
                    leg,
                    discount_curve,
                    disc,
                    discount_curve,
                    disc,
                    1.0 / ann,
                    &mut sens,
                );
                leg_pv_gradient(
                    leg,
                    forward_curve,
                    proj,
                    discount_curve,
                    disc,
                    -1.0 / ann,
                    &mut sens,
                );
                annuity_quotient_gradient(
                    &leg.payment_times,
                    &leg.year_fractions,
                    discount_curve,
                    disc,
                    spread / ann,
                    &mut sens,
                );
            }
            Instrument::Bond {
                curve,
                payment_times,
                year_fractions,
            } => {
                let disc = bundle.curve(curve)?;
                let maturity = payment_times.last().copied().unwrap_or(0.0);
                let ann = annuity(payment_times, year_fractions, disc);
                let coupon = (1.0 - disc.discount_factor(maturity)) / ann;

                sens.add(
                    curve,
                    maturity,
                    maturity * disc.discount_factor(maturity) / ann,
                );
                annuity_quotient_gradient(
                    payment_times,
                    year_fractions,
                    curve,
                    disc,
                    coupon / ann,
                    &mut sens,
                );
            }
            Instrument::FloatingRateNote {
                discount_curve,
                forward_curve,
                settlement_time,
                leg,
            } => {
                let disc = bundle.curve(discount_curve)?;
                let proj = bundle.curve(forward_curve)?;
                let maturity = leg.maturity();
                let ann = annuity(&leg.payment_times, &leg.year_fractions, disc);
                let numerator = disc.discount_factor(*settlement_time)
                    - disc.discount_factor(maturity)
                    - leg_pv(leg, proj, disc);

                sens.add(
                    discount_curve,
                    *settlement_time,
                    -settlement_time * disc.discount_factor(*settlement_time) / ann,
                );
                sens.add(
                    discount_curve,
                    maturity,
                    maturity * disc.discount_factor(maturity) / ann,
                );
                leg_pv_gradient(
                    leg,
                    forward_curve,
                    proj,
                    discount_curve,
                    disc,
                    -1.0 / ann,
                    &mut sens,
                );
                annuity_quotient_gradient(
                    &leg.payment_times,
                    &leg.year_fractions,
                    discount_curve,
                    disc,
                    numerator / (ann * ann),
                    &mut sens,
                );
            }
            Instrument::CrossCurrencySwap {
                domestic_discount,
                domestic_forward,
                foreign_discount,
                foreign_forward,
                settlement_time,
                domestic_leg,
                foreign_leg,
                spot_fx,
            } => {
                let dom_disc = bundle.curve(domestic_discount)?;
                let dom_proj = bundle.curve(domestic_forward)?;
                let for_disc = bundle.curve(foreign_discount)?;
                let for_proj = bundle.curve(foreign_forward)?;

                let ann = annuity(
                    &domestic_leg.payment_times,
                    &domestic_leg.year_fractions,
                    dom_disc,
                );
                let numerator = spot_fx * note_pv(foreign_leg, *settlement_time, for_proj, for_disc)
                    - note_pv(domestic_leg, *settlement_time, dom_proj, dom_disc);

                note_pv_gradient(
                    foreign_leg,
                    *settlement_time,
                    foreign_forward,
                    for_proj,
                    foreign_discount,
                    for_disc,
                    spot_fx / ann,
                    &mut sens,
                );
                note_pv_gradient(
                    domestic_leg,
                    *settlement_time,
                    domestic_forward,
                    dom_proj,
                    domestic_discount,
                    dom_disc,
                    -1.0 / ann,
                    &mut sens,
                );
                annuity_quotient_gradient(
                    &domestic_leg.payment_times,
                    &domestic_leg.year_fractions,
                    domestic_discount,
                    dom_disc,
                    numerator / (ann * ann),
                    &mut sens,
                );
            }
            Instrument::FxForward {
                domestic_curve,
                foreign_curve,
                payment_time,
                spot_fx,
            } => {
                let dom = bundle.curve(domestic_curve)?.discount_factor(*payment_time);
                let forn = bundle.curve(foreign_curve)?.discount_factor(*payment_time);
                let forward = spot_fx * forn / dom;
                sens.add(foreign_curve, *payment_time, -payment_time * forward);
                sens.add(domestic_curve, *payment_time, payment_time * forward);
            }
        }
        Ok(sens)
    }
}

/// PV of a unit-notional floating leg: `sum_i (R_i - 1) * d(p_i)` with
/// `R_i = d_proj(s_i) / d_proj(e_i)`.
fn leg_pv(leg: &FloatingLeg, proj: &YieldCurve, disc: &YieldCurve) -> f64 {
    let mut pv = 0.0;
    for i in 0..leg.len() {
        let ratio = proj.discount_factor(leg.start_times[i]) / proj.discount_factor(leg.end_times[i]);
        pv += (ratio - 1.0) * disc.discount_factor(leg.payment_times[i]);
    }
    pv
}

/// PV of a note paying a floating leg and principal, against an upfront
/// payment at settlement.
fn note_pv(leg: &FloatingLeg, settlement: f64, proj: &YieldCurve, disc: &YieldCurve) -> f64 {
    leg_pv(leg, proj, disc) + disc.discount_factor(leg.maturity()) - disc.discount_factor(settlement)
}

/// Fixed annuity `sum_i tau_i * d(t_i)`.
fn annuity(payment_times: &[f64], year_fractions: &[f64], disc: &YieldCurve) -> f64 {
    payment_times
        .iter()
        .zip(year_fractions)
        .map(|(t, tau)| tau * disc.discount_factor(*t))
        .sum()
}

/// Gradient of `scale * leg_pv` with respect to zero rates.
fn leg_pv_gradient(
    leg: &FloatingLeg,
    proj_name: &str,
    proj: &YieldCurve,
    disc_name: &str,
    disc: &YieldCurve,
    scale: f64,
    sens: &mut CurveSensitivity,
) {
    for i in 0..leg.len() {
        let s = leg.start_times[i];
        let e = leg.end_times[i];
        let p = leg.payment_times[i];
        let ratio = proj.discount_factor(s) / proj.discount_factor(e);
        let dp = disc.discount_factor(p);

        sens.add(proj_name, s, -s * ratio * dp * scale);
        sens.add(proj_name, e, e * ratio * dp * scale);
        sens.add(disc_name, p, -p * (ratio - 1.0) * dp * scale);
    }
}

/// Gradient of `scale * note_pv` with respect to zero rates.
#[allow(clippy::too_many_arguments)]
fn note_pv_gradient(
    leg: &FloatingLeg,
    settlement: f64,
    proj_name: &str,
    proj: &YieldCurve,
    disc_name: &str,
    disc: &YieldCurve,
    scale: f64,
    sens: &mut CurveSensitivity,
) {
    leg_pv_gradient(leg, proj_name, proj, disc_name, disc, scale, sens);
    let maturity = leg.maturity();
    sens.add(
        disc_name,
        maturity,
        -maturity * disc.discount_factor(maturity) * scale,
    );
    sens.add(
        disc_name,
        settlement,
        settlement * disc.discount_factor(settlement) * scale,
    );
}

/// Quotient-rule contribution of an annuity denominator: for `V = N / A`
/// the annuity part of the gradient is `+V * t * tau * d(t) / A`, passed
/// here as `factor = V / A`.
fn annuity_quotient_gradient(
    payment_times: &[f64],
    year_fractions: &[f64],
    disc_name: &str,
    disc: &YieldCurve,
    factor: f64,
    sens: &mut CurveSensitivity,
) {
    for (t, tau) in payment_times.iter().zip(year_fractions) {
        sens.add(disc_name, *t, factor * t * tau * disc.discount_factor(*t));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::InterpolationMethod;
    use approx::assert_relative_eq;

    fn single_curve_bundle(rate: f64) -> CurveBundle {
        CurveBundle::builder()
            .with_curve("FUNDING", YieldCurve::flat(rate))
            .build()
            .unwrap()
    }

    #[test]
    fn test_cash_model_value() {
        let bundle = single_curve_bundle(0.04);
        let cash = Instrument::cash("FUNDING", 0.5);

        let value = cash.model_value(&bundle).unwrap();

        // Simple rate implied by the continuous 4% curve
        assert_relative_eq!(value, ((0.04f64 * 0.5).exp() - 1.0) / 0.5, epsilon = 1e-14);
    }

    #[test]
    fn test_fra_matches_curve_forward() {
        let bundle = single_curve_bundle(0.03);
        let fra = Instrument::fra("FUNDING", 0.5, 1.0);

        let value = fra.model_value(&bundle).unwrap();
        let expected = bundle
            .curve("FUNDING")
            .unwrap()
            .forward_rate(0.5, 1.0, 0.5)
            .unwrap();

        assert_relative_eq!(value, expected, epsilon = 1e-15);
    }

    #[test]
    fn test_single_curve_swap_telescopes() {
        // With payments at fixing period ends and one curve for projection
        // and discounting, the floating PV telescopes to 1 - d(T), so the
        // par rate is a bond par coupon on the fixed schedule.
        let bundle = single_curve_bundle(0.05);
        let swap = Instrument::swap("FUNDING", "FUNDING", 5.0);
        let bond = Instrument::bond("FUNDING", 5.0);

        let par_rate = swap.model_value(&bundle).unwrap();
        let par_coupon = bond.model_value(&bundle).unwrap();

        assert_relative_eq!(par_rate, par_coupon, epsilon = 1e-12);
    }

    #[test]
    fn test_single_curve_basis_spread_is_zero() {
        // Funding and index legs project off the same curve
        let bundle = single_curve_bundle(0.03);
        let basis = Instrument::basis_swap("FUNDING", "FUNDING", 3.0);

        let spread = basis.model_value(&bundle).unwrap();

        assert_relative_eq!(spread, 0.0, epsilon = 1e-14);
    }

    #[test]
    fn test_basis_spread_sign() {
        let bundle = CurveBundle::builder()
            .with_curve("FUNDING", YieldCurve::flat(0.03))
            .with_curve("INDEX", YieldCurve::flat(0.035))
            .build()
            .unwrap();
        let basis = Instrument::basis_swap("FUNDING", "INDEX", 2.0);

        // Index forwards exceed funding forwards, so the par spread added
        // to the index leg is negative
        let spread = basis.model_value(&bundle).unwrap();
        assert!(spread < 0.0);
    }

    #[test]
    fn test_frn_par_spread_single_curve() {
        // Projection equals discounting: the note is worth par at
        // settlement, so the par spread vanishes
        let bundle = single_curve_bundle(0.04);
        let frn = Instrument::floating_rate_note("FUNDING", "FUNDING", 0.0, 2.0);

        let spread = frn.model_value(&bundle).unwrap();

        assert_relative_eq!(spread, 0.0, epsilon = 1e-14);
    }

    #[test]
    fn test_fx_forward_interest_parity() {
        let bundle = CurveBundle::builder()
            .with_curve("USD-FUND", YieldCurve::flat(0.05))
            .with_curve("EUR-FUND", YieldCurve::flat(0.02))
            .build()
            .unwrap();
        let fx = Instrument::fx_forward("USD-FUND", "EUR-FUND", 1.0, 1.10);

        let forward = fx.model_value(&bundle).unwrap();

        // Higher domestic rate pushes the forward above spot
        assert_relative_eq!(forward, 1.10 * (0.03f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn test_cross_currency_par_spread_consistent_curves() {
        // Each leg projects off its own discounting curve, so both notes
        // are worth zero and the par spread vanishes
        let bundle = CurveBundle::builder()
            .with_curve("USD-FUND", YieldCurve::flat(0.05))
            .with_curve("EUR-FUND", YieldCurve::flat(0.02))
            .build()
            .unwrap();
        let xccy = Instrument::cross_currency_swap(
            "USD-FUND", "USD-FUND", "EUR-FUND", "EUR-FUND", 0.0, 2.0, 1.10,
        );

        let spread = xccy.model_value(&bundle).unwrap();

        assert_relative_eq!(spread, 0.0, epsilon = 1e-13);
    }

    /// Bumps every node of every curve and compares the model value
    /// change with the analytic sensitivity projected through the node
    /// weights.
    fn assert_sensitivity_matches_bump(instrument: &Instrument) {
        let times = vec![0.5, 1.0, 2.0, 3.0];
        let names = ["FUNDING", "INDEX", "EUR-FUND", "EUR-IND"];
        let base = vec![
            vec![0.020, 0.024, 0.028, 0.030],
            vec![0.025, 0.029, 0.033, 0.035],
            vec![0.010, 0.013, 0.016, 0.018],
            vec![0.012, 0.015, 0.018, 0.020],
        ];
        let build = |rates: &[Vec<f64>]| {
            let mut builder = CurveBundle::builder();
            for (name, curve_rates) in names.iter().zip(rates) {
                builder = builder.with_curve(
                    *name,
                    YieldCurve::new(
                        times.clone(),
                        curve_rates.clone(),
                        InterpolationMethod::LinearFlat,
                    )
                    .unwrap(),
                );
            }
            builder.build().unwrap()
        };

        let bundle = build(&base);
        let sens = instrument.sensitivity(&bundle).unwrap();

        let bump = 1e-6;
        for (curve_index, name) in names.iter().enumerate() {
            let curve = bundle.curve(name).unwrap();
            for node in 0..times.len() {
                let analytic: f64 = sens
                    .entries(name)
                    .iter()
                    .map(|(t, dv)| dv * curve.node_weights(*t)[node])
                    .sum();

                let mut up = base.clone();
                up[curve_index][node] += bump;
                let mut down = base.clone();
                down[curve_index][node] -= bump;
                let numeric = (instrument.model_value(&build(&up)).unwrap()
                    - instrument.model_value(&build(&down)).unwrap())
                    / (2.0 * bump);

                assert_relative_eq!(analytic, numeric, epsilon = 1e-6, max_relative = 1e-5);
            }
        }
    }

    #[test]
    fn test_sensitivity_against_node_bump() {
        for instrument in [
            Instrument::cash("FUNDING", 1.5),
            Instrument::fra("INDEX", 0.75, 1.25),
            Instrument::future("INDEX", 1.0, 1.25),
            Instrument::swap("FUNDING", "INDEX", 3.0),
            Instrument::basis_swap("FUNDING", "INDEX", 2.0),
            Instrument::bond("FUNDING", 3.0),
            Instrument::floating_rate_note("FUNDING", "INDEX", 0.25, 2.0),
            Instrument::cross_currency_swap(
                "FUNDING", "INDEX", "EUR-FUND", "EUR-IND", 0.25, 2.0, 1.10,
            ),
            Instrument::fx_forward("FUNDING", "EUR-FUND", 1.5, 1.10),
        ] {
            assert_sensitivity_matches_bump(&instrument);
        }
    }

    #[test]
    fn test_validation() {
        assert!(Instrument::cash("FUNDING", -1.0).validate().is_err());
        assert!(Instrument::fra("FUNDING", 1.0, 0.5).validate().is_err());
        assert!(Instrument::cash("FUNDING", 1.0).validate().is_ok());
        assert!(Instrument::swap("FUNDING", "INDEX", 5.0).validate().is_ok());

        let bad_leg = Instrument::BasisSwap {
            discount_curve: "FUNDING".to_string(),
            forward_curve: "INDEX".to_string(),
            leg: FloatingLeg {
                start_times: vec![0.0],
                end_times: vec![0.25],
                payment_times: vec![0.25, 0.5],
                year_fractions: vec![0.25],
            },
        };
        assert!(matches!(
            bad_leg.validate(),
            Err(CurveError::LengthMismatch { .. })
        ));
    }
}
