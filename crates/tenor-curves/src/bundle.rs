//! Curve bundles and the pricing provider abstraction.
//!
//! A [`CurveBundle`] is an immutable collection of named curves together
//! with two registries: which curve discounts each currency, and which
//! curve projects each floating index. Pricers depend on the
//! [`CurveProvider`] trait rather than on the bundle directly, so tests
//! can substitute fixed curves.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::curve::YieldCurve;
use crate::error::{CurveError, CurveResult};
use crate::types::Currency;

/// Read-only market access for pricing.
pub trait CurveProvider: Send + Sync {
    /// Discount factor at `time` in the discount curve for `currency`.
    fn discount_factor(&self, currency: Currency, time: f64) -> CurveResult<f64>;

    /// Simply compounded forward rate of `index` over `[start, end]`.
    fn forward_rate(&self, index: &str, start: f64, end: f64, accrual: f64) -> CurveResult<f64>;
}

/// An immutable set of named curves with currency and index registries.
///
/// # Example
///
/// ```rust
/// use tenor_curves::bundle::CurveBundle;
/// use tenor_curves::curve::YieldCurve;
/// use tenor_curves::types::Currency;
///
/// let bundle = CurveBundle::builder()
///     .with_curve("USD-OIS", YieldCurve::flat(0.03))
///     .with_curve("USD-LIBOR-3M", YieldCurve::flat(0.035))
///     .with_discount(Currency::Usd, "USD-OIS")
///     .with_index("USD-LIBOR-3M", "USD-LIBOR-3M")
///     .build()
///     .unwrap();
///
/// let df = bundle.discount_factor_by_name("USD-OIS", 1.0).unwrap();
/// assert!(df < 1.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CurveBundle {
    curves: BTreeMap<String, Arc<YieldCurve>>,
    discount_names: HashMap<Currency, String>,
    index_names: HashMap<String, String>,
}

impl CurveBundle {
    /// Starts an empty builder.
    #[must_use]
    pub fn builder() -> CurveBundleBuilder {
        CurveBundleBuilder::default()
    }

    /// Looks up a curve by name.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::CurveNotFound`] if no curve has that name.
    pub fn curve(&self, name: &str) -> CurveResult<&YieldCurve> {
        self.curves
            .get(name)
            .map(Arc::as_ref)
            .ok_or_else(|| CurveError::curve_not_found(name))
    }

    /// Discount factor at `time` from the curve named `name`.
    pub fn discount_factor_by_name(&self, name: &str, time: f64) -> CurveResult<f64> {
        Ok(self.curve(name)?.discount_factor(time))
    }

    /// True if the bundle holds a curve with this name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.curves.contains_key(name)
    }

    /// Curve names in lexicographic order.
    pub fn curve_names(&self) -> impl Iterator<Item = &str> {
        self.curves.keys().map(String::as_str)
    }

    /// Number of curves in the bundle.
    #[must_use]
    pub fn len(&self) -> usize {
        self.curves.len()
    }

    /// True if the bundle holds no curves.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    /// Returns a new bundle with `curve` added or replaced under `name`.
    ///
    /// Existing curves are shared, not copied, so this is cheap enough to
    /// call once per solver iteration.
    #[must_use]
    pub fn with_curve(&self, name: impl Into<String>, curve: YieldCurve) -> Self {
        let mut next = self.clone();
        next.curves.insert(name.into(), Arc::new(curve));
        next
    }
}

impl CurveProvider for CurveBundle {
    fn discount_factor(&self, currency: Currency, time: f64) -> CurveResult<f64> {
        let name = self.discount_names.get(&currency).ok_or_else(|| {
            CurveError::DiscountNotRegistered {
                currency: currency.code().to_string(),
            }
        })?;
        self.discount_factor_by_name(name, time)
    }

    fn forward_rate(&self, index: &str, start: f64, end: f64, accrual: f64) -> CurveResult<f64> {
        let name = self
            .index_names
            .get(index)
            .ok_or_else(|| CurveError::IndexNotRegistered {
                index: index.to_string(),
            })?;
        self.curve(name)?.forward_rate(start, end, accrual)
    }
}

/// Builder for [`CurveBundle`].
#[derive(Debug, Default)]
pub struct CurveBundleBuilder {
    curves: BTreeMap<String, Arc<YieldCurve>>,
    discount_names: HashMap<Currency, String>,
    index_names: HashMap<String, String>,
}

impl CurveBundleBuilder {
    /// Adds a named curve.
    #[must_use]
    pub fn with_curve(mut self, name: impl Into<String>, curve: YieldCurve) -> Self {
        self.curves.insert(name.into(), Arc::new(curve));
        self
    }

    /// Registers the discount curve for a currency.
    #[must_use]
    pub fn with_discount(mut self, currency: Currency, curve_name: impl Into<String>) -> Self {
        self.discount_names.insert(currency, curve_name.into());
        self
    }

    /// Registers the projection curve for a floating index.
    #[must_use]
    pub fn with_index(mut self, index: impl Into<String>, curve_name: impl Into<String>) -> Self {
        self.index_names.insert(index.into(), curve_name.into());
        self
    }

    /// Validates the registries and builds the bundle.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::CurveNotFound`] if a registry entry points at
    /// a curve name the bundle does not hold.
    pub fn build(self) -> CurveResult<CurveBundle> {
        for name in self.discount_names.values().chain(self.index_names.values()) {
            if !self.curves.contains_key(name) {
                return Err(CurveError::curve_not_found(name));
            }
        }
        Ok(CurveBundle {
            curves: self.curves,
            discount_names: self.discount_names,
            index_names: self.index_names,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_bundle() -> CurveBundle {
        CurveBundle::builder()
            .with_curve("EUR-OIS", YieldCurve::flat(0.02))
            .with_curve("EUR-EURIBOR-6M", YieldCurve::flat(0.025))
            .with_discount(Currency::Eur, "EUR-OIS")
            .with_index("EUR-EURIBOR-6M", "EUR-EURIBOR-6M")
            .build()
            .unwrap()
    }

    #[test]
    fn test_lookup_by_name() {
        let bundle = sample_bundle();

        let df = bundle.discount_factor_by_name("EUR-OIS", 1.0).unwrap();
        assert_relative_eq!(df, (-0.02f64).exp(), epsilon = 1e-15);

        assert!(bundle.curve("CHF-OIS").is_err());
    }

    #[test]
    fn test_provider_registries() {
        let bundle = sample_bundle();

        let df = bundle.discount_factor(Currency::Eur, 2.0).unwrap();
        assert_relative_eq!(df, (-0.04f64).exp(), epsilon = 1e-15);

        let fwd = bundle
            .forward_rate("EUR-EURIBOR-6M", 0.5, 1.0, 0.5)
            .unwrap();
        assert!(fwd > 0.0);

        assert!(matches!(
            bundle.discount_factor(Currency::Jpy, 1.0),
            Err(CurveError::DiscountNotRegistered { .. })
        ));
        assert!(matches!(
            bundle.forward_rate("JPY-TIBOR-3M", 0.5, 1.0, 0.5),
            Err(CurveError::IndexNotRegistered { .. })
        ));
    }

    #[test]
    fn test_dangling_registration_rejected() {
        let result = CurveBundle::builder()
            .with_discount(Currency::Usd, "USD-OIS")
            .build();

        assert!(matches!(result, Err(CurveError::CurveNotFound { .. })));
    }

    #[test]
    fn test_with_curve_copy_on_write() {
        let bundle = sample_bundle();
        let updated = bundle.with_curve("EUR-OIS", YieldCurve::flat(0.05));

        // The original is untouched
        assert_relative_eq!(
            bundle.curve("EUR-OIS").unwrap().zero_rate(1.0),
            0.02,
            epsilon = 1e-15
        );
        assert_relative_eq!(
            updated.curve("EUR-OIS").unwrap().zero_rate(1.0),
            0.05,
            epsilon = 1e-15
        );
    }
}
