//! Global curve calibration.
//!
//! Fits one or more curves simultaneously so that every instrument's
//! model value matches its market quote. The parameter vector is the
//! concatenation of each fitted curve's node zero rates, in the order the
//! curve specifications are given; the residual is `model - market` per
//! instrument; and the root is found with the damped Newton solver.
//!
//! The Jacobian comes either from analytic instrument sensitivities
//! projected onto curve nodes through interpolator weights, or from
//! central finite differences over the residual. The two agree to first
//! order and the test suite cross-checks them.

use nalgebra::{DMatrix, DVector};

use tenor_math::differentiation::{FiniteDifferenceType, VectorFieldDifferentiator};
use tenor_math::solvers::{NewtonVectorSolver, VectorSolverConfig};
use tenor_math::{MathError, MathResult};

use crate::bundle::CurveBundle;
use crate::curve::{InterpolationMethod, YieldCurve};
use crate::error::{CurveError, CurveResult};
use crate::instruments::Instrument;

/// Bump size for the finite-difference Jacobian fallback.
pub const FD_JACOBIAN_STEP: f64 = 1e-6;

/// Specification of one curve to fit: its name, node times and
/// interpolation scheme.
#[derive(Debug, Clone)]
pub struct CurveSpec {
    name: String,
    node_times: Vec<f64>,
    interpolation: InterpolationMethod,
}

impl CurveSpec {
    /// Creates a specification with the default interpolation scheme.
    #[must_use]
    pub fn new(name: impl Into<String>, node_times: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            node_times,
            interpolation: InterpolationMethod::default(),
        }
    }

    /// Sets the interpolation scheme.
    #[must_use]
    pub fn with_interpolation(mut self, interpolation: InterpolationMethod) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// The curve name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The node times.
    #[must_use]
    pub fn node_times(&self) -> &[f64] {
        &self.node_times
    }
}

/// How the calibration Jacobian is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JacobianMode {
    /// Analytic instrument sensitivities projected onto curve nodes.
    #[default]
    Analytic,
    /// Central finite differences over the residual.
    FiniteDifference,
}

/// A validated calibration problem.
///
/// Construction checks everything that can fail before iterating: shapes,
/// node monotonicity, instrument consistency, curve name resolution and
/// the determinacy of the system.
#[derive(Debug, Clone)]
pub struct CalibrationRequest {
    specs: Vec<CurveSpec>,
    instruments: Vec<Instrument>,
    market_rates: Vec<f64>,
    known_curves: CurveBundle,
    start_position: Vec<f64>,
}

impl CalibrationRequest {
    /// Creates a request fitting `specs` to `instruments` quoted at
    /// `market_rates`.
    ///
    /// The starting position defaults to every node at the mean market
    /// rate; see [`CalibrationRequest::with_start_position`].
    ///
    /// # Errors
    ///
    /// - [`CurveError::EmptyRequest`] if there are no curves or instruments
    /// - [`CurveError::LengthMismatch`] if quotes and instruments disagree
    /// - [`CurveError::NonMonotonicTimes`] for bad node times
    /// - [`CurveError::DuplicateCurve`] for repeated curve names
    /// - [`CurveError::Underdetermined`] if there are more nodes than
    ///   instruments
    /// - [`CurveError::InvalidInstrument`] for inconsistent instruments
    pub fn new(
        specs: Vec<CurveSpec>,
        instruments: Vec<Instrument>,
        market_rates: Vec<f64>,
    ) -> CurveResult<Self> {
        if specs.is_empty() {
            return Err(CurveError::empty_request("no curves to fit"));
        }
        if instruments.is_empty() {
            return Err(CurveError::empty_request("no calibration instruments"));
        }
        if market_rates.len() != instruments.len() {
            return Err(CurveError::length_mismatch(format!(
                "{} instruments but {} market rates",
                instruments.len(),
                market_rates.len()
            )));
        }

        for (i, spec) in specs.iter().enumerate() {
            if spec.node_times.is_empty() {
                return Err(CurveError::empty_request(format!(
                    "curve {} has no nodes",
                    spec.name
                )));
            }
            if spec.node_times[0] <= 0.0
                || spec.node_times.windows(2).any(|w| w[1] <= w[0])
                || spec.node_times.iter().any(|t| !t.is_finite())
            {
                return Err(CurveError::non_monotonic(format!(
                    "curve {} node times",
                    spec.name
                )));
            }
            if specs[..i].iter().any(|other| other.name == spec.name) {
                return Err(CurveError::DuplicateCurve {
                    name: spec.name.clone(),
                });
            }
        }

        let nodes: usize = specs.iter().map(|s| s.node_times.len()).sum();
        if nodes > instruments.len() {
            return Err(CurveError::Underdetermined {
                nodes,
                instruments: instruments.len(),
            });
        }

        for instrument in &instruments {
            instrument.validate()?;
        }

        let mean_rate = market_rates.iter().sum::<f64>() / market_rates.len() as f64;
        Ok(Self {
            specs,
            instruments,
            market_rates,
            known_curves: CurveBundle::default(),
            start_position: vec![mean_rate; nodes],
        })
    }

    /// Supplies curves that pricing uses but calibration takes as given.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::DuplicateCurve`] if a known curve shares a
    /// name with a fitted curve.
    pub fn with_known_curves(mut self, known: CurveBundle) -> CurveResult<Self> {
        for spec in &self.specs {
            if known.contains(&spec.name) {
                return Err(CurveError::DuplicateCurve {
                    name: spec.name.clone(),
                });
            }
        }
        self.known_curves = known;
        Ok(self)
    }

    /// Overrides the starting node rates, concatenated across curves in
    /// specification order.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::LengthMismatch`] if the length differs from
    /// the total node count.
    pub fn with_start_position(mut self, start: Vec<f64>) -> CurveResult<Self> {
        if start.len() != self.start_position.len() {
            return Err(CurveError::length_mismatch(format!(
                "start position has {} entries but the system has {} nodes",
                start.len(),
                self.start_position.len()
            )));
        }
        self.start_position = start;
        Ok(self)
    }

    /// Checks that every curve an instrument references is either fitted
    /// or known. Called by the calibrator before iterating.
    fn resolve_curve_names(&self) -> CurveResult<()> {
        for instrument in &self.instruments {
            for name in instrument.curve_names() {
                let fitted = self.specs.iter().any(|s| s.name == name);
                if !fitted && !self.known_curves.contains(name) {
                    return Err(CurveError::curve_not_found(name));
                }
            }
        }
        Ok(())
    }

    /// Offsets of each curve's parameter block.
    fn layout(&self) -> Vec<usize> {
        let mut offsets = Vec::with_capacity(self.specs.len());
        let mut offset = 0;
        for spec in &self.specs {
            offsets.push(offset);
            offset += spec.node_times.len();
        }
        offsets
    }

    /// Builds the bundle implied by the parameter vector `x`.
    fn build_bundle(&self, x: &DVector<f64>) -> CurveResult<CurveBundle> {
        let mut bundle = self.known_curves.clone();
        let mut offset = 0;
        for spec in &self.specs {
            let n = spec.node_times.len();
            let rates: Vec<f64> = x.as_slice()[offset..offset + n].to_vec();
            let curve = YieldCurve::new(spec.node_times.clone(), rates, spec.interpolation)?;
            bundle = bundle.with_curve(spec.name.clone(), curve);
            offset += n;
        }
        Ok(bundle)
    }

    /// Residual `model - market` per instrument under the bundle for `x`.
    fn residual(&self, x: &DVector<f64>) -> CurveResult<DVector<f64>> {
        let bundle = self.build_bundle(x)?;
        let mut out = DVector::zeros(self.instruments.len());
        for (i, instrument) in self.instruments.iter().enumerate() {
            out[i] = instrument.model_value(&bundle)? - self.market_rates[i];
        }
        Ok(out)
    }

    /// Analytic Jacobian: instrument zero-rate sensitivities projected
    /// onto node columns through the interpolator weights.
    fn analytic_jacobian(&self, x: &DVector<f64>) -> CurveResult<DMatrix<f64>> {
        let bundle = self.build_bundle(x)?;
        let offsets = self.layout();
        let mut jac = DMatrix::zeros(self.instruments.len(), x.len());

        for (row, instrument) in self.instruments.iter().enumerate() {
            let sens = instrument.sensitivity(&bundle)?;
            for (spec, offset) in self.specs.iter().zip(&offsets) {
                let curve = bundle.curve(&spec.name)?;
                for (time, dv_dy) in sens.entries(&spec.name) {
                    let weights = curve.node_weights(*time);
                    for (k, w) in weights.iter().enumerate() {
                        jac[(row, offset + k)] += dv_dy * w;
                    }
                }
            }
        }
        Ok(jac)
    }
}

/// Result of a successful calibration.
#[derive(Debug, Clone)]
pub struct CalibrationResult {
    /// Fitted node rates, concatenated across curves in specification
    /// order.
    pub parameters: Vec<f64>,
    /// Bundle holding the fitted curves alongside the known ones.
    pub bundle: CurveBundle,
    /// Newton iterations used.
    pub iterations: u32,
    /// Infinity norm of the residual at the solution.
    pub residual_norm: f64,
}

impl CalibrationResult {
    /// Fitted node rates of one curve.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::CurveNotFound`] for an unknown name.
    pub fn fitted_rates(&self, name: &str) -> CurveResult<&[f64]> {
        Ok(self.bundle.curve(name)?.node_rates())
    }
}

/// The global curve calibration engine.
///
/// # Example
///
/// ```rust
/// use tenor_curves::calibration::{CalibrationRequest, CurveCalibrator, CurveSpec};
/// use tenor_curves::instruments::Instrument;
///
/// let spec = CurveSpec::new("FUNDING", vec![1.0, 2.0]);
/// let instruments = vec![
///     Instrument::cash("FUNDING", 1.0),
///     Instrument::swap("FUNDING", "FUNDING", 2.0),
/// ];
/// let request =
///     CalibrationRequest::new(vec![spec], instruments, vec![0.0305, 0.0316]).unwrap();
///
/// let result = CurveCalibrator::default().calibrate(&request).unwrap();
/// assert!(result.residual_norm < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CurveCalibrator {
    solver_config: VectorSolverConfig,
    jacobian_mode: JacobianMode,
}

impl CurveCalibrator {
    /// Creates a calibrator with default solver settings and the analytic
    /// Jacobian.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the Newton solver configuration.
    #[must_use]
    pub fn with_solver_config(mut self, config: VectorSolverConfig) -> Self {
        self.solver_config = config;
        self
    }

    /// Sets the Jacobian evaluation mode.
    #[must_use]
    pub fn with_jacobian_mode(mut self, mode: JacobianMode) -> Self {
        self.jacobian_mode = mode;
        self
    }

    /// Solves the calibration problem.
    ///
    /// # Errors
    ///
    /// - [`CurveError::CurveNotFound`] if an instrument references a curve
    ///   that is neither fitted nor known
    /// - [`CurveError::CalibrationFailure`] if the Newton iteration stops
    ///   without meeting tolerance
    /// - [`CurveError::Math`] for singular Jacobians and non-finite
    ///   residuals
    pub fn calibrate(&self, request: &CalibrationRequest) -> CurveResult<CalibrationResult> {
        request.resolve_curve_names()?;

        let f = |x: &DVector<f64>| -> MathResult<DVector<f64>> {
            request.residual(x).map_err(into_math_error)
        };

        let solver = NewtonVectorSolver::new(self.solver_config);
        let x0 = DVector::from_vec(request.start_position.clone());

        let solved = match self.jacobian_mode {
            JacobianMode::Analytic => {
                let jac = |x: &DVector<f64>| -> MathResult<DMatrix<f64>> {
                    request.analytic_jacobian(x).map_err(into_math_error)
                };
                solver.find_root(f, jac, &x0)
            }
            JacobianMode::FiniteDifference => {
                let differentiator = VectorFieldDifferentiator::new(
                    FiniteDifferenceType::Central,
                    FD_JACOBIAN_STEP,
                );
                let jac =
                    |x: &DVector<f64>| -> MathResult<DMatrix<f64>> { differentiator.jacobian(&f, x) };
                solver.find_root(&f, jac, &x0)
            }
        };

        let solution = match solved {
            Ok(solution) => solution,
            Err(MathError::NonConvergence {
                iterations,
                residual_norm,
                ..
            }) => {
                return Err(CurveError::CalibrationFailure {
                    iterations: iterations as usize,
                    residual: residual_norm,
                    message: "Newton iteration hit the iteration cap".to_string(),
                })
            }
            Err(err) => return Err(err.into()),
        };

        let bundle = request.build_bundle(&solution.root)?;
        Ok(CalibrationResult {
            parameters: solution.root.iter().copied().collect(),
            bundle,
            iterations: solution.iterations,
            residual_norm: solution.residual_norm,
        })
    }
}

/// Maps curve-construction failures inside solver callbacks onto the
/// solver's error type.
fn into_math_error(err: CurveError) -> MathError {
    match err {
        CurveError::Math(math) => math,
        other => MathError::invalid_input(other.to_string()),
    }
}
