//! # Fitters
//!
//! A [`Fitter`] turns a [`Simulator`] into a log-probability surface over the
//! model's free parameters and hands it to an exchangeable search backend:
//!
//! - [`EnsembleSampler`]: affine-invariant ensemble MCMC.
//! - [`NestedSampler`]: static nested sampling with evidence estimate.
//! - [`Minimizer`]: Levenberg-Marquardt local minimization.
//!
//! The usage sequence is `prepare`, `run`, then `get_results`. The free
//! parameters are collected once at `prepare` and are shared handles on the
//! model's own parameters, so the backends move the model directly.
//!
//! ```no_run
//! use visfit_rs::components::Component;
//! use visfit_rs::data::{DataSet, VisTable};
//! use visfit_rs::fitter::{EnsembleRunOptions, EnsembleSampler, Fitter, ResultMode};
//! use visfit_rs::model::Model;
//!
//! let model = Model::new(vec![Component::uniform_disk(&[("d", 3.0.into())])?]);
//! model.components()[0].param("d").unwrap().as_plain().unwrap().set_bounds(0.0, 20.0)?;
//! let table = VisTable::new(vec![1e7, 3e7], vec![0.0, 0.0], vec![2e-6, 2e-6])?
//!     .with_vis2(vec![0.9, 0.4], vec![0.02, 0.02])?;
//!
//! let mut fitter = Fitter::new(model, DataSet::new().with_vis(table), EnsembleSampler::default());
//! fitter.prepare()?;
//! fitter.run(&EnsembleRunOptions::new(2000))?;
//! let results = fitter.get_results(ResultMode::Median)?;
//! println!("{}", fitter.summary()?);
//! # Ok::<(), visfit_rs::VisFitError>(())
//! ```

pub mod ensemble;
pub mod minimize;
pub mod moves;
pub mod nested;

pub use ensemble::{
    EnsembleConfig, EnsembleResultOptions, EnsembleRunOptions, EnsembleSampler, InitMethod,
};
pub use minimize::{MinimizeConfig, Minimizer};
pub use moves::Move;
pub use nested::{NestedConfig, NestedRunOptions, NestedSampler};

use crate::data::{DataSet, DataType};
use crate::error::{Result, VisFitError};
use crate::model::Model;
use crate::parameters::{Bounds, ParameterSet};
use crate::simulator::{ComputeOptions, Simulator};
use log::debug;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write as _;
use std::str::FromStr;

/// How a point estimate is extracted from a backend's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultMode {
    /// Sample (or solution) with the lowest chi-square.
    Best,
    Mean,
    Median,
}

impl ResultMode {
    pub const NAMES: [&'static str; 3] = ["best", "mean", "median"];
}

impl FromStr for ResultMode {
    type Err = VisFitError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "best" => Ok(ResultMode::Best),
            "mean" => Ok(ResultMode::Mean),
            "median" => Ok(ResultMode::Median),
            _ => Err(VisFitError::unknown_option(s, &Self::NAMES)),
        }
    }
}

impl fmt::Display for ResultMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResultMode::Best => "best",
            ResultMode::Mean => "mean",
            ResultMode::Median => "median",
        };
        write!(f, "{}", name)
    }
}

/// Point estimates and errors of the free parameters, in
/// [`Fitter::free_parameters`] order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResults {
    pub values: Vec<f64>,
    /// Mean of the lower and upper errors.
    pub errors: Vec<f64>,
    pub errors_minus: Vec<f64>,
    pub errors_plus: Vec<f64>,
}

impl FitResults {
    pub fn new(values: Vec<f64>, errors_minus: Vec<f64>, errors_plus: Vec<f64>) -> Self {
        let errors = errors_minus
            .iter()
            .zip(&errors_plus)
            .map(|(m, p)| 0.5 * (m + p))
            .collect();
        Self {
            values,
            errors,
            errors_minus,
            errors_plus,
        }
    }

    pub fn symmetric(values: Vec<f64>, errors: Vec<f64>) -> Self {
        Self::new(values, errors.clone(), errors)
    }
}

/// The surface a backend explores: the simulator and the free parameters.
#[derive(Debug, Clone)]
pub struct FitProblem {
    simulator: Simulator,
    free: ParameterSet,
    data_types: Option<Vec<DataType>>,
}

impl FitProblem {
    fn new(simulator: Simulator) -> Self {
        Self {
            simulator,
            free: ParameterSet::new(),
            data_types: None,
        }
    }

    pub fn ndim(&self) -> usize {
        self.free.len()
    }

    pub fn free_parameters(&self) -> &ParameterSet {
        &self.free
    }

    pub fn limits(&self) -> Vec<Bounds> {
        self.free.bounds()
    }

    pub fn simulator(&self) -> &Simulator {
        &self.simulator
    }

    fn chi2_options(&self) -> ComputeOptions {
        ComputeOptions {
            chi2: true,
            simulated: false,
            data_types: self.data_types.clone(),
        }
    }

    /// Reduced chi-square with the free parameters set to `theta`.
    pub fn chi2r(&mut self, theta: &[f64]) -> Result<f64> {
        self.free.set_values(theta)?;
        let options = self.chi2_options();
        self.simulator.compute(&options)?;
        Ok(self.simulator.chi2r())
    }

    /// `-chi2r / 2`, or `-inf` when a value is not strictly inside its bounds.
    pub fn log_probability(&mut self, theta: &[f64]) -> Result<f64> {
        if !self.free.all_within_open_bounds(theta) {
            return Ok(f64::NEG_INFINITY);
        }
        let chi2r = self.chi2r(theta)?;
        Ok(if chi2r.is_nan() {
            f64::NEG_INFINITY
        } else {
            -0.5 * chi2r
        })
    }

    /// `-chi2r / 2` without the bounds check, `-inf` on NaN.
    pub fn log_likelihood(&mut self, theta: &[f64]) -> Result<f64> {
        let chi2r = self.chi2r(theta)?;
        Ok(if chi2r.is_nan() {
            f64::NEG_INFINITY
        } else {
            -0.5 * chi2r
        })
    }

    /// Normalized residuals with the free parameters set to `theta`.
    pub fn residuals(&mut self, theta: &[f64]) -> Result<Array1<f64>> {
        self.free.set_values(theta)?;
        self.simulator.residuals(self.data_types.as_deref())
    }

    /// Number of data points entering the chi-square.
    pub fn data_count(&self) -> usize {
        let kinds = match &self.data_types {
            Some(types) => types.clone(),
            None => self.simulator.data().data_types(),
        };
        self.simulator.data().count(&kinds)
    }
}

/// A search strategy over a [`FitProblem`].
pub trait FitterBackend {
    /// Options of a run.
    type RunOptions;

    /// Mode used by [`Fitter::run`] to publish results.
    const DEFAULT_MODE: ResultMode;

    fn name(&self) -> &'static str;

    /// Set up the backend once the free parameters are known.
    fn prepare(&mut self, problem: &mut FitProblem) -> Result<()>;

    fn run(&mut self, problem: &mut FitProblem, options: &Self::RunOptions) -> Result<()>;

    /// Extract estimates. Modes a backend does not support fail with
    /// [`VisFitError::UnknownOption`].
    fn results(&self, problem: &FitProblem, mode: ResultMode) -> Result<FitResults>;
}

/// A model, a data set and a search backend.
#[derive(Debug, Clone)]
pub struct Fitter<B: FitterBackend> {
    problem: FitProblem,
    backend: B,
    prepared: bool,
    has_run: bool,
}

impl<B: FitterBackend> Fitter<B> {
    pub fn new(model: Model, data: DataSet, backend: B) -> Self {
        Self::from_simulator(Simulator::new(model, data), backend)
    }

    pub fn from_simulator(simulator: Simulator, backend: B) -> Self {
        Self {
            problem: FitProblem::new(simulator),
            backend,
            prepared: false,
            has_run: false,
        }
    }

    /// Restrict the chi-square to some observable kinds.
    pub fn with_data_types(mut self, data_types: Vec<DataType>) -> Self {
        self.problem.data_types = Some(data_types);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn simulator(&self) -> &Simulator {
        &self.problem.simulator
    }

    pub fn model(&self) -> &Model {
        self.problem.simulator.model()
    }

    /// Free parameters collected at [`prepare`](Self::prepare); empty before.
    pub fn free_parameters(&self) -> &ParameterSet {
        &self.problem.free
    }

    /// Bounds of the free parameters, by name.
    pub fn limits(&self) -> Vec<(String, Bounds)> {
        self.problem
            .free
            .iter()
            .map(|(n, p)| (n.to_string(), p.bounds()))
            .collect()
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    /// Collect the free parameters and set up the backend.
    pub fn prepare(&mut self) -> Result<()> {
        self.problem.free = self.problem.simulator.model().free_parameters()?;
        let nfree = self.problem.free.len();
        self.problem.simulator.set_free_count(nfree);
        debug!(
            "Preparing {} fitter with {} free parameters: {}",
            self.backend.name(),
            self.problem.ndim(),
            self.limits()
                .iter()
                .map(|(n, b)| format!("{} in [{}, {}]", n, b.min, b.max))
                .collect::<Vec<_>>()
                .join(", ")
        );
        self.backend.prepare(&mut self.problem)?;
        self.prepared = true;
        self.has_run = false;
        Ok(())
    }

    /// Run the backend, then publish results in the backend's default mode.
    pub fn run(&mut self, options: &B::RunOptions) -> Result<FitResults> {
        if !self.prepared {
            return Err(VisFitError::NotInitialized(
                "Fitter not initialized: call prepare() before run()".to_string(),
            ));
        }
        self.backend.run(&mut self.problem, options)?;
        self.has_run = true;
        self.get_results(B::DEFAULT_MODE)
    }

    /// Extract estimates, write values and errors into the free parameters
    /// and recompute the simulator at that point.
    pub fn get_results(&mut self, mode: ResultMode) -> Result<FitResults> {
        if !self.has_run {
            return Err(VisFitError::NotInitialized(
                "no results before run()".to_string(),
            ));
        }
        let results = self.backend.results(&self.problem, mode)?;
        self.problem.free.set_values(&results.values)?;
        self.problem.free.set_errors(&results.errors)?;
        let options = ComputeOptions {
            chi2: true,
            simulated: true,
            data_types: self.problem.data_types.clone(),
        };
        self.problem.simulator.compute(&options)?;
        Ok(results)
    }

    /// Like [`get_results`](Self::get_results) with the mode given by name.
    pub fn get_results_str(&mut self, mode: &str) -> Result<FitResults> {
        self.get_results(mode.parse()?)
    }

    /// One line per free parameter (`name = value ± error unit`) and the
    /// reduced chi-square.
    pub fn summary(&self) -> Result<String> {
        if !self.has_run {
            return Err(VisFitError::NotInitialized(
                "no results before run()".to_string(),
            ));
        }
        let mut out = String::new();
        for (name, p) in self.problem.free.iter() {
            let _ = writeln!(
                out,
                "{} = {:.5} ± {:.5} {}",
                name,
                p.value(),
                p.error(),
                p.unit().label()
            );
        }
        let _ = write!(out, "chi2r = {:.5}", self.problem.simulator.chi2r());
        Ok(out)
    }
}
