//! Local minimization of the chi-square with Levenberg-Marquardt.
//!
//! The free parameters are mapped to an unbounded internal space through
//! their bounds, so the solver never leaves the allowed region. Errors come
//! from the covariance `chi2r inv(J^T J)`, with `J` the Jacobian of the
//! normalized residuals in external space.

use super::{FitProblem, FitResults, FitterBackend, ResultMode};
use crate::error::{Result, VisFitError};
use crate::lm::{LevenbergMarquardt, LmConfig, LmResult};
use crate::problem::Problem;
use crate::simulator::reduce_chi2;
use crate::uncertainty::{calculate_covariance, standard_errors_from_covariance};
use crate::utils::finite_difference::jacobian_central;
use log::{debug, info, warn};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MinimizeConfig {
    /// Starting point; the current parameter values when `None`.
    pub initial: Option<Vec<f64>>,
    pub lm: LmConfig,
}

impl MinimizeConfig {
    pub fn with_initial(mut self, initial: Vec<f64>) -> Self {
        self.initial = Some(initial);
        self
    }

    pub fn with_lm(mut self, lm: LmConfig) -> Self {
        self.lm = lm;
        self
    }
}

/// The fit surface seen through the bounds transform.
struct BoundedResiduals<'a> {
    problem: RefCell<&'a mut FitProblem>,
    n_residuals: usize,
}

impl<'a> BoundedResiduals<'a> {
    fn new(problem: &'a mut FitProblem, start: &[f64]) -> Result<Self> {
        let n_residuals = problem.residuals(start)?.len();
        Ok(Self {
            problem: RefCell::new(problem),
            n_residuals,
        })
    }

    fn external(&self, internal: &[f64]) -> Result<Vec<f64>> {
        self.problem.borrow().free_parameters().external_values(internal)
    }

    fn residuals_at(&self, external: &[f64]) -> Result<Array1<f64>> {
        self.problem.borrow_mut().residuals(external)
    }
}

impl Problem for BoundedResiduals<'_> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let internal = params.to_vec();
        let external = self.external(&internal)?;
        self.residuals_at(&external)
    }

    fn parameter_count(&self) -> usize {
        self.problem.borrow().ndim()
    }

    fn residual_count(&self) -> usize {
        self.n_residuals
    }
}

#[derive(Debug, Clone)]
struct Solution {
    values: Vec<f64>,
    errors: Vec<f64>,
    chi2r: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Minimizer {
    config: MinimizeConfig,
    start: Vec<f64>,
    lm_result: Option<LmResult>,
    solution: Option<Solution>,
}

impl Minimizer {
    pub fn new(config: MinimizeConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &MinimizeConfig {
        &self.config
    }

    /// Raw solver output of the last run.
    pub fn lm_result(&self) -> Option<&LmResult> {
        self.lm_result.as_ref()
    }

    /// Reduced chi-square at the solution.
    pub fn chi2r(&self) -> Option<f64> {
        self.solution.as_ref().map(|s| s.chi2r)
    }
}

impl FitterBackend for Minimizer {
    type RunOptions = ();

    const DEFAULT_MODE: ResultMode = ResultMode::Best;

    fn name(&self) -> &'static str {
        "minimize"
    }

    fn prepare(&mut self, problem: &mut FitProblem) -> Result<()> {
        let ndim = problem.ndim();
        if ndim == 0 {
            return Err(VisFitError::Configuration(
                "the model has no free parameters".to_string(),
            ));
        }
        let start = match &self.config.initial {
            Some(initial) if initial.len() != ndim => {
                return Err(VisFitError::DimensionMismatch(format!(
                    "initial point has {} values for {} free parameters",
                    initial.len(),
                    ndim
                )))
            }
            Some(initial) => initial.clone(),
            None => problem.free_parameters().values(),
        };
        if let Some((name, _)) = problem
            .free_parameters()
            .iter()
            .zip(&start)
            .map(|((n, p), &v)| (n, p.bounds().contains(v)))
            .find(|(_, inside)| !inside)
        {
            return Err(VisFitError::InvalidParameter(format!(
                "initial value of {} is outside its bounds",
                name
            )));
        }
        self.start = start;
        self.lm_result = None;
        self.solution = None;
        debug!("Minimizer starting from {:?}", self.start);
        Ok(())
    }

    fn run(&mut self, problem: &mut FitProblem, _options: &()) -> Result<()> {
        problem.free_parameters().set_values(&self.start)?;
        let internal = Array1::from(problem.free_parameters().internal_values()?);
        let nfree = problem.ndim();

        let bounded = BoundedResiduals::new(problem, &self.start)?;
        let solver = LevenbergMarquardt::with_config(self.config.lm.clone());
        let result = solver.minimize(&bounded, internal)?;
        if !result.success {
            warn!("Minimization did not converge: {}", result.message);
        }

        let values = bounded.external(&result.params.to_vec())?;
        let jac = jacobian_central(
            |p: &Array1<f64>| bounded.residuals_at(&p.to_vec()),
            &Array1::from(values.clone()),
            None,
        )?;
        let n = bounded.n_residuals;
        drop(bounded);

        if n <= nfree {
            warn!("{} residuals for {} free parameters", n, nfree);
        }
        let chi2r = reduce_chi2(result.cost, n, nfree);
        let covariance = calculate_covariance(&jac, chi2r)?;
        let errors = standard_errors_from_covariance(&covariance).to_vec();
        problem.free_parameters().set_values(&values)?;

        info!(
            "Minimization finished after {} iterations ({} evaluations): chi2r = {:.4}",
            result.iterations, result.func_evals, chi2r
        );
        self.solution = Some(Solution {
            values,
            errors,
            chi2r,
        });
        self.lm_result = Some(result);
        Ok(())
    }

    fn results(&self, _problem: &FitProblem, mode: ResultMode) -> Result<FitResults> {
        if mode != ResultMode::Best {
            return Err(VisFitError::unknown_option(&mode.to_string(), &["best"]));
        }
        let solution = self.solution.as_ref().ok_or_else(|| {
            VisFitError::NotInitialized("the minimizer has not been run".to_string())
        })?;
        Ok(FitResults::symmetric(
            solution.values.clone(),
            solution.errors.clone(),
        ))
    }
}
