//! Implementation of the Levenberg-Marquardt algorithm.

use log::debug;
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};
use std::fmt;

use crate::error::{Result, VisFitError};
use crate::problem::Problem;
use crate::utils::matrix_convert::{
    nalgebra_vec_to_ndarray, ndarray_to_nalgebra, ndarray_vec_to_nalgebra,
};

use super::config::{DecompositionMethod, LmConfig};

/// Result of the Levenberg-Marquardt optimization.
#[derive(Debug, Clone)]
pub struct LmResult {
    /// Optimized parameter values
    pub params: Array1<f64>,

    /// Residuals at the solution
    pub residuals: Array1<f64>,

    /// Sum of squared residuals
    pub cost: f64,

    /// Number of iterations performed
    pub iterations: usize,

    /// Number of function evaluations
    pub func_evals: usize,

    /// Whether the optimization succeeded
    pub success: bool,

    /// A message describing the result
    pub message: String,

    /// The Jacobian matrix at the solution (if requested)
    pub jacobian: Option<Array2<f64>>,
}

impl fmt::Display for LmResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimization Result:")?;
        writeln!(f, "  Success: {}", self.success)?;
        writeln!(f, "  Message: {}", self.message)?;
        writeln!(f, "  Cost: {:.6e}", self.cost)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function evaluations: {}", self.func_evals)?;
        writeln!(f, "  Parameters: {:?}", self.params)?;
        Ok(())
    }
}

enum IterationStatus {
    Continue,
    Converged(String),
    Failed(String),
}

/// The Levenberg-Marquardt optimizer.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    config: LmConfig,
}

impl LevenbergMarquardt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LmConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LmConfig {
        &self.config
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    pub fn with_ftol(mut self, ftol: f64) -> Self {
        self.config.ftol = ftol;
        self
    }

    pub fn with_xtol(mut self, xtol: f64) -> Self {
        self.config.xtol = xtol;
        self
    }

    pub fn with_gtol(mut self, gtol: f64) -> Self {
        self.config.gtol = gtol;
        self
    }

    pub fn with_calc_jacobian(mut self, calc_jacobian: bool) -> Self {
        self.config.calc_jacobian = calc_jacobian;
        self
    }

    /// Minimize the sum of squared residuals of `problem`, starting from
    /// `initial_params`.
    pub fn minimize<P: Problem + ?Sized>(
        &self,
        problem: &P,
        initial_params: Array1<f64>,
    ) -> Result<LmResult> {
        let n_params = problem.parameter_count();
        if initial_params.len() != n_params {
            return Err(VisFitError::DimensionMismatch(format!(
                "Expected {} parameters, got {}",
                n_params,
                initial_params.len()
            )));
        }

        let mut params = initial_params;
        let mut lambda = self.config.initial_lambda;
        let mut residuals = problem.eval(&params)?;
        let mut cost: f64 = residuals.iter().map(|r| r.powi(2)).sum();
        let mut func_evals = 1;
        let mut iterations = 0;

        let message = loop {
            let jac = ndarray_to_nalgebra(&problem.jacobian(&params)?);
            func_evals += n_params;
            let r = ndarray_vec_to_nalgebra(&residuals);

            let g = jac.transpose() * &r;
            let gradient_norm = g.norm();
            if gradient_norm < self.config.gtol {
                break format!(
                    "Gradient convergence: ||g|| = {:.2e} < {:.2e}",
                    gradient_norm, self.config.gtol
                );
            }

            // Inner loop: raise lambda until a step lowers the cost.
            let status = loop {
                let step = match self.calculate_step(&jac, &g, lambda) {
                    Some(s) => s,
                    None => {
                        lambda = (lambda * self.config.lambda_up_factor).min(self.config.max_lambda);
                        if lambda >= self.config.max_lambda {
                            return Err(VisFitError::ConvergenceFailure(
                                "Failed to calculate step, and lambda reached maximum".to_string(),
                            ));
                        }
                        continue;
                    }
                };

                let new_params = &params + &nalgebra_vec_to_ndarray(&step);
                let new_residuals = problem.eval(&new_params)?;
                func_evals += 1;
                let new_cost: f64 = new_residuals.iter().map(|r| r.powi(2)).sum();

                if new_cost.is_finite() && new_cost < cost {
                    let param_change = step.iter().fold(0.0_f64, |m, x| m.max(x.abs()));
                    let cost_change = (cost - new_cost) / cost.max(1e-300);

                    params = new_params;
                    residuals = new_residuals;
                    cost = new_cost;
                    lambda = (lambda * self.config.lambda_down_factor).max(self.config.min_lambda);
                    iterations += 1;

                    break if param_change < self.config.xtol {
                        IterationStatus::Converged(format!(
                            "Parameter convergence: |dx| = {:.2e} < {:.2e}",
                            param_change, self.config.xtol
                        ))
                    } else if cost_change < self.config.ftol {
                        IterationStatus::Converged(format!(
                            "Cost convergence: |df|/|f| = {:.2e} < {:.2e}",
                            cost_change, self.config.ftol
                        ))
                    } else if iterations >= self.config.max_iterations {
                        IterationStatus::Failed(format!(
                            "Maximum iterations ({}) reached",
                            self.config.max_iterations
                        ))
                    } else {
                        IterationStatus::Continue
                    };
                }

                lambda = (lambda * self.config.lambda_up_factor).min(self.config.max_lambda);
                if lambda >= self.config.max_lambda {
                    break IterationStatus::Failed(
                        "Failed to decrease cost, and lambda reached maximum".to_string(),
                    );
                }
            };

            match status {
                IterationStatus::Continue => {
                    debug!("LM iteration {}: cost = {:.6e}, lambda = {:.1e}", iterations, cost, lambda);
                }
                IterationStatus::Converged(message) => break message,
                IterationStatus::Failed(message) => {
                    return Ok(LmResult {
                        jacobian: self.final_jacobian(problem, &params)?,
                        params,
                        residuals,
                        cost,
                        iterations,
                        func_evals,
                        success: false,
                        message,
                    });
                }
            }
        };

        Ok(LmResult {
            jacobian: self.final_jacobian(problem, &params)?,
            params,
            residuals,
            cost,
            iterations,
            func_evals,
            success: true,
            message,
        })
    }

    fn final_jacobian<P: Problem + ?Sized>(
        &self,
        problem: &P,
        params: &Array1<f64>,
    ) -> Result<Option<Array2<f64>>> {
        if self.config.calc_jacobian {
            Ok(Some(problem.jacobian(params)?))
        } else {
            Ok(None)
        }
    }

    /// Solve `(J^T J + lambda I) delta = -J^T r`, with `g = J^T r`.
    /// Returns `None` when the system cannot be solved.
    fn calculate_step(&self, j: &DMatrix<f64>, g: &DVector<f64>, lambda: f64) -> Option<DVector<f64>> {
        let n = j.ncols();
        let a = j.transpose() * j + DMatrix::identity(n, n) * lambda;
        let rhs = -g;

        let svd_solve = |a: DMatrix<f64>| {
            a.svd(true, true)
                .solve(&rhs, 1e-14)
                .ok()
                .filter(|s| s.iter().all(|v| v.is_finite()))
        };

        match self.config.decomposition_method {
            DecompositionMethod::Cholesky => a.cholesky().map(|c| c.solve(&rhs)),
            DecompositionMethod::Lu => a.lu().solve(&rhs),
            DecompositionMethod::Svd => svd_solve(a),
            DecompositionMethod::Auto => match a.clone().cholesky() {
                Some(c) => Some(c.solve(&rhs)),
                None => svd_solve(a),
            },
        }
    }
}
