//! Configuration options for the Levenberg-Marquardt algorithm.

use serde::{Deserialize, Serialize};

/// Method for solving the damped normal equations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DecompositionMethod {
    /// Cholesky decomposition (fastest, needs a positive definite system)
    Cholesky,

    /// LU decomposition with partial pivoting
    Lu,

    /// SVD pseudo-inverse (slowest, handles rank-deficient systems)
    Svd,

    /// Cholesky first, SVD when it fails
    #[default]
    Auto,
}

/// Configuration options for the Levenberg-Marquardt algorithm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LmConfig {
    /// Maximum number of iterations. Default: 200
    pub max_iterations: usize,

    /// Tolerance for relative change in cost. Default: 1e-8
    pub ftol: f64,

    /// Tolerance for change in parameter values. Default: 1e-8
    pub xtol: f64,

    /// Tolerance for gradient norm. Default: 1e-8
    pub gtol: f64,

    /// Initial value for the damping parameter. Default: 1e-3
    pub initial_lambda: f64,

    /// Factor by which to increase lambda. Default: 10.0
    pub lambda_up_factor: f64,

    /// Factor by which to decrease lambda. Default: 0.1
    pub lambda_down_factor: f64,

    /// Minimum value for lambda. Default: 1e-10
    pub min_lambda: f64,

    /// Maximum value for lambda. Default: 1e10
    pub max_lambda: f64,

    /// Method to use for solving the linear system. Default: Auto
    pub decomposition_method: DecompositionMethod,

    /// Whether to return the Jacobian at the solution. Default: false
    pub calc_jacobian: bool,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            ftol: 1e-8,
            xtol: 1e-8,
            gtol: 1e-8,
            initial_lambda: 1e-3,
            lambda_up_factor: 10.0,
            lambda_down_factor: 0.1,
            min_lambda: 1e-10,
            max_lambda: 1e10,
            decomposition_method: DecompositionMethod::default(),
            calc_jacobian: false,
        }
    }
}

impl LmConfig {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_ftol(mut self, ftol: f64) -> Self {
        self.ftol = ftol;
        self
    }

    pub fn with_xtol(mut self, xtol: f64) -> Self {
        self.xtol = xtol;
        self
    }

    pub fn with_gtol(mut self, gtol: f64) -> Self {
        self.gtol = gtol;
        self
    }

    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.initial_lambda = lambda;
        self
    }

    pub fn with_decomposition_method(mut self, method: DecompositionMethod) -> Self {
        self.decomposition_method = method;
        self
    }

    pub fn with_calc_jacobian(mut self, calc_jacobian: bool) -> Self {
        self.calc_jacobian = calc_jacobian;
        self
    }
}
