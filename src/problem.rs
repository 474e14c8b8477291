//! Least-squares problem definition.
//!
//! A [`Problem`] maps a parameter vector to a vector of residuals. The
//! Levenberg-Marquardt engine minimizes the sum of their squares.

use crate::error::Result;
use ndarray::{Array1, Array2};

/// A nonlinear least-squares problem.
///
/// # Example
///
/// ```
/// use ndarray::{array, Array1};
/// use visfit_rs::problem::Problem;
/// use visfit_rs::Result;
///
/// struct Line {
///     x: Array1<f64>,
///     y: Array1<f64>,
/// }
///
/// impl Problem for Line {
///     fn eval(&self, p: &Array1<f64>) -> Result<Array1<f64>> {
///         Ok(&self.x * p[0] + p[1] - &self.y)
///     }
///     fn parameter_count(&self) -> usize {
///         2
///     }
///     fn residual_count(&self) -> usize {
///         self.x.len()
///     }
/// }
///
/// let line = Line { x: array![0.0, 1.0], y: array![1.0, 3.0] };
/// assert_eq!(line.eval_cost(&array![2.0, 1.0]).unwrap(), 0.0);
/// ```
pub trait Problem {
    /// Residuals at `params`.
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>>;

    fn parameter_count(&self) -> usize;

    fn residual_count(&self) -> usize;

    /// Jacobian of the residuals. Defaults to forward finite differences.
    fn jacobian(&self, params: &Array1<f64>) -> Result<Array2<f64>> {
        crate::utils::finite_difference::jacobian(self, params, None)
    }

    /// Sum of squared residuals.
    fn eval_cost(&self, params: &Array1<f64>) -> Result<f64> {
        let residuals = self.eval(params)?;
        Ok(residuals.iter().map(|r| r.powi(2)).sum())
    }
}
