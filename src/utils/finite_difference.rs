//! Finite difference Jacobians.
//!
//! The model visibilities have no analytic derivatives with respect to the
//! parameters (interpolated and image-based parameters in particular), so the
//! local minimizer and the covariance estimate both differentiate numerically.

use crate::error::{Result, VisFitError};
use crate::problem::Problem;
use ndarray::{Array1, Array2};

/// Default relative step size for finite differences.
const DEFAULT_EPSILON: f64 = 1e-8;

fn step(value: f64, eps: f64) -> f64 {
    if value.abs() > eps {
        value.abs() * eps
    } else {
        eps
    }
}

/// Forward-difference Jacobian, `J[i, j] = d residual[i] / d param[j]`.
pub fn jacobian<P: Problem + ?Sized>(
    problem: &P,
    params: &Array1<f64>,
    epsilon: Option<f64>,
) -> Result<Array2<f64>> {
    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    let n_params = params.len();
    let n_residuals = problem.residual_count();

    let residuals = problem.eval(params)?;
    if residuals.len() != n_residuals {
        return Err(VisFitError::DimensionMismatch(format!(
            "Expected {} residuals, got {}",
            n_residuals,
            residuals.len()
        )));
    }

    let mut jac = Array2::zeros((n_residuals, n_params));
    for j in 0..n_params {
        let mut perturbed = params.clone();
        let eps_j = step(params[j], eps);
        perturbed[j] += eps_j;

        let r = problem.eval(&perturbed)?;
        for i in 0..n_residuals {
            jac[[i, j]] = (r[i] - residuals[i]) / eps_j;
        }
    }

    Ok(jac)
}

/// Central-difference Jacobian of a vector function. Twice the cost of
/// [`jacobian`], used where accuracy matters more than speed (error bars).
pub fn jacobian_central<F>(f: F, params: &Array1<f64>, epsilon: Option<f64>) -> Result<Array2<f64>>
where
    F: Fn(&Array1<f64>) -> Result<Array1<f64>>,
{
    let eps = epsilon.unwrap_or(1e-6);
    let n_params = params.len();
    let mut columns = Vec::with_capacity(n_params);

    for j in 0..n_params {
        let eps_j = step(params[j], eps);
        let mut forward = params.clone();
        forward[j] += eps_j;
        let mut backward = params.clone();
        backward[j] -= eps_j;

        let rf = f(&forward)?;
        let rb = f(&backward)?;
        if rf.len() != rb.len() {
            return Err(VisFitError::DimensionMismatch(format!(
                "function returned {} then {} values",
                rf.len(),
                rb.len()
            )));
        }
        columns.push((rf - rb) / (2.0 * eps_j));
    }

    let n_out = columns.first().map_or(0, |c| c.len());
    let mut jac = Array2::zeros((n_out, n_params));
    for (j, col) in columns.iter().enumerate() {
        jac.column_mut(j).assign(col);
    }
    Ok(jac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    // r1 = x^2 - 1, r2 = y^2 - 2
    struct TestProblem;

    impl Problem for TestProblem {
        fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
            let x = params[0];
            let y = params[1];
            Ok(array![x.powi(2) - 1.0, y.powi(2) - 2.0])
        }

        fn parameter_count(&self) -> usize {
            2
        }

        fn residual_count(&self) -> usize {
            2
        }
    }

    #[test]
    fn test_jacobian() {
        let params = array![2.0, 3.0];
        let jac = jacobian(&TestProblem, &params, None).unwrap();

        assert_eq!(jac.shape(), &[2, 2]);
        assert_relative_eq!(jac[[0, 0]], 4.0, epsilon = 1e-5);
        assert_relative_eq!(jac[[0, 1]], 0.0, epsilon = 1e-5);
        assert_relative_eq!(jac[[1, 0]], 0.0, epsilon = 1e-5);
        assert_relative_eq!(jac[[1, 1]], 6.0, epsilon = 1e-5);
    }

    #[test]
    fn test_jacobian_central() {
        let f = |p: &Array1<f64>| Ok(array![p[0] * p[1], p[0].sin()]);
        let jac = jacobian_central(f, &array![0.5, 2.0], None).unwrap();
        assert_relative_eq!(jac[[0, 0]], 2.0, epsilon = 1e-7);
        assert_relative_eq!(jac[[0, 1]], 0.5, epsilon = 1e-7);
        assert_relative_eq!(jac[[1, 0]], 0.5f64.cos(), epsilon = 1e-7);
        assert_relative_eq!(jac[[1, 1]], 0.0, epsilon = 1e-7);
    }
}
