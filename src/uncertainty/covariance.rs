//! # Covariance Matrix Calculations
//!
//! Covariance and correlation matrices from the Jacobian of a least-squares
//! problem, used for the error bars of the local minimizer.

use crate::error::{Result, VisFitError};
use crate::utils::matrix_convert::{nalgebra_to_ndarray, ndarray_to_nalgebra};
use ndarray::{Array1, Array2};

/// Covariance matrix `redchi * inv(J^T J)`.
///
/// `J^T J` is inverted through Cholesky when it is positive definite and
/// through the SVD pseudo-inverse otherwise, so that a parameter the data do
/// not constrain yields zero variance rather than an error.
pub fn calculate_covariance(jacobian: &Array2<f64>, redchi: f64) -> Result<Array2<f64>> {
    let j = ndarray_to_nalgebra(jacobian);
    let jtj = j.transpose() * &j;

    let inv = match jtj.clone().cholesky() {
        Some(c) => c.inverse(),
        None => jtj
            .pseudo_inverse(1e-12)
            .map_err(|e| VisFitError::ComputationError(e.to_string()))?,
    };

    Ok(nalgebra_to_ndarray(&(inv * redchi)))
}

/// Correlation matrix, `covar[i, j] / sqrt(covar[i, i] covar[j, j])`.
pub fn calculate_correlation(covar: &Array2<f64>) -> Array2<f64> {
    let n = covar.nrows();
    Array2::from_shape_fn((n, n), |(i, j)| {
        if i == j {
            return 1.0;
        }
        let denom = (covar[[i, i]] * covar[[j, j]]).sqrt();
        if denom > 0.0 {
            covar[[i, j]] / denom
        } else {
            0.0
        }
    })
}

/// Square roots of the diagonal; non-positive variances give zero.
pub fn standard_errors_from_covariance(covar: &Array2<f64>) -> Array1<f64> {
    covar
        .diag()
        .mapv(|v| if v > 0.0 { v.sqrt() } else { 0.0 })
}
