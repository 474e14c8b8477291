//! # Uncertainty Estimation
//!
//! Parameter error bars for the local minimizer, derived from the Jacobian at
//! the solution.

pub mod covariance;

pub use covariance::{calculate_correlation, calculate_covariance, standard_errors_from_covariance};
