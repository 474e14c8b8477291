//! Levenberg-Marquardt algorithm implementation.
//!
//! Used by the local-minimization fitter backend. The damped normal equations
//! are solved with `nalgebra` decompositions.

pub mod algorithm;
pub mod config;

pub use algorithm::{LevenbergMarquardt, LmResult};
pub use config::{DecompositionMethod, LmConfig};
