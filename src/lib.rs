//! # visfit-rs
//!
//! `visfit-rs` computes the complex visibilities of geometric models of
//! astronomical sources and fits them to interferometric observables.
//!
//! The library provides:
//! - Analytic components (points, disks, Gaussians, rings and their elliptic
//!   variants), image-based components and radial-profile components
//! - A parameter system with bounds, wavelength/time interpolation and links
//! - A model that sums component visibilities and renders images
//! - A simulator computing squared visibilities, phases, closure phases and
//!   the chi-square against a data set
//! - Exchangeable fitters: ensemble MCMC, nested sampling and
//!   Levenberg-Marquardt minimization (feature `fit`)
//!
//! ## Basic Usage
//!
//! ```
//! use visfit_rs::{Component, Model};
//!
//! let model = Model::new(vec![
//!     Component::point(&[("f", 0.3.into())])?,
//!     Component::uniform_disk(&[("d", 2.0.into()), ("f", 0.7.into())])?,
//! ]);
//! let cf = model.complex_coherent_flux(&[0.0, 5e7], &[0.0, 0.0], Some(&[2e-6, 2e-6][..]), None)?;
//! assert!((cf[0].re - 1.0).abs() < 1e-12);
//! assert!(cf[1].norm() < 1.0);
//! # Ok::<(), visfit_rs::VisFitError>(())
//! ```

pub mod error;
pub mod units;

// Parameter system
pub mod parameters;

// Numerics
pub mod special;
pub mod utils;

// Models and data
pub mod components;
pub mod data;
pub mod model;
pub mod simulator;

pub mod problem;

#[cfg(feature = "fit")]
pub mod lm;

#[cfg(feature = "fit")]
pub mod uncertainty;

#[cfg(feature = "fit")]
pub mod fitter;

// Re-exports for convenience
pub use components::Component;
pub use error::{Result, VisFitError};
pub use model::Model;
pub use simulator::Simulator;

#[cfg(feature = "fit")]
pub use fitter::{Fitter, ResultMode};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
