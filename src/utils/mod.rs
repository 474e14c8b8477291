//! Numerical helpers shared by the model and the fitters.

pub mod fft;
pub mod finite_difference;
#[cfg(feature = "fit")]
pub mod matrix_convert;
pub mod stats;

pub use fft::{centered_freq, fft2, fftfreq, fftshift2, ifft2, ifftshift2};
pub use finite_difference::{jacobian, jacobian_central};
