//! Convolution of two components.
//!
//! In the Fourier plane the convolution is the product of the base
//! component's full visibility (translation and flux included) with the
//! kernel's normalized shape visibility. In the image plane the two images
//! are convolved through the FFT and the result keeps the base's flux.

use super::{Component, ComponentKind, OptionValue};
use crate::error::{Result, VisFitError};
use crate::parameters::ModelParam;
use crate::utils::fft::convolve2;
use ndarray::{Array1, Array2};
use num_complex::Complex64;

const BASE_PREFIX: &str = "c1_";
const KERNEL_PREFIX: &str = "c2_";

#[derive(Debug, Clone)]
pub struct Convolution {
    base: Component,
    kernel: Component,
}

impl Convolution {
    /// The kernel may not itself be a convolution.
    pub fn new(base: Component, kernel: Component) -> Result<Self> {
        if matches!(kernel.kind(), ComponentKind::Convolution(_)) {
            return Err(VisFitError::Configuration(
                "a convolution cannot be used as a convolution kernel".to_string(),
            ));
        }
        Ok(Self { base, kernel })
    }

    pub fn base(&self) -> &Component {
        &self.base
    }

    pub fn kernel(&self) -> &Component {
        &self.kernel
    }

    /// Operand parameters renamed `c1_<name>` and `c2_<name>`. The handles are
    /// shared with the operands.
    pub fn prefixed_params(&self) -> Vec<(String, ModelParam)> {
        let prefix = |prefix: &str, c: &Component| {
            c.params()
                .iter()
                .map(|(n, p)| (format!("{}{}", prefix, n), p.clone()))
                .collect::<Vec<_>>()
        };
        let mut params = prefix(BASE_PREFIX, &self.base);
        params.extend(prefix(KERNEL_PREFIX, &self.kernel));
        params
    }

    pub(super) fn set(&mut self, name: &str, value: OptionValue) -> Result<()> {
        if let Some(rest) = name.strip_prefix(BASE_PREFIX) {
            self.base.set(rest, value)
        } else if let Some(rest) = name.strip_prefix(KERNEL_PREFIX) {
            self.kernel.set(rest, value)
        } else {
            Err(VisFitError::Configuration(format!(
                "convolution parameters are prefixed with '{}' or '{}', got '{}'",
                BASE_PREFIX, KERNEL_PREFIX, name
            )))
        }
    }

    pub fn complex_coherent_flux(
        &self,
        u: &[f64],
        v: &[f64],
        wl: Option<&[f64]>,
        t: Option<&[f64]>,
    ) -> Result<Array1<Complex64>> {
        let base = self.base.complex_coherent_flux(u, v, wl, t)?;
        let kernel = self.kernel.shape_visibility(u, v, wl, t)?;
        Ok(base * kernel)
    }

    pub fn shape_visibility(
        &self,
        u: &[f64],
        v: &[f64],
        wl: Option<&[f64]>,
        t: Option<&[f64]>,
    ) -> Result<Array1<Complex64>> {
        let base = self.base.shape_visibility(u, v, wl, t)?;
        let kernel = self.kernel.shape_visibility(u, v, wl, t)?;
        Ok(base * kernel)
    }

    pub fn image(&self, dim: usize, pix_size: f64, wl: Option<f64>, t: Option<f64>) -> Result<Array2<f64>> {
        let base = self.base.image(dim, pix_size, wl, t)?;
        let kernel = self.kernel.image(dim, pix_size, wl, t)?;
        let flux = base.sum();
        let mut out = convolve2(&base, &kernel);
        let total = out.sum();
        if total != 0.0 {
            out.mapv_inplace(|v| v / total * flux);
        }
        Ok(out)
    }
}
