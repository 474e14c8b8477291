//! Models: ordered collections of components.
//!
//! A [`Model`] sums the complex coherent fluxes of its components, renders
//! images (directly or through the inverse FFT of the aggregated visibility)
//! and flattens the component parameters into a [`ParameterSet`] for the
//! fitters.

use crate::components::Component;
use crate::error::{Result, VisFitError};
use crate::parameters::{ModelParam, ParameterSet};
use crate::units::MAS2RAD;
use crate::utils::fft::{centered_freq, fftshift2, ifft2, ifftshift2};
use ndarray::{Array1, Array2, Array4, ArrayD, Axis};
use num_complex::Complex64;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wavelength used by the FFT image mode when none is given (m).
const DEFAULT_FT_WAVELENGTH: f64 = 1e-6;

/// Options of [`Model::image`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageOptions {
    /// Side of the image in pixels.
    pub dim: usize,
    /// Pixel size (mas).
    pub pix_size: f64,
    /// Wavelengths (m); empty for a single achromatic slice.
    pub wl: Vec<f64>,
    /// Times (MJD s); empty for a single static slice.
    pub t: Vec<f64>,
    /// Render through the inverse FFT of the model visibility. The phase is
    /// discarded, so only centro-symmetric models are reproduced exactly.
    pub from_ft: bool,
    /// Remove length-1 time and wavelength axes.
    pub squeeze: bool,
}

impl ImageOptions {
    pub fn new(dim: usize, pix_size: f64) -> Self {
        Self {
            dim,
            pix_size,
            wl: Vec::new(),
            t: Vec::new(),
            from_ft: false,
            squeeze: true,
        }
    }

    pub fn with_wl(mut self, wl: Vec<f64>) -> Self {
        self.wl = wl;
        self
    }

    pub fn with_time(mut self, t: Vec<f64>) -> Self {
        self.t = t;
        self
    }

    pub fn with_from_ft(mut self, from_ft: bool) -> Self {
        self.from_ft = from_ft;
        self
    }

    pub fn with_squeeze(mut self, squeeze: bool) -> Self {
        self.squeeze = squeeze;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Model {
    components: Vec<Component>,
}

impl Model {
    pub fn new(components: Vec<Component>) -> Self {
        Self { components }
    }

    pub fn push(&mut self, component: Component) {
        self.components.push(component);
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn components_mut(&mut self) -> &mut [Component] {
        &mut self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Sum of the components' complex coherent fluxes.
    pub fn complex_coherent_flux(
        &self,
        u: &[f64],
        v: &[f64],
        wl: Option<&[f64]>,
        t: Option<&[f64]>,
    ) -> Result<Array1<Complex64>> {
        let mut total = Array1::zeros(u.len());
        for component in &self.components {
            total += &component.complex_coherent_flux(u, v, wl, t)?;
        }
        Ok(total)
    }

    /// Image hypercube `[t, wl, y, x]`. With `squeeze`, length-1 time and
    /// wavelength axes are removed, so a single image is 2-D.
    pub fn image(&self, options: &ImageOptions) -> Result<ArrayD<f64>> {
        if options.dim == 0 || !(options.pix_size > 0.0) {
            return Err(VisFitError::InvalidInput(format!(
                "image needs a positive dimension and pixel size (got {} and {})",
                options.dim, options.pix_size
            )));
        }
        let wls: Vec<Option<f64>> = if options.wl.is_empty() {
            vec![None]
        } else {
            options.wl.iter().copied().map(Some).collect()
        };
        let ts: Vec<Option<f64>> = if options.t.is_empty() {
            vec![None]
        } else {
            options.t.iter().copied().map(Some).collect()
        };

        let conditions: Vec<(Option<f64>, Option<f64>)> = ts
            .iter()
            .flat_map(|&t| wls.iter().map(move |&wl| (t, wl)))
            .collect();

        let slices = conditions
            .par_iter()
            .map(|&(t, wl)| {
                if options.from_ft {
                    self.image_from_ft(options.dim, options.pix_size, wl, t)
                } else {
                    self.direct_image(options.dim, options.pix_size, wl, t)
                }
            })
            .collect::<Result<Vec<Array2<f64>>>>()?;

        let dim = options.dim;
        let flat: Vec<f64> = slices.into_iter().flat_map(|s| s.into_iter()).collect();
        let cube = Array4::from_shape_vec((ts.len(), wls.len(), dim, dim), flat)
            .map_err(|e| VisFitError::ComputationError(e.to_string()))?;

        let mut out = cube.into_dyn();
        if options.squeeze {
            if wls.len() == 1 {
                out = out.index_axis_move(Axis(1), 0);
            }
            if ts.len() == 1 {
                out = out.index_axis_move(Axis(0), 0);
            }
        }
        Ok(out)
    }

    fn direct_image(&self, dim: usize, pix_size: f64, wl: Option<f64>, t: Option<f64>) -> Result<Array2<f64>> {
        let mut image = Array2::zeros((dim, dim));
        for component in &self.components {
            image += &component.image(dim, pix_size, wl, t)?;
        }
        Ok(image)
    }

    fn image_from_ft(&self, dim: usize, pix_size: f64, wl: Option<f64>, t: Option<f64>) -> Result<Array2<f64>> {
        let freq = centered_freq(dim, pix_size * MAS2RAD);
        let mut u = Vec::with_capacity(dim * dim);
        let mut v = Vec::with_capacity(dim * dim);
        for i in 0..dim {
            for j in 0..dim {
                u.push(freq[j]);
                v.push(freq[i]);
            }
        }
        let wl = [wl.unwrap_or(DEFAULT_FT_WAVELENGTH)];
        let t = t.map(|t| [t]);
        let ft = self.complex_coherent_flux(&u, &v, Some(&wl[..]), t.as_ref().map(|a| &a[..]))?;
        let ft = ft
            .into_shape((dim, dim))
            .map_err(|e| VisFitError::ComputationError(e.to_string()))?;
        Ok(fftshift2(&ifft2(&ifftshift2(&ft))).mapv(|z| z.norm()))
    }

    /// Flattened parameters keyed `c{i}_{shortname}_{name}` (1-based component
    /// index), with `_interp{k}` appended for the nodes of interpolated
    /// parameters. Linked and normalization parameters are skipped, and a
    /// parameter shared between components is listed once.
    pub fn parameters(&self, free_only: bool) -> Result<ParameterSet> {
        let mut set = ParameterSet::new();
        for (i, component) in self.components.iter().enumerate() {
            let prefix = format!("c{}_{}", i + 1, component.shortname());
            for (name, param) in component.params() {
                if matches!(param, ModelParam::Linked(_) | ModelParam::Normalized(_)) {
                    continue;
                }
                for (node, handle) in param.leaves() {
                    if (free_only && !handle.free()) || set.contains_handle(&handle) {
                        continue;
                    }
                    let key = match node {
                        Some(k) => format!("{}_{}_interp{}", prefix, name, k + 1),
                        None => format!("{}_{}", prefix, name),
                    };
                    set.insert(&key, handle)?;
                }
            }
        }
        Ok(set)
    }

    pub fn free_parameters(&self) -> Result<ParameterSet> {
        self.parameters(true)
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, component) in self.components.iter().enumerate() {
            writeln!(f, "c{}: {}", i + 1, component)?;
        }
        Ok(())
    }
}
