//! Components defined by a radial intensity profile.
//!
//! The visibility of a centro-symmetric profile `I(r)` is its Hankel transform
//! normalized by the total flux,
//!
//! ```text
//! V(rho) = ∫ 2 pi r I(r) J0(2 pi r rho) dr / ∫ 2 pi r I(r) dr
//! ```
//!
//! evaluated by trapezoidal quadrature on the (possibly nonuniform) radius grid.

use super::transform::PixelGrid;
use super::Sampled;
use crate::error::{Result, VisFitError};
use crate::parameters::interpolated::interp_clamped;
use crate::special::j0;
use crate::units::MAS2RAD;
use ndarray::Array2;
use std::borrow::Cow;
use std::f64::consts::PI;

/// Extent of the exponential ring's radius grid, in scale lengths.
const EXP_RING_EXTENT: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub enum RadialProfile {
    /// User profile: radii in mas and the intensity at each radius.
    Sampled { r: Vec<f64>, intensity: Vec<f64> },
    /// `exp(-(r - din/2) / w)` outside `din/2`, zero inside, on `dim` radii.
    ExponentialRing,
}

impl RadialProfile {
    pub fn sampled(r: Vec<f64>, intensity: Vec<f64>) -> Result<Self> {
        if r.len() != intensity.len() {
            return Err(VisFitError::Configuration(format!(
                "radial profile has {} radii and {} intensities",
                r.len(),
                intensity.len()
            )));
        }
        if r.len() < 2 {
            return Err(VisFitError::Configuration(
                "radial profile needs at least two samples".to_string(),
            ));
        }
        if r[0] < 0.0 || r.windows(2).any(|w| w[1] <= w[0]) {
            return Err(VisFitError::Configuration(
                "radii must be non-negative and strictly increasing".to_string(),
            ));
        }
        Ok(RadialProfile::Sampled { r, intensity })
    }

    /// Radius grid (mas) and intensities for the current parameter values.
    pub fn profile<'a>(&'a self, p: &Sampled) -> Result<(Cow<'a, [f64]>, Cow<'a, [f64]>)> {
        match self {
            RadialProfile::Sampled { r, intensity } => {
                Ok((Cow::Borrowed(r.as_slice()), Cow::Borrowed(intensity.as_slice())))
            }
            RadialProfile::ExponentialRing => {
                let r0 = p.get("din") / 2.0;
                let w = p.get("w");
                let dim = p.get("dim").round();
                if !(w > 0.0) {
                    return Err(VisFitError::InvalidParameter(format!(
                        "exponential scale length must be positive, got {}",
                        w
                    )));
                }
                if dim < 2.0 {
                    return Err(VisFitError::InvalidParameter(format!(
                        "exponential ring needs at least 2 radii, got {}",
                        dim
                    )));
                }
                let n = dim as usize;
                let step = EXP_RING_EXTENT * w / (n - 1) as f64;
                let r: Vec<f64> = (0..n).map(|k| r0 + k as f64 * step).collect();
                let intensity = r.iter().map(|&ri| (-(ri - r0) / w).exp()).collect();
                Ok((Cow::Owned(r), Cow::Owned(intensity)))
            }
        }
    }

    /// Normalized visibility at radial frequency `rho` (cycles/rad).
    pub fn visibility(&self, rho: f64, p: &Sampled) -> Result<f64> {
        let (r, intensity) = self.profile(p)?;
        let weights: Vec<f64> = r
            .iter()
            .zip(intensity.iter())
            .map(|(&ri, &ii)| 2.0 * PI * ri * ii)
            .collect();
        let flux = trapz(&r, &weights);
        if flux == 0.0 {
            return Err(VisFitError::InvalidParameter(
                "radial profile has zero flux".to_string(),
            ));
        }
        if rho == 0.0 {
            return Ok(1.0);
        }
        let integrand: Vec<f64> = r
            .iter()
            .zip(weights.iter())
            .map(|(&ri, &wi)| wi * j0(2.0 * PI * ri * MAS2RAD * rho))
            .collect();
        Ok(trapz(&r, &integrand) / flux)
    }

    /// Intensity on a pixel grid, linear in radius inside the profile's
    /// range and zero outside.
    pub fn render(&self, grid: &PixelGrid, p: &Sampled) -> Result<Array2<f64>> {
        let (r, intensity) = self.profile(p)?;
        let (rmin, rmax) = (r[0], r[r.len() - 1]);
        Ok(grid.r2().mapv(|r2| {
            let radius = r2.sqrt();
            if radius < rmin || radius > rmax {
                0.0
            } else {
                interp_clamped(radius, &r, &intensity)
            }
        }))
    }
}

fn trapz(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xw, yw)| 0.5 * (xw[1] - xw[0]) * (yw[0] + yw[1]))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Component;
    use crate::special::jinc;
    use approx::assert_relative_eq;

    #[test]
    fn test_flat_profile_is_uniform_disk() {
        let n = 4001;
        let r: Vec<f64> = (0..n).map(|k| 2.0 * k as f64 / (n - 1) as f64).collect();
        let c = Component::radial_profile(r, vec![1.0; n], &[]).unwrap();

        for rho in [0.0, 1e7, 4e7] {
            let vis = c.complex_coherent_flux(&[rho], &[0.0], None, None).unwrap();
            let expected = jinc(PI * 4.0 * MAS2RAD * rho);
            assert_relative_eq!(vis[0].re, expected, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_thin_exponential_ring_is_infinitesimal_ring() {
        let c = Component::exponential_ring(&[("din", 4.0.into()), ("w", 1e-3.into())]).unwrap();
        let rho = 3e7;
        let vis = c.complex_coherent_flux(&[rho], &[0.0], None, None).unwrap();
        assert_relative_eq!(vis[0].re, j0(PI * 4.0 * MAS2RAD * rho), epsilon = 1e-3);
    }

    #[test]
    fn test_invalid_profiles() {
        assert!(RadialProfile::sampled(vec![0.0, 1.0], vec![1.0]).is_err());
        assert!(RadialProfile::sampled(vec![1.0, 0.5], vec![1.0, 1.0]).is_err());
        let ring = Component::exponential_ring(&[("din", 4.0.into())]).unwrap();
        assert!(matches!(
            ring.complex_coherent_flux(&[1e7], &[0.0], None, None),
            Err(VisFitError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_render_is_zero_inside_ring() {
        let c = Component::exponential_ring(&[("din", 4.0.into()), ("w", 0.5.into())]).unwrap();
        let img = c.image(32, 0.25, None, None).unwrap();
        assert_eq!(img[[16, 16]], 0.0);
        assert!(img[[16, 24]] > img[[16, 28]]);
        assert_relative_eq!(img.sum(), 1.0, epsilon = 1e-12);
    }
}
