//! Components defined by a pixelized image or a chromatic image cube.
//!
//! The visibility is the 2-D DFT of the (zero-padded) image, normalized to 1
//! at zero frequency and interpolated at the requested frequencies. The
//! transform only depends on the pixel size and the grid dimension, so it is
//! cached and recomputed only when one of them changes.

use super::transform::{Frame, PixelGrid};
use super::Sampled;
use crate::error::{Result, VisFitError};
use crate::parameters::interpolated::interp_clamped;
use crate::utils::fft::{fft2, fftshift2, ifftshift2};
use log::debug;
use ndarray::{s, Array2, Array3, ArrayView2};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// How the transform is sampled between grid nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GridInterpolation {
    #[default]
    Bilinear,
    Nearest,
}

/// Value returned for frequencies outside the transform grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutOfGrid {
    #[default]
    Zero,
    /// Value of the nearest boundary node.
    Boundary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GridConfig {
    pub interpolation: GridInterpolation,
    pub out_of_grid: OutOfGrid,
}

/// Normalized transform of every slice of the cube.
#[derive(Debug, Clone)]
pub struct GridTransform {
    ft: Array3<Complex64>,
    wl: Vec<f64>,
    n: usize,
    pix_rad: f64,
}

impl GridTransform {
    /// Side of the (square) transform grid.
    pub fn size(&self) -> usize {
        self.n
    }

    /// Frequency spacing of the grid (cycles/rad).
    pub fn frequency_step(&self) -> f64 {
        1.0 / (self.n as f64 * self.pix_rad)
    }

    /// Transform sampled at a frame's frequency, interpolated linearly in
    /// wavelength between slices (clamped outside the cube's range).
    pub fn sample(&self, frame: &Frame, wl: Option<f64>, config: &GridConfig) -> Complex64 {
        let nf = self.n as f64;
        let half = (self.n / 2) as f64;
        let kx = frame.fx * nf * self.pix_rad + half;
        let ky = frame.fy * nf * self.pix_rad + half;

        let nslices = self.ft.shape()[0];
        match (wl, nslices) {
            (Some(w), n) if n > 1 => {
                let (lo, hi, t) = bracket(&self.wl, w);
                let a = sample_slice(self.ft.slice(s![lo, .., ..]), kx, ky, config);
                if t == 0.0 {
                    return a;
                }
                let b = sample_slice(self.ft.slice(s![hi, .., ..]), kx, ky, config);
                a * (1.0 - t) + b * t
            }
            _ => sample_slice(self.ft.slice(s![0, .., ..]), kx, ky, config),
        }
    }
}

/// Neighbouring indices of `x` in the increasing grid `keys` and the linear
/// weight of the upper one, clamped at both ends.
fn bracket(keys: &[f64], x: f64) -> (usize, usize, f64) {
    let last = keys.len() - 1;
    if x <= keys[0] {
        return (0, 0, 0.0);
    }
    if x >= keys[last] {
        return (last, last, 0.0);
    }
    let hi = keys.partition_point(|&k| k <= x).min(last);
    let lo = hi - 1;
    (lo, hi, (x - keys[lo]) / (keys[hi] - keys[lo]))
}

fn sample_slice(ft: ArrayView2<Complex64>, kx: f64, ky: f64, config: &GridConfig) -> Complex64 {
    let (nrows, ncols) = ft.dim();
    let max_x = (ncols - 1) as f64;
    let max_y = (nrows - 1) as f64;
    let outside = kx < 0.0 || ky < 0.0 || kx > max_x || ky > max_y;
    if outside && config.out_of_grid == OutOfGrid::Zero {
        return Complex64::new(0.0, 0.0);
    }
    let kx = kx.clamp(0.0, max_x);
    let ky = ky.clamp(0.0, max_y);

    match config.interpolation {
        GridInterpolation::Nearest => ft[[ky.round() as usize, kx.round() as usize]],
        GridInterpolation::Bilinear => {
            let x0 = kx.floor() as usize;
            let y0 = ky.floor() as usize;
            let x1 = (x0 + 1).min(ncols - 1);
            let y1 = (y0 + 1).min(nrows - 1);
            let tx = kx - x0 as f64;
            let ty = ky - y0 as f64;
            ft[[y0, x0]] * ((1.0 - tx) * (1.0 - ty))
                + ft[[y0, x1]] * (tx * (1.0 - ty))
                + ft[[y1, x0]] * ((1.0 - tx) * ty)
                + ft[[y1, x1]] * (tx * ty)
        }
    }
}

#[derive(Debug, Default)]
struct TransformCache {
    key: Option<(u64, usize)>,
    transform: Option<Arc<GridTransform>>,
    recomputations: usize,
}

/// Image cube `[wl, y, x]` with its wavelength grid and transform cache.
#[derive(Debug, Clone)]
pub struct GridImage {
    cube: Arc<Array3<f64>>,
    wl: Vec<f64>,
    config: GridConfig,
    cache: Arc<Mutex<TransformCache>>,
}

impl GridImage {
    pub fn new(cube: Array3<f64>, wl: Vec<f64>) -> Result<Self> {
        let (nwl, ny, nx) = cube.dim();
        if nwl == 0 || ny == 0 || nx == 0 {
            return Err(VisFitError::Configuration(
                "image cube must not be empty".to_string(),
            ));
        }
        if wl.is_empty() && nwl > 1 {
            return Err(VisFitError::Configuration(format!(
                "a cube of {} slices needs a wavelength grid",
                nwl
            )));
        }
        if !wl.is_empty() {
            if wl.len() != nwl {
                return Err(VisFitError::Configuration(format!(
                    "wavelength grid has {} values for {} slices",
                    wl.len(),
                    nwl
                )));
            }
            if wl.windows(2).any(|w| w[1] <= w[0]) {
                return Err(VisFitError::Configuration(
                    "wavelength grid must be strictly increasing".to_string(),
                ));
            }
        }
        Ok(Self {
            cube: Arc::new(cube),
            wl,
            config: GridConfig::default(),
            cache: Arc::new(Mutex::new(TransformCache::default())),
        })
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: GridConfig) {
        self.config = config;
    }

    pub fn cube(&self) -> &Array3<f64> {
        &self.cube
    }

    pub fn wavelengths(&self) -> &[f64] {
        &self.wl
    }

    /// Largest side of the stored images.
    pub fn native_dim(&self) -> usize {
        let (_, ny, nx) = self.cube.dim();
        ny.max(nx)
    }

    /// Number of times the transform was computed.
    pub fn recomputations(&self) -> usize {
        self.cache.lock().map_or(0, |c| c.recomputations)
    }

    /// Normalized transform for pixel size `pix_rad` (rad) on a grid of at
    /// least `dim` pixels, from the cache when the geometry is unchanged.
    pub fn transform(&self, pix_rad: f64, dim: f64) -> Result<Arc<GridTransform>> {
        if !(pix_rad.is_finite() && pix_rad > 0.0) {
            return Err(VisFitError::InvalidParameter(format!(
                "pixel size must be positive, got {} rad",
                pix_rad
            )));
        }
        let n = (dim.round().max(1.0) as usize).max(self.native_dim());
        let key = (pix_rad.to_bits(), n);

        let mut cache = self
            .cache
            .lock()
            .map_err(|_| VisFitError::ComputationError("transform cache poisoned".to_string()))?;
        if cache.key == Some(key) {
            if let Some(transform) = &cache.transform {
                return Ok(Arc::clone(transform));
            }
        }

        debug!("Computing image transform on a {}x{} grid", n, n);
        let transform = Arc::new(self.compute(pix_rad, n));
        cache.key = Some(key);
        cache.transform = Some(Arc::clone(&transform));
        cache.recomputations += 1;
        Ok(transform)
    }

    fn compute(&self, pix_rad: f64, n: usize) -> GridTransform {
        let (nwl, ny, nx) = self.cube.dim();
        let oy = n / 2 - ny / 2;
        let ox = n / 2 - nx / 2;
        let mut ft = Array3::zeros((nwl, n, n));

        for k in 0..nwl {
            let mut padded = Array2::<Complex64>::zeros((n, n));
            padded
                .slice_mut(s![oy..oy + ny, ox..ox + nx])
                .assign(&self.cube.slice(s![k, .., ..]).mapv(|v| Complex64::new(v, 0.0)));
            let mut slice = fftshift2(&fft2(&ifftshift2(&padded)));
            let norm = slice[[n / 2, n / 2]];
            if norm.norm() != 0.0 {
                slice.mapv_inplace(|v| v / norm);
            }
            ft.slice_mut(s![k, .., ..]).assign(&slice);
        }

        GridTransform {
            ft,
            wl: self.wl.clone(),
            n,
            pix_rad,
        }
    }

    /// Image slice at `wl`, linearly interpolated between slices.
    fn slice_at(&self, wl: Option<f64>) -> Array2<f64> {
        let nwl = self.cube.shape()[0];
        match wl {
            Some(w) if nwl > 1 => {
                let (lo, hi, t) = bracket(&self.wl, w);
                let a = self.cube.slice(s![lo, .., ..]);
                let b = self.cube.slice(s![hi, .., ..]);
                &a * (1.0 - t) + &b * t
            }
            _ => self.cube.slice(s![0, .., ..]).to_owned(),
        }
    }

    /// Resample the stored image on `grid` (bilinear, zero outside).
    pub fn render(&self, grid: &PixelGrid, p: &Sampled, wl: Option<f64>) -> Array2<f64> {
        let src = self.slice_at(wl);
        let (ny, nx) = src.dim();
        let pix = p.get("pixSize");
        let cx = (nx / 2) as f64;
        let cy = (ny / 2) as f64;

        ndarray::Zip::from(&grid.x)
            .and(&grid.y)
            .map_collect(|&x, &y| {
                let col = x / pix + cx;
                let row = y / pix + cy;
                if col < 0.0 || row < 0.0 || col > (nx - 1) as f64 || row > (ny - 1) as f64 {
                    return 0.0;
                }
                let c0 = col.floor() as usize;
                let r0 = row.floor() as usize;
                let c1 = (c0 + 1).min(nx - 1);
                let r1 = (r0 + 1).min(ny - 1);
                let tc = col - c0 as f64;
                let tr = row - r0 as f64;
                let top = src[[r0, c0]] * (1.0 - tc) + src[[r0, c1]] * tc;
                let bottom = src[[r1, c0]] * (1.0 - tc) + src[[r1, c1]] * tc;
                top * (1.0 - tr) + bottom * tr
            })
    }
}

/// Total flux of each slice, interpolated at `wl` (clamped).
pub fn slice_flux(grid: &GridImage, wl: f64) -> f64 {
    let totals: Vec<f64> = grid
        .cube
        .outer_iter()
        .map(|slice| slice.sum())
        .collect();
    if totals.len() == 1 {
        return totals[0];
    }
    interp_clamped(wl, &grid.wl, &totals)
}
