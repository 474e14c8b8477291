//! Geometric pipeline shared by the components.
//!
//! In the Fourier plane a component's shape is evaluated in a rotated and
//! stretched frame, then multiplied by the translation phase and the flux.
//! In the image plane the pixel grid is shifted, rotated and stretched the
//! same way before the shape's intensity is evaluated, and the result is
//! rescaled to the flux.

use ndarray::Array2;
use num_complex::Complex64;
use std::f64::consts::{FRAC_PI_2, PI};

/// Spatial frequency expressed in a shape's own frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Frequency along the shape's first axis (cycles/rad).
    pub fx: f64,
    /// Frequency along the shape's second axis, divided by the elongation.
    pub fy: f64,
    /// Reduced radial frequency, `hypot(fx, fy)`.
    pub rho: f64,
    /// Rotation applied to reach this frame (rad).
    pub rot: f64,
}

impl Frame {
    /// Frame of a shape without ellipticity.
    pub fn circular(u: f64, v: f64) -> Self {
        Self {
            fx: u,
            fy: v,
            rho: u.hypot(v),
            rot: 0.0,
        }
    }

    /// Rotate `(u, v)` by `rot` and divide the rotated second axis by `elong`.
    pub fn elliptic(u: f64, v: f64, rot: f64, elong: f64) -> Self {
        let (si, co) = rot.sin_cos();
        let fx = u * co - v * si;
        let fy = (u * si + v * co) / elong;
        Self {
            fx,
            fy,
            rho: fx.hypot(fy),
            rot,
        }
    }

    /// Position angle of the frequency vector on the sky, with the shapes'
    /// convention that `0` points along the major axis of a `pa = 0` shape.
    pub fn sky_angle(&self) -> f64 {
        self.fy.atan2(self.fx) - self.rot + FRAC_PI_2
    }
}

/// Rotation used by analytic shapes for a position angle in radians.
///
/// Shapes measure the position angle from the v axis, hence the quarter turn.
pub fn shape_rotation(pa_rad: f64) -> f64 {
    pa_rad + FRAC_PI_2
}

/// `exp(-2 pi i (u x + v y))` with `x`, `y` in radians.
pub fn translate_factor(u: f64, v: f64, x_rad: f64, y_rad: f64) -> Complex64 {
    Complex64::from_polar(1.0, -2.0 * PI * (u * x_rad + v * y_rad))
}

/// Pixel coordinates of an image grid, `[row = y, col = x]`, in mas.
#[derive(Debug, Clone)]
pub struct PixelGrid {
    pub x: Array2<f64>,
    pub y: Array2<f64>,
    /// Rotation applied to reach these coordinates (rad).
    pub rot: f64,
    /// Pixel size (mas).
    pub pix: f64,
}

impl PixelGrid {
    /// Centered grid: pixel `(i, j)` sits at `x = (j - dim/2) pix`,
    /// `y = (i - dim/2) pix`.
    pub fn centered(dim: usize, pix: f64) -> Self {
        let half = dim as f64 / 2.0;
        Self {
            x: Array2::from_shape_fn((dim, dim), |(_, j)| (j as f64 - half) * pix),
            y: Array2::from_shape_fn((dim, dim), |(i, _)| (i as f64 - half) * pix),
            rot: 0.0,
            pix,
        }
    }

    /// Move the origin to `(x0, y0)` (mas).
    pub fn translate(mut self, x0: f64, y0: f64) -> Self {
        self.x.mapv_inplace(|x| x - x0);
        self.y.mapv_inplace(|y| y - y0);
        self
    }

    /// Rotate by `rot` and stretch the rotated second axis by `elong`.
    pub fn ellipticize(self, rot: f64, elong: f64) -> Self {
        let (si, co) = rot.sin_cos();
        let xp = &self.x * co - &self.y * si;
        let yp = (&self.x * si + &self.y * co) * elong;
        Self {
            x: xp,
            y: yp,
            rot,
            pix: self.pix,
        }
    }

    /// Squared radius of every pixel.
    pub fn r2(&self) -> Array2<f64> {
        &self.x * &self.x + &self.y * &self.y
    }

    /// Sky angle of every pixel, same convention as [`Frame::sky_angle`].
    pub fn sky_angle(&self) -> Array2<f64> {
        let rot = self.rot;
        ndarray::Zip::from(&self.y)
            .and(&self.x)
            .map_collect(|&y, &x| y.atan2(x) - rot + FRAC_PI_2)
    }

    pub fn dim(&self) -> usize {
        self.x.nrows()
    }
}

/// Rescale `image` so that it sums to `flux`. An all-zero image is left as is.
pub fn normalize_flux(mut image: Array2<f64>, flux: f64) -> Array2<f64> {
    let total = image.sum();
    if total != 0.0 {
        image.mapv_inplace(|v| v / total * flux);
    }
    image
}

/// Image with a single lit pixel at the one closest to the origin
/// (smallest `|x| + |y|`).
pub fn point_image(grid: &PixelGrid) -> Array2<f64> {
    let mut image = Array2::zeros(grid.x.raw_dim());
    let mut best: Option<((usize, usize), f64)> = None;
    for ((idx, &x), &y) in grid.x.indexed_iter().zip(grid.y.iter()) {
        let d = x.abs() + y.abs();
        if best.map_or(true, |(_, b)| d < b) {
            best = Some((idx, d));
        }
    }
    if let Some((idx, _)) = best {
        image[idx] = 1.0;
    }
    image
}
