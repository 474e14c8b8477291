//! Analytic shapes: closed-form visibility and intensity per shape.
//!
//! Every visibility is normalized to 1 at zero frequency; flux and position
//! are applied by the component pipeline.

use super::transform::{point_image, Frame, PixelGrid};
use super::Sampled;
use crate::special;
use ndarray::Array2;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::{LN_2, PI};

/// The analytic shapes a component can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shape {
    Point,
    Background,
    UniformDisk,
    Gaussian,
    InfinitesimalRing,
    Ring,
    LinearLdd,
    QuadraticLdd,
    Lorentzian,
    GaussLorentz,
    SkewedRing,
}

impl Shape {
    pub const ALL: [Shape; 11] = [
        Shape::Point,
        Shape::Background,
        Shape::UniformDisk,
        Shape::Gaussian,
        Shape::InfinitesimalRing,
        Shape::Ring,
        Shape::LinearLdd,
        Shape::QuadraticLdd,
        Shape::Lorentzian,
        Shape::GaussLorentz,
        Shape::SkewedRing,
    ];

    /// Human-readable name.
    pub fn name(self, elliptic: bool) -> &'static str {
        match (self, elliptic) {
            (Shape::Point, _) => "Point source",
            (Shape::Background, _) => "Background",
            (Shape::UniformDisk, false) => "Uniform Disk",
            (Shape::UniformDisk, true) => "Uniform Ellipse",
            (Shape::Gaussian, false) => "Gaussian Disk",
            (Shape::Gaussian, true) => "Gaussian Ellipse",
            (Shape::InfinitesimalRing, false) => "Infinitesimal Ring",
            (Shape::InfinitesimalRing, true) => "Elliptical infinitesimal ring",
            (Shape::Ring, false) => "Ring",
            (Shape::Ring, true) => "Elliptical ring",
            (Shape::LinearLdd, _) => "Linear Limb Darkened Disk",
            (Shape::QuadraticLdd, _) => "Quadratic Limb Darkened Disk",
            (Shape::Lorentzian, false) => "Pseudo-Lorentzian",
            (Shape::Lorentzian, true) => "Elliptical Pseudo-Lorentzian",
            (Shape::GaussLorentz, false) => "Gauss-Lorentzian",
            (Shape::GaussLorentz, true) => "Elliptical Gauss-Lorentzian",
            (Shape::SkewedRing, false) => "Skewed Infinitesimal Ring",
            (Shape::SkewedRing, true) => "Elliptical Skewed Infinitesimal Ring",
        }
    }

    /// Short name used to build flat parameter keys.
    pub fn shortname(self, elliptic: bool) -> &'static str {
        match (self, elliptic) {
            (Shape::Point, _) => "Pt",
            (Shape::Background, _) => "Bckg",
            (Shape::UniformDisk, false) => "UD",
            (Shape::UniformDisk, true) => "eUD",
            (Shape::Gaussian, false) => "GD",
            (Shape::Gaussian, true) => "EG",
            (Shape::InfinitesimalRing, false) => "IR",
            (Shape::InfinitesimalRing, true) => "EIR",
            (Shape::Ring, false) => "R",
            (Shape::Ring, true) => "ER",
            (Shape::LinearLdd, _) => "LLDD",
            (Shape::QuadraticLdd, _) => "QLDD",
            (Shape::Lorentzian, false) => "LO",
            (Shape::Lorentzian, true) => "ELO",
            (Shape::GaussLorentz, false) => "GL",
            (Shape::GaussLorentz, true) => "EGL",
            (Shape::SkewedRing, false) => "SKIR",
            (Shape::SkewedRing, true) => "SKEIR",
        }
    }

    /// Shape-specific parameter names, after the common `x`, `y`, `f`.
    pub fn param_names(self) -> &'static [&'static str] {
        match self {
            Shape::Point | Shape::Background => &[],
            Shape::UniformDisk | Shape::InfinitesimalRing => &["d"],
            Shape::Gaussian | Shape::Lorentzian => &["fwhm"],
            Shape::Ring => &["din", "dout"],
            Shape::LinearLdd => &["d", "a"],
            Shape::QuadraticLdd => &["d", "a1", "a2"],
            Shape::GaussLorentz => &["fwhm", "flor"],
            Shape::SkewedRing => &["d", "skw", "skwPa"],
        }
    }

    /// Normalized visibility in the shape's frame.
    pub fn visibility(self, frame: &Frame, p: &Sampled) -> Complex64 {
        let rho = frame.rho;
        let real = |v: f64| Complex64::new(v, 0.0);
        match self {
            Shape::Point => real(1.0),
            Shape::Background => real(if rho == 0.0 { 1.0 } else { 0.0 }),
            Shape::UniformDisk => real(special::jinc(PI * p.rad("d") * rho)),
            Shape::Gaussian => real(gaussian_vis(p.rad("fwhm"), rho)),
            Shape::InfinitesimalRing => real(special::j0(PI * p.rad("d") * rho)),
            Shape::Ring => {
                let (din, dout) = (p.rad("din"), p.rad("dout"));
                real(special::ring(PI * din * rho, PI * dout * rho, din, dout))
            }
            Shape::LinearLdd => real(special::limb_darkened_disk(
                PI * p.rad("d") * rho,
                p.get("a"),
                0.0,
            )),
            Shape::QuadraticLdd => real(special::limb_darkened_disk(
                PI * p.rad("d") * rho,
                p.get("a1"),
                p.get("a2"),
            )),
            Shape::Lorentzian => real(lorentzian_vis(p.rad("fwhm"), rho)),
            Shape::GaussLorentz => {
                let fwhm = p.rad("fwhm");
                let flor = p.get("flor");
                real((1.0 - flor) * gaussian_vis(fwhm, rho) + flor * lorentzian_vis(fwhm, rho))
            }
            Shape::SkewedRing => {
                let xx = PI * p.rad("d") * rho;
                let phi = frame.sky_angle() + p.rad("skwPa");
                Complex64::new(special::j0(xx), -phi.sin() * special::j1(xx) * p.get("skw"))
            }
        }
    }

    /// Unnormalized intensity on a pixel grid (coordinates in mas).
    pub fn image(self, grid: &PixelGrid, p: &Sampled) -> Array2<f64> {
        let r2 = grid.r2();
        let mask = |lo: f64, hi: f64| r2.mapv(|r| if r >= lo && r <= hi { 1.0 } else { 0.0 });
        match self {
            Shape::Point => point_image(grid),
            Shape::Background => Array2::ones(r2.raw_dim()),
            Shape::UniformDisk => mask(f64::NEG_INFINITY, (p.get("d") / 2.0).powi(2)),
            Shape::Gaussian => gaussian_image(grid, &r2, p.get("fwhm")),
            Shape::InfinitesimalRing => {
                let r = p.get("d") / 2.0;
                mask(r * r, (r + grid.pix).powi(2))
            }
            Shape::Ring => mask((p.get("din") / 2.0).powi(2), (p.get("dout") / 2.0).powi(2)),
            Shape::LinearLdd => ldd_image(&r2, p.get("d"), p.get("a"), 0.0),
            Shape::QuadraticLdd => ldd_image(&r2, p.get("d"), p.get("a1"), p.get("a2")),
            Shape::Lorentzian => lorentzian_image(grid, &r2, p.get("fwhm")),
            Shape::GaussLorentz => {
                let flor = p.get("flor");
                let g = unit_sum(gaussian_image(grid, &r2, p.get("fwhm")));
                let l = unit_sum(lorentzian_image(grid, &r2, p.get("fwhm")));
                g * (1.0 - flor) + l * flor
            }
            Shape::SkewedRing => {
                let r = p.get("d") / 2.0;
                let half = grid.pix / 2.0;
                let lo = (r - half).max(0.0).powi(2);
                let ring = mask(lo, (r + half).powi(2));
                let skw = p.get("skw");
                let offset = p.rad("skwPa");
                let modulation = grid.sky_angle().mapv(|phi| 1.0 + skw * (phi + offset).sin());
                ring * modulation
            }
        }
    }
}

fn gaussian_vis(fwhm_rad: f64, rho: f64) -> f64 {
    (-(PI * fwhm_rad * rho).powi(2) / (4.0 * LN_2)).exp()
}

fn lorentzian_vis(fwhm_rad: f64, rho: f64) -> f64 {
    (-2.0 * PI * fwhm_rad * rho / 3f64.sqrt()).exp()
}

fn gaussian_image(grid: &PixelGrid, r2: &Array2<f64>, fwhm: f64) -> Array2<f64> {
    if fwhm == 0.0 {
        return point_image(grid);
    }
    r2.mapv(|r| (-4.0 * LN_2 * r / (fwhm * fwhm)).exp())
}

fn lorentzian_image(grid: &PixelGrid, r2: &Array2<f64>, fwhm: f64) -> Array2<f64> {
    if fwhm == 0.0 {
        return point_image(grid);
    }
    let a2 = fwhm * fwhm / 3.0;
    r2.mapv(|r| (a2 + r).powf(-1.5))
}

fn ldd_image(r2: &Array2<f64>, d: f64, a: f64, b: f64) -> Array2<f64> {
    let rmax2 = (d / 2.0).powi(2);
    r2.mapv(|r| {
        if r > rmax2 || rmax2 == 0.0 {
            return 0.0;
        }
        let one_minus_mu = 1.0 - (1.0 - r / rmax2).sqrt();
        1.0 - a * one_minus_mu - b * one_minus_mu * one_minus_mu
    })
}

fn unit_sum(image: Array2<f64>) -> Array2<f64> {
    super::transform::normalize_flux(image, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ParamSamples;
    use crate::parameters::{ModelParam, Parameter};
    use crate::units::Unit;
    use approx::assert_relative_eq;

    fn samples(values: &[(&str, f64, Unit)]) -> ParamSamples {
        let params: Vec<(String, ModelParam)> = values
            .iter()
            .map(|(n, v, u)| (n.to_string(), Parameter::new(n, *v).with_unit(*u).into()))
            .collect();
        ParamSamples::evaluate(&params, None, None).unwrap()
    }

    fn all_params() -> ParamSamples {
        samples(&[
            ("d", 3.0, Unit::Mas),
            ("fwhm", 2.0, Unit::Mas),
            ("din", 2.0, Unit::Mas),
            ("dout", 4.0, Unit::Mas),
            ("a", 0.4, Unit::Dimensionless),
            ("a1", 0.3, Unit::Dimensionless),
            ("a2", 0.2, Unit::Dimensionless),
            ("flor", 0.3, Unit::Dimensionless),
            ("skw", 0.5, Unit::Dimensionless),
            ("skwPa", 30.0, Unit::Deg),
        ])
    }

    #[test]
    fn test_every_shape_is_one_at_zero_frequency() {
        let samples = all_params();
        let p = samples.at(0);
        let frame = Frame::circular(0.0, 0.0);
        for shape in Shape::ALL {
            let v = shape.visibility(&frame, &p);
            assert_relative_eq!(v.re, 1.0, epsilon = 1e-12);
            assert_relative_eq!(v.im, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_uniform_disk_first_null() {
        let samples = samples(&[("d", 5.0, Unit::Mas)]);
        let p = samples.at(0);
        let rho = 3.8317059702075125 / (PI * 5.0 * crate::units::MAS2RAD);
        let v = Shape::UniformDisk.visibility(&Frame::circular(rho, 0.0), &p);
        assert!(v.norm() < 1e-10);
    }

    #[test]
    fn test_gaussian_half_width() {
        // The visibility of a Gaussian falls to 1/2 at rho = 2 ln2 / (pi fwhm).
        let samples = samples(&[("fwhm", 1.0, Unit::Mas)]);
        let p = samples.at(0);
        let rho = 2.0 * LN_2 / (PI * crate::units::MAS2RAD);
        let v = Shape::Gaussian.visibility(&Frame::circular(0.0, rho), &p);
        assert_relative_eq!(v.re, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_background_only_at_origin() {
        let samples = all_params();
        let p = samples.at(0);
        assert_eq!(Shape::Background.visibility(&Frame::circular(1.0, 0.0), &p).re, 0.0);
    }

    #[test]
    fn test_skewed_ring_is_odd() {
        let samples = all_params();
        let p = samples.at(0);
        let a = Shape::SkewedRing.visibility(&Frame::circular(1e7, 3e7), &p);
        let b = Shape::SkewedRing.visibility(&Frame::circular(-1e7, -3e7), &p);
        assert_relative_eq!(a.re, b.re, epsilon = 1e-12);
        assert_relative_eq!(a.im, -b.im, epsilon = 1e-12);
        assert!(a.im.abs() > 0.0);
    }

    #[test]
    fn test_image_masks() {
        let samples = all_params();
        let p = samples.at(0);
        let grid = PixelGrid::centered(16, 0.5);

        let disk = Shape::UniformDisk.image(&grid, &p);
        assert_eq!(disk[[8, 8]], 1.0);
        assert_eq!(disk[[0, 0]], 0.0);

        let ring = Shape::Ring.image(&grid, &p);
        assert_eq!(ring[[8, 8]], 0.0);
        assert_eq!(ring[[8, 11]], 1.0);

        let ldd = Shape::LinearLdd.image(&grid, &p);
        assert!(ldd[[8, 8]] > ldd[[8, 10]]);
    }

    #[test]
    fn test_zero_width_gaussian_falls_back_to_point() {
        let samples = samples(&[("fwhm", 0.0, Unit::Mas)]);
        let p = samples.at(0);
        let grid = PixelGrid::centered(8, 1.0);
        let img = Shape::Gaussian.image(&grid, &p);
        assert_eq!(img.sum(), 1.0);
        assert_eq!(img[[4, 4]], 1.0);
    }
}
