//! Bessel functions and the visibility kernels built from them.
//!
//! Several kernels are ratios that read `0/0` at the origin. Each one checks
//! its own removable singularity and returns the analytic limit there, so no
//! NaN ever leaves this module for a finite argument.

use std::f64::consts::PI;

/// Below this |x| the ratio kernels switch to their Taylor expansions.
const SERIES_THRESHOLD: f64 = 1e-4;

/// Bessel function of the first kind, order 0.
pub fn j0(x: f64) -> f64 {
    libm::j0(x)
}

/// Bessel function of the first kind, order 1.
pub fn j1(x: f64) -> f64 {
    libm::j1(x)
}

/// Bessel function of the first kind, integer order `n`.
pub fn jn(n: i32, x: f64) -> f64 {
    libm::jn(n, x)
}

/// Bessel function of the first kind, order 3/2.
///
/// `J_{3/2}(x) = sqrt(2 / (pi x)) (sin x / x - cos x)`, zero at the origin.
pub fn j3_2(x: f64) -> f64 {
    if x == 0.0 {
        return 0.0;
    }
    (2.0 / (PI * x)).sqrt() * (x.sin() / x - x.cos())
}

/// `2 J1(x) / x`, the uniform-disk kernel. Equals 1 at `x = 0`.
///
/// ```
/// use visfit_rs::special::jinc;
///
/// assert_eq!(jinc(0.0), 1.0);
/// assert!(jinc(3.8317059702075125).abs() < 1e-12);
/// ```
pub fn jinc(x: f64) -> f64 {
    if x.abs() < SERIES_THRESHOLD {
        return 1.0 - x * x / 8.0;
    }
    2.0 * j1(x) / x
}

/// `J1(x) / x`, equal to 1/2 at the origin.
pub fn j1_over_x(x: f64) -> f64 {
    0.5 * jinc(x)
}

/// `sqrt(pi / 2) J_{3/2}(x) / x^{3/2} = (sin x - x cos x) / x^3`, equal to 1/3 at the origin.
pub fn j3_2_over_x3_2(x: f64) -> f64 {
    if x.abs() < 1e-3 {
        let x2 = x * x;
        return 1.0 / 3.0 - x2 / 30.0;
    }
    (x.sin() - x * x.cos()) / (x * x * x)
}

/// `2 J2(x) / x^2`, equal to 1/4 at the origin.
pub fn two_j2_over_x2(x: f64) -> f64 {
    if x.abs() < SERIES_THRESHOLD {
        return 0.25 - x * x / 48.0;
    }
    2.0 * jn(2, x) / (x * x)
}

/// Normalized visibility of a disk with quadratic limb darkening
/// `I(mu) = 1 - a (1 - mu) - b (1 - mu)^2`.
///
/// Equals 1 at the origin for any coefficients that keep the total flux
/// non-zero.
pub fn limb_darkened_disk(x: f64, a: f64, b: f64) -> f64 {
    let c0 = 1.0 - a - b;
    let c1 = a + 2.0 * b;
    let c2 = -b;
    let norm = c0 / 2.0 + c1 / 3.0 + c2 / 4.0;
    if norm == 0.0 {
        return 0.0;
    }
    (c0 * j1_over_x(x) + c1 * j3_2_over_x3_2(x) + c2 * two_j2_over_x2(x)) / norm
}

/// Normalized visibility of a uniform ring between diameters `din` and
/// `dout`, at arguments `xin = pi din rho` and `xout = pi dout rho`.
///
/// When the two diameters coincide the ring degenerates into an
/// infinitesimal ring and `J0` is returned.
pub fn ring(xin: f64, xout: f64, din: f64, dout: f64) -> f64 {
    let fin = din * din;
    let fout = dout * dout;
    if fout == fin {
        return j0(xout);
    }
    (jinc(xout) * fout - jinc(xin) * fin) / (fout - fin)
}
