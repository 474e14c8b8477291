//! Two-dimensional FFT helpers on top of `rustfft`.
//!
//! Conventions follow numpy: `fft2` is unnormalized, `ifft2` divides by the
//! number of samples, frequencies are ordered `0, 1, ..., -1` and the shift
//! functions move the zero frequency to/from index `n / 2`.

use ndarray::{Array1, Array2, Axis};
use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

fn transform_axis(data: &mut Array2<Complex64>, axis: Axis, fft: &Arc<dyn Fft<f64>>) {
    let mut buffer = vec![Complex64::new(0.0, 0.0); data.len_of(axis)];
    for mut lane in data.lanes_mut(axis) {
        for (b, v) in buffer.iter_mut().zip(lane.iter()) {
            *b = *v;
        }
        fft.process(&mut buffer);
        for (v, b) in lane.iter_mut().zip(buffer.iter()) {
            *v = *b;
        }
    }
}

fn transform2(data: &Array2<Complex64>, inverse: bool) -> Array2<Complex64> {
    let (nrows, ncols) = data.dim();
    let mut out = data.clone();
    if nrows == 0 || ncols == 0 {
        return out;
    }
    let mut planner = FftPlanner::<f64>::new();
    let (row_fft, col_fft) = if inverse {
        (planner.plan_fft_inverse(ncols), planner.plan_fft_inverse(nrows))
    } else {
        (planner.plan_fft_forward(ncols), planner.plan_fft_forward(nrows))
    };
    transform_axis(&mut out, Axis(1), &row_fft);
    transform_axis(&mut out, Axis(0), &col_fft);
    out
}

/// Unnormalized forward 2-D DFT.
pub fn fft2(data: &Array2<Complex64>) -> Array2<Complex64> {
    transform2(data, false)
}

/// Inverse 2-D DFT, normalized by `1 / (nrows * ncols)`.
pub fn ifft2(data: &Array2<Complex64>) -> Array2<Complex64> {
    let n = data.len().max(1) as f64;
    transform2(data, true).mapv(|v| v / n)
}

fn roll2(data: &Array2<Complex64>, shift_rows: usize, shift_cols: usize) -> Array2<Complex64> {
    let (nrows, ncols) = data.dim();
    Array2::from_shape_fn((nrows, ncols), |(i, j)| {
        data[[(i + nrows - shift_rows) % nrows, (j + ncols - shift_cols) % ncols]]
    })
}

/// Move the zero frequency to the center, `out[(k + n/2) % n] = in[k]`.
pub fn fftshift2(data: &Array2<Complex64>) -> Array2<Complex64> {
    let (nrows, ncols) = data.dim();
    if nrows == 0 || ncols == 0 {
        return data.clone();
    }
    roll2(data, nrows / 2, ncols / 2)
}

/// Inverse of [`fftshift2`].
pub fn ifftshift2(data: &Array2<Complex64>) -> Array2<Complex64> {
    let (nrows, ncols) = data.dim();
    if nrows == 0 || ncols == 0 {
        return data.clone();
    }
    roll2(data, nrows - nrows / 2, ncols - ncols / 2)
}

/// Sample frequencies of an `n`-point DFT with spacing `d`, numpy order.
pub fn fftfreq(n: usize, d: f64) -> Array1<f64> {
    let nf = n as f64;
    Array1::from_shape_fn(n, |k| {
        let k = if k < (n + 1) / 2 { k as f64 } else { k as f64 - nf };
        k / (nf * d)
    })
}

/// Sample frequencies in centered order, `(k - n/2) / (n d)` for `k = 0..n`.
pub fn centered_freq(n: usize, d: f64) -> Array1<f64> {
    let nf = n as f64;
    let half = (n / 2) as f64;
    Array1::from_shape_fn(n, |k| (k as f64 - half) / (nf * d))
}

/// Circular convolution of two real images of the same shape, via the FFT.
/// Both images are assumed centered on index `n / 2`.
pub fn convolve2(a: &Array2<f64>, b: &Array2<f64>) -> Array2<f64> {
    let fa = fft2(&ifftshift2(&a.mapv(|v| Complex64::new(v, 0.0))));
    let fb = fft2(&ifftshift2(&b.mapv(|v| Complex64::new(v, 0.0))));
    let prod = &fa * &fb;
    fftshift2(&ifft2(&prod)).mapv(|v| v.re)
}
