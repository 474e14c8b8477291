//! Conversions between `ndarray` (public API) and `nalgebra` (linear algebra).

use ndarray::{Array1, Array2};
use nalgebra::{DMatrix, DVector};

/// Convert a 2-D ndarray into a nalgebra matrix.
pub fn ndarray_to_nalgebra(arr: &Array2<f64>) -> DMatrix<f64> {
    let (rows, cols) = arr.dim();
    DMatrix::from_fn(rows, cols, |i, j| arr[[i, j]])
}

/// Convert a nalgebra matrix into a 2-D ndarray.
pub fn nalgebra_to_ndarray(mat: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((mat.nrows(), mat.ncols()), |(i, j)| mat[(i, j)])
}

pub fn ndarray_vec_to_nalgebra(arr: &Array1<f64>) -> DVector<f64> {
    DVector::from_iterator(arr.len(), arr.iter().copied())
}

pub fn nalgebra_vec_to_ndarray(vec: &DVector<f64>) -> Array1<f64> {
    Array1::from_iter(vec.iter().copied())
}
