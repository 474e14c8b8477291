//! Small statistics helpers used when summarizing sampler output.

use ndarray::ArrayView1;
use ndarray_stats::QuantileExt;
use std::cmp::Ordering;

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    v
}

/// Quantile `q` in [0, 1] with linear interpolation between order statistics
/// (numpy's default method). Returns NaN for an empty slice.
///
/// ```
/// use visfit_rs::utils::stats::quantile;
///
/// assert_eq!(quantile(&[1.0, 2.0, 3.0, 4.0], 0.5), 2.5);
/// ```
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let v = sorted(values);
    let pos = q.clamp(0.0, 1.0) * (v.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    v[lo] + (pos - lo as f64) * (v[hi] - v[lo])
}

/// Several quantiles of the same data.
pub fn quantiles(values: &[f64], qs: &[f64]) -> Vec<f64> {
    qs.iter().map(|&q| quantile(values, q)).collect()
}

/// Weighted quantile: the first sorted sample whose normalized cumulative
/// weight reaches `q`.
pub fn weighted_quantile(values: &[f64], weights: &[f64], q: f64) -> f64 {
    if values.is_empty() || values.len() != weights.len() {
        return f64::NAN;
    }
    let mut idx: Vec<usize> = (0..values.len()).collect();
    idx.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));

    let total: f64 = weights.iter().sum();
    if !(total > 0.0) {
        return f64::NAN;
    }
    let q = q.clamp(0.0, 1.0);
    let mut acc = 0.0;
    for &i in &idx {
        acc += weights[i];
        if acc / total >= q {
            return values[i];
        }
    }
    values[idx[idx.len() - 1]]
}

pub fn mean(values: &[f64]) -> f64 {
    ArrayView1::from(values).mean().unwrap_or(f64::NAN)
}

/// Population standard deviation; 0 for fewer than two values.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    ArrayView1::from(values).std(0.0)
}

/// Index of the smallest non-NaN value.
pub fn argmin(values: &[f64]) -> Option<usize> {
    ArrayView1::from(values).argmin_skipnan().ok()
}

/// `log(exp(a) + exp(b))` without overflow.
pub fn logaddexp(a: f64, b: f64) -> f64 {
    if a == f64::NEG_INFINITY {
        return b;
    }
    if b == f64::NEG_INFINITY {
        return a;
    }
    let m = a.max(b);
    m + ((a - m).exp() + (b - m).exp()).ln()
}
