//! Wavelength- and time-interpolated parameters.
//!
//! An interpolated parameter stores one plain [`Parameter`] per key of a
//! fixed grid (wavelengths in meters or times in MJD seconds) and evaluates to
//! the piecewise-linear interpolation of their values. Outside the grid the
//! end values are held constant.

use crate::error::{Result, VisFitError};
use crate::parameters::parameter::Parameter;
use crate::parameters::shared::SharedParameter;
use crate::units::Unit;
use serde::{Deserialize, Serialize};

/// Coordinate an interpolated parameter is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterpAxis {
    Wavelength,
    Time,
}

impl InterpAxis {
    fn label(self) -> &'static str {
        match self {
            InterpAxis::Wavelength => "wl",
            InterpAxis::Time => "time",
        }
    }
}

/// Initial values of an interpolated parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum InterpValues {
    /// Every key starts at the template parameter's value.
    Default,
    /// Every key starts at the same value.
    Scalar(f64),
    /// One value per key.
    Sequence(Vec<f64>),
}

impl From<f64> for InterpValues {
    fn from(value: f64) -> Self {
        InterpValues::Scalar(value)
    }
}

impl From<Vec<f64>> for InterpValues {
    fn from(values: Vec<f64>) -> Self {
        InterpValues::Sequence(values)
    }
}

impl From<&[f64]> for InterpValues {
    fn from(values: &[f64]) -> Self {
        InterpValues::Sequence(values.to_vec())
    }
}

/// Request to turn a component parameter into an interpolated one.
///
/// ```
/// use visfit_rs::parameters::Interp;
///
/// let interp = Interp::wl(vec![2.0e-6, 2.2e-6, 2.4e-6], vec![3.0, 3.5, 4.0]);
/// assert_eq!(interp.keys().len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Interp {
    axis: InterpAxis,
    keys: Vec<f64>,
    values: InterpValues,
}

impl Interp {
    pub fn new(axis: InterpAxis, keys: Vec<f64>, values: impl Into<InterpValues>) -> Self {
        Self {
            axis,
            keys,
            values: values.into(),
        }
    }

    /// Wavelength-keyed request (keys in meters).
    pub fn wl(keys: Vec<f64>, values: impl Into<InterpValues>) -> Self {
        Self::new(InterpAxis::Wavelength, keys, values)
    }

    /// Time-keyed request (keys in MJD seconds).
    pub fn time(keys: Vec<f64>, values: impl Into<InterpValues>) -> Self {
        Self::new(InterpAxis::Time, keys, values)
    }

    pub fn axis(&self) -> InterpAxis {
        self.axis
    }

    pub fn keys(&self) -> &[f64] {
        &self.keys
    }

    /// Build the interpolated parameter using `template` for name, bounds and unit.
    pub fn build(&self, template: &Parameter) -> Result<InterpolatedParameter> {
        InterpolatedParameter::new(template, self.axis, self.keys.clone(), self.values.clone())
    }
}

/// A parameter interpolated over a wavelength or time grid.
#[derive(Debug, Clone)]
pub struct InterpolatedParameter {
    name: String,
    unit: Unit,
    axis: InterpAxis,
    keys: Vec<f64>,
    params: Vec<SharedParameter>,
}

impl InterpolatedParameter {
    /// Create the parameter. Every per-key parameter copies the template's
    /// bounds, unit, free flag and error.
    ///
    /// Fails when a value sequence does not have one value per key, or when
    /// the keys are not strictly increasing.
    pub fn new(
        template: &Parameter,
        axis: InterpAxis,
        keys: Vec<f64>,
        values: InterpValues,
    ) -> Result<Self> {
        validate_keys(&keys)?;
        let nkeys = keys.len();
        let values = match values {
            InterpValues::Default => vec![template.value(); nkeys],
            InterpValues::Scalar(v) => vec![v; nkeys],
            InterpValues::Sequence(v) => {
                if v.len() != nkeys {
                    return Err(VisFitError::Configuration(format!(
                        "{} and value should have the same length: len({})={}, len(value)={}",
                        axis.label(),
                        axis.label(),
                        nkeys,
                        v.len()
                    )));
                }
                v
            }
        };

        let params = values
            .into_iter()
            .map(|v| {
                let mut p = template.clone();
                p.set_value(v);
                SharedParameter::new(p)
            })
            .collect();

        Ok(Self {
            name: template.name().to_string(),
            unit: template.unit(),
            axis,
            keys,
            params,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn axis(&self) -> InterpAxis {
        self.axis
    }

    pub fn keys(&self) -> &[f64] {
        &self.keys
    }

    /// Per-key parameters, in key order.
    pub fn params(&self) -> &[SharedParameter] {
        &self.params
    }

    /// Replace the key grid. The number of keys is fixed at construction.
    pub fn set_keys(&mut self, keys: Vec<f64>) -> Result<()> {
        if keys.len() != self.keys.len() {
            return Err(VisFitError::Configuration(format!(
                "Can't modify number of key {}s in an interpolated parameter after creation \
                 ({} != {}); create a new parameter instead",
                self.axis.label(),
                keys.len(),
                self.keys.len()
            )));
        }
        validate_keys(&keys)?;
        self.keys = keys;
        Ok(())
    }

    /// Value at the given wavelength/time. Only the coordinate matching the
    /// axis is used; `None` evaluates to the first stored value.
    pub fn evaluate(&self, wl: Option<f64>, t: Option<f64>) -> f64 {
        let coord = match self.axis {
            InterpAxis::Wavelength => wl,
            InterpAxis::Time => t,
        };
        let values: Vec<f64> = self.params.iter().map(|p| p.value()).collect();
        match coord {
            Some(x) => interp_clamped(x, &self.keys, &values),
            None => values[0],
        }
    }
}

fn validate_keys(keys: &[f64]) -> Result<()> {
    if keys.is_empty() {
        return Err(VisFitError::Configuration(
            "interpolation grid needs at least one key".to_string(),
        ));
    }
    if keys.windows(2).any(|w| !(w[1] > w[0])) {
        return Err(VisFitError::Configuration(
            "interpolation keys must be strictly increasing".to_string(),
        ));
    }
    Ok(())
}

/// Piecewise-linear interpolation with flat extrapolation.
///
/// `keys` must be strictly increasing and have the same length as `values`.
pub fn interp_clamped(x: f64, keys: &[f64], values: &[f64]) -> f64 {
    let n = keys.len();
    if x <= keys[0] {
        return values[0];
    }
    if x >= keys[n - 1] {
        return values[n - 1];
    }
    // first key strictly greater than x
    let hi = keys.partition_point(|&k| k <= x);
    let lo = hi - 1;
    if keys[lo] == x {
        return values[lo];
    }
    let frac = (x - keys[lo]) / (keys[hi] - keys[lo]);
    values[lo] + frac * (values[hi] - values[lo])
}
