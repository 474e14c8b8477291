//! The closed set of parameter kinds a component can hold.

use crate::error::{Result, VisFitError};
use crate::parameters::interpolated::InterpolatedParameter;
use crate::parameters::linked::{LinkedParameter, NormalizationParameter};
use crate::parameters::parameter::Parameter;
use crate::parameters::shared::SharedParameter;
use crate::units::Unit;
use ndarray::Array1;
use std::fmt;

/// Any parameter-like value a component can reference.
///
/// Every variant evaluates to a scalar at a given wavelength (m) and time
/// (MJD s). Cloning a `ModelParam` clones handles, not values: the clone
/// reads and writes the same underlying parameters.
#[derive(Debug, Clone)]
pub enum ModelParam {
    Plain(SharedParameter),
    Interpolated(InterpolatedParameter),
    Linked(LinkedParameter),
    Normalized(NormalizationParameter),
}

impl ModelParam {
    /// Value at one wavelength/time condition.
    pub fn evaluate(&self, wl: Option<f64>, t: Option<f64>) -> f64 {
        match self {
            ModelParam::Plain(p) => p.value(),
            ModelParam::Interpolated(p) => p.evaluate(wl, t),
            ModelParam::Linked(p) => p.evaluate(wl, t),
            ModelParam::Normalized(p) => p.evaluate(wl, t),
        }
    }

    /// Values at many conditions.
    ///
    /// `wl` and `t` are broadcast against each other: a length-1 slice is
    /// repeated, otherwise both lengths must agree. With neither given, a
    /// single value is returned.
    pub fn evaluate_many(&self, wl: Option<&[f64]>, t: Option<&[f64]>) -> Result<Array1<f64>> {
        let n = broadcast_len(&[wl, t])?;
        if let ModelParam::Plain(p) = self {
            return Ok(Array1::from_elem(n, p.value()));
        }
        Ok(Array1::from_shape_fn(n, |i| {
            self.evaluate(pick(wl, i), pick(t, i))
        }))
    }

    /// Name of the parameter (for interpolated and linked parameters, the
    /// name of the parameter they stand for).
    pub fn name(&self) -> String {
        match self {
            ModelParam::Plain(p) => p.name(),
            ModelParam::Interpolated(p) => p.name().to_string(),
            ModelParam::Linked(p) => p.name(),
            ModelParam::Normalized(p) => p.name().to_string(),
        }
    }

    pub fn unit(&self) -> Unit {
        match self {
            ModelParam::Plain(p) => p.unit(),
            ModelParam::Interpolated(p) => p.unit(),
            ModelParam::Linked(p) => p.unit(),
            ModelParam::Normalized(_) => Unit::Dimensionless,
        }
    }

    /// Whether any independent parameter behind this value is free.
    /// Linked and normalization parameters are never free.
    pub fn is_free(&self) -> bool {
        match self {
            ModelParam::Plain(p) => p.free(),
            ModelParam::Interpolated(p) => p.params().iter().any(|q| q.free()),
            ModelParam::Linked(_) | ModelParam::Normalized(_) => false,
        }
    }

    /// Independent parameters owned by this value, tagged with their key
    /// index for interpolated parameters. Derived parameters own none.
    pub fn leaves(&self) -> Vec<(Option<usize>, SharedParameter)> {
        match self {
            ModelParam::Plain(p) => vec![(None, p.clone())],
            ModelParam::Interpolated(p) => p
                .params()
                .iter()
                .enumerate()
                .map(|(k, q)| (Some(k), q.clone()))
                .collect(),
            ModelParam::Linked(_) | ModelParam::Normalized(_) => Vec::new(),
        }
    }

    pub fn as_plain(&self) -> Option<&SharedParameter> {
        match self {
            ModelParam::Plain(p) => Some(p),
            _ => None,
        }
    }

    /// Assign a value to a plain parameter.
    pub fn set_value(&self, value: f64) -> Result<()> {
        match self {
            ModelParam::Plain(p) => {
                p.set_value(value);
                Ok(())
            }
            _ => Err(VisFitError::InvalidParameter(format!(
                "cannot assign a value to derived parameter '{}'",
                self.name()
            ))),
        }
    }
}

impl From<Parameter> for ModelParam {
    fn from(param: Parameter) -> Self {
        ModelParam::Plain(SharedParameter::new(param))
    }
}

impl From<SharedParameter> for ModelParam {
    fn from(param: SharedParameter) -> Self {
        ModelParam::Plain(param)
    }
}

impl From<InterpolatedParameter> for ModelParam {
    fn from(param: InterpolatedParameter) -> Self {
        ModelParam::Interpolated(param)
    }
}

impl From<LinkedParameter> for ModelParam {
    fn from(param: LinkedParameter) -> Self {
        ModelParam::Linked(param)
    }
}

impl From<NormalizationParameter> for ModelParam {
    fn from(param: NormalizationParameter) -> Self {
        ModelParam::Normalized(param)
    }
}

impl fmt::Display for ModelParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelParam::Plain(p) => write!(f, "{}", p),
            ModelParam::Interpolated(p) => {
                write!(f, "{} interpolated on {} keys", p.name(), p.keys().len())
            }
            ModelParam::Linked(p) => {
                write!(f, "{} linked ({} {})", p.name(), p.op(), p.factor())
            }
            ModelParam::Normalized(p) => {
                write!(f, "{} = {} - sum of {} parameters", p.name(), p.target(), p.params().len())
            }
        }
    }
}

/// Common length of optional coordinate arrays, where a length-1 array
/// broadcasts against any other length.
pub fn broadcast_len(arrays: &[Option<&[f64]>]) -> Result<usize> {
    let mut n = 1;
    for a in arrays.iter().flatten() {
        let len = a.len();
        if len == 0 {
            return Err(VisFitError::DimensionMismatch(
                "coordinate arrays must not be empty".to_string(),
            ));
        }
        if len == 1 || len == n {
            continue;
        }
        if n == 1 {
            n = len;
        } else {
            return Err(VisFitError::DimensionMismatch(format!(
                "cannot broadcast arrays of length {} and {}",
                n, len
            )));
        }
    }
    Ok(n)
}

/// i-th element of a broadcast coordinate array.
pub fn pick(a: Option<&[f64]>, i: usize) -> Option<f64> {
    a.map(|s| if s.len() == 1 { s[0] } else { s[i] })
}
