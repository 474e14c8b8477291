//! Parameters derived from other parameters.
//!
//! Neither kind is ever free: their value follows deterministically from the
//! parameters they wrap, so they are skipped when a model is flattened into
//! its free-parameter vector.

use crate::parameters::value::ModelParam;
use crate::units::Unit;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operator applied by a [`LinkedParameter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkOp {
    Add,
    Multiply,
}

impl LinkOp {
    pub fn apply(self, value: f64, factor: f64) -> f64 {
        match self {
            LinkOp::Add => value + factor,
            LinkOp::Multiply => value * factor,
        }
    }
}

impl FromStr for LinkOp {
    type Err = crate::VisFitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "add" => Ok(LinkOp::Add),
            "mult" | "multiply" => Ok(LinkOp::Multiply),
            _ => Err(crate::VisFitError::unknown_option(s, &["add", "multiply"])),
        }
    }
}

impl fmt::Display for LinkOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkOp::Add => write!(f, "add"),
            LinkOp::Multiply => write!(f, "multiply"),
        }
    }
}

/// Affine link to another parameter: `source + factor` or `source * factor`.
///
/// ```
/// use visfit_rs::parameters::{LinkOp, LinkedParameter, ModelParam, Parameter};
///
/// let din = ModelParam::from(Parameter::new("din", 4.0));
/// let dout = LinkedParameter::new(din.clone(), LinkOp::Add, 2.0);
/// assert_eq!(dout.evaluate(None, None), 6.0);
/// ```
#[derive(Debug, Clone)]
pub struct LinkedParameter {
    source: Box<ModelParam>,
    op: LinkOp,
    factor: f64,
}

impl LinkedParameter {
    pub fn new(source: ModelParam, op: LinkOp, factor: f64) -> Self {
        Self {
            source: Box::new(source),
            op,
            factor,
        }
    }

    pub fn source(&self) -> &ModelParam {
        &self.source
    }

    pub fn op(&self) -> LinkOp {
        self.op
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    pub fn name(&self) -> String {
        self.source.name()
    }

    pub fn unit(&self) -> Unit {
        self.source.unit()
    }

    pub fn evaluate(&self, wl: Option<f64>, t: Option<f64>) -> f64 {
        self.op.apply(self.source.evaluate(wl, t), self.factor)
    }
}

/// `target - sum(params)`, so that a set of fluxes sums to `target`.
#[derive(Debug, Clone)]
pub struct NormalizationParameter {
    name: String,
    params: Vec<ModelParam>,
    target: f64,
}

impl NormalizationParameter {
    pub fn new(name: &str, params: Vec<ModelParam>, target: f64) -> Self {
        Self {
            name: name.to_string(),
            params,
            target,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ModelParam] {
        &self.params
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn evaluate(&self, wl: Option<f64>, t: Option<f64>) -> f64 {
        self.target - self.params.iter().map(|p| p.evaluate(wl, t)).sum::<f64>()
    }
}
