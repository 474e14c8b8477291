//! In-memory interferometric observables.
//!
//! A [`DataSet`] holds at most one [`VisTable`] (baseline observables) and one
//! [`T3Table`] (closure phases). Spatial frequencies are in cycles/rad,
//! wavelengths in m and times in MJD seconds; phases are in degrees.

use crate::error::{Result, VisFitError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Observable kinds a simulator can compare with the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Squared visibility, normalized by the zero-frequency flux.
    Vis2,
    /// Visibility amplitude, normalized by the zero-frequency flux.
    VisAmp,
    /// Visibility phase (deg).
    VisPhi,
    /// Closure phase (deg).
    T3Phi,
}

impl DataType {
    pub const ALL: [DataType; 4] = [DataType::Vis2, DataType::VisAmp, DataType::VisPhi, DataType::T3Phi];

    pub fn label(self) -> &'static str {
        match self {
            DataType::Vis2 => "VIS2DATA",
            DataType::VisAmp => "VISAMP",
            DataType::VisPhi => "VISPHI",
            DataType::T3Phi => "T3PHI",
        }
    }

    /// Phases are compared modulo 360 degrees.
    pub fn is_phase(self) -> bool {
        matches!(self, DataType::VisPhi | DataType::T3Phi)
    }
}

impl FromStr for DataType {
    type Err = VisFitError;

    fn from_str(s: &str) -> Result<Self> {
        DataType::ALL
            .into_iter()
            .find(|d| d.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let expected: Vec<&str> = DataType::ALL.iter().map(|d| d.label()).collect();
                VisFitError::unknown_option(s, &expected)
            })
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Measured values with their 1-sigma errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observable {
    pub value: Vec<f64>,
    pub error: Vec<f64>,
}

impl Observable {
    fn new(kind: DataType, value: Vec<f64>, error: Vec<f64>, n: usize) -> Result<Self> {
        if value.len() != n || error.len() != n {
            return Err(VisFitError::DimensionMismatch(format!(
                "{} needs {} values and errors, got {} and {}",
                kind,
                n,
                value.len(),
                error.len()
            )));
        }
        if error.iter().any(|&e| !(e > 0.0)) {
            return Err(VisFitError::InvalidInput(format!(
                "{} errors must be positive",
                kind
            )));
        }
        Ok(Self { value, error })
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

fn check_len(label: &str, values: &[f64], n: usize) -> Result<()> {
    if values.len() != n {
        return Err(VisFitError::DimensionMismatch(format!(
            "{} has {} values, expected {}",
            label,
            values.len(),
            n
        )));
    }
    Ok(())
}

/// Baseline observables sampled at `(u, v, wl[, t])`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisTable {
    pub u: Vec<f64>,
    pub v: Vec<f64>,
    pub wl: Vec<f64>,
    /// Empty for static observations.
    pub t: Vec<f64>,
    pub vis2: Option<Observable>,
    pub visamp: Option<Observable>,
    pub visphi: Option<Observable>,
}

impl VisTable {
    pub fn new(u: Vec<f64>, v: Vec<f64>, wl: Vec<f64>) -> Result<Self> {
        let n = u.len();
        check_len("v", &v, n)?;
        check_len("wl", &wl, n)?;
        Ok(Self {
            u,
            v,
            wl,
            t: Vec::new(),
            vis2: None,
            visamp: None,
            visphi: None,
        })
    }

    pub fn with_time(mut self, t: Vec<f64>) -> Result<Self> {
        check_len("t", &t, self.len())?;
        self.t = t;
        Ok(self)
    }

    pub fn with_vis2(mut self, value: Vec<f64>, error: Vec<f64>) -> Result<Self> {
        self.vis2 = Some(Observable::new(DataType::Vis2, value, error, self.len())?);
        Ok(self)
    }

    pub fn with_visamp(mut self, value: Vec<f64>, error: Vec<f64>) -> Result<Self> {
        self.visamp = Some(Observable::new(DataType::VisAmp, value, error, self.len())?);
        Ok(self)
    }

    pub fn with_visphi(mut self, value: Vec<f64>, error: Vec<f64>) -> Result<Self> {
        self.visphi = Some(Observable::new(DataType::VisPhi, value, error, self.len())?);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.u.len()
    }

    pub fn is_empty(&self) -> bool {
        self.u.is_empty()
    }

    pub fn time(&self) -> Option<&[f64]> {
        (!self.t.is_empty()).then_some(self.t.as_slice())
    }

    pub fn observable(&self, kind: DataType) -> Option<&Observable> {
        match kind {
            DataType::Vis2 => self.vis2.as_ref(),
            DataType::VisAmp => self.visamp.as_ref(),
            DataType::VisPhi => self.visphi.as_ref(),
            DataType::T3Phi => None,
        }
    }
}

/// Closure-phase triangles: baselines `(u1, v1)`, `(u2, v2)` and their sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct T3Table {
    pub u1: Vec<f64>,
    pub v1: Vec<f64>,
    pub u2: Vec<f64>,
    pub v2: Vec<f64>,
    pub wl: Vec<f64>,
    pub t: Vec<f64>,
    pub t3phi: Option<Observable>,
}

impl T3Table {
    pub fn new(u1: Vec<f64>, v1: Vec<f64>, u2: Vec<f64>, v2: Vec<f64>, wl: Vec<f64>) -> Result<Self> {
        let n = u1.len();
        check_len("v1", &v1, n)?;
        check_len("u2", &u2, n)?;
        check_len("v2", &v2, n)?;
        check_len("wl", &wl, n)?;
        Ok(Self {
            u1,
            v1,
            u2,
            v2,
            wl,
            t: Vec::new(),
            t3phi: None,
        })
    }

    pub fn with_time(mut self, t: Vec<f64>) -> Result<Self> {
        check_len("t", &t, self.len())?;
        self.t = t;
        Ok(self)
    }

    pub fn with_t3phi(mut self, value: Vec<f64>, error: Vec<f64>) -> Result<Self> {
        self.t3phi = Some(Observable::new(DataType::T3Phi, value, error, self.len())?);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.u1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.u1.is_empty()
    }

    pub fn time(&self) -> Option<&[f64]> {
        (!self.t.is_empty()).then_some(self.t.as_slice())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSet {
    pub vis: Option<VisTable>,
    pub t3: Option<T3Table>,
}

impl DataSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vis(mut self, table: VisTable) -> Self {
        self.vis = Some(table);
        self
    }

    pub fn with_t3(mut self, table: T3Table) -> Self {
        self.t3 = Some(table);
        self
    }

    /// Observable kinds present in the data, in [`DataType::ALL`] order.
    pub fn data_types(&self) -> Vec<DataType> {
        DataType::ALL
            .into_iter()
            .filter(|&d| self.observable(d).is_some())
            .collect()
    }

    pub fn observable(&self, kind: DataType) -> Option<&Observable> {
        match kind {
            DataType::T3Phi => self.t3.as_ref().and_then(|t| t.t3phi.as_ref()),
            _ => self.vis.as_ref().and_then(|v| v.observable(kind)),
        }
    }

    /// Number of data points of the given kinds.
    pub fn count(&self, kinds: &[DataType]) -> usize {
        kinds
            .iter()
            .filter_map(|&k| self.observable(k))
            .map(Observable::len)
            .sum()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
