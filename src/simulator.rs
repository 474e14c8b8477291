//! Comparison of a model with a data set.
//!
//! The [`Simulator`] evaluates the model at the data's coordinates, derives the
//! same observables as the data, and reduces the normalized residuals to a
//! chi-square. The fitters only see it through [`Simulator::compute`],
//! [`Simulator::chi2r`] and [`Simulator::residuals`].

use crate::data::{DataSet, DataType, Observable};
use crate::error::{Result, VisFitError};
use crate::model::Model;
use log::warn;
use ndarray::Array1;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Options of [`Simulator::compute`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeOptions {
    /// Update the chi-square.
    pub chi2: bool,
    /// Store the simulated observables.
    pub simulated: bool,
    /// Observable kinds to use; all those present in the data when `None`.
    pub data_types: Option<Vec<DataType>>,
}

impl Default for ComputeOptions {
    fn default() -> Self {
        Self {
            chi2: true,
            simulated: true,
            data_types: None,
        }
    }
}

impl ComputeOptions {
    pub fn with_data_types(mut self, data_types: Vec<DataType>) -> Self {
        self.data_types = Some(data_types);
        self
    }
}

/// Model observables at the data's coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulatedData {
    pub vis2: Option<Vec<f64>>,
    pub visamp: Option<Vec<f64>>,
    pub visphi: Option<Vec<f64>>,
    pub t3phi: Option<Vec<f64>>,
}

impl SimulatedData {
    pub fn get(&self, kind: DataType) -> Option<&[f64]> {
        match kind {
            DataType::Vis2 => self.vis2.as_deref(),
            DataType::VisAmp => self.visamp.as_deref(),
            DataType::VisPhi => self.visphi.as_deref(),
            DataType::T3Phi => self.t3phi.as_deref(),
        }
    }

    fn set(&mut self, kind: DataType, values: Vec<f64>) {
        let slot = match kind {
            DataType::Vis2 => &mut self.vis2,
            DataType::VisAmp => &mut self.visamp,
            DataType::VisPhi => &mut self.visphi,
            DataType::T3Phi => &mut self.t3phi,
        };
        *slot = Some(values);
    }
}

/// Wrap a phase difference in degrees into `(-180, 180]`.
pub fn wrap_degrees(d: f64) -> f64 {
    let w = (d + 180.0).rem_euclid(360.0) - 180.0;
    if w == -180.0 {
        180.0
    } else {
        w
    }
}

#[derive(Debug, Clone)]
pub struct Simulator {
    model: Model,
    data: DataSet,
    chi2: f64,
    chi2r: f64,
    simulated: SimulatedData,
    /// Free-parameter count fixed by the fitter; counted from the model when unset.
    nfree: Option<usize>,
    dof_warned: bool,
}

impl Simulator {
    pub fn new(model: Model, data: DataSet) -> Self {
        Self {
            model,
            data,
            chi2: f64::NAN,
            chi2r: f64::NAN,
            simulated: SimulatedData::default(),
            nfree: None,
            dof_warned: false,
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut Model {
        self.nfree = None;
        self.dof_warned = false;
        &mut self.model
    }

    /// Fix the number of free parameters used by the reduced chi-square.
    pub fn set_free_count(&mut self, nfree: usize) {
        self.nfree = Some(nfree);
        self.dof_warned = false;
    }

    pub fn data(&self) -> &DataSet {
        &self.data
    }

    /// Chi-square of the last [`compute`](Self::compute); NaN before.
    pub fn chi2(&self) -> f64 {
        self.chi2
    }

    /// Reduced chi-square of the last [`compute`](Self::compute); NaN before.
    pub fn chi2r(&self) -> f64 {
        self.chi2r
    }

    pub fn simulated(&self) -> &SimulatedData {
        &self.simulated
    }

    fn selected(&self, data_types: Option<&[DataType]>) -> Vec<DataType> {
        let present = self.data.data_types();
        match data_types {
            Some(types) => present.into_iter().filter(|d| types.contains(d)).collect(),
            None => present,
        }
    }

    /// Model values of one observable kind.
    fn simulate(&self, kind: DataType) -> Result<Vec<f64>> {
        match kind {
            DataType::T3Phi => {
                let t3 = self
                    .data
                    .t3
                    .as_ref()
                    .ok_or_else(|| VisFitError::InvalidInput("no closure-phase table".to_string()))?;
                let u3: Vec<f64> = t3.u1.iter().zip(&t3.u2).map(|(a, b)| a + b).collect();
                let v3: Vec<f64> = t3.v1.iter().zip(&t3.v2).map(|(a, b)| a + b).collect();
                let wl = Some(t3.wl.as_slice());
                let t = t3.time();
                let v1 = self.model.complex_coherent_flux(&t3.u1, &t3.v1, wl, t)?;
                let v2 = self.model.complex_coherent_flux(&t3.u2, &t3.v2, wl, t)?;
                let v3 = self.model.complex_coherent_flux(&u3, &v3, wl, t)?;
                Ok((0..t3.len())
                    .map(|i| (v1[i] * v2[i] * v3[i].conj()).arg().to_degrees())
                    .collect())
            }
            _ => {
                let vis = self
                    .data
                    .vis
                    .as_ref()
                    .ok_or_else(|| VisFitError::InvalidInput("no visibility table".to_string()))?;
                let wl = Some(vis.wl.as_slice());
                let t = vis.time();
                let cf = self.model.complex_coherent_flux(&vis.u, &vis.v, wl, t)?;
                if kind == DataType::VisPhi {
                    return Ok(cf.iter().map(|z| z.arg().to_degrees()).collect());
                }
                let zeros = vec![0.0; vis.len()];
                let flux = self.model.complex_coherent_flux(&zeros, &zeros, wl, t)?;
                let normalized = normalize(&cf, &flux);
                Ok(match kind {
                    DataType::Vis2 => normalized.iter().map(|a| a * a).collect(),
                    _ => normalized,
                })
            }
        }
    }

    fn residuals_of(&self, kind: DataType, model: &[f64], observed: &Observable) -> Vec<f64> {
        model
            .iter()
            .zip(observed.value.iter().zip(&observed.error))
            .map(|(&m, (&d, &e))| {
                let diff = if kind.is_phase() { wrap_degrees(d - m) } else { d - m };
                diff / e
            })
            .collect()
    }

    /// Normalized residuals `(data - model) / error` of the selected kinds,
    /// concatenated in [`DataType::ALL`] order.
    pub fn residuals(&self, data_types: Option<&[DataType]>) -> Result<Array1<f64>> {
        let mut out = Vec::new();
        for kind in self.selected(data_types) {
            if let Some(observed) = self.data.observable(kind) {
                let model = self.simulate(kind)?;
                out.extend(self.residuals_of(kind, &model, observed));
            }
        }
        Ok(Array1::from(out))
    }

    /// Evaluate the model and update the chi-square and the simulated data.
    pub fn compute(&mut self, options: &ComputeOptions) -> Result<()> {
        let kinds = self.selected(options.data_types.as_deref());
        let mut chi2 = 0.0;
        let mut n = 0usize;
        let mut simulated = SimulatedData::default();

        for kind in kinds {
            let model = self.simulate(kind)?;
            if options.chi2 {
                if let Some(observed) = self.data.observable(kind) {
                    let res = self.residuals_of(kind, &model, observed);
                    chi2 += res.iter().map(|r| r * r).sum::<f64>();
                    n += res.len();
                }
            }
            if options.simulated {
                simulated.set(kind, model);
            }
        }

        if options.chi2 {
            let nfree = match self.nfree {
                Some(nfree) => nfree,
                None => self.model.free_parameters()?.len(),
            };
            if n <= nfree && !self.dof_warned {
                warn!(
                    "{} data points for {} free parameters: reducing chi2 by the number of points",
                    n, nfree
                );
                self.dof_warned = true;
            }
            self.chi2 = chi2;
            self.chi2r = reduce_chi2(chi2, n, nfree);
        }
        if options.simulated {
            self.simulated = simulated;
        }
        Ok(())
    }
}

/// Visibility amplitudes over the zero-frequency flux; NaN where the total
/// flux vanishes.
fn normalize(cf: &Array1<Complex64>, flux: &Array1<Complex64>) -> Vec<f64> {
    cf.iter()
        .zip(flux.iter())
        .map(|(z, f)| {
            let total = f.norm();
            if total == 0.0 {
                f64::NAN
            } else {
                z.norm() / total
            }
        })
        .collect()
}

/// `chi2 / (n - nfree)`, or `chi2 / n` when there are no degrees of freedom.
pub fn reduce_chi2(chi2: f64, n: usize, nfree: usize) -> f64 {
    if n > nfree {
        chi2 / (n - nfree) as f64
    } else if n == 0 {
        0.0
    } else {
        chi2 / n as f64
    }
}
