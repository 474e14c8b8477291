//! Static nested sampling.
//!
//! Live points are drawn uniformly in the unit cube and mapped onto the
//! parameter bounds. At each iteration the lowest-likelihood live point is
//! retired with the prior-volume weight `X_{i-1} - X_i`, `X_i = exp(-i/nlive)`,
//! and replaced by a constrained random walk started from another live point.
//! The run stops once the evidence the live points can still add falls below
//! `dlogz`.

use super::{FitProblem, FitResults, FitterBackend, ResultMode};
use crate::error::{Result, VisFitError};
use crate::utils::stats::{logaddexp, weighted_quantile};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NestedConfig {
    pub nlive: usize,
    /// Random-walk steps per replacement.
    pub walks: usize,
    pub seed: Option<u64>,
    pub max_iterations: usize,
}

impl Default for NestedConfig {
    fn default() -> Self {
        Self {
            nlive: 1000,
            walks: 25,
            seed: None,
            max_iterations: 100_000,
        }
    }
}

impl NestedConfig {
    pub fn with_nlive(mut self, nlive: usize) -> Self {
        self.nlive = nlive;
        self
    }

    pub fn with_walks(mut self, walks: usize) -> Self {
        self.walks = walks;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NestedRunOptions {
    /// Stop when the remaining evidence is below `dlogz` (in log units).
    pub dlogz: f64,
}

impl Default for NestedRunOptions {
    fn default() -> Self {
        Self { dlogz: 0.01 }
    }
}

impl NestedRunOptions {
    pub fn new(dlogz: f64) -> Self {
        Self { dlogz }
    }
}

#[derive(Debug, Clone)]
struct LivePoint {
    unit: Vec<f64>,
    theta: Vec<f64>,
    log_l: f64,
}

#[derive(Debug, Clone)]
pub struct NestedSampler {
    config: NestedConfig,
    rng: StdRng,
    /// Live set drawn by `prepare`; every run starts from it.
    initial: Vec<LivePoint>,
    live: Vec<LivePoint>,
    samples: Vec<Vec<f64>>,
    log_l: Vec<f64>,
    log_wt: Vec<f64>,
    logz: f64,
    logzerr: f64,
    scale: f64,
}

impl Default for NestedSampler {
    fn default() -> Self {
        Self::new(NestedConfig::default())
    }
}

impl NestedSampler {
    pub fn new(config: NestedConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            rng,
            initial: Vec::new(),
            live: Vec::new(),
            samples: Vec::new(),
            log_l: Vec::new(),
            log_wt: Vec::new(),
            logz: f64::NEG_INFINITY,
            logzerr: f64::NAN,
            scale: 0.1,
        }
    }

    pub fn config(&self) -> &NestedConfig {
        &self.config
    }

    /// Log-evidence of the last run.
    pub fn logz(&self) -> f64 {
        self.logz
    }

    /// Error on [`logz`](Self::logz), `sqrt(H / nlive)`.
    pub fn logzerr(&self) -> f64 {
        self.logzerr
    }

    /// Retired and final live points, in retirement order.
    pub fn samples(&self) -> &[Vec<f64>] {
        &self.samples
    }

    /// Normalized importance weights of [`samples`](Self::samples).
    pub fn weights(&self) -> Vec<f64> {
        self.log_wt.iter().map(|w| (w - self.logz).exp()).collect()
    }

    /// Restore the prepared live set and clear the accumulated run.
    fn reset(&mut self) {
        self.live = self.initial.clone();
        self.samples.clear();
        self.log_l.clear();
        self.log_wt.clear();
        self.logz = f64::NEG_INFINITY;
        self.logzerr = f64::NAN;
        self.scale = 0.1;
    }

    fn to_theta(problem: &FitProblem, unit: &[f64]) -> Result<Vec<f64>> {
        problem
            .limits()
            .iter()
            .zip(unit)
            .map(|(b, &u)| Ok(b.from_unit(u)?))
            .collect()
    }

    fn draw(&mut self, problem: &mut FitProblem) -> Result<LivePoint> {
        let unit: Vec<f64> = (0..problem.ndim()).map(|_| self.rng.gen::<f64>()).collect();
        let theta = Self::to_theta(problem, &unit)?;
        let log_l = problem.log_likelihood(&theta)?;
        Ok(LivePoint { unit, theta, log_l })
    }

    /// Random walk from a live point other than `worst`, keeping only
    /// positions with a likelihood above `threshold`.
    fn replace(&mut self, problem: &mut FitProblem, worst: usize, threshold: f64) -> Result<LivePoint> {
        let n = self.live.len();
        let mut start = self.rng.gen_range(0..n - 1);
        if start >= worst {
            start += 1;
        }
        let mut current = self.live[start].clone();
        let mut accepted = 0usize;

        for _ in 0..self.config.walks {
            let unit: Vec<f64> = current
                .unit
                .iter()
                .map(|&u| {
                    let step: f64 = self.rng.sample(StandardNormal);
                    u + self.scale * step
                })
                .collect();
            if unit.iter().any(|u| !(0.0..=1.0).contains(u)) {
                continue;
            }
            let theta = Self::to_theta(problem, &unit)?;
            let log_l = problem.log_likelihood(&theta)?;
            if log_l > threshold {
                current = LivePoint { unit, theta, log_l };
                accepted += 1;
            }
        }

        let rate = accepted as f64 / self.config.walks.max(1) as f64;
        self.scale = if rate > 0.5 {
            (self.scale * 1.1).min(1.0)
        } else {
            (self.scale / 1.1).max(1e-8)
        };
        Ok(current)
    }
}

impl FitterBackend for NestedSampler {
    type RunOptions = NestedRunOptions;

    const DEFAULT_MODE: ResultMode = ResultMode::Median;

    fn name(&self) -> &'static str {
        "nested"
    }

    fn prepare(&mut self, problem: &mut FitProblem) -> Result<()> {
        if problem.ndim() == 0 {
            return Err(VisFitError::Configuration(
                "the model has no free parameters".to_string(),
            ));
        }
        if self.config.nlive < 2 {
            return Err(VisFitError::Configuration(
                "nested sampling needs at least 2 live points".to_string(),
            ));
        }
        if let Some(b) = problem.limits().iter().find(|b| !b.is_finite()) {
            return Err(VisFitError::Configuration(format!(
                "nested sampling needs finite bounds, got [{}, {}]",
                b.min, b.max
            )));
        }
        let mut initial = Vec::with_capacity(self.config.nlive);
        for _ in 0..self.config.nlive {
            initial.push(self.draw(problem)?);
        }
        self.initial = initial;
        self.reset();
        debug!(
            "Nested sampler ready: {} live points, {} walks",
            self.config.nlive, self.config.walks
        );
        Ok(())
    }

    fn run(&mut self, problem: &mut FitProblem, options: &NestedRunOptions) -> Result<()> {
        if self.initial.is_empty() {
            return Err(VisFitError::NotInitialized(
                "nested sampler has no live points".to_string(),
            ));
        }
        self.reset();
        let nlive = self.live.len() as f64;
        let mut log_x = 0.0;
        let mut iterations = 0;

        loop {
            let (worst, worst_l) = self
                .live
                .iter()
                .enumerate()
                .map(|(i, p)| (i, p.log_l))
                .fold((0, f64::INFINITY), |acc, (i, l)| if l < acc.1 { (i, l) } else { acc });
            let max_l = self
                .live
                .iter()
                .map(|p| p.log_l)
                .fold(f64::NEG_INFINITY, f64::max);

            let remaining = max_l + log_x;
            if logaddexp(self.logz, remaining) - self.logz < options.dlogz {
                break;
            }
            if iterations >= self.config.max_iterations {
                warn!(
                    "Nested sampling stopped after {} iterations before reaching dlogz = {}",
                    iterations, options.dlogz
                );
                break;
            }

            let new_log_x = -((iterations + 1) as f64) / nlive;
            let log_width = log_x + (1.0 - (new_log_x - log_x).exp()).ln();
            let log_wt = worst_l + log_width;
            self.logz = logaddexp(self.logz, log_wt);
            self.samples.push(self.live[worst].theta.clone());
            self.log_l.push(worst_l);
            self.log_wt.push(log_wt);

            let replacement = self.replace(problem, worst, worst_l)?;
            self.live[worst] = replacement;
            log_x = new_log_x;
            iterations += 1;
        }

        // The remaining live points share the last prior volume.
        let log_share = log_x - nlive.ln();
        for point in &self.live {
            let log_wt = point.log_l + log_share;
            self.logz = logaddexp(self.logz, log_wt);
            self.samples.push(point.theta.clone());
            self.log_l.push(point.log_l);
            self.log_wt.push(log_wt);
        }

        // Information H = sum(w_i ln L_i) - ln Z with normalized weights.
        let information = (self
            .log_l
            .iter()
            .zip(&self.log_wt)
            .filter(|(l, _)| l.is_finite())
            .map(|(l, w)| (w - self.logz).exp() * l)
            .sum::<f64>()
            - self.logz)
            .max(0.0);
        self.logzerr = if information.is_finite() {
            (information / nlive).sqrt()
        } else {
            f64::NAN
        };
        info!(
            "Nested sampling finished after {} iterations: logz = {:.3} +/- {:.3}",
            iterations, self.logz, self.logzerr
        );
        Ok(())
    }

    fn results(&self, problem: &FitProblem, mode: ResultMode) -> Result<FitResults> {
        if mode != ResultMode::Median {
            return Err(VisFitError::unknown_option(&mode.to_string(), &["median"]));
        }
        if self.samples.is_empty() {
            return Err(VisFitError::NotInitialized(
                "nested sampler has no samples".to_string(),
            ));
        }
        let weights = self.weights();
        let mut values = Vec::with_capacity(problem.ndim());
        let mut minus = Vec::with_capacity(problem.ndim());
        let mut plus = Vec::with_capacity(problem.ndim());
        for d in 0..problem.ndim() {
            let column: Vec<f64> = self.samples.iter().map(|s| s[d]).collect();
            let q16 = weighted_quantile(&column, &weights, 0.16);
            let q50 = weighted_quantile(&column, &weights, 0.5);
            let q84 = weighted_quantile(&column, &weights, 0.84);
            values.push(q50);
            minus.push(q50 - q16);
            plus.push(q84 - q50);
        }
        Ok(FitResults::new(values, minus, plus))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Component;
    use crate::data::{DataSet, VisTable};
    use crate::fitter::Fitter;
    use crate::model::Model;

    fn fitter(config: NestedConfig) -> Fitter<NestedSampler> {
        let model = Model::new(vec![Component::uniform_disk(&[("d", 3.0.into())]).unwrap()]);
        let disk = &model.components()[0];
        disk.param("d").unwrap().as_plain().unwrap().set_bounds(0.0, 10.0).unwrap();
        disk.param("f").unwrap().as_plain().unwrap().set_free(false);

        let truth = Model::new(vec![Component::uniform_disk(&[("d", 5.0.into())]).unwrap()]);
        let u: Vec<f64> = (1..=8).map(|k| k as f64 * 0.45e7).collect();
        let v = vec![0.0; 8];
        let cf = truth.complex_coherent_flux(&u, &v, None, None).unwrap();
        let vis2: Vec<f64> = cf.iter().map(|z| z.norm_sqr()).collect();
        let table = VisTable::new(u, v, vec![2e-6; 8])
            .unwrap()
            .with_vis2(vis2, vec![0.01; 8])
            .unwrap();
        Fitter::new(model, DataSet::new().with_vis(table), NestedSampler::new(config))
    }

    #[test]
    fn test_recovers_diameter_and_evidence() {
        let mut f = fitter(NestedConfig::default().with_nlive(100).with_seed(7));
        f.prepare().unwrap();
        let res = f.run(&NestedRunOptions::new(0.1)).unwrap();
        assert!((res.values[0] - 5.0).abs() < 0.1, "{:?}", res.values);
        assert!(res.errors_minus[0] >= 0.0 && res.errors_plus[0] >= 0.0);
        assert!(f.backend().logz().is_finite());
        assert!(f.backend().logzerr() >= 0.0);
        let total: f64 = f.backend().weights().iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_second_run_starts_over() {
        let mut f = fitter(NestedConfig::default().with_nlive(100).with_seed(7));
        f.prepare().unwrap();
        let options = NestedRunOptions::new(0.1);
        f.run(&options).unwrap();
        let logz1 = f.backend().logz();
        let n1 = f.backend().samples().len();

        let res = f.run(&options).unwrap();
        let logz2 = f.backend().logz();
        let n2 = f.backend().samples().len();
        assert!((logz2 - logz1).abs() < 1.0, "logz {} then {}", logz1, logz2);
        assert!((n2 as f64) < 1.3 * n1 as f64, "{} samples after {}", n2, n1);
        let total: f64 = f.backend().weights().iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!((res.values[0] - 5.0).abs() < 0.1, "{:?}", res.values);
    }

    #[test]
    fn test_only_median_mode() {
        let mut f = fitter(NestedConfig::default().with_nlive(20).with_seed(1).with_max_iterations(50));
        f.prepare().unwrap();
        f.run(&NestedRunOptions::default()).unwrap();
        assert!(matches!(
            f.get_results(ResultMode::Best),
            Err(VisFitError::UnknownOption { .. })
        ));
        assert!(f.get_results_str("median").is_ok());
    }

    #[test]
    fn test_infinite_bounds_rejected() {
        let model = Model::new(vec![Component::gaussian(&[("fwhm", 1.0.into())]).unwrap()]);
        let table = VisTable::new(vec![1e7], vec![0.0], vec![2e-6])
            .unwrap()
            .with_vis2(vec![0.5], vec![0.1])
            .unwrap();
        let mut f = Fitter::new(model, DataSet::new().with_vis(table), NestedSampler::default());
        assert!(matches!(f.prepare(), Err(VisFitError::Configuration(_))));
    }
}
