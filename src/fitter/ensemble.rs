//! Affine-invariant ensemble MCMC.
//!
//! The ensemble is split into two halves; each half is updated in turn with
//! proposals built from the other half, so that the stationary distribution
//! is preserved. One move is drawn per step from the weighted move list.

use super::moves::Move;
use super::{FitProblem, FitResults, FitterBackend, ResultMode};
use crate::error::{Result, VisFitError};
use crate::utils::stats::{argmin, mean, quantile};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Starting positions of the walkers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InitMethod {
    /// Uniform within the parameter bounds (which must be finite).
    #[default]
    Random,
    /// Every walker at the current parameter values.
    Fixed,
    /// Normal around the current values with the parameter errors as widths.
    Gaussian,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleConfig {
    pub nwalkers: usize,
    pub init: InitMethod,
    /// Moves with their selection weights.
    pub moves: Vec<(Move, f64)>,
    pub seed: Option<u64>,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            nwalkers: 16,
            init: InitMethod::Random,
            moves: vec![
                (Move::differential_evolution(), 0.8),
                (Move::de_snooker(), 0.2),
            ],
            seed: None,
        }
    }
}

impl EnsembleConfig {
    pub fn with_nwalkers(mut self, nwalkers: usize) -> Self {
        self.nwalkers = nwalkers;
        self
    }

    pub fn with_init(mut self, init: InitMethod) -> Self {
        self.init = init;
        self
    }

    pub fn with_moves(mut self, moves: Vec<(Move, f64)>) -> Self {
        self.moves = moves;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnsembleRunOptions {
    pub nsteps: usize,
    /// Log the progress every `progress` steps; 0 disables it.
    pub progress: usize,
}

impl EnsembleRunOptions {
    pub fn new(nsteps: usize) -> Self {
        Self { nsteps, progress: 0 }
    }

    pub fn with_progress(mut self, every: usize) -> Self {
        self.progress = every;
        self
    }
}

impl Default for EnsembleRunOptions {
    fn default() -> Self {
        Self::new(1000)
    }
}

/// Sample selection for [`ResultMode`] extraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnsembleResultOptions {
    /// Steps dropped from the start of the chain.
    pub discard: usize,
    /// Mean, median and quantiles use the samples with
    /// `chi2 <= chi2_limit_factor * min(chi2)`.
    pub chi2_limit_factor: f64,
}

impl Default for EnsembleResultOptions {
    fn default() -> Self {
        Self {
            discard: 0,
            chi2_limit_factor: 20.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnsembleSampler {
    config: EnsembleConfig,
    result_options: EnsembleResultOptions,
    rng: StdRng,
    position: Vec<Vec<f64>>,
    log_prob: Vec<f64>,
    /// `[step][walker][dim]`
    chain: Vec<Vec<Vec<f64>>>,
    /// `[step][walker]`
    chain_log_prob: Vec<Vec<f64>>,
    accepted: Vec<usize>,
}

impl Default for EnsembleSampler {
    fn default() -> Self {
        Self::new(EnsembleConfig::default())
    }
}

impl EnsembleSampler {
    pub fn new(config: EnsembleConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            result_options: EnsembleResultOptions::default(),
            rng,
            position: Vec::new(),
            log_prob: Vec::new(),
            chain: Vec::new(),
            chain_log_prob: Vec::new(),
            accepted: Vec::new(),
        }
    }

    pub fn with_result_options(mut self, options: EnsembleResultOptions) -> Self {
        self.result_options = options;
        self
    }

    pub fn set_result_options(&mut self, options: EnsembleResultOptions) {
        self.result_options = options;
    }

    pub fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    /// Stored positions, `[step][walker][dim]`.
    pub fn chain(&self) -> &[Vec<Vec<f64>>] {
        &self.chain
    }

    /// Stored log-probabilities, `[step][walker]`.
    pub fn log_prob(&self) -> &[Vec<f64>] {
        &self.chain_log_prob
    }

    /// Accepted proposals per walker over the number of steps.
    pub fn acceptance_fraction(&self) -> Vec<f64> {
        let steps = self.chain.len().max(1) as f64;
        self.accepted.iter().map(|&a| a as f64 / steps).collect()
    }

    /// Samples after `discard` steps, flattened, with their chi2r.
    fn flat_samples(&self, discard: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
        let mut samples = Vec::new();
        let mut chi2 = Vec::new();
        for (positions, lps) in self.chain.iter().zip(&self.chain_log_prob).skip(discard) {
            for (p, &lp) in positions.iter().zip(lps) {
                samples.push(p.clone());
                chi2.push(-2.0 * lp);
            }
        }
        (samples, chi2)
    }

    fn initial_positions(&mut self, problem: &FitProblem) -> Result<Vec<Vec<f64>>> {
        let free = problem.free_parameters();
        let nw = self.config.nwalkers;
        let mut positions = vec![Vec::with_capacity(free.len()); nw];

        for p in free.handles() {
            match self.config.init {
                InitMethod::Random => {
                    let bounds = p.bounds();
                    if !bounds.is_finite() {
                        return Err(VisFitError::Configuration(format!(
                            "random initialization of '{}' needs finite bounds, got [{}, {}]",
                            p.name(),
                            bounds.min,
                            bounds.max
                        )));
                    }
                    for w in positions.iter_mut() {
                        w.push(bounds.min + self.rng.gen::<f64>() * bounds.width());
                    }
                }
                InitMethod::Fixed => {
                    for w in positions.iter_mut() {
                        w.push(p.value());
                    }
                }
                InitMethod::Gaussian => {
                    let normal = Normal::new(p.value(), p.error().abs()).map_err(|e| {
                        VisFitError::Configuration(format!("gaussian initialization of '{}': {}", p.name(), e))
                    })?;
                    for w in positions.iter_mut() {
                        w.push(normal.sample(&mut self.rng));
                    }
                }
            }
        }
        Ok(positions)
    }

    fn pick_move(&mut self) -> Move {
        let total: f64 = self.config.moves.iter().map(|(_, w)| w).sum();
        let mut draw = self.rng.gen::<f64>() * total;
        for (m, w) in &self.config.moves {
            if draw < *w {
                return *m;
            }
            draw -= w;
        }
        self.config
            .moves
            .last()
            .map_or_else(Move::stretch, |(m, _)| *m)
    }

    fn step(&mut self, problem: &mut FitProblem) -> Result<()> {
        let mv = self.pick_move();
        let nw = self.position.len();
        let half = nw / 2;

        for (start, end) in [(0, half), (half, nw)] {
            let walkers: Vec<Vec<f64>> = self.position[start..end].to_vec();
            let complement: Vec<Vec<f64>> = self.position[..start]
                .iter()
                .chain(&self.position[end..])
                .cloned()
                .collect();
            let (proposals, factors) = mv.propose(&walkers, &complement, &mut self.rng);

            for (k, (q, factor)) in proposals.into_iter().zip(factors).enumerate() {
                let i = start + k;
                let lp = problem.log_probability(&q)?;
                let ln_accept = factor + lp - self.log_prob[i];
                if ln_accept > self.rng.gen::<f64>().ln() {
                    self.position[i] = q;
                    self.log_prob[i] = lp;
                    self.accepted[i] += 1;
                }
            }
        }
        Ok(())
    }
}

impl FitterBackend for EnsembleSampler {
    type RunOptions = EnsembleRunOptions;

    const DEFAULT_MODE: ResultMode = ResultMode::Best;

    fn name(&self) -> &'static str {
        "ensemble"
    }

    fn prepare(&mut self, problem: &mut FitProblem) -> Result<()> {
        let ndim = problem.ndim();
        if ndim == 0 {
            return Err(VisFitError::Configuration(
                "the model has no free parameters".to_string(),
            ));
        }
        if self.config.moves.is_empty() || self.config.moves.iter().any(|(_, w)| !(*w >= 0.0)) {
            return Err(VisFitError::Configuration(
                "the move list must be non-empty with non-negative weights".to_string(),
            ));
        }
        let min_half = self
            .config
            .moves
            .iter()
            .map(|(m, _)| m.min_complement())
            .max()
            .unwrap_or(1);
        let nw = self.config.nwalkers;
        if nw % 2 != 0 || nw < 2 * ndim || nw / 2 < min_half {
            return Err(VisFitError::Configuration(format!(
                "{} walkers for {} parameters: need an even number, at least {}",
                nw,
                ndim,
                (2 * ndim).max(2 * min_half)
            )));
        }

        self.position = self.initial_positions(problem)?;
        self.log_prob = Vec::with_capacity(nw);
        for i in 0..nw {
            let theta = self.position[i].clone();
            self.log_prob.push(problem.log_probability(&theta)?);
        }
        self.chain.clear();
        self.chain_log_prob.clear();
        self.accepted = vec![0; nw];
        debug!(
            "Ensemble sampler ready: {} walkers, {} dimensions, init {:?}",
            nw, ndim, self.config.init
        );
        Ok(())
    }

    fn run(&mut self, problem: &mut FitProblem, options: &EnsembleRunOptions) -> Result<()> {
        if self.position.is_empty() {
            return Err(VisFitError::NotInitialized(
                "ensemble sampler has no walkers".to_string(),
            ));
        }
        for step in 0..options.nsteps {
            self.step(problem)?;
            self.chain.push(self.position.clone());
            self.chain_log_prob.push(self.log_prob.clone());
            if options.progress > 0 && (step + 1) % options.progress == 0 {
                debug!("step {}/{}", step + 1, options.nsteps);
            }
        }
        info!(
            "Ensemble run finished: {} steps, mean acceptance {:.3}",
            self.chain.len(),
            mean(&self.acceptance_fraction())
        );
        Ok(())
    }

    fn results(&self, problem: &FitProblem, mode: ResultMode) -> Result<FitResults> {
        let opts = self.result_options;
        let (samples, chi2) = self.flat_samples(opts.discard);
        let best = argmin(&chi2).ok_or_else(|| {
            VisFitError::NotInitialized("the chain holds no finite sample".to_string())
        })?;
        let limit = opts.chi2_limit_factor * chi2[best];
        let selected: Vec<&Vec<f64>> = samples
            .iter()
            .zip(&chi2)
            .filter(|(_, &c)| c <= limit)
            .map(|(s, _)| s)
            .collect();

        let ndim = problem.ndim();
        let column = |d: usize| selected.iter().map(|s| s[d]).collect::<Vec<f64>>();
        let values: Vec<f64> = match mode {
            ResultMode::Best => samples[best].clone(),
            ResultMode::Mean => (0..ndim).map(|d| mean(&column(d))).collect(),
            ResultMode::Median => (0..ndim).map(|d| quantile(&column(d), 0.5)).collect(),
        };

        let mut minus = Vec::with_capacity(ndim);
        let mut plus = Vec::with_capacity(ndim);
        for d in 0..ndim {
            let col = column(d);
            minus.push((quantile(&col, 0.16) - values[d]).abs());
            plus.push((quantile(&col, 0.84) - values[d]).abs());
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

    fn fitter(config: EnsembleConfig) -> Fitter<EnsembleSampler> {
        let model = Model::new(vec![Component::uniform_disk(&[("d", 3.0.into())]).unwrap()]);
        let d = model.components()[0].param("d").unwrap().as_plain().unwrap().clone();
        d.set_bounds(0.0, 10.0).unwrap();
        model.components()[0].param("f").unwrap().as_plain().unwrap().set_free(false);

        let truth = Model::new(vec![Component::uniform_disk(&[("d", 5.0.into())]).unwrap()]);
        // First lobe only, where the squared visibility is monotonic in d.
        let u: Vec<f64> = (1..=8).map(|k| k as f64 * 0.45e7).collect();
        let v = vec![0.0; 8];
        let cf = truth.complex_coherent_flux(&u, &v, None, None).unwrap();
        let vis2: Vec<f64> = cf.iter().map(|z| z.norm_sqr()).collect();
        let table = VisTable::new(u, v, vec![2e-6; 8])
            .unwrap()
            .with_vis2(vis2, vec![0.01; 8])
            .unwrap();
        Fitter::new(model, DataSet::new().with_vis(table), EnsembleSampler::new(config))
    }

    #[test]
    fn test_run_before_prepare_fails() {
        let mut f = fitter(EnsembleConfig::default().with_seed(1));
        assert!(matches!(
            f.run(&EnsembleRunOptions::new(10)),
            Err(VisFitError::NotInitialized(_))
        ));
    }

    #[test]
    fn test_recovers_diameter() {
        let mut f = fitter(EnsembleConfig::default().with_seed(42));
        f.prepare().unwrap();
        let best = f.run(&EnsembleRunOptions::new(500)).unwrap();
        assert!((best.values[0] - 5.0).abs() < 0.05, "{:?}", best.values);
        assert_eq!(f.backend().chain().len(), 500);
        assert!(f.simulator().chi2r() < 1.0);

        let median = f.get_results(ResultMode::Median).unwrap();
        assert!((median.values[0] - 5.0).abs() < 0.1);
        assert!(median.errors[0] >= 0.0);
        let d = f.free_parameters().get("c1_UD_d").unwrap();
        assert_eq!(d.value(), median.values[0]);
        assert_eq!(d.error(), median.errors[0]);
    }

    #[test]
    fn test_random_init_needs_finite_bounds() {
        let model = Model::new(vec![Component::gaussian(&[("fwhm", 3.0.into())]).unwrap()]);
        let table = VisTable::new(vec![1e7], vec![0.0], vec![2e-6])
            .unwrap()
            .with_vis2(vec![0.5], vec![0.1])
            .unwrap();
        let mut f = Fitter::new(model, DataSet::new().with_vis(table), EnsembleSampler::default());
        assert!(matches!(f.prepare(), Err(VisFitError::Configuration(_))));
    }

    #[test]
    fn test_odd_walker_count_rejected() {
        let mut f = fitter(EnsembleConfig::default().with_nwalkers(7));
        assert!(matches!(f.prepare(), Err(VisFitError::Configuration(_))));
    }

    #[test]
    fn test_fixed_init_starts_at_current_values() {
        let mut f = fitter(
            EnsembleConfig::default()
                .with_init(InitMethod::Fixed)
                .with_moves(vec![(Move::stretch(), 1.0)])
                .with_seed(3),
        );
        f.prepare().unwrap();
        f.run(&EnsembleRunOptions::new(1)).unwrap();
        // Identical walkers cannot be moved by ensemble proposals.
        for walker in &f.backend().chain()[0] {
            assert_eq!(walker[0], 3.0);
        }
    }
}
