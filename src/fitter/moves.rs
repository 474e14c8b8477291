//! Proposal moves of the ensemble sampler.
//!
//! Each move proposes new positions for one half of the ensemble using the
//! other half, and returns the log of the factor entering the acceptance
//! probability.

use rand::seq::index::sample;
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Move {
    /// Goodman & Weare stretch move with scale `a`.
    Stretch { a: f64 },
    /// Differential evolution: `x + gamma (c1 - c2)` with
    /// `gamma = gamma0 (1 + sigma N(0, 1))`. `gamma0` defaults to
    /// `2.38 / sqrt(2 ndim)`.
    DifferentialEvolution { sigma: f64, gamma0: Option<f64> },
    /// Differential evolution along the direction of a third walker.
    DESnooker { gamma: f64 },
}

impl Move {
    pub fn stretch() -> Self {
        Move::Stretch { a: 2.0 }
    }

    pub fn differential_evolution() -> Self {
        Move::DifferentialEvolution {
            sigma: 1e-5,
            gamma0: None,
        }
    }

    pub fn de_snooker() -> Self {
        Move::DESnooker { gamma: 1.7 }
    }

    /// Walkers needed in the complementary half.
    pub fn min_complement(&self) -> usize {
        match self {
            Move::Stretch { .. } => 1,
            Move::DifferentialEvolution { .. } => 2,
            Move::DESnooker { .. } => 3,
        }
    }

    /// Proposals for `walkers` built from `complement`, with their log
    /// acceptance factors.
    pub fn propose<R: Rng + ?Sized>(
        &self,
        walkers: &[Vec<f64>],
        complement: &[Vec<f64>],
        rng: &mut R,
    ) -> (Vec<Vec<f64>>, Vec<f64>) {
        let ndim = walkers.first().map_or(0, Vec::len);
        let nc = complement.len();
        let mut proposals = Vec::with_capacity(walkers.len());
        let mut factors = Vec::with_capacity(walkers.len());

        for x in walkers {
            match *self {
                Move::Stretch { a } => {
                    let z = ((a - 1.0) * rng.gen::<f64>() + 1.0).powi(2) / a;
                    let c = &complement[rng.gen_range(0..nc)];
                    proposals.push(c.iter().zip(x).map(|(ci, xi)| ci + z * (xi - ci)).collect());
                    factors.push((ndim as f64 - 1.0) * z.ln());
                }
                Move::DifferentialEvolution { sigma, gamma0 } => {
                    let g0 = gamma0.unwrap_or(2.38 / (2.0 * ndim as f64).sqrt());
                    let pair = sample(rng, nc, 2);
                    let (c1, c2) = (&complement[pair.index(0)], &complement[pair.index(1)]);
                    let eta: f64 = rng.sample(StandardNormal);
                    let gamma = g0 * (1.0 + sigma * eta);
                    proposals.push(
                        x.iter()
                            .zip(c1.iter().zip(c2))
                            .map(|(xi, (a, b))| xi + gamma * (a - b))
                            .collect(),
                    );
                    factors.push(0.0);
                }
                Move::DESnooker { gamma } => {
                    let picks = sample(rng, nc, 3);
                    let z = &complement[picks.index(0)];
                    let z1 = &complement[picks.index(1)];
                    let z2 = &complement[picks.index(2)];
                    let delta: Vec<f64> = x.iter().zip(z).map(|(a, b)| a - b).collect();
                    let norm = delta.iter().map(|d| d * d).sum::<f64>().sqrt();
                    if norm == 0.0 {
                        proposals.push(x.clone());
                        factors.push(0.0);
                        continue;
                    }
                    let dir: Vec<f64> = delta.iter().map(|d| d / norm).collect();
                    let project = |p: &[f64]| dir.iter().zip(p).map(|(u, v)| u * v).sum::<f64>();
                    let step = gamma * (project(z1) - project(z2));
                    let q: Vec<f64> = x.iter().zip(&dir).map(|(xi, u)| xi + step * u).collect();
                    let new_norm = q
                        .iter()
                        .zip(z)
                        .map(|(a, b)| (a - b).powi(2))
                        .sum::<f64>()
                        .sqrt();
                    factors.push((ndim as f64 - 1.0) * (new_norm.ln() - norm.ln()));
                    proposals.push(q);
                }
            }
        }
        (proposals, factors)
    }
}
