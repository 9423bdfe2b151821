//! Gaussian mixture model with full covariance matrices, fitted by EM.
//!
//! Responsibilities are initialized from a seeded k-means run, then the
//! usual expectation/maximization steps alternate until the per-sample
//! log-likelihood improves by less than `tolerance`. Every covariance gets
//! `reg_covar` added to its diagonal so it stays positive definite.

use super::kmeans::{KMeans, KMeansConfig};
use crate::error::{RegimeError, Result};
use crate::utils::linalg::{cholesky, cholesky_log_det, solve_lower};
use std::f64::consts::PI;
use tracing::{debug, trace, warn};

/// Gaussian mixture configuration.
#[derive(Debug, Clone)]
pub struct GmmConfig {
    /// Number of mixture components
    pub n_components: usize,
    /// Maximum EM iterations
    pub max_iter: usize,
    /// Convergence threshold on the lower bound change
    pub tolerance: f64,
    /// Non-negative regularization added to covariance diagonals
    pub reg_covar: f64,
    /// Seed for the k-means initialization
    pub seed: u64,
}

impl Default for GmmConfig {
    fn default() -> Self {
        Self {
            n_components: 3,
            max_iter: 100,
            tolerance: 1e-3,
            reg_covar: 1e-6,
            seed: 42,
        }
    }
}

impl GmmConfig {
    /// Set number of components.
    pub fn n_components(mut self, n_components: usize) -> Self {
        self.n_components = n_components;
        self
    }

    /// Set maximum EM iterations.
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set convergence tolerance.
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set covariance regularization.
    pub fn reg_covar(mut self, reg_covar: f64) -> Self {
        self.reg_covar = reg_covar;
        self
    }

    /// Set random seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// One fitted mixture component.
#[derive(Debug, Clone)]
pub struct Component {
    pub weight: f64,
    pub mean: Vec<f64>,
    pub covariance: Vec<Vec<f64>>,
    cholesky: Vec<Vec<f64>>,
    log_det: f64,
}

impl Component {
    fn log_density(&self, x: &[f64]) -> f64 {
        let diff: Vec<f64> = x.iter().zip(self.mean.iter()).map(|(a, m)| a - m).collect();
        let y = solve_lower(&self.cholesky, &diff);
        let mahalanobis: f64 = y.iter().map(|v| v * v).sum();
        -0.5 * (x.len() as f64 * (2.0 * PI).ln() + self.log_det + mahalanobis)
    }
}

/// A fitted Gaussian mixture.
#[derive(Debug, Clone)]
pub struct GaussianMixture {
    components: Vec<Component>,
    n_features: usize,
    converged: bool,
    n_iter: usize,
    lower_bound: f64,
}

impl GaussianMixture {
    /// Fit a mixture on row-major data.
    pub fn fit(rows: &[Vec<f64>], config: &GmmConfig) -> Result<Self> {
        let n = rows.len();
        if n == 0 {
            return Err(RegimeError::EmptyData);
        }
        if config.n_components == 0 {
            return Err(RegimeError::InvalidParameter(
                "number of components must be positive".to_string(),
            ));
        }
        if config.n_components > n {
            return Err(RegimeError::InsufficientData {
                needed: config.n_components,
                got: n,
            });
        }
        if config.reg_covar.is_nan() || config.reg_covar < 0.0 {
            return Err(RegimeError::InvalidParameter(format!(
                "reg_covar must be non-negative, got {}",
                config.reg_covar
            )));
        }

        let kmeans_config = KMeansConfig::default()
            .k(config.n_components)
            .n_init(1)
            .seed(config.seed);
        let init = KMeans::fit(rows, &kmeans_config)?;
        let mut resp: Vec<Vec<f64>> = init
            .labels
            .iter()
            .map(|&label| {
                let mut r = vec![0.0; config.n_components];
                r[label] = 1.0;
                r
            })
            .collect();

        let n_features = rows[0].len();
        let mut model = Self {
            components: maximization(rows, &resp, config.reg_covar)?,
            n_features,
            converged: false,
            n_iter: 0,
            lower_bound: f64::NEG_INFINITY,
        };

        for iter in 1..=config.max_iter {
            let previous = model.lower_bound;
            let (log_resp, lower_bound) = model.expectation(rows);
            resp = log_resp
                .into_iter()
                .map(|row| row.into_iter().map(f64::exp).collect())
                .collect();
            model.components = maximization(rows, &resp, config.reg_covar)?;
            model.lower_bound = lower_bound;
            model.n_iter = iter;

            let change = lower_bound - previous;
            trace!(iter, lower_bound, change, "EM iteration");
            if change.abs() < config.tolerance {
                model.converged = true;
                break;
            }
        }

        if model.converged {
            debug!(
                n_components = config.n_components,
                rows = n,
                n_iter = model.n_iter,
                lower_bound = model.lower_bound,
                "gaussian mixture fitted"
            );
        } else {
            warn!(
                n_components = config.n_components,
                max_iter = config.max_iter,
                lower_bound = model.lower_bound,
                "EM did not converge; consider raising max_iter or tolerance"
            );
        }

        Ok(model)
    }

    /// Per-row log responsibilities and the mean log-likelihood.
    fn expectation(&self, rows: &[Vec<f64>]) -> (Vec<Vec<f64>>, f64) {
        let mut total = 0.0;
        let log_resp = rows
            .iter()
            .map(|row| {
                let weighted: Vec<f64> = self
                    .components
                    .iter()
                    .map(|c| c.weight.ln() + c.log_density(row))
                    .collect();
                let norm = log_sum_exp(&weighted);
                total += norm;
                weighted.into_iter().map(|w| w - norm).collect()
            })
            .collect();

        (log_resp, total / rows.len() as f64)
    }

    fn check_dimensions(&self, rows: &[Vec<f64>]) -> Result<()> {
        match rows.iter().find(|r| r.len() != self.n_features) {
            Some(row) => Err(RegimeError::DimensionMismatch {
                expected: self.n_features,
                got: row.len(),
            }),
            None => Ok(()),
        }
    }

    /// Posterior component probabilities per row; each row sums to 1.
    pub fn predict_proba(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        self.check_dimensions(rows)?;
        let (log_resp, _) = self.expectation(rows);
        Ok(log_resp
            .into_iter()
            .map(|row| row.into_iter().map(f64::exp).collect())
            .collect())
    }

    /// Most probable component per row.
    pub fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<usize>> {
        Ok(self
            .predict_proba(rows)?
            .iter()
            .map(|p| argmax(p))
            .collect())
    }

    /// Mean per-sample log-likelihood.
    pub fn score(&self, rows: &[Vec<f64>]) -> Result<f64> {
        if rows.is_empty() {
            return Err(RegimeError::EmptyData);
        }
        self.check_dimensions(rows)?;
        Ok(self.expectation(rows).1)
    }

    /// Bayesian information criterion on `rows`; lower is better.
    pub fn bic(&self, rows: &[Vec<f64>]) -> Result<f64> {
        let n = rows.len() as f64;
        let score = self.score(rows)?;
        Ok(-2.0 * score * n + self.n_parameters() as f64 * n.ln())
    }

    /// Free parameters of a full-covariance mixture.
    pub fn n_parameters(&self) -> usize {
        let k = self.components.len();
        let d = self.n_features;
        k * d * (d + 1) / 2 + k * d + k - 1
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn n_components(&self) -> usize {
        self.components.len()
    }

    pub fn weights(&self) -> Vec<f64> {
        self.components.iter().map(|c| c.weight).collect()
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    /// Lower bound (mean log-likelihood) reached by the last EM step.
    pub fn lower_bound(&self) -> f64 {
        self.lower_bound
    }
}

/// M-step: weights, means and regularized covariances from responsibilities.
fn maximization(rows: &[Vec<f64>], resp: &[Vec<f64>], reg_covar: f64) -> Result<Vec<Component>> {
    let n = rows.len() as f64;
    let d = rows[0].len();
    let k = resp[0].len();

    (0..k)
        .map(|j| {
            let nk: f64 = resp.iter().map(|r| r[j]).sum::<f64>() + 10.0 * f64::EPSILON;

            let mut mean = vec![0.0; d];
            for (row, r) in rows.iter().zip(resp.iter()) {
                for (m, &x) in mean.iter_mut().zip(row.iter()) {
                    *m += r[j] * x;
                }
            }
            for m in &mut mean {
                *m /= nk;
            }

            let mut covariance = vec![vec![0.0; d]; d];
            for (row, r) in rows.iter().zip(resp.iter()) {
                for a in 0..d {
                    let da = row[a] - mean[a];
                    for b in 0..=a {
                        covariance[a][b] += r[j] * da * (row[b] - mean[b]);
                    }
                }
            }
            for a in 0..d {
                for b in 0..=a {
                    covariance[a][b] /= nk;
                    covariance[b][a] = covariance[a][b];
                }
                covariance[a][a] += reg_covar;
            }

            let factor = cholesky(&covariance).ok_or_else(|| {
                RegimeError::ComputationError(format!(
                    "covariance of component {} is not positive definite; increase reg_covar",
                    j
                ))
            })?;
            let log_det = cholesky_log_det(&factor);

            Ok(Component {
                weight: nk / n,
                mean,
                covariance,
                cholesky: factor,
                log_det,
            })
        })
        .collect()
}

fn log_sum_exp(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    max + values.iter().map(|v| (v - max).exp()).sum::<f64>().ln()
}

fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best, best_v), (i, &v)| {
            if v > best_v {
                (i, v)
            } else {
                (best, best_v)
            }
        })
        .0
}
