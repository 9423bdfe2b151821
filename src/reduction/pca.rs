//! Principal component analysis on feature rows.

use crate::core::FeatureMatrix;
use crate::error::{RegimeError, Result};
use crate::utils::linalg::symmetric_eigen;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Supported linear reduction methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReductionMethod {
    Pca,
}

impl FromStr for ReductionMethod {
    type Err = RegimeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pca" => Ok(Self::Pca),
            other => Err(RegimeError::UnsupportedOption {
                option: "method".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ReductionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pca => write!(f, "pca"),
        }
    }
}

/// A fitted PCA projection.
///
/// Components are unit vectors sorted by descending explained variance. Each
/// component's largest-magnitude loading is positive, which fixes the sign
/// ambiguity of the eigendecomposition.
#[derive(Debug, Clone)]
pub struct Pca {
    mean: Vec<f64>,
    components: Vec<Vec<f64>>,
    explained_variance: Vec<f64>,
    explained_variance_ratio: Vec<f64>,
}

impl Pca {
    /// Fit on row-major data, keeping `n_components` components.
    pub fn fit(rows: &[Vec<f64>], n_components: usize) -> Result<Self> {
        let n = rows.len();
        let d = rows.first().map(|r| r.len()).ok_or(RegimeError::EmptyData)?;
        if d == 0 {
            return Err(RegimeError::EmptyData);
        }
        if let Some(row) = rows.iter().find(|r| r.len() != d) {
            return Err(RegimeError::DimensionMismatch {
                expected: d,
                got: row.len(),
            });
        }
        if n_components == 0 || n_components > n.min(d) {
            return Err(RegimeError::InvalidParameter(format!(
                "n_components must be between 1 and {}, got {}",
                n.min(d),
                n_components
            )));
        }

        let mut mean = vec![0.0; d];
        for row in rows {
            for (m, &x) in mean.iter_mut().zip(row.iter()) {
                *m += x;
            }
        }
        for m in &mut mean {
            *m /= n as f64;
        }

        let denom = n.saturating_sub(1).max(1) as f64;
        let mut covariance = vec![vec![0.0; d]; d];
        for row in rows {
            for a in 0..d {
                let da = row[a] - mean[a];
                for b in 0..=a {
                    covariance[a][b] += da * (row[b] - mean[b]);
                }
            }
        }
        for a in 0..d {
            for b in 0..=a {
                covariance[a][b] /= denom;
                covariance[b][a] = covariance[a][b];
            }
        }

        let (eigenvalues, eigenvectors) = symmetric_eigen(&covariance);
        let eigenvalues: Vec<f64> = eigenvalues.into_iter().map(|v| v.max(0.0)).collect();
        let total: f64 = eigenvalues.iter().sum();

        let components: Vec<Vec<f64>> = eigenvectors
            .into_iter()
            .take(n_components)
            .map(orient)
            .collect();
        let explained_variance: Vec<f64> = eigenvalues[..n_components].to_vec();
        let explained_variance_ratio = explained_variance
            .iter()
            .map(|&v| if total > 0.0 { v / total } else { 0.0 })
            .collect();

        debug!(rows = n, features = d, n_components, "pca fitted");
        Ok(Self {
            mean,
            components,
            explained_variance,
            explained_variance_ratio,
        })
    }

    /// Project rows onto the fitted components.
    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        rows.iter()
            .map(|row| {
                if row.len() != self.mean.len() {
                    return Err(RegimeError::DimensionMismatch {
                        expected: self.mean.len(),
                        got: row.len(),
                    });
                }
                Ok(self
                    .components
                    .iter()
                    .map(|component| {
                        row.iter()
                            .zip(self.mean.iter())
                            .zip(component.iter())
                            .map(|((&x, &m), &c)| (x - m) * c)
                            .sum()
                    })
                    .collect())
            })
            .collect()
    }

    /// Map projected rows back into feature space.
    pub fn inverse_transform(&self, projected: &[Vec<f64>]) -> Vec<Vec<f64>> {
        projected
            .iter()
            .map(|scores| {
                let mut row = self.mean.clone();
                for (score, component) in scores.iter().zip(self.components.iter()) {
                    for (x, &c) in row.iter_mut().zip(component.iter()) {
                        *x += score * c;
                    }
                }
                row
            })
            .collect()
    }

    pub fn n_components(&self) -> usize {
        self.components.len()
    }

    /// Principal axes, one unit vector per component.
    pub fn components(&self) -> &[Vec<f64>] {
        &self.components
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Variance (sample, `n - 1` denominator) captured by each component.
    pub fn explained_variance(&self) -> &[f64] {
        &self.explained_variance
    }

    /// Share of the total variance captured by each component.
    pub fn explained_variance_ratio(&self) -> &[f64] {
        &self.explained_variance_ratio
    }
}

/// Flip a component so its largest-magnitude loading is positive.
fn orient(component: Vec<f64>) -> Vec<f64> {
    let pivot = component
        .iter()
        .copied()
        .fold(0.0_f64, |best, x| if x.abs() > best.abs() { x } else { best });
    if pivot < 0.0 {
        component.into_iter().map(|x| -x).collect()
    } else {
        component
    }
}

/// Reduce a feature matrix to `n_components` synthetic columns `PC1..PCn`.
///
/// # Errors
/// `UnsupportedOption` for any method other than `"pca"`, `InvalidParameter`
/// when `n_components` is outside `1..=min(rows, columns)`, and
/// `MissingValues` when the matrix contains NaN or infinite entries.
pub fn reduce_dimensionality(
    features: &FeatureMatrix,
    method: &str,
    n_components: usize,
) -> Result<FeatureMatrix> {
    let method: ReductionMethod = method.parse()?;
    features.ensure_model_ready()?;

    match method {
        ReductionMethod::Pca => {
            let rows = features.rows();
            let pca = Pca::fit(&rows, n_components)?;
            let projected = pca.transform(&rows)?;
            let names = (1..=n_components).map(|i| format!("PC{}", i)).collect();
            FeatureMatrix::from_rows(features.index().to_vec(), names, &projected)
        }
    }
}
