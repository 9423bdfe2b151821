//! Column standardization for feature matrices.

use crate::error::{RegimeError, Result};

/// Zero-mean, unit-variance scaler fitted per feature column.
///
/// Uses the population standard deviation; a column with zero variance
/// keeps a scale of 1 so that it maps to all zeros.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Fit the scaler on row-major data.
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        let n = rows.len();
        let d = rows.first().map(|r| r.len()).ok_or(RegimeError::EmptyData)?;
        if d == 0 {
            return Err(RegimeError::EmptyData);
        }

        let mut means = vec![0.0; d];
        for row in rows {
            if row.len() != d {
                return Err(RegimeError::DimensionMismatch {
                    expected: d,
                    got: row.len(),
                });
            }
            for (m, &x) in means.iter_mut().zip(row.iter()) {
                *m += x;
            }
        }
        for m in &mut means {
            *m /= n as f64;
        }

        let mut scales = vec![0.0; d];
        for row in rows {
            for j in 0..d {
                scales[j] += (row[j] - means[j]).powi(2);
            }
        }
        for s in &mut scales {
            let std = (*s / n as f64).sqrt();
            *s = if std < 1e-10 { 1.0 } else { std };
        }

        Ok(Self { means, scales })
    }

    /// Transform rows using the fitted parameters.
    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        rows.iter()
            .map(|row| {
                if row.len() != self.means.len() {
                    return Err(RegimeError::DimensionMismatch {
                        expected: self.means.len(),
                        got: row.len(),
                    });
                }
                Ok(row
                    .iter()
                    .zip(self.means.iter().zip(self.scales.iter()))
                    .map(|(&x, (&m, &s))| (x - m) / s)
                    .collect())
            })
            .collect()
    }

    /// Fit and transform in one step.
    pub fn fit_transform(rows: &[Vec<f64>]) -> Result<(Self, Vec<Vec<f64>>)> {
        let scaler = Self::fit(rows)?;
        let scaled = scaler.transform(rows)?;
        Ok((scaler, scaled))
    }

    /// Recover the original scale.
    pub fn inverse_transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter()
            .map(|row| {
                row.iter()
                    .zip(self.means.iter().zip(self.scales.iter()))
                    .map(|(&z, (&m, &s))| z * s + m)
                    .collect()
            })
            .collect()
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    /// Number of features the scaler was fitted on.
    pub fn n_features(&self) -> usize {
        self.means.len()
    }
}
