//! Feature matrix: named feature columns aligned on a shared time index.

use super::series::{validate_index, Series};
use crate::error::{RegimeError, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Policy for handling missing values (NaN/Inf).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MissingValuePolicy {
    /// Drop rows with a missing value in any column.
    Drop,
    /// Fill with a specific value.
    Fill(f64),
    /// Forward fill (use previous valid value).
    ForwardFill,
    /// Return error if missing values found.
    Error,
}

/// A table of time series aligned on a shared index.
///
/// Rows are time steps, columns are named features. Values are stored
/// column-major: `columns[feature][observation]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    index: Vec<DateTime<Utc>>,
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    /// Create an empty matrix (no columns) on the given index.
    pub fn new(index: Vec<DateTime<Utc>>) -> Result<Self> {
        validate_index(&index)?;
        Ok(Self {
            index,
            names: Vec::new(),
            columns: Vec::new(),
        })
    }

    /// Create a matrix from row-major data.
    pub fn from_rows(
        index: Vec<DateTime<Utc>>,
        names: Vec<String>,
        rows: &[Vec<f64>],
    ) -> Result<Self> {
        if rows.len() != index.len() {
            return Err(RegimeError::DimensionMismatch {
                expected: index.len(),
                got: rows.len(),
            });
        }
        for row in rows {
            if row.len() != names.len() {
                return Err(RegimeError::DimensionMismatch {
                    expected: names.len(),
                    got: row.len(),
                });
            }
        }

        let mut matrix = Self::new(index)?;
        for (d, name) in names.into_iter().enumerate() {
            let column = rows.iter().map(|row| row[d]).collect();
            matrix = matrix.with_column(name, column)?;
        }
        Ok(matrix)
    }

    /// Merge several named series on their index (inner join).
    ///
    /// Only timestamps present in every series are kept, in ascending order.
    /// Unnamed series get `feature_<position>` as column name.
    ///
    /// Every rolling feature names its output after the feature, so two
    /// windows of the same feature collide with [`RegimeError::DuplicateColumn`].
    /// Rename them first with [`Series::with_name`], e.g.
    /// `realized_volatility(&r, 21)?.with_name("vol_21")`.
    pub fn from_series(series: &[Series]) -> Result<Self> {
        let first = series.first().ok_or(RegimeError::EmptyData)?;

        let mut shared: Vec<DateTime<Utc>> = first.index().to_vec();
        for s in &series[1..] {
            let positions: HashMap<DateTime<Utc>, usize> = s
                .index()
                .iter()
                .enumerate()
                .map(|(i, t)| (*t, i))
                .collect();
            shared.retain(|t| positions.contains_key(t));
        }

        let mut matrix = Self::new(shared)?;
        for (k, s) in series.iter().enumerate() {
            let positions: HashMap<DateTime<Utc>, usize> = s
                .index()
                .iter()
                .enumerate()
                .map(|(i, t)| (*t, i))
                .collect();
            let column = matrix
                .index
                .iter()
                .map(|t| s.values()[positions[t]])
                .collect();
            let name = s
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("feature_{}", k));
            matrix = matrix.with_column(name, column)?;
        }

        Ok(matrix)
    }

    /// Append a named column.
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        let name = name.into();
        if self.names.contains(&name) {
            return Err(RegimeError::DuplicateColumn(name));
        }
        if values.len() != self.index.len() {
            return Err(RegimeError::DimensionMismatch {
                expected: self.index.len(),
                got: values.len(),
            });
        }
        self.names.push(name);
        self.columns.push(values);
        Ok(self)
    }

    /// Append a series as a column; its index must equal the matrix index.
    pub fn with_series(self, series: &Series) -> Result<Self> {
        if series.index() != self.index.as_slice() {
            return Err(RegimeError::IndexMismatch(format!(
                "series {} is not aligned with the feature matrix",
                series.name().unwrap_or("<unnamed>")
            )));
        }
        let name = series
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("feature_{}", self.ncols()));
        self.with_column(name, series.values().to_vec())
    }

    /// Number of rows (time steps).
    pub fn nrows(&self) -> usize {
        self.index.len()
    }

    /// Number of feature columns.
    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nrows() == 0 || self.ncols() == 0
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Values of a column by name.
    pub fn column(&self, name: &str) -> Result<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
            .ok_or_else(|| RegimeError::ColumnNotFound(name.to_string()))
    }

    /// Extract a column as an aligned series.
    pub fn series(&self, name: &str) -> Result<Series> {
        let values = self.column(name)?.to_vec();
        Ok(Series::new(self.index.clone(), values)?.with_name(name))
    }

    /// Get all values organized by column.
    pub fn columns(&self) -> &[Vec<f64>] {
        &self.columns
    }

    /// Row-major copy of the data, one `Vec` per time step.
    pub fn rows(&self) -> Vec<Vec<f64>> {
        (0..self.nrows())
            .map(|i| self.columns.iter().map(|col| col[i]).collect())
            .collect()
    }

    /// Check if the matrix has missing values (NaN or Inf).
    pub fn has_missing_values(&self) -> bool {
        self.columns
            .iter()
            .any(|col| col.iter().any(|v| !v.is_finite()))
    }

    /// Drop every row with a missing value in any column.
    pub fn drop_missing(&self) -> FeatureMatrix {
        let valid: Vec<usize> = (0..self.nrows())
            .filter(|&i| self.columns.iter().all(|col| col[i].is_finite()))
            .collect();

        FeatureMatrix {
            index: valid.iter().map(|&i| self.index[i]).collect(),
            names: self.names.clone(),
            columns: self
                .columns
                .iter()
                .map(|col| valid.iter().map(|&i| col[i]).collect())
                .collect(),
        }
    }

    /// Return a sanitized copy with missing values handled.
    pub fn sanitized(&self, policy: MissingValuePolicy) -> Result<FeatureMatrix> {
        match policy {
            MissingValuePolicy::Error => {
                if self.has_missing_values() {
                    return Err(RegimeError::MissingValues);
                }
                Ok(self.clone())
            }
            MissingValuePolicy::Drop => Ok(self.drop_missing()),
            MissingValuePolicy::Fill(fill_value) => Ok(self.map_columns(|col| {
                col.iter()
                    .map(|&v| if v.is_finite() { v } else { fill_value })
                    .collect()
            })),
            MissingValuePolicy::ForwardFill => Ok(self.map_columns(|col| {
                let mut last_valid = None;
                col.iter()
                    .map(|&v| {
                        if v.is_finite() {
                            last_valid = Some(v);
                            v
                        } else {
                            last_valid.unwrap_or(v)
                        }
                    })
                    .collect()
            })),
        }
    }

    fn map_columns<F>(&self, f: F) -> FeatureMatrix
    where
        F: Fn(&[f64]) -> Vec<f64>,
    {
        FeatureMatrix {
            index: self.index.clone(),
            names: self.names.clone(),
            columns: self.columns.iter().map(|col| f(col)).collect(),
        }
    }

    /// Reject matrices that cannot be fed to a model.
    pub(crate) fn ensure_model_ready(&self) -> Result<()> {
        if self.nrows() == 0 || self.ncols() == 0 {
            return Err(RegimeError::EmptyData);
        }
        if self.has_missing_values() {
            return Err(RegimeError::MissingValues);
        }
        Ok(())
    }
}
