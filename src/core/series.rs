//! Time-indexed univariate series.

use crate::error::{RegimeError, Result};
use chrono::{DateTime, Utc};

/// A univariate series of `f64` samples on a strictly increasing time index.
///
/// Missing values are represented as `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    index: Vec<DateTime<Utc>>,
    values: Vec<f64>,
    name: Option<String>,
}

impl Series {
    /// Create a new series, validating that the index is strictly increasing
    /// and has the same length as the values.
    pub fn new(index: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        validate_index(&index)?;
        if index.len() != values.len() {
            return Err(RegimeError::DimensionMismatch {
                expected: index.len(),
                got: values.len(),
            });
        }
        Ok(Self {
            index,
            values,
            name: None,
        })
    }

    /// Attach a name to the series.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Build a series that shares this series' index.
    ///
    /// Used by the rolling operators so that outputs stay aligned with inputs.
    pub(crate) fn derive(&self, values: Vec<f64>, name: &str) -> Series {
        debug_assert_eq!(values.len(), self.index.len());
        Series {
            index: self.index.clone(),
            values,
            name: Some(name.to_string()),
        }
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Value at a position, `None` when out of bounds.
    pub fn get(&self, position: usize) -> Option<f64> {
        self.values.get(position).copied()
    }

    /// Number of `NaN` entries.
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_nan()).count()
    }

    /// Check if the series has missing values (NaN or Inf).
    pub fn has_missing_values(&self) -> bool {
        self.values.iter().any(|v| !v.is_finite())
    }

    /// Ensure another series is aligned with this one.
    pub fn ensure_aligned(&self, other: &Series) -> Result<()> {
        if self.len() != other.len() {
            return Err(RegimeError::DimensionMismatch {
                expected: self.len(),
                got: other.len(),
            });
        }
        if self.index != other.index {
            return Err(RegimeError::IndexMismatch(format!(
                "series {} and {} are indexed differently",
                self.name().unwrap_or("<unnamed>"),
                other.name().unwrap_or("<unnamed>")
            )));
        }
        Ok(())
    }

    /// Elementwise combination of two aligned series.
    pub fn zip_with<F>(&self, other: &Series, name: &str, f: F) -> Result<Series>
    where
        F: Fn(f64, f64) -> f64,
    {
        self.ensure_aligned(other)?;
        let values = self
            .values
            .iter()
            .zip(other.values.iter())
            .map(|(&a, &b)| f(a, b))
            .collect();
        Ok(self.derive(values, name))
    }
}

/// Validate that timestamps are strictly increasing.
pub(crate) fn validate_index(index: &[DateTime<Utc>]) -> Result<()> {
    for i in 1..index.len() {
        if index[i] <= index[i - 1] {
            return Err(RegimeError::IndexMismatch(
                "timestamps must be strictly increasing".to_string(),
            ));
        }
    }
    Ok(())
}
