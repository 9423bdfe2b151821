//! Regime label assignments.

use super::series::Series;
use crate::error::Result;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Label used by density-based clustering for points outside every cluster.
pub const NOISE_LABEL: i64 = -1;

/// Integer regime labels aligned to a feature matrix index.
///
/// Label values carry no ordering; `-1` is reserved for noise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegimeLabels {
    index: Vec<DateTime<Utc>>,
    name: String,
    labels: Vec<i64>,
}

impl RegimeLabels {
    pub(crate) fn new(index: Vec<DateTime<Utc>>, name: &str, labels: Vec<i64>) -> Self {
        debug_assert_eq!(index.len(), labels.len());
        Self {
            index,
            name: name.to_string(),
            labels,
        }
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn labels(&self) -> &[i64] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Distinct labels, noise excluded, in ascending order.
    pub fn distinct(&self) -> Vec<i64> {
        self.labels
            .iter()
            .copied()
            .filter(|&l| l != NOISE_LABEL)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Number of distinct non-noise labels.
    pub fn n_clusters(&self) -> usize {
        self.distinct().len()
    }

    /// Number of rows labelled as noise.
    pub fn noise_count(&self) -> usize {
        self.labels.iter().filter(|&&l| l == NOISE_LABEL).count()
    }

    /// Labels as a float series on the same index.
    pub fn to_series(&self) -> Result<Series> {
        let values = self.labels.iter().map(|&l| l as f64).collect();
        Ok(Series::new(self.index.clone(), values)?.with_name(self.name.clone()))
    }
}
