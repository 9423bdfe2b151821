//! Entropy-based features for time series.
//!
//! Provides window kernels (Shannon, permutation and sample entropy) and
//! their rolling counterparts over a [`Series`].

use crate::core::Series;
use crate::error::{RegimeError, Result};
use crate::transform::window::{rolling, rolling_apply, validate_window};
use crate::utils::stats::population_std_dev;
use std::collections::HashMap;
use tracing::debug;

/// How histogram heights are turned into the values entropy is taken over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistogramNormalization {
    /// Bin counts divided by the sample count (a probability mass).
    #[default]
    Probability,
    /// Bin counts divided by `n * bin_width` (a probability density).
    Density,
}

/// Rolling Shannon entropy configuration.
#[derive(Debug, Clone)]
pub struct ShannonEntropyConfig {
    /// Window length
    pub window: usize,
    /// Number of equal-width histogram bins
    pub bins: usize,
    /// Histogram normalization
    pub normalization: HistogramNormalization,
}

impl Default for ShannonEntropyConfig {
    fn default() -> Self {
        Self {
            window: 21,
            bins: 10,
            normalization: HistogramNormalization::Probability,
        }
    }
}

impl ShannonEntropyConfig {
    /// Set window length.
    pub fn window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    /// Set number of bins.
    pub fn bins(mut self, bins: usize) -> Self {
        self.bins = bins;
        self
    }

    /// Set histogram normalization.
    pub fn normalization(mut self, normalization: HistogramNormalization) -> Self {
        self.normalization = normalization;
        self
    }
}

/// Rolling permutation entropy configuration.
#[derive(Debug, Clone)]
pub struct PermutationEntropyConfig {
    pub window: usize,
    /// Embedding order (pattern length)
    pub order: usize,
    /// Time delay between pattern elements
    pub delay: usize,
}

impl Default for PermutationEntropyConfig {
    fn default() -> Self {
        Self {
            window: 21,
            order: 3,
            delay: 1,
        }
    }
}

/// Rolling sample entropy configuration.
#[derive(Debug, Clone)]
pub struct SampleEntropyConfig {
    pub window: usize,
    /// Embedding dimension
    pub m: usize,
    /// Tolerance as a multiple of the window's standard deviation
    pub r: f64,
}

impl Default for SampleEntropyConfig {
    fn default() -> Self {
        Self {
            window: 50,
            m: 2,
            r: 0.2,
        }
    }
}

/// Returns the Shannon entropy of a histogram of the values.
///
/// Bins span `[min, max]` with the right-most edge inclusive; a constant
/// input uses the range `[v - 0.5, v + 0.5]`. Empty bins are discarded and
/// the result is `-sum(h * ln(h))` over the normalized heights `h`.
///
/// # Arguments
/// * `series` - Window values
/// * `bins` - Number of equal-width bins
/// * `normalization` - How bin counts are normalized
pub fn shannon_entropy(series: &[f64], bins: usize, normalization: HistogramNormalization) -> f64 {
    if series.is_empty() || bins == 0 {
        return f64::NAN;
    }

    let mut lo = series.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = series.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !lo.is_finite() || !hi.is_finite() {
        return f64::NAN;
    }
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let bin_width = (hi - lo) / bins as f64;
    let mut counts = vec![0usize; bins];
    for &x in series {
        let bin = ((x - lo) / bin_width).floor() as usize;
        counts[bin.min(bins - 1)] += 1;
    }

    let n = series.len() as f64;
    let scale = match normalization {
        HistogramNormalization::Probability => n,
        HistogramNormalization::Density => n * bin_width,
    };

    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let h = c as f64 / scale;
            -h * h.ln()
        })
        .sum()
}

/// Returns the normalized permutation entropy of the values.
///
/// Based on the frequency distribution of ordinal patterns; the result
/// lies in `[0, 1]`. Ties are ranked by position.
///
/// # Arguments
/// * `series` - Window values
/// * `order` - Order of permutation patterns (typically 3-7)
/// * `delay` - Time delay between elements (typically 1)
///
/// # Errors
/// Fails when the order or delay is invalid, when the input is too short
/// to hold one pattern, or when it contains non-finite values.
pub fn permutation_entropy(series: &[f64], order: usize, delay: usize) -> Result<f64> {
    if order < 2 {
        return Err(RegimeError::InvalidParameter(format!(
            "permutation order must be at least 2, got {}",
            order
        )));
    }
    if delay == 0 {
        return Err(RegimeError::InvalidParameter(
            "permutation delay must be positive".to_string(),
        ));
    }
    let span = (order - 1) * delay + 1;
    if series.len() < span {
        return Err(RegimeError::InsufficientData {
            needed: span,
            got: series.len(),
        });
    }
    if series.iter().any(|x| !x.is_finite()) {
        return Err(RegimeError::MissingValues);
    }

    let n_patterns = series.len() - (order - 1) * delay;
    let mut pattern_counts: HashMap<Vec<usize>, usize> = HashMap::new();

    for i in 0..n_patterns {
        let pattern = ordinal_pattern(series, i, order, delay);
        *pattern_counts.entry(pattern).or_insert(0) += 1;
    }

    let entropy: f64 = pattern_counts
        .values()
        .map(|&count| {
            let p = count as f64 / n_patterns as f64;
            -p * p.log2()
        })
        .sum();

    Ok(entropy / log2_factorial(order))
}

/// Permutation that sorts the embedded vector starting at `start`.
fn ordinal_pattern(series: &[f64], start: usize, order: usize, delay: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..order).collect();
    indices.sort_by(|&a, &b| {
        series[start + a * delay]
            .partial_cmp(&series[start + b * delay])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    indices
}

/// `log2(n!)` as a sum of logarithms; stays finite for any order.
fn log2_factorial(n: usize) -> f64 {
    (2..=n).map(|k| (k as f64).log2()).sum()
}

/// Returns the sample entropy of the values.
///
/// The tolerance is `r` times the population standard deviation of the
/// input. Returns `NaN` when the input has at most `m + 1` samples, zero
/// variance, or no matching template pairs at either length.
///
/// Cost is `O(N^2 * m)` for `N` samples.
///
/// # Arguments
/// * `series` - Window values
/// * `m` - Embedding dimension (typically 2)
/// * `r` - Tolerance multiplier (typically 0.2)
pub fn sample_entropy(series: &[f64], m: usize, r: f64) -> f64 {
    let n = series.len();
    if n <= m + 1 {
        return f64::NAN;
    }
    let std = population_std_dev(series);
    if std == 0.0 || !std.is_finite() {
        return f64::NAN;
    }

    let tolerance = r * std;
    let a = count_matches(series, m + 1, tolerance);
    let b = count_matches(series, m, tolerance);

    if a == 0 || b == 0 {
        return f64::NAN;
    }

    -((a as f64) / (b as f64)).ln()
}

/// Count unordered template pairs `i < j` of length `template_len` whose
/// Chebyshev distance is within `tolerance`, over starts `0..N - template_len`.
fn count_matches(series: &[f64], template_len: usize, tolerance: f64) -> usize {
    let starts = series.len() - template_len;
    let mut count = 0;

    for i in 0..starts {
        for j in (i + 1)..starts {
            if templates_match(series, i, j, template_len, tolerance) {
                count += 1;
            }
        }
    }

    count
}

fn templates_match(series: &[f64], i: usize, j: usize, len: usize, tolerance: f64) -> bool {
    (0..len).all(|k| (series[i + k] - series[j + k]).abs() <= tolerance)
}

/// Rolling Shannon entropy with probability-normalized histogram heights.
///
/// Heights are bin masses summing to 1, so a flat window scores 0. This
/// differs from numpy's `density=True` heights, whose entropy shifts with
/// the bin width; use [`rolling_shannon_entropy_with`] and
/// [`HistogramNormalization::Density`] for that convention.
pub fn rolling_shannon_entropy(series: &Series, window: usize, bins: usize) -> Result<Series> {
    let config = ShannonEntropyConfig::default().window(window).bins(bins);
    rolling_shannon_entropy_with(series, &config)
}

/// Rolling Shannon entropy with a full configuration.
pub fn rolling_shannon_entropy_with(series: &Series, config: &ShannonEntropyConfig) -> Result<Series> {
    if config.bins == 0 {
        return Err(RegimeError::InvalidParameter(
            "bins must be positive".to_string(),
        ));
    }
    rolling(series, config.window, "shannon_entropy", |w| {
        shannon_entropy(w, config.bins, config.normalization)
    })
}

/// Rolling normalized permutation entropy (delay 1).
///
/// A window on which the kernel fails yields `NaN`; the failure is logged.
pub fn rolling_permutation_entropy(series: &Series, window: usize, order: usize) -> Result<Series> {
    let config = PermutationEntropyConfig {
        window,
        order,
        ..Default::default()
    };
    rolling_permutation_entropy_with(series, &config)
}

/// Rolling permutation entropy with a full configuration.
pub fn rolling_permutation_entropy_with(
    series: &Series,
    config: &PermutationEntropyConfig,
) -> Result<Series> {
    if config.order < 2 {
        return Err(RegimeError::InvalidParameter(format!(
            "permutation order must be at least 2, got {}",
            config.order
        )));
    }
    if config.delay == 0 {
        return Err(RegimeError::InvalidParameter(
            "permutation delay must be positive".to_string(),
        ));
    }
    validate_window(series.len(), config.window)?;

    let values = rolling_apply(series.values(), config.window, |position, w| {
        match permutation_entropy(w, config.order, config.delay) {
            Ok(pe) => pe,
            Err(err) => {
                debug!(position, error = %err, "permutation entropy undefined for window");
                f64::NAN
            }
        }
    });
    Ok(series.derive(values, "permutation_entropy"))
}

/// Rolling sample entropy.
///
/// Each window costs `O(window^2 * m)`, so a full pass is
/// `O(len * window^2 * m)`; keep `window` modest on long series.
pub fn rolling_sample_entropy(series: &Series, window: usize, m: usize, r: f64) -> Result<Series> {
    rolling_sample_entropy_with(series, &SampleEntropyConfig { window, m, r })
}

/// Rolling sample entropy with a full configuration.
pub fn rolling_sample_entropy_with(series: &Series, config: &SampleEntropyConfig) -> Result<Series> {
    if !(config.r.is_finite() && config.r > 0.0) {
        return Err(RegimeError::InvalidParameter(format!(
            "tolerance r must be positive, got {}",
            config.r
        )));
    }
    rolling(series, config.window, "sample_entropy", |w| {
        sample_entropy(w, config.m, config.r)
    })
}
