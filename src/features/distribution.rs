//! Distribution shape features: skewness and kurtosis.
//!
//! The estimators follow the usual moment conventions:
//!
//! * biased skewness `g1 = m3 / m2^1.5`, bias-corrected
//!   `G1 = g1 * sqrt(n (n - 1)) / (n - 2)`;
//! * biased kurtosis `m4 / m2^2` (minus 3 for Fisher's excess definition),
//!   bias-corrected via the standard `G2` adjustment.
//!
//! The rolling variants use biased moments and excess kurtosis, so a normal
//! distribution scores 0 for both.

use crate::core::Series;
use crate::error::Result;
use crate::transform::window::rolling;
use crate::utils::stats::{central_moment, mean};

/// Returns the skewness (third standardized moment).
///
/// `NaN` for inputs with zero variance, or fewer than 3 samples when
/// `bias` is false.
pub fn skewness(series: &[f64], bias: bool) -> f64 {
    let n = series.len() as f64;
    let Some(m2) = nonzero_variance(series) else {
        return f64::NAN;
    };
    let m3 = central_moment(series, 3);
    let g1 = m3 / m2.powf(1.5);

    if bias {
        return g1;
    }
    if series.len() < 3 {
        return f64::NAN;
    }
    g1 * (n * (n - 1.0)).sqrt() / (n - 2.0)
}

/// Returns the kurtosis (fourth standardized moment).
///
/// With `fisher` the result is excess kurtosis (normal = 0), otherwise
/// Pearson's definition (normal = 3). `NaN` for inputs with zero variance,
/// or fewer than 4 samples when `bias` is false.
pub fn kurtosis(series: &[f64], fisher: bool, bias: bool) -> f64 {
    let n = series.len() as f64;
    let Some(m2) = nonzero_variance(series) else {
        return f64::NAN;
    };
    let m4 = central_moment(series, 4);
    let mut k = m4 / (m2 * m2);

    if !bias {
        if series.len() < 4 {
            return f64::NAN;
        }
        k = ((n + 1.0) * k - 3.0 * (n - 1.0)) * (n - 1.0) / ((n - 2.0) * (n - 3.0)) + 3.0;
    }

    if fisher {
        k - 3.0
    } else {
        k
    }
}

/// Biased second central moment, `None` if it is numerically zero.
fn nonzero_variance(series: &[f64]) -> Option<f64> {
    if series.is_empty() {
        return None;
    }
    let m2 = central_moment(series, 2);
    let threshold = (f64::EPSILON * mean(series)).powi(2);
    if m2.is_nan() || m2 <= threshold {
        None
    } else {
        Some(m2)
    }
}

/// Rolling biased skewness.
pub fn rolling_skew(series: &Series, window: usize) -> Result<Series> {
    rolling(series, window, "skew", |w| skewness(w, true))
}

/// Rolling biased excess kurtosis.
pub fn rolling_kurtosis(series: &Series, window: usize) -> Result<Series> {
    rolling(series, window, "kurtosis", |w| kurtosis(w, true, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone, Utc};

    fn make_series(values: Vec<f64>) -> Series {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let index = (0..values.len())
            .map(|i| base + Duration::days(i as i64))
            .collect();
        Series::new(index, values).unwrap()
    }

    // ==================== skewness ====================

    #[test]
    fn skewness_symmetric_is_zero() {
        let series = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(skewness(&series, true), 0.0, epsilon = 1e-12);
        assert_relative_eq!(skewness(&series, false), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn skewness_right_tail() {
        // mean 0.75: m2 = 1.6875, m3 = 2.53125
        let series = vec![0.0, 0.0, 0.0, 3.0];
        let g1 = skewness(&series, true);
        assert_relative_eq!(g1, 2.53125 / 1.6875_f64.powf(1.5), epsilon = 1e-12);
        assert!(g1 > 0.0);

        let adjusted = skewness(&series, false);
        assert_relative_eq!(adjusted, g1 * 12.0_f64.sqrt() / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn skewness_constant_is_nan() {
        assert!(skewness(&[2.0; 10], true).is_nan());
        assert!(skewness(&[], true).is_nan());
    }

    // ==================== kurtosis ====================

    #[test]
    fn kurtosis_conventions() {
        // m2 = 2, m4 = 6.8 -> Pearson 1.7, Fisher -1.3
        let series = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(kurtosis(&series, false, true), 1.7, epsilon = 1e-12);
        assert_relative_eq!(kurtosis(&series, true, true), -1.3, epsilon = 1e-12);

        // G2 for n = 5: ((6 * 1.7 - 12) * 4) / (3 * 2) = -1.2
        assert_relative_eq!(kurtosis(&series, true, false), -1.2, epsilon = 1e-12);
        assert_relative_eq!(kurtosis(&series, false, false), 1.8, epsilon = 1e-12);
    }

    #[test]
    fn kurtosis_unbiased_needs_four_samples() {
        assert!(kurtosis(&[1.0, 2.0, 4.0], true, false).is_nan());
        assert!(kurtosis(&[1.0, 2.0, 4.0], true, true).is_finite());
    }

    #[test]
    fn kurtosis_constant_is_nan() {
        assert!(kurtosis(&[5.0; 8], true, true).is_nan());
    }

    // ==================== rolling ====================

    #[test]
    fn rolling_moments_align_with_input() {
        let series = make_series((0..30).map(|i| ((i * 5 + 1) % 7) as f64).collect());
        let skew = rolling_skew(&series, 10).unwrap();
        let kurt = rolling_kurtosis(&series, 10).unwrap();

        for out in [&skew, &kurt] {
            assert_eq!(out.len(), 30);
            assert_eq!(out.index(), series.index());
            assert!(out.values()[..9].iter().all(|v| v.is_nan()));
            assert!(out.values()[9..].iter().all(|v| v.is_finite()));
        }

        let last = &series.values()[20..30];
        assert_relative_eq!(skew.values()[29], skewness(last, true), epsilon = 1e-12);
        assert_relative_eq!(kurt.values()[29], kurtosis(last, true, true), epsilon = 1e-12);
    }
}
