//! Trailing rolling-window functions.
//!
//! Every rolling output has the length of its input. Positions before the
//! window fills are `NaN`, and so is every window containing a `NaN`.

use crate::core::Series;
use crate::error::{RegimeError, Result};
use crate::utils::stats;

/// Check rolling preconditions: non-empty input and `1 <= window <= len`.
pub fn validate_window(len: usize, window: usize) -> Result<()> {
    if len == 0 {
        return Err(RegimeError::EmptyData);
    }
    if window == 0 {
        return Err(RegimeError::InvalidParameter(
            "window must be positive".to_string(),
        ));
    }
    if window > len {
        return Err(RegimeError::InsufficientData {
            needed: window,
            got: len,
        });
    }
    Ok(())
}

/// Generic trailing rolling window application.
///
/// `f` is called once per full window that contains no `NaN`.
pub fn rolling_apply<F>(series: &[f64], window: usize, mut f: F) -> Vec<f64>
where
    F: FnMut(usize, &[f64]) -> f64,
{
    let n = series.len();
    let mut result = vec![f64::NAN; n];
    if window == 0 {
        return result;
    }

    for end in window..=n {
        let segment = &series[end - window..end];
        if segment.iter().any(|x| x.is_nan()) {
            continue;
        }
        result[end - 1] = f(end - 1, segment);
    }

    result
}

/// Apply a window kernel to a series, keeping its index and naming the output.
pub fn rolling<F>(series: &Series, window: usize, name: &str, mut f: F) -> Result<Series>
where
    F: FnMut(&[f64]) -> f64,
{
    validate_window(series.len(), window)?;
    let values = rolling_apply(series.values(), window, |_, w| f(w));
    Ok(series.derive(values, name))
}

/// Compute rolling mean (moving average).
///
/// A window of identical values returns that value exactly.
pub fn rolling_mean(series: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(series, window, |_, s| window_mean(s))
}

/// Compute rolling sample variance (n-1 denominator).
///
/// A window of identical values has variance exactly 0.
pub fn rolling_var(series: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(series, window, |_, s| window_variance(s))
}

/// Mean of one window; exact for a flat window.
pub fn window_mean(window: &[f64]) -> f64 {
    match constant_value(window) {
        Some(value) => value,
        None => stats::mean(window),
    }
}

/// Sample variance of one window; exactly 0 for a flat window of two or
/// more values.
pub fn window_variance(window: &[f64]) -> f64 {
    if window.len() > 1 && constant_value(window).is_some() {
        0.0
    } else {
        stats::variance(window)
    }
}

/// Sample standard deviation of one window; exactly 0 for a flat window.
pub fn window_std(window: &[f64]) -> f64 {
    window_variance(window).sqrt()
}

/// The shared value of a window whose entries are all equal.
fn constant_value(window: &[f64]) -> Option<f64> {
    let first = *window.first()?;
    window.iter().all(|&x| x == first).then_some(first)
}

/// Compute rolling sample standard deviation.
pub fn rolling_std(series: &[f64], window: usize) -> Vec<f64> {
    rolling_var(series, window)
        .iter()
        .map(|v| v.sqrt())
        .collect()
}

/// Shift values forward by `periods` positions, filling the head with `NaN`.
pub fn shift(series: &[f64], periods: usize) -> Vec<f64> {
    let n = series.len();
    let mut result = vec![f64::NAN; n];
    if periods < n {
        result[periods..].copy_from_slice(&series[..n - periods]);
    }
    result
}
