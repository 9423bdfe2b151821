//! Volatility estimators and rolling standardization.

use crate::core::Series;
use crate::error::{RegimeError, Result};
use crate::transform::window::{
    rolling, rolling_mean, rolling_std, shift, validate_window, window_std,
};
use crate::utils::stats;

/// Rolling sample standard deviation of returns; a flat window gives 0.
pub fn realized_volatility(returns: &Series, window: usize) -> Result<Series> {
    rolling(returns, window, "realized_volatility", window_std)
}

/// Parkinson range-based volatility.
///
/// `sqrt(1 / (4 ln 2) * mean(ln(high / low)^2))` over each window.
///
/// # Errors
/// Fails when the inputs are misaligned, when a finite price is not
/// strictly positive, or when `high < low` at any position.
pub fn parkinson_volatility(high: &Series, low: &Series, window: usize) -> Result<Series> {
    high.ensure_aligned(low)?;
    validate_window(high.len(), window)?;
    ensure_positive(high, "high")?;
    ensure_positive(low, "low")?;

    for (position, (&h, &l)) in high.values().iter().zip(low.values()).enumerate() {
        if h < l {
            return Err(RegimeError::InvalidParameter(format!(
                "high below low at position {}: {} < {}",
                position, h, l
            )));
        }
    }

    let factor = 1.0 / (4.0 * std::f64::consts::LN_2);
    let log_range_sq = high.zip_with(low, "log_range_sq", |h, l| (h / l).ln().powi(2))?;
    rolling(&log_range_sq, window, "parkinson_volatility", |w| {
        (factor * stats::mean(w)).sqrt()
    })
}

/// Average true range.
///
/// True range is `max(high - low, |high - prev_close|, |low - prev_close|)`.
/// The first row has no previous close, so its true range is `NaN` and the
/// first defined output appears at position `window`.
pub fn average_true_range(
    high: &Series,
    low: &Series,
    close: &Series,
    window: usize,
) -> Result<Series> {
    high.ensure_aligned(low)?;
    high.ensure_aligned(close)?;
    validate_window(high.len(), window)?;

    let true_range = true_range(high.values(), low.values(), close.values());
    let atr = rolling_mean(&true_range, window);
    Ok(high.derive(atr, "average_true_range"))
}

/// True range per row; `NaN` wherever any component is `NaN`.
pub fn true_range(high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    let prev_close = shift(close, 1);
    high.iter()
        .zip(low.iter())
        .zip(prev_close.iter())
        .map(|((&h, &l), &pc)| {
            let components = [h - l, (h - pc).abs(), (l - pc).abs()];
            if components.iter().any(|c| c.is_nan()) {
                f64::NAN
            } else {
                components.iter().copied().fold(f64::NEG_INFINITY, f64::max)
            }
        })
        .collect()
}

/// Rolling z-score: `(x - rolling_mean) / rolling_std`.
///
/// A flat window has zero deviation and yields `NaN`.
pub fn z_score(series: &Series, window: usize) -> Result<Series> {
    validate_window(series.len(), window)?;

    let mean = rolling_mean(series.values(), window);
    let std = rolling_std(series.values(), window);
    let values = series
        .values()
        .iter()
        .zip(mean.iter().zip(std.iter()))
        .map(|(&x, (&m, &s))| (x - m) / s)
        .collect();

    Ok(series.derive(values, "z_score"))
}

/// Reject finite values that are not strictly positive.
fn ensure_positive(series: &Series, name: &str) -> Result<()> {
    match series
        .values()
        .iter()
        .enumerate()
        .find(|(_, &v)| v.is_finite() && v <= 0.0)
    {
        Some((position, &value)) => Err(RegimeError::NonPositiveValue {
            name: name.to_string(),
            position,
            value,
        }),
        None => Ok(()),
    }
}
