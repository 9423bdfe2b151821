//! Rolling time series features for regime detection.
//!
//! Every rolling feature returns a [`Series`](crate::core::Series) on the
//! input's index whose first `window - 1` values are `NaN`.
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//! use regime_features::core::{FeatureMatrix, Series};
//! use regime_features::features::{rolling_permutation_entropy, z_score};
//!
//! let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let index: Vec<_> = (0..40).map(|i| base + Duration::days(i)).collect();
//! let values: Vec<f64> = (0..40).map(|i| (i as f64 * 0.7).sin()).collect();
//! let series = Series::new(index, values).unwrap();
//!
//! let pe = rolling_permutation_entropy(&series, 21, 3).unwrap();
//! let z = z_score(&series, 21).unwrap();
//! let features = FeatureMatrix::from_series(&[pe, z]).unwrap().drop_missing();
//! assert_eq!(features.nrows(), 20);
//! ```

pub mod distribution;
pub mod entropy;
pub mod volatility;

pub use distribution::{kurtosis, rolling_kurtosis, rolling_skew, skewness};

pub use entropy::{
    permutation_entropy, rolling_permutation_entropy, rolling_permutation_entropy_with,
    rolling_sample_entropy, rolling_sample_entropy_with, rolling_shannon_entropy,
    rolling_shannon_entropy_with, sample_entropy, shannon_entropy, HistogramNormalization,
    PermutationEntropyConfig, SampleEntropyConfig, ShannonEntropyConfig,
};

pub use volatility::{
    average_true_range, parkinson_volatility, realized_volatility, true_range, z_score,
};
