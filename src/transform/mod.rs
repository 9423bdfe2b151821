//! Data transformations: rolling windows and feature scaling.
//!
//! # Example
//!
//! ```
//! use regime_features::transform::{rolling_mean, StandardScaler};
//!
//! let series = vec![1.0, 2.0, 3.0, 4.0, 5.0];
//! let rm = rolling_mean(&series, 3);
//! assert!(rm[1].is_nan());
//!
//! let rows = vec![vec![1.0, 10.0], vec![3.0, 30.0]];
//! let (_scaler, scaled) = StandardScaler::fit_transform(&rows).unwrap();
//! assert_eq!(scaled[0], vec![-1.0, -1.0]);
//! ```

pub mod scale;
pub mod window;

pub use scale::StandardScaler;

pub use window::{
    rolling, rolling_apply, rolling_mean, rolling_std, rolling_var, shift, validate_window,
    window_mean, window_std, window_variance,
};
