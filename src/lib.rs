//! # regime-features
//!
//! Rolling statistical features and unsupervised regime detection for
//! financial time series.
//!
//! Provides entropy measures (Shannon, permutation, sample entropy),
//! volatility estimators (realized, Parkinson, ATR), distribution moments
//! and rolling z-scores, plus k-means, Gaussian mixture and HDBSCAN
//! clustering of the resulting feature matrix and PCA reduction.

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]
#![allow(clippy::needless_range_loop)]

pub mod clustering;
pub mod core;
pub mod error;
pub mod features;
pub mod reduction;
pub mod transform;
pub mod utils;

pub use error::{RegimeError, Result};

pub mod prelude {
    pub use crate::clustering::{
        apply_gmm, apply_hdbscan, apply_kmeans, FittedRegimeModel, GmmConfig, HdbscanConfig,
        KMeansConfig,
    };
    pub use crate::core::{FeatureMatrix, MissingValuePolicy, RegimeLabels, Series};
    pub use crate::error::{RegimeError, Result};
    pub use crate::features::{
        average_true_range, parkinson_volatility, realized_volatility, rolling_kurtosis,
        rolling_permutation_entropy, rolling_sample_entropy, rolling_shannon_entropy,
        rolling_skew, z_score,
    };
    pub use crate::reduction::reduce_dimensionality;
}
