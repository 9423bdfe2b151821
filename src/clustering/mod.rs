//! Unsupervised regime clustering.
//!
//! Provides seeded k-means, Gaussian mixtures fitted by EM and HDBSCAN, plus
//! the `apply_*` entry points that standardize a [`FeatureMatrix`] before
//! clustering it.
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//! use regime_features::clustering::apply_kmeans;
//! use regime_features::core::FeatureMatrix;
//!
//! let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let index: Vec<_> = (0..6).map(|i| base + Duration::days(i)).collect();
//! let rows = vec![
//!     vec![1.0, 2.0],
//!     vec![1.1, 2.1],
//!     vec![0.9, 1.9],
//!     vec![10.0, 11.0],
//!     vec![10.1, 11.1],
//!     vec![9.9, 10.9],
//! ];
//! let features = FeatureMatrix::from_rows(index, vec!["a".into(), "b".into()], &rows).unwrap();
//!
//! let (labels, _model) = apply_kmeans(&features, 2).unwrap();
//! assert_eq!(labels.name(), "regime_kmeans");
//! assert_eq!(labels.n_clusters(), 2);
//! assert_eq!(labels.labels()[0], labels.labels()[2]);
//! assert_ne!(labels.labels()[0], labels.labels()[3]);
//! ```
//!
//! [`FeatureMatrix`]: crate::core::FeatureMatrix

pub mod distance;
pub mod gmm;
pub mod hdbscan;
pub mod kmeans;
pub mod regime;

pub use distance::{euclidean_distance, pairwise_distances, squared_euclidean};
pub use gmm::{GaussianMixture, GmmConfig};
pub use hdbscan::{Hdbscan, HdbscanConfig};
pub use kmeans::{elbow_inertias, KMeans, KMeansConfig};
pub use regime::{
    apply_gmm, apply_gmm_with, apply_hdbscan, apply_hdbscan_with, apply_kmeans,
    apply_kmeans_with, FittedRegimeModel, RegimePredictor, GMM_LABEL, HDBSCAN_LABEL,
    KMEANS_LABEL,
};
