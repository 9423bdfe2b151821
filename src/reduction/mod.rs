//! Linear dimensionality reduction of feature matrices.
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//! use regime_features::core::FeatureMatrix;
//! use regime_features::reduction::reduce_dimensionality;
//!
//! let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let index: Vec<_> = (0..5).map(|i| base + Duration::days(i)).collect();
//! let rows: Vec<Vec<f64>> = (0..5)
//!     .map(|i| vec![i as f64, (i * i) as f64, (i % 2) as f64])
//!     .collect();
//! let names = vec!["a".to_string(), "b".to_string(), "c".to_string()];
//! let features = FeatureMatrix::from_rows(index, names, &rows).unwrap();
//!
//! let reduced = reduce_dimensionality(&features, "pca", 2).unwrap();
//! assert_eq!(reduced.column_names(), &["PC1".to_string(), "PC2".to_string()]);
//! assert!(reduce_dimensionality(&features, "umap", 2).is_err());
//! ```

pub mod pca;

pub use pca::{reduce_dimensionality, Pca, ReductionMethod};
