//! Core data structures: series, feature matrices and regime labels.

mod feature_matrix;
mod labels;
mod series;

pub use feature_matrix::{FeatureMatrix, MissingValuePolicy};
pub use labels::{RegimeLabels, NOISE_LABEL};
pub use series::Series;
