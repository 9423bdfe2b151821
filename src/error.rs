//! Error types for the regime-features library.

use thiserror::Error;

/// Result type alias for feature and clustering operations.
pub type Result<T> = std::result::Result<T, RegimeError>;

/// Errors that can occur while computing features or fitting regime models.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegimeError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Two inputs do not share the same time index, or an index is malformed.
    #[error("index mismatch: {0}")]
    IndexMismatch(String),

    /// A logarithm was requested of a value that is not strictly positive.
    #[error("non-positive value in {name} at position {position}: {value}")]
    NonPositiveValue {
        name: String,
        position: usize,
        value: f64,
    },

    /// Missing values detected when not allowed.
    #[error("missing values detected in data")]
    MissingValues,

    /// A column with this name already exists.
    #[error("duplicate column: {0}")]
    DuplicateColumn(String),

    /// No column with this name exists.
    #[error("column not found: {0}")]
    ColumnNotFound(String),

    /// A configuration value names an option that is not implemented.
    #[error("unsupported {option}: {value}")]
    UnsupportedOption { option: String, value: String },

    /// Computation error (e.g., numerical issues).
    #[error("computation error: {0}")]
    ComputationError(String),
}
