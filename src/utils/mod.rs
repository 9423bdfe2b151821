//! Numerical helpers shared by features and models.

pub mod linalg;
pub mod stats;

pub use linalg::{cholesky, symmetric_eigen};
pub use stats::{central_moment, mean, std_dev, variance};
