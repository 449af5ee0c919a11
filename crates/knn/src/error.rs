//! Error types for the KNN prediction engine.
//!
//! All of these are raised before any prediction work starts, so a failed
//! call never leaves a partially filled output behind.

use rating_matrix::MatrixError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum KnnError {
    /// Out-of-range access or another matrix contract violation
    #[error(transparent)]
    Matrix(#[from] MatrixError),

    /// Inputs that must line up don't (train vs. mask, similarity vs. users)
    #[error("dimension mismatch in {context}: expected {expected:?}, found {found:?}")]
    DimensionMismatch {
        context: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// A configuration value outside its valid domain
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A mean was needed over a scope with no stored ratings
    #[error("mean is undefined for {scope}: no stored ratings")]
    UndefinedMean { scope: String },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, KnnError>;
