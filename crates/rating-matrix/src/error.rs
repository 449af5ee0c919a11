//! Error types for the rating-matrix crate.
//!
//! Every variant here is a contract violation by the caller (an index past the
//! declared shape, two matrices that should line up but don't). None of them
//! is a data condition that a retry could fix.

use std::fmt;
use thiserror::Error;

/// Which axis of a matrix an index refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    User,
    Item,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::User => write!(f, "user"),
            Axis::Item => write!(f, "item"),
        }
    }
}

/// Errors raised by matrix construction and access
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatrixError {
    /// Index outside `[0, bound)` on the given axis
    #[error("{axis} index {index} out of range (bound {bound})")]
    IndexOutOfRange {
        axis: Axis,
        index: usize,
        bound: usize,
    },

    /// Two matrices that must share a shape don't
    ///
    /// Shapes are `(rows, columns)`.
    #[error("dimension mismatch: expected {expected:?}, found {found:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// A constructor argument was not usable (e.g. a ragged row)
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, MatrixError>;
