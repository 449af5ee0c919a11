//! Error types for the data-loader crate.
//!
//! Parse errors carry the file and line they came from so a bad row in a
//! large ratings file can be found directly.

use rating_matrix::MatrixError;
use thiserror::Error;

/// Errors that can occur while loading, splitting, reading or writing data
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// I/O error occurred while reading or writing a file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A line in a data file couldn't be parsed
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// A parameter or data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// A row of a delimited matrix file is shorter or longer than the first
    #[error("Expected {expected} fields but found {found} in line {line}")]
    FieldCountMismatch {
        expected: usize,
        found: usize,
        line: usize,
    },

    /// The data did not fit the matrix it was loaded into
    #[error("Matrix error: {0}")]
    MatrixError(#[from] MatrixError),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
