//! # Rating Matrix Crate
//!
//! Sparse user×item rating storage and the similarity abstraction that the
//! KNN engine reads from.
//!
//! ## Main Components
//!
//! - **types**: `SparseRatingMatrix` and its read-only `RatingVector` views
//! - **similarity**: the `Similarity` trait and the dense `SimilarityMatrix`
//! - **error**: error types for matrix access
//!
//! ## Example Usage
//!
//! ```ignore
//! use rating_matrix::SparseRatingMatrix;
//!
//! let mut ratings = SparseRatingMatrix::new(3, 2);
//! ratings.set(0, 1, 4.0)?;
//!
//! assert_eq!(ratings.get(0, 1)?, Some(4.0));
//! assert_eq!(ratings.get(0, 0)?, None);
//! assert_eq!(ratings.user_mean(0)?, Some(4.0));
//! ```

pub mod error;
pub mod similarity;
pub mod types;

pub use error::{Axis, MatrixError, Result};
pub use similarity::{Similarity, SimilarityMatrix};
pub use types::{ItemIndex, Rating, RatingVector, SparseRatingMatrix, UserIndex};
