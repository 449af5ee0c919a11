//! # Data Loader Crate
//!
//! Turns a delimited ratings file into the train/test rating matrices the
//! KNN engine works on, and moves matrices to and from text files.
//!
//! ## Main Components
//!
//! - **types**: `RatingRecord`, `IdIndex`, `SplitOptions`, `Dataset`
//! - **parser**: parse `user<d>item<d>rating[<d>timestamp]` lines
//! - **split**: assign dense indices and split ratings by count per user
//! - **matrix_io**: comma-delimited matrix read/write
//! - **error**: error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{Dataset, SplitOptions};
//! use std::path::Path;
//!
//! let dataset = Dataset::load(Path::new("data/ml-100k/u.data"), "\t", &SplitOptions::default())?;
//!
//! println!(
//!     "{} users, {} items, {} train / {} test ratings",
//!     dataset.users.len(),
//!     dataset.items.len(),
//!     dataset.train.non_zeros_count(),
//!     dataset.test.non_zeros_count(),
//! );
//! ```

pub mod error;
pub mod matrix_io;
pub mod parser;
pub mod split;
pub mod types;

pub use error::{DataLoadError, Result};
pub use matrix_io::{read_similarity_matrix, read_sparse_matrix, write_matrix};
pub use parser::parse_ratings;
pub use split::split_by_count;
pub use types::{Dataset, ExternalId, IdIndex, RatingRecord, SplitOptions};
