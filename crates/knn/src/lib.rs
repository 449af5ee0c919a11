//! # KNN Crate
//!
//! User-based k-nearest-neighbor rating prediction on top of
//! `rating-matrix`.
//!
//! ## Components
//!
//! - **neighbors**: top-K neighbor selection with deterministic tie-breaking
//! - **engine**: `UserKnn`, the mean-centered weighted-average predictor
//! - **config**: neighborhood size, rating range, normalization mode
//! - **evaluation**: RMSE / MAE against held-out ratings
//!
//! ## Example Usage
//!
//! ```ignore
//! use knn::{UserKnn, Normalization};
//!
//! let knn = UserKnn::new(50).with_normalization(Normalization::Signed);
//! let prediction = knn.predict(&train, &test, &similarity)?;
//!
//! println!("capped: {}", prediction.stats.capped);
//! println!("defaulted: {}", prediction.stats.defaulted);
//! println!("rmse: {:?}", knn::rmse(&prediction.ratings, &test)?);
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod neighbors;

pub use config::{KnnConfig, Normalization, RatingRange};
pub use engine::{Prediction, PredictionStats, UserKnn, predict_ratings};
pub use error::{KnnError, Result};
pub use evaluation::{mae, rmse};
pub use neighbors::{Neighbor, NeighborSet, top_k_neighbors};
