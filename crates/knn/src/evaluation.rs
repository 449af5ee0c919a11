//! Accuracy of predictions against held-out ratings.
//!
//! Errors are taken over the positions stored in the test matrix that also
//! have a prediction; test positions without one are ignored.

use crate::engine::check_same_shape;
use crate::error::Result;
use rating_matrix::SparseRatingMatrix;

/// Root mean squared error, `None` when no test position was predicted
pub fn rmse(predicted: &SparseRatingMatrix, test: &SparseRatingMatrix) -> Result<Option<f64>> {
    let errors = paired_errors(predicted, test)?;
    if errors.is_empty() {
        return Ok(None);
    }
    let squared: f64 = errors.iter().map(|e| e * e).sum();
    Ok(Some((squared / errors.len() as f64).sqrt()))
}

/// Mean absolute error, `None` when no test position was predicted
pub fn mae(predicted: &SparseRatingMatrix, test: &SparseRatingMatrix) -> Result<Option<f64>> {
    let errors = paired_errors(predicted, test)?;
    if errors.is_empty() {
        return Ok(None);
    }
    let absolute: f64 = errors.iter().map(|e| e.abs()).sum();
    Ok(Some(absolute / errors.len() as f64))
}

fn paired_errors(predicted: &SparseRatingMatrix, test: &SparseRatingMatrix) -> Result<Vec<f64>> {
    check_same_shape("predicted vs. test", test, predicted)?;

    let mut errors = Vec::with_capacity(test.non_zeros_count());
    for (user, item, actual) in test.entries() {
        if let Some(estimate) = predicted.get(user, item)? {
            errors.push(estimate - actual);
        }
    }
    Ok(errors)
}
