//! User-based KNN rating prediction (Resnick et al., GroupLens, 1994).
//!
//! ## Algorithm
//! For every user `u` with at least one masked position:
//! 1. Rank the top-K neighbors of `u` by similarity
//! 2. For each masked item `i`, over the neighbors `n` that rated `i`:
//!    - `weighted_sum += sim(u, n) * (r[n, i] - mean(n))`
//!    - `weight_sum += sim(u, n)` (or `|sim(u, n)|`, see `Normalization`)
//! 3. Predict `mean(u) + weighted_sum / weight_sum`, or the global mean when
//!    `weighted_sum` is zero (a cold item, or neighbors rating at their means)
//! 4. Clamp into the rating range and store at `(u, i)`
//!
//! Users are independent of each other, so with `parallel` set they are
//! spread over the rayon pool. Each user yields its own writes and counters;
//! the counters are summed and the writes applied once the pool is done.

use crate::config::{KnnConfig, Normalization, RatingRange};
use crate::error::{KnnError, Result};
use crate::neighbors::{NeighborSet, top_k_neighbors};
use rating_matrix::{
    ItemIndex, Rating, RatingVector, Similarity, SparseRatingMatrix, UserIndex,
};
use rayon::prelude::*;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use tracing::{debug, info, instrument};

// =============================================================================
// Results
// =============================================================================

/// Diagnostic counters of one prediction run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PredictionStats {
    /// Positions written to the output
    pub predicted: usize,
    /// Predictions that had to be clamped into the rating range
    pub capped: usize,
    /// Predictions that fell back to the global mean
    pub defaulted: usize,
}

impl Add for PredictionStats {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            predicted: self.predicted + other.predicted,
            capped: self.capped + other.capped,
            defaulted: self.defaulted + other.defaulted,
        }
    }
}

impl AddAssign for PredictionStats {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sum for PredictionStats {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// Output of `UserKnn::predict`
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub ratings: SparseRatingMatrix,
    pub stats: PredictionStats,
}

/// Writes and counters produced for a single user
struct UserPredictions {
    user: UserIndex,
    ratings: Vec<(ItemIndex, Rating)>,
    stats: PredictionStats,
}

/// Read-only inputs shared by every user's computation
struct Inputs<'a, S: ?Sized> {
    train: &'a SparseRatingMatrix,
    similarity: &'a S,
    user_means: &'a [Option<f64>],
    global_mean: f64,
}

// =============================================================================
// UserKnn
// =============================================================================

/// User-based KNN predictor
#[derive(Debug, Clone, Default)]
pub struct UserKnn {
    config: KnnConfig,
}

impl UserKnn {
    /// Predictor with neighborhood size `k` and default settings otherwise
    pub fn new(k: usize) -> Self {
        Self {
            config: KnnConfig {
                k,
                ..KnnConfig::default()
            },
        }
    }

    pub fn from_config(config: KnnConfig) -> Self {
        Self { config }
    }

    /// Configure the output rating range (default: [1.0, 5.0])
    pub fn with_rating_range(mut self, range: RatingRange) -> Self {
        self.config.rating_range = range;
        self
    }

    /// Configure how similarity weights are normalized (default: signed)
    pub fn with_normalization(mut self, normalization: Normalization) -> Self {
        self.config.normalization = normalization;
        self
    }

    /// Enable or disable spreading users over the rayon pool (default: on)
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    pub fn config(&self) -> &KnnConfig {
        &self.config
    }

    /// Predicts every position stored in `mask` from `train`.
    ///
    /// All argument checks run before any prediction work, so an error
    /// never comes with a partially filled output.
    #[instrument(
        skip(self, train, mask, similarity),
        fields(k = self.config.k, users = train.user_count(), items = train.item_count())
    )]
    pub fn predict<S>(
        &self,
        train: &SparseRatingMatrix,
        mask: &SparseRatingMatrix,
        similarity: &S,
    ) -> Result<Prediction>
    where
        S: Similarity + ?Sized,
    {
        self.config.validate()?;
        check_same_shape("train vs. mask", train, mask)?;

        let users = train.user_count();
        if similarity.entity_count() != users {
            return Err(KnnError::DimensionMismatch {
                context: "similarity vs. users",
                expected: (users, users),
                found: (similarity.entity_count(), similarity.entity_count()),
            });
        }

        let mut ratings = SparseRatingMatrix::new(users, train.item_count());
        if mask.non_zeros_count() == 0 {
            debug!("Mask is empty, nothing to predict");
            return Ok(Prediction {
                ratings,
                stats: PredictionStats::default(),
            });
        }

        let global_mean = train.global_mean().ok_or_else(|| KnnError::UndefinedMean {
            scope: "training set".to_string(),
        })?;
        let user_means = train.user_means();
        let inputs = Inputs {
            train,
            similarity,
            user_means: &user_means,
            global_mean,
        };

        let targets: Vec<(UserIndex, RatingVector<'_>)> = mask.users().collect();
        debug!(
            "Predicting {} positions for {} users",
            mask.non_zeros_count(),
            targets.len()
        );

        let per_user: Vec<UserPredictions> = if self.config.parallel {
            targets
                .par_iter()
                .map(|&(user, items)| self.predict_user(&inputs, user, items))
                .collect::<Result<Vec<_>>>()?
        } else {
            targets
                .iter()
                .map(|&(user, items)| self.predict_user(&inputs, user, items))
                .collect::<Result<Vec<_>>>()?
        };

        let mut stats = PredictionStats::default();
        for user_predictions in per_user {
            for (item, value) in user_predictions.ratings {
                ratings.set(user_predictions.user, item, value)?;
            }
            stats += user_predictions.stats;
        }

        info!(
            predicted = stats.predicted,
            capped = stats.capped,
            defaulted = stats.defaulted,
            "User KNN prediction finished"
        );
        Ok(Prediction { ratings, stats })
    }

    /// Predictions for one user's masked items
    fn predict_user<S>(
        &self,
        inputs: &Inputs<'_, S>,
        user: UserIndex,
        items: RatingVector<'_>,
    ) -> Result<UserPredictions>
    where
        S: Similarity + ?Sized,
    {
        let neighbors = top_k_neighbors(inputs.similarity, user, self.config.k)?;
        let user_mean = inputs.user_means[user];

        let mut result = UserPredictions {
            user,
            ratings: Vec::with_capacity(items.len()),
            stats: PredictionStats::default(),
        };

        for item in items.indices() {
            // A user without training ratings has no mean to offset from
            let estimate = match user_mean {
                Some(mean) => self
                    .weighted_deviation(inputs, &neighbors, item)?
                    .map(|deviation| mean + deviation)
                    .filter(|value| value.is_finite()),
                None => None,
            };

            let raw = estimate.unwrap_or_else(|| {
                result.stats.defaulted += 1;
                inputs.global_mean
            });

            let (value, capped) = self.config.rating_range.clamp(raw);
            if capped {
                result.stats.capped += 1;
            }
            result.stats.predicted += 1;
            result.ratings.push((item, value));
        }

        debug!(
            user,
            neighbors = neighbors.len(),
            predicted = result.stats.predicted,
            defaulted = result.stats.defaulted,
            "Predicted user"
        );
        Ok(result)
    }

    /// Normalized, mean-centered neighbor deviation for `item`.
    ///
    /// `None` when the weighted deviation sums to zero (always the case when
    /// no neighbor rated the item), when the weights cancel out, or when the
    /// result is not finite.
    fn weighted_deviation<S>(
        &self,
        inputs: &Inputs<'_, S>,
        neighbors: &NeighborSet,
        item: ItemIndex,
    ) -> Result<Option<f64>>
    where
        S: Similarity + ?Sized,
    {
        let raters = inputs.train.column(item)?;

        let mut weighted_sum = 0.0;
        let mut weight_sum = 0.0;
        let mut contributors = 0usize;
        for neighbor in neighbors {
            let Some(rating) = raters.get(neighbor.index) else {
                continue;
            };
            let Some(neighbor_mean) = inputs.user_means[neighbor.index] else {
                continue;
            };
            weighted_sum += neighbor.similarity * (rating - neighbor_mean);
            weight_sum += self.config.normalization.weight(neighbor.similarity);
            contributors += 1;
        }

        if contributors == 0 || weighted_sum == 0.0 || weight_sum == 0.0 {
            return Ok(None);
        }
        let deviation = weighted_sum / weight_sum;
        Ok(deviation.is_finite().then_some(deviation))
    }
}

/// Predicts the positions of `mask` with `k` neighbors and default settings
pub fn predict_ratings<S>(
    train: &SparseRatingMatrix,
    mask: &SparseRatingMatrix,
    similarity: &S,
    k: usize,
) -> Result<Prediction>
where
    S: Similarity + ?Sized,
{
    UserKnn::new(k).predict(train, mask, similarity)
}

pub(crate) fn check_same_shape(
    context: &'static str,
    expected: &SparseRatingMatrix,
    found: &SparseRatingMatrix,
) -> Result<()> {
    if expected.shape() != found.shape() {
        return Err(KnnError::DimensionMismatch {
            context,
            expected: expected.shape(),
            found: found.shape(),
        });
    }
    Ok(())
}
