//! Engine configuration.
//!
//! Everything here derives `Serialize`/`Deserialize` with field defaults so
//! a partial JSON document (for example `{"k": 20}`) is a valid config.

use crate::error::{KnnError, Result};
use rating_matrix::Rating;
use serde::{Deserialize, Serialize};

/// Closed interval that every prediction is clamped into
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingRange {
    pub min: Rating,
    pub max: Rating,
}

impl RatingRange {
    pub fn new(min: Rating, max: Rating) -> Result<Self> {
        let range = Self { min, max };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.min <= self.max) {
            return Err(KnnError::InvalidParameter {
                name: "rating_range",
                reason: format!("min {} must not exceed max {}", self.min, self.max),
            });
        }
        Ok(())
    }

    /// Clamps `value` into the range; the flag is true when it moved
    pub fn clamp(&self, value: Rating) -> (Rating, bool) {
        if value > self.max {
            (self.max, true)
        } else if value < self.min {
            (self.min, true)
        } else {
            (value, false)
        }
    }

    pub fn contains(&self, value: Rating) -> bool {
        value >= self.min && value <= self.max
    }
}

/// MovieLens scale
impl Default for RatingRange {
    fn default() -> Self {
        Self { min: 1.0, max: 5.0 }
    }
}

/// How the similarity weights are summed into the normalizing denominator.
///
/// `Signed` divides by `Σ sim`. With negative similarities that sum can be
/// small or flip sign, which amplifies the correction instead of damping it.
/// `Absolute` divides by `Σ |sim|`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Normalization {
    #[default]
    Signed,
    Absolute,
}

impl Normalization {
    pub(crate) fn weight(&self, similarity: f64) -> f64 {
        match self {
            Normalization::Signed => similarity,
            Normalization::Absolute => similarity.abs(),
        }
    }
}

/// Parameters of one prediction run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnnConfig {
    /// Neighborhood size, at least 1
    pub k: usize,
    pub rating_range: RatingRange,
    pub normalization: Normalization,
    /// Spread users over the rayon pool
    pub parallel: bool,
}

impl KnnConfig {
    pub fn validate(&self) -> Result<()> {
        if self.k < 1 {
            return Err(KnnError::InvalidParameter {
                name: "k",
                reason: "neighborhood size must be at least 1".to_string(),
            });
        }
        self.rating_range.validate()
    }
}

impl Default for KnnConfig {
    fn default() -> Self {
        Self {
            k: 50,
            rating_range: RatingRange::default(),
            normalization: Normalization::default(),
            parallel: true,
        }
    }
}
