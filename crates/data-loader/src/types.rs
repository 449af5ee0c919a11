//! Core types for loading and splitting rating data.
//!
//! - `RatingRecord`: one parsed line of a ratings file, still keyed by the
//!   ids used in the file
//! - `IdIndex`: maps those ids to dense matrix indices
//! - `SplitOptions` / `Dataset`: how a file is split and what comes out

use rating_matrix::SparseRatingMatrix;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Type Aliases
// =============================================================================

/// An id as it appears in the ratings file (user or item)
pub type ExternalId = u32;

// =============================================================================
// RatingRecord
// =============================================================================

/// One `user, item, rating` line of a ratings file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub user_id: ExternalId,
    pub item_id: ExternalId,
    pub rating: f64,
}

// =============================================================================
// IdIndex
// =============================================================================

/// Assigns dense indices `0, 1, 2, ...` to external ids in the order they
/// are first inserted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdIndex {
    index_of: HashMap<ExternalId, usize>,
    ids: Vec<ExternalId>,
}

impl IdIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `id`, assigning the next free index if it is new
    pub fn insert(&mut self, id: ExternalId) -> usize {
        if let Some(&index) = self.index_of.get(&id) {
            return index;
        }
        let index = self.ids.len();
        self.index_of.insert(id, index);
        self.ids.push(id);
        index
    }

    pub fn get(&self, id: ExternalId) -> Option<usize> {
        self.index_of.get(&id).copied()
    }

    /// External id behind a dense index
    pub fn id_of(&self, index: usize) -> Option<ExternalId> {
        self.ids.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// External ids in index order
    pub fn ids(&self) -> &[ExternalId] {
        &self.ids
    }
}

// =============================================================================
// Splitting
// =============================================================================

/// How a ratings file is turned into train and test matrices
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitOptions {
    /// Users with fewer ratings than this are dropped entirely
    pub min_ratings: usize,
    /// Ratings per user that go to the training set; the rest are test
    pub train_ratings_per_user: usize,
    /// Visit the records in a seeded random order instead of file order
    pub shuffle: bool,
    pub seed: u64,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            min_ratings: 20,
            train_ratings_per_user: 10,
            shuffle: false,
            seed: 1,
        }
    }
}

/// Train and test matrices over the same user/item indices
#[derive(Debug, Clone)]
pub struct Dataset {
    pub train: SparseRatingMatrix,
    pub test: SparseRatingMatrix,
    pub users: IdIndex,
    pub items: IdIndex,
    /// Users dropped for having fewer than `min_ratings` ratings
    pub removed_users: usize,
}
