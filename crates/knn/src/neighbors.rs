//! Top-K neighbor selection.
//!
//! ## Ordering
//! Neighbors are ranked by descending similarity. Equal scores are ranked
//! by ascending entity index, so the set chosen at the K-th boundary is the
//! same on every run. Negative scores are ranked like any other; NaN scores
//! cannot be ranked and are skipped.

use crate::error::{KnnError, Result};
use rating_matrix::{Axis, MatrixError, Similarity};
use std::cmp::Ordering;

/// One ranked neighbor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub similarity: f64,
}

/// Neighbors of one target, best first, at most K long
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NeighborSet {
    neighbors: Vec<Neighbor>,
}

impl NeighborSet {
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Neighbor> {
        self.neighbors.iter()
    }

    /// Neighbor indices in rank order
    pub fn indices(&self) -> Vec<usize> {
        self.neighbors.iter().map(|n| n.index).collect()
    }

    /// Similarity of `index` if it made the set
    pub fn similarity_of(&self, index: usize) -> Option<f64> {
        self.neighbors
            .iter()
            .find(|n| n.index == index)
            .map(|n| n.similarity)
    }
}

impl<'a> IntoIterator for &'a NeighborSet {
    type Item = &'a Neighbor;
    type IntoIter = std::slice::Iter<'a, Neighbor>;

    fn into_iter(self) -> Self::IntoIter {
        self.neighbors.iter()
    }
}

/// Rank order: higher similarity first, then lower index
fn rank(a: &Neighbor, b: &Neighbor) -> Ordering {
    b.similarity
        .total_cmp(&a.similarity)
        .then_with(|| a.index.cmp(&b.index))
}

/// Returns the `k` entities most similar to `target`, excluding `target`.
///
/// When fewer than `k` candidates exist, all of them are returned.
pub fn top_k_neighbors<S>(similarity: &S, target: usize, k: usize) -> Result<NeighborSet>
where
    S: Similarity + ?Sized,
{
    let count = similarity.entity_count();
    if target >= count {
        return Err(KnnError::Matrix(MatrixError::IndexOutOfRange {
            axis: Axis::User,
            index: target,
            bound: count,
        }));
    }
    if k < 1 {
        return Err(KnnError::InvalidParameter {
            name: "k",
            reason: "neighborhood size must be at least 1".to_string(),
        });
    }

    let mut candidates: Vec<Neighbor> = (0..count)
        .filter(|&index| index != target)
        .map(|index| Neighbor {
            index,
            similarity: similarity.similarity(target, index),
        })
        .filter(|n| !n.similarity.is_nan())
        .collect();

    // Partition around the K-th element first, then order only the head
    if candidates.len() > k {
        candidates.select_nth_unstable_by(k - 1, rank);
        candidates.truncate(k);
    }
    candidates.sort_unstable_by(rank);

    Ok(NeighborSet {
        neighbors: candidates,
    })
}
