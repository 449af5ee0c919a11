//! The sparse user×item rating matrix and its read-only vector views.
//!
//! Storage is one ordered map per row and one per column, so both
//! `row(u)` and `column(i)` iterate stored entries only, in ascending
//! index order. Presence is explicit: a stored `0.0` is a rating like any
//! other and is never confused with an unset cell.
//!
//! Sums and counts per row, per column and overall are maintained on every
//! `set`, which makes all of the means O(1) reads.

use crate::error::{Axis, MatrixError, Result};
use std::collections::{BTreeMap, btree_map};

// =============================================================================
// Type Aliases
// =============================================================================

/// Dense row index, `[0, user_count)`
pub type UserIndex = usize;

/// Dense column index, `[0, item_count)`
pub type ItemIndex = usize;

/// A rating value
pub type Rating = f64;

// =============================================================================
// Running statistics
// =============================================================================

/// Sum and count of the stored entries in one scope (a row, a column, or
/// the whole matrix)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct RunningMean {
    sum: f64,
    count: usize,
}

impl RunningMean {
    /// Account for a write that replaced `previous` (if any) with `value`
    fn record(&mut self, previous: Option<Rating>, value: Rating) {
        match previous {
            Some(old) => self.sum += value - old,
            None => {
                self.sum += value;
                self.count += 1;
            }
        }
    }

    fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

// =============================================================================
// RatingVector
// =============================================================================

/// Borrowed view over the stored entries of one row or one column.
///
/// The view is read-only; the only way to change the underlying matrix is
/// `SparseRatingMatrix::set`, which keeps the counts and means consistent.
#[derive(Debug, Clone, Copy)]
pub struct RatingVector<'a> {
    entries: &'a BTreeMap<usize, Rating>,
}

impl<'a> RatingVector<'a> {
    fn new(entries: &'a BTreeMap<usize, Rating>) -> Self {
        Self { entries }
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stored value at `index`, `None` if unset
    pub fn get(&self, index: usize) -> Option<Rating> {
        self.entries.get(&index).copied()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.entries.contains_key(&index)
    }

    /// `(index, value)` pairs in ascending index order
    pub fn iter(&self) -> Iter<'a> {
        Iter {
            inner: self.entries.iter(),
        }
    }

    /// Indices of the stored entries in ascending order
    pub fn indices(&self) -> impl Iterator<Item = usize> + use<'a> {
        self.entries.keys().copied()
    }

    /// Mean of the stored values, `None` for an empty vector
    pub fn mean(&self) -> Option<f64> {
        if self.entries.is_empty() {
            return None;
        }
        let total: f64 = self.entries.values().sum();
        Some(total / self.entries.len() as f64)
    }
}

impl<'a> IntoIterator for RatingVector<'a> {
    type Item = (usize, Rating);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a `RatingVector`
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    inner: btree_map::Iter<'a, usize, Rating>,
}

impl Iterator for Iter<'_> {
    type Item = (usize, Rating);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(&index, &value)| (index, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Iter<'_> {}

// =============================================================================
// SparseRatingMatrix
// =============================================================================

/// User×item ratings with explicit presence per cell.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseRatingMatrix {
    user_count: usize,
    item_count: usize,
    rows: Vec<BTreeMap<ItemIndex, Rating>>,
    columns: Vec<BTreeMap<UserIndex, Rating>>,
    user_stats: Vec<RunningMean>,
    item_stats: Vec<RunningMean>,
    global_stats: RunningMean,
}

impl SparseRatingMatrix {
    /// Creates an empty matrix with a fixed shape
    pub fn new(user_count: usize, item_count: usize) -> Self {
        Self {
            user_count,
            item_count,
            rows: vec![BTreeMap::new(); user_count],
            columns: vec![BTreeMap::new(); item_count],
            user_stats: vec![RunningMean::default(); user_count],
            item_stats: vec![RunningMean::default(); item_count],
            global_stats: RunningMean::default(),
        }
    }

    /// Builds a matrix from `(user, item, rating)` triples.
    ///
    /// Later triples overwrite earlier ones at the same position.
    pub fn from_entries<I>(user_count: usize, item_count: usize, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (UserIndex, ItemIndex, Rating)>,
    {
        let mut matrix = Self::new(user_count, item_count);
        for (user, item, rating) in entries {
            matrix.set(user, item, rating)?;
        }
        Ok(matrix)
    }

    pub fn user_count(&self) -> usize {
        self.user_count
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }

    /// `(user_count, item_count)`
    pub fn shape(&self) -> (usize, usize) {
        (self.user_count, self.item_count)
    }

    /// Number of explicitly stored entries, zeros included
    pub fn non_zeros_count(&self) -> usize {
        self.global_stats.count
    }

    /// Stored value at `(user, item)`, `Ok(None)` when unset
    pub fn get(&self, user: UserIndex, item: ItemIndex) -> Result<Option<Rating>> {
        self.check_user(user)?;
        self.check_item(item)?;
        Ok(self.rows[user].get(&item).copied())
    }

    pub fn contains(&self, user: UserIndex, item: ItemIndex) -> Result<bool> {
        Ok(self.get(user, item)?.is_some())
    }

    /// Stores `value` at `(user, item)`, replacing any previous value.
    ///
    /// Ratings must be finite; NaN or infinite values are rejected so that
    /// every mean stays finite.
    pub fn set(&mut self, user: UserIndex, item: ItemIndex, value: Rating) -> Result<()> {
        self.check_user(user)?;
        self.check_item(item)?;
        if !value.is_finite() {
            return Err(MatrixError::InvalidParameter(format!(
                "rating at ({}, {}) is not finite: {}",
                user, item, value
            )));
        }

        let previous = self.rows[user].insert(item, value);
        self.columns[item].insert(user, value);

        self.user_stats[user].record(previous, value);
        self.item_stats[item].record(previous, value);
        self.global_stats.record(previous, value);
        Ok(())
    }

    /// Mean of all stored entries, `None` for an empty matrix
    pub fn global_mean(&self) -> Option<f64> {
        self.global_stats.mean()
    }

    /// Mean of the stored entries in row `user`, `None` if the row is empty
    pub fn user_mean(&self, user: UserIndex) -> Result<Option<f64>> {
        self.check_user(user)?;
        Ok(self.user_stats[user].mean())
    }

    /// Mean of the stored entries in column `item`, `None` if the column is empty
    pub fn item_mean(&self, item: ItemIndex) -> Result<Option<f64>> {
        self.check_item(item)?;
        Ok(self.item_stats[item].mean())
    }

    /// Per-user means, indexed by user
    pub fn user_means(&self) -> Vec<Option<f64>> {
        self.user_stats.iter().map(RunningMean::mean).collect()
    }

    /// Per-item means, indexed by item
    pub fn item_means(&self) -> Vec<Option<f64>> {
        self.item_stats.iter().map(RunningMean::mean).collect()
    }

    /// Stored entries of one user, keyed by item
    pub fn row(&self, user: UserIndex) -> Result<RatingVector<'_>> {
        self.check_user(user)?;
        Ok(RatingVector::new(&self.rows[user]))
    }

    /// Stored entries of one item, keyed by user
    pub fn column(&self, item: ItemIndex) -> Result<RatingVector<'_>> {
        self.check_item(item)?;
        Ok(RatingVector::new(&self.columns[item]))
    }

    /// Users with at least one stored entry, in ascending order
    pub fn users(&self) -> impl Iterator<Item = (UserIndex, RatingVector<'_>)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| !row.is_empty())
            .map(|(user, row)| (user, RatingVector::new(row)))
    }

    /// Every stored `(user, item, rating)` in row-major order
    pub fn entries(&self) -> impl Iterator<Item = (UserIndex, ItemIndex, Rating)> + '_ {
        self.rows.iter().enumerate().flat_map(|(user, row)| {
            row.iter().map(move |(&item, &rating)| (user, item, rating))
        })
    }

    /// Fails with `DimensionMismatch` unless `other` has the same shape
    pub fn ensure_same_shape(&self, other: &SparseRatingMatrix) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(MatrixError::DimensionMismatch {
                expected: self.shape(),
                found: other.shape(),
            });
        }
        Ok(())
    }

    fn check_user(&self, user: UserIndex) -> Result<()> {
        if user >= self.user_count {
            return Err(MatrixError::IndexOutOfRange {
                axis: Axis::User,
                index: user,
                bound: self.user_count,
            });
        }
        Ok(())
    }

    fn check_item(&self, item: ItemIndex) -> Result<()> {
        if item >= self.item_count {
            return Err(MatrixError::IndexOutOfRange {
                axis: Axis::Item,
                index: item,
                bound: self.item_count,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SparseRatingMatrix {
        // 3 users x 2 items, user 2 only rated item 0
        SparseRatingMatrix::from_entries(
            3,
            2,
            [(0, 0, 4.0), (0, 1, 2.0), (1, 0, 3.0), (1, 1, 5.0), (2, 0, 1.0)],
        )
        .unwrap()
    }

    #[test]
    fn test_get_and_set() {
        let mut matrix = SparseRatingMatrix::new(2, 3);
        assert_eq!(matrix.get(1, 2).unwrap(), None);

        matrix.set(1, 2, 4.5).unwrap();
        assert_eq!(matrix.get(1, 2).unwrap(), Some(4.5));
        assert!(matrix.contains(1, 2).unwrap());
        assert!(!matrix.contains(0, 0).unwrap());
    }

    #[test]
    fn test_explicit_zero_is_stored() {
        let mut matrix = SparseRatingMatrix::new(1, 2);
        matrix.set(0, 1, 0.0).unwrap();

        assert_eq!(matrix.get(0, 1).unwrap(), Some(0.0));
        assert_eq!(matrix.get(0, 0).unwrap(), None);
        assert_eq!(matrix.non_zeros_count(), 1);
        assert_eq!(matrix.row(0).unwrap().len(), 1);
    }

    #[test]
    fn test_non_finite_rating_rejected() {
        let mut matrix = SparseRatingMatrix::new(1, 2);
        matrix.set(0, 0, 3.0).unwrap();

        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let result = matrix.set(0, 1, value);
            assert!(matches!(result, Err(MatrixError::InvalidParameter(_))));
        }
        assert_eq!(matrix.get(0, 1).unwrap(), None);
        assert_eq!(matrix.global_mean(), Some(3.0));
    }

    #[test]
    fn test_overwrite_counts_once() {
        let mut matrix = SparseRatingMatrix::new(1, 1);
        matrix.set(0, 0, 2.0).unwrap();
        matrix.set(0, 0, 4.0).unwrap();

        assert_eq!(matrix.non_zeros_count(), 1);
        assert_eq!(matrix.user_mean(0).unwrap(), Some(4.0));
        assert_eq!(matrix.item_mean(0).unwrap(), Some(4.0));
        assert_eq!(matrix.global_mean(), Some(4.0));
    }

    #[test]
    fn test_out_of_range() {
        let mut matrix = SparseRatingMatrix::new(2, 2);

        let err = matrix.get(2, 0).unwrap_err();
        assert_eq!(
            err,
            MatrixError::IndexOutOfRange {
                axis: Axis::User,
                index: 2,
                bound: 2
            }
        );
        assert!(matches!(
            matrix.set(0, 5, 1.0),
            Err(MatrixError::IndexOutOfRange { axis: Axis::Item, .. })
        ));
        assert!(matrix.row(3).is_err());
        assert!(matrix.column(3).is_err());
        assert!(matrix.user_mean(9).is_err());
        // Nothing was stored by the failed write
        assert_eq!(matrix.non_zeros_count(), 0);
    }

    #[test]
    fn test_means() {
        let matrix = sample();

        assert_eq!(matrix.global_mean(), Some(3.0));
        assert_eq!(matrix.user_mean(0).unwrap(), Some(3.0));
        assert_eq!(matrix.user_mean(1).unwrap(), Some(4.0));
        assert_eq!(matrix.user_mean(2).unwrap(), Some(1.0));
        assert_eq!(matrix.item_mean(0).unwrap(), Some(8.0 / 3.0));
        assert_eq!(matrix.item_mean(1).unwrap(), Some(3.5));
        assert_eq!(matrix.user_means(), vec![Some(3.0), Some(4.0), Some(1.0)]);
    }

    #[test]
    fn test_empty_scopes_have_no_mean() {
        let matrix = SparseRatingMatrix::new(2, 2);

        assert_eq!(matrix.global_mean(), None);
        assert_eq!(matrix.user_mean(0).unwrap(), None);
        assert_eq!(matrix.item_mean(1).unwrap(), None);
        assert!(matrix.row(0).unwrap().mean().is_none());
    }

    #[test]
    fn test_row_and_column_views() {
        let matrix = sample();

        let row: Vec<_> = matrix.row(0).unwrap().iter().collect();
        assert_eq!(row, vec![(0, 4.0), (1, 2.0)]);

        let column: Vec<_> = matrix.column(0).unwrap().into_iter().collect();
        assert_eq!(column, vec![(0, 4.0), (1, 3.0), (2, 1.0)]);

        let column = matrix.column(1).unwrap();
        assert_eq!(column.indices().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(column.get(2), None);
        assert_eq!(column.mean(), Some(3.5));
    }

    #[test]
    fn test_users_skips_empty_rows() {
        let matrix = SparseRatingMatrix::from_entries(4, 2, [(3, 1, 1.0), (1, 0, 2.0)]).unwrap();

        let users: Vec<UserIndex> = matrix.users().map(|(user, _)| user).collect();
        assert_eq!(users, vec![1, 3]);
    }

    #[test]
    fn test_entries_row_major() {
        let matrix =
            SparseRatingMatrix::from_entries(2, 2, [(1, 0, 2.0), (0, 1, 3.0), (0, 0, 1.0)])
                .unwrap();

        let entries: Vec<_> = matrix.entries().collect();
        assert_eq!(entries, vec![(0, 0, 1.0), (0, 1, 3.0), (1, 0, 2.0)]);
    }

    #[test]
    fn test_ensure_same_shape() {
        let a = SparseRatingMatrix::new(3, 4);
        let b = SparseRatingMatrix::new(3, 5);

        assert!(a.ensure_same_shape(&SparseRatingMatrix::new(3, 4)).is_ok());
        assert_eq!(
            a.ensure_same_shape(&b),
            Err(MatrixError::DimensionMismatch {
                expected: (3, 4),
                found: (3, 5)
            })
        );
    }
}
