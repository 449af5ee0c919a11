//! Building train/test matrices from parsed ratings.
//!
//! Steps:
//! 1. Count ratings per user, in first-appearance order
//! 2. Drop users below `min_ratings`; the rest keep their relative order
//!    and get compact indices
//! 3. Index every item seen in the file, in first-appearance order
//! 4. Walk the records (file order, or a seeded shuffle) and send each
//!    user's first `train_ratings_per_user` ratings to train, the rest to
//!    test

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::{Dataset, IdIndex, RatingRecord, SplitOptions};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rating_matrix::SparseRatingMatrix;
use std::path::Path;
use tracing::{debug, info, instrument};

impl Dataset {
    /// Parse `path` and split it
    #[instrument(skip(path, options), fields(path = %path.display()))]
    pub fn load(path: &Path, delimiter: &str, options: &SplitOptions) -> Result<Self> {
        let records = parser::parse_ratings(path, delimiter)?;
        info!("Parsed {} ratings", records.len());
        split_by_count(&records, options)
    }
}

/// Split `records` into train and test matrices; see the module docs
pub fn split_by_count(records: &[RatingRecord], options: &SplitOptions) -> Result<Dataset> {
    if options.train_ratings_per_user == 0 {
        return Err(DataLoadError::InvalidValue {
            field: "train_ratings_per_user".to_string(),
            value: "0".to_string(),
        });
    }

    // 1. Ratings per user, indexed by first appearance
    let mut seen_users = IdIndex::new();
    let mut rating_counts: Vec<usize> = Vec::new();
    let mut items = IdIndex::new();
    for record in records {
        let index = seen_users.insert(record.user_id);
        if index == rating_counts.len() {
            rating_counts.push(0);
        }
        rating_counts[index] += 1;
        items.insert(record.item_id);
    }

    // 2. Keep users with enough ratings
    let mut users = IdIndex::new();
    for (index, &user_id) in seen_users.ids().iter().enumerate() {
        if rating_counts[index] >= options.min_ratings {
            users.insert(user_id);
        }
    }
    let removed_users = seen_users.len() - users.len();
    info!(
        "{} users have less than {} ratings and were removed",
        removed_users, options.min_ratings
    );

    // 3. Visit order
    let mut order: Vec<&RatingRecord> = records.iter().collect();
    if options.shuffle {
        let mut rng = StdRng::seed_from_u64(options.seed);
        order.shuffle(&mut rng);
    }

    // 4. Fill train first, then test
    let mut train = SparseRatingMatrix::new(users.len(), items.len());
    let mut test = SparseRatingMatrix::new(users.len(), items.len());
    let mut train_counts = vec![0usize; users.len()];
    for record in order {
        let Some(user) = users.get(record.user_id) else {
            continue;
        };
        let Some(item) = items.get(record.item_id) else {
            continue;
        };
        // A repeated (user, item) record replaces the earlier value in place
        if train.contains(user, item)? {
            train.set(user, item, record.rating)?;
        } else if train_counts[user] < options.train_ratings_per_user {
            train.set(user, item, record.rating)?;
            train_counts[user] += 1;
        } else {
            test.set(user, item, record.rating)?;
        }
    }

    debug!(
        "Split into {} train and {} test ratings ({} users, {} items)",
        train.non_zeros_count(),
        test.non_zeros_count(),
        users.len(),
        items.len()
    );

    Ok(Dataset {
        train,
        test,
        users,
        items,
        removed_users,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(user_id: u32, item_id: u32, rating: f64) -> RatingRecord {
        RatingRecord {
            user_id,
            item_id,
            rating,
        }
    }

    /// User 10 has 4 ratings, user 20 has 1, user 30 has 3
    fn records() -> Vec<RatingRecord> {
        vec![
            record(10, 100, 4.0),
            record(20, 200, 2.0),
            record(10, 101, 3.0),
            record(30, 100, 5.0),
            record(10, 102, 1.0),
            record(30, 103, 2.0),
            record(10, 103, 5.0),
            record(30, 101, 4.0),
        ]
    }

    #[test]
    fn test_split_by_count() {
        let options = SplitOptions {
            min_ratings: 2,
            train_ratings_per_user: 2,
            shuffle: false,
            seed: 1,
        };
        let dataset = split_by_count(&records(), &options).unwrap();

        // User 20 dropped, 10 and 30 compacted to 0 and 1
        assert_eq!(dataset.removed_users, 1);
        assert_eq!(dataset.users.ids(), &[10, 30]);
        // Items keep every id, including the one only user 20 rated
        assert_eq!(dataset.items.ids(), &[100, 200, 101, 102, 103]);

        assert_eq!(dataset.train.shape(), (2, 5));
        assert_eq!(dataset.train.row(0).unwrap().len(), 2);
        assert_eq!(dataset.train.row(1).unwrap().len(), 2);
        assert_eq!(dataset.test.non_zeros_count(), 3);

        // File order: user 10's first two ratings are items 100 and 101
        assert_eq!(dataset.train.get(0, 0).unwrap(), Some(4.0));
        assert_eq!(dataset.train.get(0, 2).unwrap(), Some(3.0));
        assert_eq!(dataset.test.get(0, 3).unwrap(), Some(1.0));
        assert_eq!(dataset.test.get(1, 2).unwrap(), Some(4.0));
    }

    #[test]
    fn test_shuffle_is_seeded() {
        let options = SplitOptions {
            min_ratings: 1,
            train_ratings_per_user: 1,
            shuffle: true,
            seed: 42,
        };
        let first = split_by_count(&records(), &options).unwrap();
        let second = split_by_count(&records(), &options).unwrap();

        assert_eq!(first.train, second.train);
        assert_eq!(first.test, second.test);
        // Every kept user has exactly one training rating
        for user in 0..first.users.len() {
            assert_eq!(first.train.row(user).unwrap().len(), 1);
        }
    }

    #[test]
    fn test_train_and_test_disjoint() {
        let dataset = split_by_count(&records(), &SplitOptions {
            min_ratings: 1,
            train_ratings_per_user: 1,
            ..SplitOptions::default()
        })
        .unwrap();

        for (user, item, _) in dataset.test.entries() {
            assert!(!dataset.train.contains(user, item).unwrap());
        }
        assert_eq!(
            dataset.train.non_zeros_count() + dataset.test.non_zeros_count(),
            records().len()
        );
    }

    #[test]
    fn test_repeated_record_keeps_train_quota() {
        let records = vec![
            record(10, 100, 4.0),
            record(10, 100, 5.0),
            record(10, 101, 3.0),
            record(10, 102, 1.0),
        ];
        let options = SplitOptions {
            min_ratings: 1,
            train_ratings_per_user: 2,
            ..SplitOptions::default()
        };
        let dataset = split_by_count(&records, &options).unwrap();

        assert_eq!(dataset.train.row(0).unwrap().len(), 2);
        assert_eq!(dataset.train.get(0, 0).unwrap(), Some(5.0));
        assert_eq!(dataset.train.get(0, 1).unwrap(), Some(3.0));
        assert_eq!(dataset.test.get(0, 2).unwrap(), Some(1.0));
        assert_eq!(dataset.test.non_zeros_count(), 1);
    }

    #[test]
    fn test_zero_train_count_rejected() {
        let options = SplitOptions {
            train_ratings_per_user: 0,
            ..SplitOptions::default()
        };
        assert!(matches!(
            split_by_count(&records(), &options),
            Err(DataLoadError::InvalidValue { .. })
        ));
    }
}
