//! Integration tests for the KNN engine.
//!
//! These run the predictor over a seeded random dataset and check the
//! properties that must hold for any input, not just hand-picked ones.

use knn::{KnnError, Normalization, RatingRange, UserKnn, mae, rmse, top_k_neighbors};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rating_matrix::{SimilarityMatrix, SparseRatingMatrix};

const USERS: usize = 40;
const ITEMS: usize = 60;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("knn=debug")
        .with_test_writer()
        .try_init();
}

/// Random train/test split with about a third of the cells rated, plus a
/// random symmetric similarity matrix with both signs present
fn create_test_setup(seed: u64) -> (SparseRatingMatrix, SparseRatingMatrix, SimilarityMatrix) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = SparseRatingMatrix::new(USERS, ITEMS);
    let mut test = SparseRatingMatrix::new(USERS, ITEMS);

    for user in 0..USERS {
        for item in 0..ITEMS {
            if rng.random_bool(0.35) {
                let rating = rng.random_range(1..=5) as f64;
                if rng.random_bool(0.8) {
                    train.set(user, item, rating).unwrap();
                } else {
                    test.set(user, item, rating).unwrap();
                }
            }
        }
    }

    let mut similarity = SimilarityMatrix::new(USERS);
    for a in 0..USERS {
        similarity.set(a, a, 1.0).unwrap();
        for b in a + 1..USERS {
            let score = rng.random_range(-1.0..1.0);
            similarity.set_symmetric(a, b, score).unwrap();
        }
    }

    (train, test, similarity)
}

#[test]
fn test_predictions_within_range() {
    init_tracing();
    let (train, test, similarity) = create_test_setup(7);
    let range = RatingRange::default();

    for normalization in [Normalization::Signed, Normalization::Absolute] {
        let prediction = UserKnn::new(10)
            .with_normalization(normalization)
            .predict(&train, &test, &similarity)
            .unwrap();

        for (_, _, value) in prediction.ratings.entries() {
            assert!(range.contains(value), "prediction {} out of range", value);
        }
        assert_eq!(prediction.stats.predicted, test.non_zeros_count());
    }
}

#[test]
fn test_only_test_positions_predicted() {
    let (train, test, similarity) = create_test_setup(11);

    let prediction = UserKnn::new(5).predict(&train, &test, &similarity).unwrap();

    let predicted: Vec<_> = prediction.ratings.entries().map(|(u, i, _)| (u, i)).collect();
    let expected: Vec<_> = test.entries().map(|(u, i, _)| (u, i)).collect();
    assert_eq!(predicted, expected);
}

#[test]
fn test_deterministic_across_runs_and_modes() {
    let (train, test, similarity) = create_test_setup(3);

    let first = UserKnn::new(8).predict(&train, &test, &similarity).unwrap();
    let second = UserKnn::new(8).predict(&train, &test, &similarity).unwrap();
    let sequential = UserKnn::new(8)
        .with_parallel(false)
        .predict(&train, &test, &similarity)
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(first, sequential);
}

#[test]
fn test_k_at_least_all_other_users() {
    let (train, test, similarity) = create_test_setup(5);

    let neighbors = top_k_neighbors(&similarity, 0, USERS + 10).unwrap();
    assert_eq!(neighbors.len(), USERS - 1);

    let all = UserKnn::new(USERS - 1).predict(&train, &test, &similarity).unwrap();
    let more = UserKnn::new(USERS * 2).predict(&train, &test, &similarity).unwrap();
    assert_eq!(all, more);
}

#[test]
fn test_cold_items_fall_back_to_global_mean() {
    let (mut train, _, similarity) = create_test_setup(13);
    let cold_item = ITEMS;
    // Rebuild with one extra, never-rated column
    let mut widened = SparseRatingMatrix::new(USERS, ITEMS + 1);
    for (user, item, rating) in train.entries() {
        widened.set(user, item, rating).unwrap();
    }
    train = widened;

    let mut mask = SparseRatingMatrix::new(USERS, ITEMS + 1);
    for user in 0..4 {
        mask.set(user, cold_item, 0.0).unwrap();
    }

    let prediction = UserKnn::new(10).predict(&train, &mask, &similarity).unwrap();

    let global_mean = train.global_mean().unwrap();
    for user in 0..4 {
        assert_eq!(prediction.ratings.get(user, cold_item).unwrap(), Some(global_mean));
    }
    assert_eq!(prediction.stats.defaulted, 4);
}

#[test]
fn test_dimension_mismatch_writes_nothing() {
    let (train, _, similarity) = create_test_setup(17);
    let mask = SparseRatingMatrix::from_entries(USERS + 1, ITEMS, [(0, 0, 1.0)]).unwrap();

    let result = UserKnn::new(4).predict(&train, &mask, &similarity);
    assert!(matches!(result, Err(KnnError::DimensionMismatch { .. })));
}

#[test]
fn test_evaluation_on_predictions() {
    let (train, test, similarity) = create_test_setup(23);

    let prediction = UserKnn::new(10).predict(&train, &test, &similarity).unwrap();

    let rmse = rmse(&prediction.ratings, &test).unwrap().unwrap();
    let mae = mae(&prediction.ratings, &test).unwrap().unwrap();
    // Ratings live in [1, 5], so no error can exceed 4
    assert!(mae <= rmse + 1e-12);
    assert!(rmse <= 4.0);
}
