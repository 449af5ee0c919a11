//! Pairwise similarity between entities (users, or items).
//!
//! The prediction engine only ever asks "how similar are `a` and `b`", so
//! that question is a trait. `SimilarityMatrix` is the dense, precomputed
//! implementation used by the CLI and the tests; any other metric can be
//! plugged in without touching the engine.

use crate::error::{Axis, MatrixError, Result};

/// Read-only source of pairwise similarity scores.
///
/// `Sync` is required so neighbor lookups for different targets can run on
/// separate threads against the same source.
pub trait Similarity: Sync {
    /// Number of entities; valid indices are `[0, entity_count)`
    fn entity_count(&self) -> usize;

    /// Score between `a` and `b`. Both indices must be in range.
    fn similarity(&self, a: usize, b: usize) -> f64;
}

/// Dense `n×n` similarity table stored row-major.
///
/// Symmetry is assumed by callers but not enforced; see `is_symmetric`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    size: usize,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    /// All-zero matrix of `size × size`
    pub fn new(size: usize) -> Self {
        Self {
            size,
            values: vec![0.0; size * size],
        }
    }

    /// Builds a matrix from rows; every row must have `rows.len()` entries
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let size = rows.len();
        let mut values = Vec::with_capacity(size * size);
        for (index, row) in rows.into_iter().enumerate() {
            if row.len() != size {
                return Err(MatrixError::InvalidParameter(format!(
                    "similarity row {} has {} entries, expected {}",
                    index,
                    row.len(),
                    size
                )));
            }
            values.extend(row);
        }
        Ok(Self { size, values })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, a: usize, b: usize) -> Result<f64> {
        self.check(a)?;
        self.check(b)?;
        Ok(self.values[a * self.size + b])
    }

    pub fn set(&mut self, a: usize, b: usize, value: f64) -> Result<()> {
        self.check(a)?;
        self.check(b)?;
        self.values[a * self.size + b] = value;
        Ok(())
    }

    /// Sets both `(a, b)` and `(b, a)`
    pub fn set_symmetric(&mut self, a: usize, b: usize, value: f64) -> Result<()> {
        self.set(a, b, value)?;
        self.set(b, a, value)
    }

    /// All scores of entity `a`, indexed by the other entity
    pub fn row(&self, a: usize) -> Result<&[f64]> {
        self.check(a)?;
        let start = a * self.size;
        Ok(&self.values[start..start + self.size])
    }

    /// True when every `(a, b)` is within `tolerance` of `(b, a)`
    pub fn is_symmetric(&self, tolerance: f64) -> bool {
        (0..self.size).all(|a| {
            (a + 1..self.size).all(|b| {
                let forward = self.values[a * self.size + b];
                let backward = self.values[b * self.size + a];
                (forward - backward).abs() <= tolerance
            })
        })
    }

    fn check(&self, index: usize) -> Result<()> {
        if index >= self.size {
            return Err(MatrixError::IndexOutOfRange {
                axis: Axis::User,
                index,
                bound: self.size,
            });
        }
        Ok(())
    }
}

impl Similarity for SimilarityMatrix {
    fn entity_count(&self) -> usize {
        self.size
    }

    fn similarity(&self, a: usize, b: usize) -> f64 {
        self.values[a * self.size + b]
    }
}
