//! Comma-delimited text I/O for matrices.
//!
//! Files are dense: one line per row, one value per column. When reading a
//! rating matrix, zeros are treated as unset; a similarity matrix keeps
//! every value.

use crate::error::{DataLoadError, Result};
use crate::parser::read_lines_latin1;
use rating_matrix::{SimilarityMatrix, SparseRatingMatrix};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

const DELIMITER: char = ',';

/// Write `matrix` as dense comma-delimited text; unset cells become `0`
pub fn write_matrix(matrix: &SparseRatingMatrix, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for user in 0..matrix.user_count() {
        let row = matrix.row(user)?;
        let line = (0..matrix.item_count())
            .map(|item| row.get(item).unwrap_or(0.0).to_string())
            .collect::<Vec<_>>()
            .join(&DELIMITER.to_string());
        writeln!(writer, "{}", line)?;
    }
    writer.flush()?;
    debug!("Wrote {}x{} matrix to {}", matrix.user_count(), matrix.item_count(), path.display());
    Ok(())
}

/// Read a rating matrix; zero entries are not stored
pub fn read_sparse_matrix(path: &Path) -> Result<SparseRatingMatrix> {
    let rows = parse_dense_rows(&read_lines_latin1(path)?, &path.display().to_string())?;
    let item_count = rows.first().map_or(0, Vec::len);

    let mut matrix = SparseRatingMatrix::new(rows.len(), item_count);
    for (user, row) in rows.iter().enumerate() {
        for (item, &value) in row.iter().enumerate() {
            if value != 0.0 {
                matrix.set(user, item, value)?;
            }
        }
    }
    Ok(matrix)
}

/// Read a square similarity matrix
pub fn read_similarity_matrix(path: &Path) -> Result<SimilarityMatrix> {
    let rows = parse_dense_rows(&read_lines_latin1(path)?, &path.display().to_string())?;
    Ok(SimilarityMatrix::from_rows(rows)?)
}

/// Parse comma-delimited numeric rows; every row must match the first's width
pub fn parse_dense_rows<S: AsRef<str>>(lines: &[S], file: &str) -> Result<Vec<Vec<f64>>> {
    let mut rows: Vec<Vec<f64>> = Vec::with_capacity(lines.len());
    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;
        let line_trimmed = line.as_ref().trim();
        if line_trimmed.is_empty() {
            continue;
        }

        let row = line_trimmed
            .split(DELIMITER)
            .map(|field| {
                field.trim().parse::<f64>().map_err(|e| DataLoadError::ParseError {
                    file: file.to_string(),
                    line: line_no,
                    reason: format!("Invalid value '{}': {}", field, e),
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        if let Some(first) = rows.first() {
            if first.len() != row.len() {
                return Err(DataLoadError::FieldCountMismatch {
                    expected: first.len(),
                    found: row.len(),
                    line: line_no,
                });
            }
        }
        rows.push(row);
    }
    Ok(rows)
}
