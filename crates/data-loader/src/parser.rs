//! Parser for delimited ratings files.
//!
//! Each non-empty line is `userId<d>itemId<d>rating[<d>timestamp]`, where
//! `<d>` is the delimiter (`\t` for MovieLens 100K `u.data`, `::` for the
//! 1M `ratings.dat`). Anything after the rating is ignored.

use crate::error::{DataLoadError, Result};
use crate::types::RatingRecord;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Reads a file as ISO-8859-1 (Latin-1), which is what MovieLens ships.
///
/// Every byte maps directly to the Unicode code point of the same value, so
/// this never fails on non-UTF-8 input.
pub(crate) fn read_lines_latin1(path: &Path) -> Result<Vec<String>> {
    let mut file = File::open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    let content: String = bytes.iter().map(|&b| b as char).collect();
    Ok(content.lines().map(|s| s.to_string()).collect())
}

/// Parse a ratings file
pub fn parse_ratings(path: &Path, delimiter: &str) -> Result<Vec<RatingRecord>> {
    let lines = read_lines_latin1(path)?;
    let file = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    parse_rating_lines(&lines, &file, delimiter)
}

/// Parse already-read lines; `file` only labels errors
pub fn parse_rating_lines<S: AsRef<str>>(
    lines: &[S],
    file: &str,
    delimiter: &str,
) -> Result<Vec<RatingRecord>> {
    if delimiter.is_empty() {
        return Err(DataLoadError::InvalidValue {
            field: "delimiter".to_string(),
            value: String::new(),
        });
    }

    let mut records = Vec::with_capacity(lines.len());
    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;
        let line_trimmed = line.as_ref().trim();
        if line_trimmed.is_empty() {
            continue;
        }

        let mut parts = line_trimmed.split(delimiter);
        let user_id = next_field(&mut parts, file, line_no, "userId")?;
        let item_id = next_field(&mut parts, file, line_no, "itemId")?;
        let rating = next_field(&mut parts, file, line_no, "rating")?;

        records.push(RatingRecord {
            user_id: parse_field(user_id, file, line_no, "userId")?,
            item_id: parse_field(item_id, file, line_no, "itemId")?,
            rating: parse_field(rating, file, line_no, "rating")?,
        });
    }
    Ok(records)
}

fn next_field<'a>(
    parts: &mut impl Iterator<Item = &'a str>,
    file: &str,
    line: usize,
    name: &str,
) -> Result<&'a str> {
    parts.next().ok_or_else(|| DataLoadError::ParseError {
        file: file.to_string(),
        line,
        reason: format!("Missing {}", name),
    })
}

fn parse_field<T>(value: &str, file: &str, line: usize, name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| DataLoadError::ParseError {
        file: file.to_string(),
        line,
        reason: format!("Invalid {}: {}", name, e),
    })
}
