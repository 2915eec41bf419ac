// Dataset loading from CSV files.
//
// Training data needs `review_text` and `sentiment` columns; batch input only
// needs `review_text`. Columns are found by header name, so their position and
// any additional columns do not matter.

pub mod models;

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use tracing::{info, warn};

use crate::error::AnalysisError;
use models::{LabeledReview, Review};

pub const TEXT_COLUMN: &str = "review_text";
pub const LABEL_COLUMN: &str = "sentiment";

/// Load a labeled training dataset from a CSV file.
pub fn load_labeled<P: AsRef<Path>>(path: P) -> Result<Vec<LabeledReview>> {
    let file = File::open(&path)
        .with_context(|| format!("Failed to open training data: {}", path.as_ref().display()))?;
    read_labeled(file)
}

/// Load reviews for batch analysis from a CSV file.
pub fn load_reviews<P: AsRef<Path>>(path: P) -> Result<Vec<Review>> {
    let file = File::open(&path)
        .with_context(|| format!("Failed to open reviews file: {}", path.as_ref().display()))?;
    read_reviews(file)
}

/// Read labeled reviews from any CSV source.
///
/// Rows with a blank text or label are skipped (and counted in the log); a
/// missing column is a data error naming the column.
pub fn read_labeled<R: Read>(reader: R) -> Result<Vec<LabeledReview>> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader.headers().context("Failed to read CSV header")?.clone();

    let text_idx = column_index(&headers, TEXT_COLUMN)
        .ok_or_else(|| AnalysisError::Data(format!("missing column `{TEXT_COLUMN}`")))?;
    let label_idx = column_index(&headers, LABEL_COLUMN)
        .ok_or_else(|| AnalysisError::Data(format!("missing column `{LABEL_COLUMN}`")))?;

    let mut reviews = Vec::new();
    let mut skipped = 0usize;
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to parse CSV row {}", row + 1))?;
        let text = record.get(text_idx).unwrap_or("").trim();
        let label = record.get(label_idx).unwrap_or("").trim();
        if text.is_empty() || label.is_empty() {
            skipped += 1;
            continue;
        }
        reviews.push(LabeledReview::new(text, label));
    }

    if skipped > 0 {
        warn!(skipped, "Skipped training rows with blank text or label");
    }
    info!(rows = reviews.len(), "Loaded labeled reviews");
    Ok(reviews)
}

/// Read reviews from any CSV source. Blank texts are kept; the batch pipeline
/// decides what to do with them.
pub fn read_reviews<R: Read>(reader: R) -> Result<Vec<Review>> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader.headers().context("Failed to read CSV header")?.clone();

    let text_idx = column_index(&headers, TEXT_COLUMN).ok_or_else(|| {
        AnalysisError::Input(format!("CSV must contain a `{TEXT_COLUMN}` column"))
    })?;

    let mut reviews = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to parse CSV row {}", row + 1))?;
        let extra = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != text_idx)
            .map(|(i, name)| (name.to_string(), record.get(i).unwrap_or("").to_string()))
            .collect();
        reviews.push(Review {
            id: row,
            text: record.get(text_idx).unwrap_or("").to_string(),
            extra,
        });
    }

    info!(rows = reviews.len(), "Loaded reviews");
    Ok(reviews)
}

fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}
