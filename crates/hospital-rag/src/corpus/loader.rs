//! Delimited corpus file loading

use csv::StringRecord;
use std::path::Path;

use crate::error::{Error, Result};

/// Accepted header names for the question column.
const QUESTION_HEADERS: &[&str] = &["질문", "question"];
/// Accepted header names for the answer column.
const ANSWER_HEADERS: &[&str] = &["답변", "answer"];

/// One raw question/answer candidate row, before cleaning.
///
/// Empty cells are read back as `None` so diagnostics can distinguish a
/// missing cell from one that cleans down to nothing.
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    pub question: Option<String>,
    pub answer: Option<String>,
}

/// Raw rows as read from one corpus file, in source order.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub rows: Vec<RawRecord>,
}

/// Load the train and validation corpora.
///
/// Either file being missing, unreadable, or lacking the expected columns
/// fails with `Error::DataLoad`; the caller decides whether that is fatal.
pub fn load(train_path: &Path, validation_path: &Path) -> Result<(RawTable, RawTable)> {
    let train = load_table(train_path)?;
    let validation = load_table(validation_path)?;
    tracing::info!(
        "loaded corpus: {} train rows, {} validation rows",
        train.rows.len(),
        validation.rows.len()
    );
    Ok((train, validation))
}

/// Load a single delimited corpus file.
pub fn load_table(path: &Path) -> Result<RawTable> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| Error::DataLoad(format!("{}: {}", path.display(), e)))?;

    let headers = reader
        .headers()
        .map_err(|e| Error::DataLoad(format!("{}: {}", path.display(), e)))?
        .clone();

    let question_column = find_column(&headers, QUESTION_HEADERS).ok_or_else(|| {
        Error::DataLoad(format!("{}: no question column in header", path.display()))
    })?;
    let answer_column = find_column(&headers, ANSWER_HEADERS).ok_or_else(|| {
        Error::DataLoad(format!("{}: no answer column in header", path.display()))
    })?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| Error::DataLoad(format!("{}: {}", path.display(), e)))?;
        rows.push(RawRecord {
            question: cell(&record, question_column),
            answer: cell(&record, answer_column),
        });
    }

    Ok(RawTable { rows })
}

fn find_column(headers: &StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|header| names.iter().any(|name| header.trim() == *name))
}

fn cell(record: &StringRecord, column: usize) -> Option<String> {
    match record.get(column).map(str::trim) {
        Some("") | None => None,
        Some(value) => Some(value.to_string()),
    }
}
