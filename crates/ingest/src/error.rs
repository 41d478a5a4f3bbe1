//! Ingestion error types

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised at the ingestion boundary
///
/// Bad cells and missing option tables never raise; they are counted in a
/// [`crate::TableReport`]. Only conditions that leave no snapshot to compute
/// are errors.
#[derive(Error, Debug)]
pub enum IngestError {
    /// CSV could not be read or parsed
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// CSV read from a non-file reader failed
    #[error("CSV error: {0}")]
    Reader(#[from] csv::Error),

    /// The underlying close for the requested date is unavailable
    #[error("No spot quote for {symbol} on {date}")]
    MissingSpot { symbol: String, date: NaiveDate },

    /// The underlying history file is absent
    #[error("Underlying history not found: {0}")]
    MissingHistory(PathBuf),
}
