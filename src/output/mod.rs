//! Output module for CSV artifacts, run reports and statistics
//!
//! This module handles:
//! - Writing collected reviews as spreadsheet-friendly CSV
//! - Generating markdown reports of a harvest invocation
//! - Printing statistics from the review database

mod csv_file;
mod markdown;
pub mod stats;

pub use csv_file::{csv_path, write_records_csv, CsvSink, CSV_HEADER};
pub use markdown::{format_markdown_report, write_markdown_report, HarvestReport, SourceReport};
pub use stats::{load_statistics, print_statistics, HarvestStatistics};

use crate::storage::StorageError;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
