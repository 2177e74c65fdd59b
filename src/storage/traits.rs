//! Storage traits and error types
//!
//! This module defines the trait interfaces for sinks and storage backends
//! and associated error types.

use crate::storage::{RunOutcome, RunRecord, RunStatus, StoredRecord, UpsertStats};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Destination for collected records
///
/// The collector flushes into a sink at checkpoints and at run end.
pub trait RecordSink {
    /// Inserts every record whose key is absent
    ///
    /// Existing records are never overwritten, so calling this twice with
    /// the same records reports them as already present the second time.
    fn upsert_insert_only(&mut self, records: &[StoredRecord]) -> StorageResult<UpsertStats>;
}

impl<T: RecordSink + ?Sized> RecordSink for &mut T {
    fn upsert_insert_only(&mut self, records: &[StoredRecord]) -> StorageResult<UpsertStats> {
        (**self).upsert_insert_only(records)
    }
}

impl<T: RecordSink + ?Sized> RecordSink for Box<T> {
    fn upsert_insert_only(&mut self, records: &[StoredRecord]) -> StorageResult<UpsertStats> {
        (**self).upsert_insert_only(records)
    }
}

/// Trait for storage backend implementations
///
/// This trait defines the database operations needed by the harvest driver
/// on top of the record sink itself.
pub trait Storage: RecordSink {
    // ===== Run Management =====

    /// Creates a new collection run for a source
    ///
    /// # Arguments
    ///
    /// * `source` - Name of the source being collected
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, source: &str, config_hash: &str) -> StorageResult<i64>;

    /// Records the final status and outcome of a run
    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        outcome: &RunOutcome,
    ) -> StorageResult<()>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run of a source
    fn get_latest_run(&self, source: &str) -> StorageResult<Option<RunRecord>>;

    // ===== Records =====

    /// Loads all stored records of a source in insertion order
    fn load_records(&self, source: &str) -> StorageResult<Vec<StoredRecord>>;

    // ===== Statistics =====

    /// Gets total record count
    fn count_total_records(&self) -> StorageResult<u64>;

    /// Gets record counts per source, sorted by source name
    fn count_records_by_source(&self) -> StorageResult<Vec<(String, u64)>>;
}
