//! Storage module for persisting collected reviews
//!
//! This module handles everything written by a collection run:
//! - The insert-only `RecordSink` interface the collector flushes into
//! - SQLite database initialization and schema management
//! - Run history tracking
//! - In-memory and fan-out sinks

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::{MemorySink, TeeSink};
pub use sqlite::{init_database, SqliteStorage};
pub use traits::{RecordSink, Storage, StorageError, StorageResult};

use crate::record::Record;
use crate::state::StopReason;
use crate::HarvestError;

use std::ops::AddAssign;
use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(HarvestError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, HarvestError> {
    SqliteStorage::new(path)
}

/// A record as handed to a sink, keyed by its content signature
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    /// Content signature; the document key
    pub key: String,
    pub source: String,
    pub rating: String,
    /// `YYYY-MM-DD`, or empty when the date is absent
    pub date: String,
    pub content: String,
}

impl StoredRecord {
    /// Builds the persisted form of a record collected from `source`
    pub fn from_record(source: &str, record: &Record) -> Self {
        Self {
            key: record.signature(source),
            source: source.to_string(),
            rating: record.rating.to_string(),
            date: record.date_string(),
            content: record.content.clone(),
        }
    }
}

/// Outcome of an insert-only upsert
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertStats {
    /// Records that were not present and have been written
    pub inserted: usize,

    /// Records whose key already existed; left untouched
    pub already_present: usize,
}

impl UpsertStats {
    pub fn total(&self) -> usize {
        self.inserted + self.already_present
    }
}

impl AddAssign for UpsertStats {
    fn add_assign(&mut self, other: Self) {
        self.inserted += other.inserted;
        self.already_present += other.already_present;
    }
}

/// Represents a collection run in the database
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub source: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub stop_reason: Option<StopReason>,
    pub collected: u64,
    pub inserted: u64,
    pub batches: u32,
}

/// What a finished run reports back to the run history
#[derive(Debug, Clone, Copy)]
pub struct RunOutcome {
    pub stop_reason: StopReason,
    pub collected: usize,
    pub inserted: usize,
    pub batches: u32,
}

/// Status of a collection run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
