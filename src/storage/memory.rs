//! In-process sinks
//!
//! `MemorySink` keeps everything in memory, which is enough for embedding
//! the collector or for tests. `TeeSink` fans one flush out to two sinks.

use crate::storage::traits::{RecordSink, StorageResult};
use crate::storage::{StoredRecord, UpsertStats};
use std::collections::HashSet;
use tracing::warn;

/// Insert-only sink backed by a vector
#[derive(Debug, Default)]
pub struct MemorySink {
    keys: HashSet<String>,
    records: Vec<StoredRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records stored so far, in insertion order
    pub fn records(&self) -> &[StoredRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }
}

impl RecordSink for MemorySink {
    fn upsert_insert_only(&mut self, records: &[StoredRecord]) -> StorageResult<UpsertStats> {
        let mut stats = UpsertStats::default();

        for record in records {
            if self.keys.insert(record.key.clone()) {
                self.records.push(record.clone());
                stats.inserted += 1;
            } else {
                stats.already_present += 1;
            }
        }

        Ok(stats)
    }
}

/// Forwards every flush to a primary and a mirror sink
///
/// The primary decides the outcome: its stats are returned and its errors
/// propagate. A failing mirror is logged and skipped.
pub struct TeeSink<A, B> {
    primary: A,
    mirror: B,
}

impl<A: RecordSink, B: RecordSink> TeeSink<A, B> {
    pub fn new(primary: A, mirror: B) -> Self {
        Self { primary, mirror }
    }

    pub fn primary(&self) -> &A {
        &self.primary
    }

    pub fn mirror(&self) -> &B {
        &self.mirror
    }
}

impl<A: RecordSink, B: RecordSink> RecordSink for TeeSink<A, B> {
    fn upsert_insert_only(&mut self, records: &[StoredRecord]) -> StorageResult<UpsertStats> {
        let stats = self.primary.upsert_insert_only(records)?;

        if let Err(e) = self.mirror.upsert_insert_only(records) {
            warn!("Mirror sink rejected {} records: {}", records.len(), e);
        }

        Ok(stats)
    }
}
