use crate::record::{Record, RecordIdentity};
use std::collections::HashSet;

/// Transient state of one collection run
///
/// Records are kept in the order they were first admitted. Identity
/// admission is strictly sequential, so the same source ordering always
/// yields the same result.
#[derive(Debug, Default)]
pub struct CollectionState {
    collected: Vec<Record>,
    seen: HashSet<RecordIdentity>,
    stagnation_counter: u32,
    last_count: usize,
    batches: u32,
    flushed: usize,
}

impl CollectionState {
    /// Creates an empty state at run start
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records collected so far
    pub fn len(&self) -> usize {
        self.collected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collected.is_empty()
    }

    /// The collected records in admission order
    pub fn records(&self) -> &[Record] {
        &self.collected
    }

    /// Admits a record under the given identity
    ///
    /// Returns false, leaving the state untouched, if the identity was
    /// already admitted.
    pub fn admit(&mut self, identity: RecordIdentity, record: Record) -> bool {
        if !self.seen.insert(identity) {
            return false;
        }
        self.collected.push(record);
        true
    }

    /// Closes the current batch and updates the stagnation counter
    ///
    /// Returns true if the batch admitted at least one new record.
    pub fn finish_batch(&mut self) -> bool {
        self.batches += 1;

        if self.collected.len() == self.last_count {
            self.stagnation_counter += 1;
            false
        } else {
            self.stagnation_counter = 0;
            self.last_count = self.collected.len();
            true
        }
    }

    /// Consecutive batches without a newly admitted record
    pub fn stagnation_counter(&self) -> u32 {
        self.stagnation_counter
    }

    /// Number of batches finished so far
    pub fn batches(&self) -> u32 {
        self.batches
    }

    /// Records admitted since the last successful flush
    pub fn pending(&self) -> &[Record] {
        &self.collected[self.flushed..]
    }

    /// Marks every record collected so far as flushed
    pub fn mark_flushed(&mut self) {
        self.flushed = self.collected.len();
    }

    /// Consumes the state and returns the collected records
    pub fn into_records(self) -> Vec<Record> {
        self.collected
    }
}
