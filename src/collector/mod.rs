//! Paginated collection of reviews
//!
//! This module contains the collection loop and the source adapters it
//! drives:
//! - `ReviewSource`: the capability interface every adapter implements
//! - `PaginatedCollector`: extract, deduplicate, detect stalls, advance, stop
//! - `BackoffSchedule`: delays between advance attempts
//! - `HttpPagedSource`: a configuration-driven page-number adapter

mod backoff;
mod fetcher;
mod http_source;
mod paginated;
mod parser;
mod source;

pub use backoff::BackoffSchedule;
pub use fetcher::{build_http_client, fetch_page, FetchedPage};
pub use http_source::HttpPagedSource;
pub use paginated::PaginatedCollector;
pub use parser::{has_next_page, parse_candidates, HttpCandidate, PageSelectors};
pub use source::ReviewSource;

use crate::record::Record;
use crate::state::StopReason;
use crate::storage::{StorageError, UpsertStats};
use crate::SourceError;
use std::time::Duration;
use thiserror::Error;

/// Tuning knobs of the collection loop that are not per-call limits
#[derive(Debug, Clone)]
pub struct CollectorOptions {
    /// Flush pending records every this many batches; 0 flushes only at the end
    pub checkpoint_every: u32,

    /// Delays between failed advance attempts
    pub backoff: BackoffSchedule,

    /// How long to wait for the visible candidates to change after a trigger
    pub settle_timeout: Duration,

    /// How often to re-scan while waiting
    pub poll_interval: Duration,

    /// Run one bounded expansion pass when the target was not reached
    pub expand_pass: bool,

    /// Click budget of the expansion pass
    pub expand_max_clicks: usize,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            checkpoint_every: 3,
            backoff: BackoffSchedule::default(),
            settle_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(250),
            expand_pass: false,
            expand_max_clicks: 80,
        }
    }
}

/// Outcome of one collection run
#[derive(Debug, Clone)]
pub struct CollectionResult {
    /// Unique records in the order first observed
    pub records: Vec<Record>,

    pub reached_target: bool,

    pub stopped_reason: StopReason,

    /// Batches scanned, not counting the expansion pass
    pub batches: u32,

    /// What the sink reported across all flushes of this run
    pub persisted: UpsertStats,
}

/// Errors that end a collection run without a regular result
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to open source '{name}': {source}")]
    SourceInit { name: String, source: SourceError },

    /// A non-transient source error; `partial` holds what was collected
    #[error("Collection from '{name}' aborted: {source}")]
    Aborted {
        name: String,
        source: SourceError,
        partial: Box<CollectionResult>,
    },

    /// The final flush failed after a regular stop
    #[error("Failed to persist records from '{name}': {source}")]
    Persist {
        name: String,
        source: StorageError,
        partial: Box<CollectionResult>,
    },
}

impl CollectError {
    /// Records collected before the run failed, if it got that far
    pub fn partial(&self) -> Option<&CollectionResult> {
        match self {
            Self::Aborted { partial, .. } | Self::Persist { partial, .. } => Some(partial),
            Self::InvalidArgument(_) | Self::SourceInit { .. } => None,
        }
    }
}
