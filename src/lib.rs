//! Review-Harvest: paginated review collection with idempotent persistence
//!
//! This crate collects review records from paginated or incrementally loaded
//! sources, deduplicates them by identity, detects stalled progress, and
//! persists them insert-only into SQLite and CSV artifacts.

pub mod collector;
pub mod config;
pub mod harvest;
pub mod output;
pub mod record;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Review-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL template in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector for {field}: {selector}")]
    InvalidSelector { field: String, selector: String },
}

/// Errors raised by a review source adapter
///
/// Stale handles, parse failures and missing fields concern a single
/// candidate and are skipped by the collector. Everything else describes the
/// session itself.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Stale candidate handle: {0}")]
    Stale(String),

    #[error("Failed to parse candidate: {0}")]
    Parse(String),

    #[error("Candidate is missing field '{0}'")]
    MissingField(String),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Unexpected status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Session error: {0}")]
    Session(String),
}

impl SourceError {
    /// Returns true if the error only concerns one candidate
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Stale(_) | Self::Parse(_) | Self::MissingField(_)
        )
    }
}

/// Result type alias for Review-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for source adapter operations
pub type SourceResult<T> = std::result::Result<T, SourceError>;

// Re-export commonly used types
pub use collector::{CollectionResult, CollectorOptions, PaginatedCollector, ReviewSource};
pub use config::Config;
pub use record::{RawRecord, Rating, Record, RecordIdentity};
pub use state::{CollectionState, StopReason};
