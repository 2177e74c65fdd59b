//! Record model for collected reviews
//!
//! This module defines what a collected review looks like:
//! - `RawRecord`: the fields an adapter extracted, before normalization
//! - `Record`: a normalized review that passed the non-empty content check
//! - `Rating`: numeric score, free-form label, or missing
//! - `RecordIdentity`: the deduplication key of a record

mod identity;
mod normalize;

pub use identity::{content_signature, RecordIdentity};
pub use normalize::{normalize_content, parse_rating, parse_review_date};

use chrono::NaiveDate;
use std::fmt;

/// Fields extracted from one candidate by a source adapter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    /// Page-assigned identifier, if the markup carries one
    pub natural_id: Option<String>,

    /// Raw rating text (e.g. "4", "width: 90%", "total_rating_8")
    pub rating: Option<String>,

    /// Raw date text; the date may appear anywhere inside it
    pub date: Option<String>,

    /// Raw review text
    pub content: String,
}

impl RawRecord {
    /// Creates a raw record with only content set
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.natural_id = Some(id.into());
        self
    }

    pub fn with_rating(mut self, rating: impl Into<String>) -> Self {
        self.rating = Some(rating.into());
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Returns the trimmed natural id, if present and non-empty
    pub fn natural_id(&self) -> Option<&str> {
        self.natural_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// A review rating
#[derive(Debug, Clone, PartialEq)]
pub enum Rating {
    /// A numeric score on the source's own scale
    Score(f64),

    /// Non-numeric rating text
    Label(String),

    /// No rating was found
    Missing,
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Score(score) => write!(f, "{}", score),
            Self::Label(label) => f.write_str(label),
            Self::Missing => Ok(()),
        }
    }
}

/// One normalized collected review
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub rating: Rating,
    pub date: Option<NaiveDate>,
    pub content: String,
}

impl Record {
    /// Normalizes a raw record
    ///
    /// Returns `None` when the normalized content is empty; such records are
    /// never retained.
    pub fn from_raw(raw: &RawRecord) -> Option<Self> {
        let content = normalize_content(&raw.content);
        if content.is_empty() {
            return None;
        }

        Some(Self {
            rating: raw
                .rating
                .as_deref()
                .map(parse_rating)
                .unwrap_or(Rating::Missing),
            date: raw.date.as_deref().and_then(parse_review_date),
            content,
        })
    }

    /// The date as `YYYY-MM-DD`, or an empty string when absent
    pub fn date_string(&self) -> String {
        self.date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }

    /// Content signature of this record for the given source
    pub fn signature(&self, source: &str) -> String {
        content_signature(
            source,
            &self.date_string(),
            &self.rating.to_string(),
            &self.content,
        )
    }
}
