use crate::record::{RawRecord, Record};
use sha2::{Digest, Sha256};
use std::fmt;

/// Deduplication key of a record within one collection run
///
/// A natural id assigned by the page is preferred because it survives
/// re-renders; otherwise the content signature is used.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordIdentity {
    /// Page-assigned identifier
    Natural(String),

    /// Hex-encoded SHA-256 over the normalized fields
    Content(String),
}

impl RecordIdentity {
    /// Derives the identity of a candidate
    ///
    /// # Arguments
    ///
    /// * `source` - Name of the source the candidate came from
    /// * `raw` - The extracted raw fields (used for the natural id)
    /// * `record` - The normalized record, when content was non-empty
    pub fn derive(source: &str, raw: &RawRecord, record: Option<&Record>) -> Self {
        if let Some(id) = raw.natural_id() {
            return Self::Natural(id.to_string());
        }

        match record {
            Some(record) => Self::Content(record.signature(source)),
            None => Self::Content(content_signature(source, "", "", "")),
        }
    }

    /// Returns true if this identity came from the page itself
    pub fn is_natural(&self) -> bool {
        matches!(self, Self::Natural(_))
    }
}

impl fmt::Display for RecordIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Natural(id) => write!(f, "id:{}", id),
            Self::Content(digest) => write!(f, "sha256:{}", digest),
        }
    }
}

/// Computes the content signature of a normalized record
///
/// The signature is the hex-encoded SHA-256 of `source||date||rating||content`.
/// It is also the key under which records are persisted.
///
/// # Example
///
/// ```
/// use review_harvest::record::content_signature;
///
/// let a = content_signature("shop", "2024-01-02", "5", "Loved it");
/// let b = content_signature("shop", "2024-01-02", "5", "Loved it");
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 64);
/// ```
pub fn content_signature(source: &str, date: &str, rating: &str, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}||{}||{}||{}", source, date, rating, content).as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_is_deterministic() {
        let first = content_signature("kyobo", "2024-05-01", "9.5", "moving story");
        let second = content_signature("kyobo", "2024-05-01", "9.5", "moving story");
        assert_eq!(first, second);
    }

    #[test]
    fn test_signature_covers_every_field() {
        let base = content_signature("a", "2024-05-01", "5", "text");
        assert_ne!(base, content_signature("b", "2024-05-01", "5", "text"));
        assert_ne!(base, content_signature("a", "2024-05-02", "5", "text"));
        assert_ne!(base, content_signature("a", "2024-05-01", "4", "text"));
        assert_ne!(base, content_signature("a", "2024-05-01", "5", "text!"));
    }

    #[test]
    fn test_natural_id_is_preferred() {
        let raw = RawRecord::new("body").with_id("7781");
        let record = Record::from_raw(&raw);
        let identity = RecordIdentity::derive("shop", &raw, record.as_ref());
        assert_eq!(identity, RecordIdentity::Natural("7781".to_string()));
        assert!(identity.is_natural());
        assert_eq!(identity.to_string(), "id:7781");
    }

    #[test]
    fn test_content_identity_ignores_raw_formatting() {
        let a = RawRecord::new("  same text ").with_date("2024.01.02");
        let b = RawRecord::new("same text\u{a0}").with_date("2024-01-02");
        let ra = Record::from_raw(&a);
        let rb = Record::from_raw(&b);

        assert_eq!(
            RecordIdentity::derive("shop", &a, ra.as_ref()),
            RecordIdentity::derive("shop", &b, rb.as_ref())
        );
    }
}
