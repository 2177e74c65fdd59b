/// Stop reason definitions for collection runs
///
/// This module defines every way a collection run can end.
use std::fmt;

/// Represents why a collection run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    // ===== Expected Stops =====
    /// The requested number of unique records was collected
    TargetReached,

    /// The source could not be advanced any further
    SourceExhausted,

    /// Too many consecutive batches admitted no new record
    Stagnation,

    // ===== Fatal Stop =====
    /// The run aborted on an unrecoverable error
    Error,
}

impl StopReason {
    /// Returns true if the run ended normally
    ///
    /// `SourceExhausted` and `Stagnation` are normal stops even though the
    /// target may not have been reached.
    pub fn is_expected(&self) -> bool {
        !self.is_error()
    }

    /// Returns true if the run aborted
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }

    /// Converts the stop reason to a database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::TargetReached => "target_reached",
            Self::SourceExhausted => "source_exhausted",
            Self::Stagnation => "stagnation",
            Self::Error => "error",
        }
    }

    /// Parses a stop reason from a database string representation
    ///
    /// Returns None if the string doesn't match any known reason.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "target_reached" => Some(Self::TargetReached),
            "source_exhausted" => Some(Self::SourceExhausted),
            "stagnation" => Some(Self::Stagnation),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::TargetReached => "target reached",
            Self::SourceExhausted => "source exhausted",
            Self::Stagnation => "stagnation",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}
