//! State module for tracking collection progress
//!
//! This module provides the transient state of one collection run.
//!
//! # Components
//!
//! - `CollectionState`: Ordered collected records, the identity set, and progress counters
//! - `StopReason`: Why a collection run ended

mod collection_state;
mod stop_reason;

// Re-export main types
pub use collection_state::CollectionState;
pub use stop_reason::StopReason;
