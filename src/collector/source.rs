use crate::record::RawRecord;
use crate::SourceResult;
use async_trait::async_trait;

/// A paginated or incrementally loaded origin of reviews
///
/// The collector drives one adapter per run and owns it exclusively. Every
/// capability is a required method; an adapter with nothing to expand
/// returns `Ok(0)` from [`ReviewSource::expand_visible`].
#[async_trait]
pub trait ReviewSource: Send {
    /// Handle to one visible item, valid until the next advance
    type Candidate: Send + Sync;

    /// Stable name of the source; part of every content signature
    fn name(&self) -> &str;

    /// Establishes the session and loads the first batch
    ///
    /// An error here is fatal for the run.
    async fn open(&mut self) -> SourceResult<()>;

    /// Lists every candidate currently visible, in page order
    async fn list_visible_candidates(&mut self) -> SourceResult<Vec<Self::Candidate>>;

    /// Extracts the raw fields of one candidate
    ///
    /// Errors for which [`SourceError::is_transient`](crate::SourceError::is_transient)
    /// holds only skip this candidate.
    async fn extract(&mut self, candidate: &Self::Candidate) -> SourceResult<RawRecord>;

    /// Triggers loading of the next batch (click, scroll or request)
    ///
    /// Returns `Ok(false)` when the trigger could not be performed.
    async fn trigger_advance(&mut self) -> SourceResult<bool>;

    /// Returns true while the page still signals more data
    async fn has_more_indicator(&mut self) -> SourceResult<bool>;

    /// Expands truncated visible candidates, clicking at most `max_clicks` times
    ///
    /// Returns the number of expansions performed.
    async fn expand_visible(&mut self, max_clicks: usize) -> SourceResult<usize>;

    /// Tears the session down
    ///
    /// Called exactly once per run on every exit path the run future reaches.
    /// A run future dropped before completion never gets here, so adapters
    /// that hold an external session (a browser, a socket) must also release
    /// it in `Drop`.
    async fn close(&mut self) -> SourceResult<()>;
}
