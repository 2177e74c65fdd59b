//! The collection loop
//!
//! Each batch lists the visible candidates, admits the ones whose identity
//! was not seen before, and then tries to advance the source. An advance
//! attempt only counts when the visible candidates actually change, so the
//! loop never relies on a fixed sleep to decide that a page has loaded.

use crate::collector::{CollectError, CollectionResult, CollectorOptions, ReviewSource};
use crate::record::{Record, RecordIdentity};
use crate::state::{CollectionState, StopReason};
use crate::storage::{RecordSink, StorageResult, StoredRecord, UpsertStats};
use crate::SourceResult;
use std::collections::BTreeSet;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// Result of trying to advance the source once per batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Advance {
    /// The visible candidates changed
    Progressed,

    /// Every attempt failed but the page still signals more data
    Stalled,

    /// An attempt failed and the page signals no more data
    Exhausted,
}

/// What is visible at one instant, for change detection
#[derive(Debug, PartialEq, Eq)]
struct Snapshot {
    count: usize,
    identities: BTreeSet<RecordIdentity>,
}

impl Snapshot {
    fn changed_since(&self, before: &Snapshot) -> bool {
        self.count > before.count || self.identities != before.identities
    }
}

/// Per-run bookkeeping that outlives a fatal error
struct Progress {
    state: CollectionState,
    persisted: UpsertStats,
}

impl Progress {
    fn into_result(self, target: usize, stopped_reason: StopReason) -> CollectionResult {
        let batches = self.state.batches();
        let records = self.state.into_records();

        CollectionResult {
            reached_target: records.len() >= target && stopped_reason != StopReason::Error,
            records,
            stopped_reason,
            batches,
            persisted: self.persisted,
        }
    }
}

/// Collects unique records from one source
///
/// The collector owns the source for the duration of the run and closes it
/// on every exit path. Records are flushed to the optional sink every
/// `checkpoint_every` batches and once more when the run stops.
pub struct PaginatedCollector<'a, S: ReviewSource> {
    source: S,
    options: CollectorOptions,
    sink: Option<&'a mut dyn RecordSink>,
}

impl<'a, S: ReviewSource> PaginatedCollector<'a, S> {
    pub fn new(source: S, options: CollectorOptions) -> Self {
        Self {
            source,
            options,
            sink: None,
        }
    }

    /// Attaches the sink that checkpoints and the final flush write to
    pub fn with_sink(mut self, sink: &'a mut dyn RecordSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn options(&self) -> &CollectorOptions {
        &self.options
    }

    /// Gives the source back after the run
    pub fn into_source(self) -> S {
        self.source
    }

    /// Runs the collection loop until a stop condition holds
    ///
    /// # Arguments
    ///
    /// * `target` - Desired number of unique records
    /// * `max_attempts_per_batch` - Advance attempts before a batch gives up
    /// * `stagnation_limit` - Consecutive batches without a new record before stopping
    ///
    /// # Returns
    ///
    /// * `Ok(CollectionResult)` - The run stopped for an expected reason
    /// * `Err(CollectError)` - The run could not start or was aborted; aborted
    ///   runs carry the partial result
    ///
    /// # Cancellation
    ///
    /// Dropping the returned future stops the run at its current suspension
    /// point without flushing or calling [`ReviewSource::close`]. Records
    /// already checkpointed stay persisted; the source can be taken back with
    /// [`PaginatedCollector::into_source`] and closed by the caller.
    pub async fn run(
        &mut self,
        target: usize,
        max_attempts_per_batch: u32,
        stagnation_limit: u32,
    ) -> Result<CollectionResult, CollectError> {
        if target == 0 {
            return Err(CollectError::InvalidArgument(
                "target must be greater than 0".to_string(),
            ));
        }
        if max_attempts_per_batch == 0 {
            return Err(CollectError::InvalidArgument(
                "max attempts per batch must be greater than 0".to_string(),
            ));
        }
        if stagnation_limit == 0 {
            return Err(CollectError::InvalidArgument(
                "stagnation limit must be greater than 0".to_string(),
            ));
        }

        let name = self.source.name().to_string();
        info!("[{}] Opening source (target={})", name, target);

        if let Err(e) = self.source.open().await {
            self.close_source(&name).await;
            return Err(CollectError::SourceInit { name, source: e });
        }

        let mut progress = Progress {
            state: CollectionState::new(),
            persisted: UpsertStats::default(),
        };

        let outcome = self
            .collect(
                &name,
                &mut progress,
                target,
                max_attempts_per_batch,
                stagnation_limit,
            )
            .await;

        match outcome {
            Ok(reason) => {
                let flushed = self.flush(&name, &mut progress);
                self.close_source(&name).await;

                info!(
                    "[{}] Stopped: {} ({} records, {} batches, {} newly persisted)",
                    name,
                    reason,
                    progress.state.len(),
                    progress.state.batches(),
                    progress.persisted.inserted
                );

                let result = progress.into_result(target, reason);
                match flushed {
                    Ok(()) => Ok(result),
                    Err(e) => Err(CollectError::Persist {
                        name,
                        source: e,
                        partial: Box::new(result),
                    }),
                }
            }
            Err(e) => {
                warn!(
                    "[{}] Aborting after {} records: {}",
                    name,
                    progress.state.len(),
                    e
                );

                if let Err(flush_err) = self.flush(&name, &mut progress) {
                    warn!("[{}] Final flush failed: {}", name, flush_err);
                }
                self.close_source(&name).await;

                Err(CollectError::Aborted {
                    name,
                    source: e,
                    partial: Box::new(progress.into_result(target, StopReason::Error)),
                })
            }
        }
    }

    async fn collect(
        &mut self,
        name: &str,
        progress: &mut Progress,
        target: usize,
        max_attempts: u32,
        stagnation_limit: u32,
    ) -> SourceResult<StopReason> {
        let reason = loop {
            let admitted = self.scan_batch(name, &mut progress.state, target).await?;
            progress.state.finish_batch();

            info!(
                "[{}] Batch {}: admitted={} collected={} stagnation={}",
                name,
                progress.state.batches(),
                admitted,
                progress.state.len(),
                progress.state.stagnation_counter()
            );

            if progress.state.len() >= target {
                break StopReason::TargetReached;
            }

            if progress.state.stagnation_counter() >= stagnation_limit {
                break StopReason::Stagnation;
            }

            if self.options.checkpoint_every > 0
                && progress.state.batches() % self.options.checkpoint_every == 0
            {
                if let Err(e) = self.flush(name, progress) {
                    warn!("[{}] Checkpoint failed, will retry: {}", name, e);
                }
            }

            match self.advance(name, max_attempts).await? {
                Advance::Progressed => {}
                Advance::Stalled => {
                    debug!("[{}] Advance stalled, source still signals more", name);
                }
                Advance::Exhausted => break StopReason::SourceExhausted,
            }
        };

        if reason != StopReason::TargetReached && self.options.expand_pass {
            self.expand_pass(name, &mut progress.state, target).await;
            if progress.state.len() >= target {
                return Ok(StopReason::TargetReached);
            }
        }

        Ok(reason)
    }

    /// Admits every new visible candidate, stopping once the target is met
    ///
    /// Returns the number of records admitted.
    async fn scan_batch(
        &mut self,
        name: &str,
        state: &mut CollectionState,
        target: usize,
    ) -> SourceResult<usize> {
        let candidates = match self.source.list_visible_candidates().await {
            Ok(candidates) => candidates,
            Err(e) if e.is_transient() => {
                warn!("[{}] Could not list candidates: {}", name, e);
                return Ok(0);
            }
            Err(e) => return Err(e),
        };

        let mut admitted = 0;
        for candidate in &candidates {
            if state.len() >= target {
                break;
            }

            let raw = match self.source.extract(candidate).await {
                Ok(raw) => raw,
                Err(e) if e.is_transient() => {
                    debug!("[{}] Skipping candidate: {}", name, e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let Some(record) = Record::from_raw(&raw) else {
                debug!("[{}] Skipping candidate with empty content", name);
                continue;
            };

            let identity = RecordIdentity::derive(name, &raw, Some(&record));
            if state.admit(identity, record) {
                admitted += 1;
            }
        }

        Ok(admitted)
    }

    /// Tries to load the next batch, judging success by structural change
    async fn advance(&mut self, name: &str, max_attempts: u32) -> SourceResult<Advance> {
        let before = self.snapshot(name).await?;

        for attempt in 1..=max_attempts {
            match self.source.trigger_advance().await {
                Ok(true) => {
                    if self.wait_for_change(name, &before).await? {
                        debug!("[{}] Advance attempt {} succeeded", name, attempt);
                        return Ok(Advance::Progressed);
                    }
                    debug!("[{}] Advance attempt {} changed nothing", name, attempt);
                }
                Ok(false) => {
                    debug!("[{}] Advance attempt {} could not trigger", name, attempt);
                }
                Err(e) => {
                    debug!("[{}] Advance attempt {} failed: {}", name, attempt, e);
                }
            }

            if !self.has_more(name).await {
                return Ok(Advance::Exhausted);
            }

            if attempt < max_attempts {
                let delay = self.options.backoff.delay(attempt);
                debug!("[{}] Backing off {:?}", name, delay);
                sleep(delay).await;
            }
        }

        Ok(Advance::Stalled)
    }

    /// Polls until the visible candidates differ from `before` or the settle timeout passes
    async fn wait_for_change(&mut self, name: &str, before: &Snapshot) -> SourceResult<bool> {
        let deadline = Instant::now() + self.options.settle_timeout;

        loop {
            if self.snapshot(name).await?.changed_since(before) {
                return Ok(true);
            }

            if Instant::now() >= deadline {
                return Ok(false);
            }

            sleep(self.options.poll_interval).await;
        }
    }

    async fn snapshot(&mut self, name: &str) -> SourceResult<Snapshot> {
        let candidates = match self.source.list_visible_candidates().await {
            Ok(candidates) => candidates,
            Err(e) if e.is_transient() => {
                debug!("[{}] Snapshot listing failed: {}", name, e);
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        let mut identities = BTreeSet::new();
        for candidate in &candidates {
            match self.source.extract(candidate).await {
                Ok(raw) => {
                    let record = Record::from_raw(&raw);
                    identities.insert(RecordIdentity::derive(name, &raw, record.as_ref()));
                }
                Err(e) if e.is_transient() => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(Snapshot {
            count: candidates.len(),
            identities,
        })
    }

    /// An unreadable indicator counts as "more"; exhaustion then comes from stagnation
    async fn has_more(&mut self, name: &str) -> bool {
        match self.source.has_more_indicator().await {
            Ok(more) => more,
            Err(e) => {
                warn!("[{}] Could not read has-more indicator: {}", name, e);
                true
            }
        }
    }

    /// Best-effort enrichment: expand truncated candidates, then re-scan once
    async fn expand_pass(&mut self, name: &str, state: &mut CollectionState, target: usize) {
        match self
            .source
            .expand_visible(self.options.expand_max_clicks)
            .await
        {
            Ok(expanded) => debug!("[{}] Expanded {} candidates", name, expanded),
            Err(e) => {
                warn!("[{}] Expansion pass failed: {}", name, e);
                return;
            }
        }

        match self.scan_batch(name, state, target).await {
            Ok(admitted) => info!("[{}] Expansion pass admitted {}", name, admitted),
            Err(e) => warn!("[{}] Re-scan after expansion failed: {}", name, e),
        }
    }

    /// Sends every record admitted since the last flush to the sink
    fn flush(&mut self, name: &str, progress: &mut Progress) -> StorageResult<()> {
        let Some(sink) = self.sink.as_deref_mut() else {
            return Ok(());
        };

        let pending = progress.state.pending();
        if pending.is_empty() {
            return Ok(());
        }

        let batch: Vec<StoredRecord> = pending
            .iter()
            .map(|record| StoredRecord::from_record(name, record))
            .collect();

        let stats = sink.upsert_insert_only(&batch)?;
        progress.persisted += stats;
        progress.state.mark_flushed();

        debug!(
            "[{}] Flushed {} records ({} new, {} already present)",
            name,
            batch.len(),
            stats.inserted,
            stats.already_present
        );
        Ok(())
    }

    async fn close_source(&mut self, name: &str) {
        if let Err(e) = self.source.close().await {
            warn!("[{}] Failed to close source: {}", name, e);
        }
    }
}
