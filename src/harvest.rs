//! Harvest driver
//!
//! Runs every configured source one after the other. Each source gets its
//! own adapter, its own run-history entry, and a sink that writes both the
//! review database and the source's CSV artifact. A failing source is
//! recorded in the report and does not stop the remaining ones.

use crate::collector::{CollectError, HttpPagedSource, PaginatedCollector};
use crate::config::{Config, SourceConfig};
use crate::output::{
    csv_path, write_markdown_report, write_records_csv, CsvSink, HarvestReport, SourceReport,
};
use crate::state::StopReason;
use crate::storage::{open_storage, RunOutcome, RunStatus, SqliteStorage, Storage, TeeSink};
use crate::HarvestError;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, warn};

/// Picks the configured sources to work on
///
/// # Arguments
///
/// * `config` - The loaded configuration
/// * `filter` - Name of a single source, or `None` for all of them
///
/// # Returns
///
/// * `Ok(Vec<&SourceConfig>)` - The selected sources in configuration order
/// * `Err(HarvestError::UnknownSource)` - No source has the requested name
pub fn select_sources<'c>(
    config: &'c Config,
    filter: Option<&str>,
) -> Result<Vec<&'c SourceConfig>, HarvestError> {
    match filter {
        Some(name) => config
            .source(name)
            .map(|source| vec![source])
            .ok_or_else(|| HarvestError::UnknownSource(name.to_string())),
        None => Ok(config.sources.iter().collect()),
    }
}

/// Owns the review database for the duration of an invocation
pub struct Harvester {
    config: Config,
    config_hash: String,
    storage: SqliteStorage,
}

impl Harvester {
    /// Opens the database named in the configuration
    pub fn new(config: Config, config_hash: String) -> Result<Self, HarvestError> {
        let storage = open_storage(Path::new(&config.output.database_path))?;
        Ok(Self::with_storage(config, config_hash, storage))
    }

    pub fn with_storage(config: Config, config_hash: String, storage: SqliteStorage) -> Self {
        Self {
            config,
            config_hash,
            storage,
        }
    }

    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Harvests the selected sources and writes the markdown report
    pub async fn run(&mut self, filter: Option<&str>) -> Result<HarvestReport, HarvestError> {
        let sources: Vec<SourceConfig> = select_sources(&self.config, filter)?
            .into_iter()
            .cloned()
            .collect();

        let mut report = HarvestReport {
            started_at: Utc::now().to_rfc3339(),
            config_hash: self.config_hash.clone(),
            ..HarvestReport::default()
        };

        for source in &sources {
            report.sources.push(self.harvest_source(source).await?);
        }

        report.finished_at = Utc::now().to_rfc3339();

        let summary_path = Path::new(&self.config.output.summary_path);
        write_markdown_report(&report, summary_path)?;
        info!("Report written to {}", summary_path.display());

        Ok(report)
    }

    /// Collects one source and records the run
    ///
    /// Collection failures end up in the returned report; only failures of
    /// the run history itself are returned as errors.
    pub async fn harvest_source(
        &mut self,
        source: &SourceConfig,
    ) -> Result<SourceReport, HarvestError> {
        let started = Instant::now();
        let settings = &self.config.collector;
        let csv_file = csv_path(Path::new(&self.config.output.csv_dir), &source.name);

        info!(
            "Harvesting '{}' from {}",
            source.name,
            source.page_url(source.start_page)
        );

        let adapter = HttpPagedSource::new(source.clone(), self.config.user_agent.clone())?;
        let run_id = self.storage.create_run(&source.name, &self.config_hash)?;

        let (outcome, csv_written) = {
            let mut sink = TeeSink::new(&mut self.storage, CsvSink::new(&csv_file));
            let outcome = PaginatedCollector::new(adapter, settings.to_options())
                .with_sink(&mut sink)
                .run(
                    settings.target,
                    settings.max_attempts_per_batch,
                    settings.stagnation_limit,
                )
                .await;
            (outcome, !sink.mirror().is_empty())
        };

        let mut report = SourceReport {
            name: source.name.clone(),
            run_id: Some(run_id),
            status: RunStatus::Completed,
            stop_reason: StopReason::Error,
            target: settings.target,
            collected: 0,
            inserted: 0,
            already_present: 0,
            batches: 0,
            duration_seconds: 0.0,
            csv_path: None,
            error: None,
        };

        let result = match &outcome {
            Ok(result) => Some(result),
            Err(e) => {
                error!("Source '{}' failed: {}", source.name, e);
                report.status = RunStatus::Failed;
                report.error = Some(e.to_string());
                e.partial()
            }
        };

        if let Some(result) = result {
            report.stop_reason = result.stopped_reason;
            report.collected = result.records.len();
            report.inserted = result.persisted.inserted;
            report.already_present = result.persisted.already_present;
            report.batches = result.batches;
        }

        if let Err(CollectError::Persist { .. }) = &outcome {
            warn!(
                "Source '{}' stopped normally but its records were not all stored",
                source.name
            );
        }

        self.storage.finish_run(
            run_id,
            report.status,
            &RunOutcome {
                stop_reason: report.stop_reason,
                collected: report.collected,
                inserted: report.inserted,
                batches: report.batches,
            },
        )?;

        // An artifact left by an earlier run is not this run's output
        if csv_written {
            report.csv_path = Some(csv_file.display().to_string());
        }
        report.duration_seconds = started.elapsed().as_secs_f64();

        info!(
            "Finished '{}': {} ({} collected, {} new)",
            source.name, report.stop_reason, report.collected, report.inserted
        );

        Ok(report)
    }

    /// Re-exports stored reviews of the selected sources to their CSV artifacts
    ///
    /// Returns the written paths with their row counts.
    pub fn export_csv(&self, filter: Option<&str>) -> Result<Vec<(PathBuf, usize)>, HarvestError> {
        let dir = Path::new(&self.config.output.csv_dir);
        let mut written = Vec::new();

        for source in select_sources(&self.config, filter)? {
            let records = self.storage.load_records(&source.name)?;
            let path = csv_path(dir, &source.name);
            write_records_csv(&path, &records)?;

            info!("Exported {} reviews to {}", records.len(), path.display());
            written.push((path, records.len()));
        }

        Ok(written)
    }
}
