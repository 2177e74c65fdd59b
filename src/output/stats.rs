//! Statistics from the review database
//!
//! This module provides functionality for extracting and displaying
//! stored review counts and run history from the storage layer.

use crate::storage::{RunRecord, Storage};
use crate::HarvestError;

/// Review database statistics
#[derive(Debug, Clone)]
pub struct HarvestStatistics {
    /// Total number of stored reviews
    pub total_records: u64,

    /// Stored reviews per source, sorted by source name
    pub records_by_source: Vec<(String, u64)>,

    /// Most recent run of each requested source that has one
    pub latest_runs: Vec<RunRecord>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `sources` - Sources whose latest run should be reported
///
/// # Returns
///
/// * `Ok(HarvestStatistics)` - Successfully loaded statistics
/// * `Err(HarvestError)` - Failed to query statistics
pub fn load_statistics(
    storage: &dyn Storage,
    sources: &[&str],
) -> Result<HarvestStatistics, HarvestError> {
    let total_records = storage.count_total_records()?;
    let records_by_source = storage.count_records_by_source()?;

    let mut latest_runs = Vec::new();
    for source in sources {
        if let Some(run) = storage.get_latest_run(source)? {
            latest_runs.push(run);
        }
    }

    Ok(HarvestStatistics {
        total_records,
        records_by_source,
        latest_runs,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Review Statistics ===\n");

    println!("Stored reviews: {}", stats.total_records);
    println!();

    if !stats.records_by_source.is_empty() {
        println!("By Source:");
        for (source, count) in &stats.records_by_source {
            let percentage = if stats.total_records > 0 {
                (*count as f64 / stats.total_records as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} ({:.1}%)", source, count, percentage);
        }
        println!();
    }

    if !stats.latest_runs.is_empty() {
        println!("Latest Runs:");
        for run in &stats.latest_runs {
            let reason = run
                .stop_reason
                .map(|r| r.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {} #{}: {} ({}), {} collected, {} new, {} batches, started {}",
                run.source,
                run.id,
                run.status.to_db_string(),
                reason,
                run.collected,
                run.inserted,
                run.batches,
                run.started_at
            );
        }
    }
}
