//! Markdown report generation
//!
//! This module generates a human-readable report of one harvest
//! invocation: when it ran, which settings it used, and how every source
//! stopped.

use crate::output::OutputResult;
use crate::state::StopReason;
use crate::storage::RunStatus;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Outcome of one source within a harvest
#[derive(Debug, Clone)]
pub struct SourceReport {
    pub name: String,
    pub run_id: Option<i64>,
    pub status: RunStatus,
    pub stop_reason: StopReason,
    pub target: usize,
    pub collected: usize,
    pub inserted: usize,
    pub already_present: usize,
    pub batches: u32,
    pub duration_seconds: f64,
    pub csv_path: Option<String>,
    /// Error message when the run failed
    pub error: Option<String>,
}

/// Everything one invocation collected
#[derive(Debug, Clone, Default)]
pub struct HarvestReport {
    pub started_at: String,
    pub finished_at: String,
    pub config_hash: String,
    pub sources: Vec<SourceReport>,
}

impl HarvestReport {
    pub fn total_collected(&self) -> usize {
        self.sources.iter().map(|s| s.collected).sum()
    }

    pub fn total_inserted(&self) -> usize {
        self.sources.iter().map(|s| s.inserted).sum()
    }

    pub fn failed_sources(&self) -> usize {
        self.sources
            .iter()
            .filter(|s| s.status == RunStatus::Failed)
            .count()
    }
}

/// Writes a markdown report
///
/// # Arguments
///
/// * `report` - The harvest report data
/// * `output_path` - Path where the markdown file should be written
pub fn write_markdown_report(report: &HarvestReport, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_report(report);

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a harvest report as markdown
pub fn format_markdown_report(report: &HarvestReport) -> String {
    let mut md = String::new();

    md.push_str("# Review-Harvest Report\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", report.started_at));
    md.push_str(&format!("- **Finished**: {}\n", report.finished_at));
    md.push_str(&format!("- **Config Hash**: {}\n", report.config_hash));
    md.push_str(&format!("- **Sources**: {}\n", report.sources.len()));
    md.push_str(&format!(
        "- **Records Collected**: {}\n",
        report.total_collected()
    ));
    md.push_str(&format!(
        "- **Newly Stored**: {}\n\n",
        report.total_inserted()
    ));

    md.push_str("## Sources\n\n");
    if report.sources.is_empty() {
        md.push_str("_No sources were collected._\n\n");
    } else {
        md.push_str("| Source | Status | Stop Reason | Collected / Target | New | Already Stored | Batches | Duration |\n");
        md.push_str("|--------|--------|-------------|--------------------|-----|----------------|---------|----------|\n");
        for source in &report.sources {
            md.push_str(&format!(
                "| {} | {} | {} | {} / {} | {} | {} | {} | {:.1}s |\n",
                source.name,
                source.status.to_db_string(),
                source.stop_reason,
                source.collected,
                source.target,
                source.inserted,
                source.already_present,
                source.batches,
                source.duration_seconds
            ));
        }
        md.push('\n');
    }

    let artifacts: Vec<_> = report
        .sources
        .iter()
        .filter_map(|s| s.csv_path.as_ref().map(|p| (&s.name, p)))
        .collect();
    if !artifacts.is_empty() {
        md.push_str("## CSV Artifacts\n\n");
        for (name, path) in artifacts {
            md.push_str(&format!("- `{}`: {}\n", name, path));
        }
        md.push('\n');
    }

    if report.failed_sources() > 0 {
        md.push_str("## Errors\n\n");
        for source in report.sources.iter().filter(|s| s.error.is_some()) {
            md.push_str(&format!(
                "- **{}**: {}\n",
                source.name,
                source.error.as_deref().unwrap_or_default()
            ));
        }
        md.push('\n');
    }

    md.push_str("---\n\n");
    md.push_str("*Generated by Review-Harvest*\n");

    md
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(name: &str, status: RunStatus, reason: StopReason) -> SourceReport {
        SourceReport {
            name: name.to_string(),
            run_id: Some(1),
            status,
            stop_reason: reason,
            target: 10,
            collected: 4,
            inserted: 3,
            already_present: 1,
            batches: 2,
            duration_seconds: 1.5,
            csv_path: Some(format!("out/reviews_{}.csv", name)),
            error: None,
        }
    }

    #[test]
    fn test_report_lists_every_source() {
        let mut failed = source("broken", RunStatus::Failed, StopReason::Error);
        failed.error = Some("Failed to open source 'broken'".to_string());

        let report = HarvestReport {
            started_at: "2024-01-01T00:00:00Z".to_string(),
            finished_at: "2024-01-01T00:01:00Z".to_string(),
            config_hash: "abc".to_string(),
            sources: vec![
                source("shop", RunStatus::Completed, StopReason::Stagnation),
                failed,
            ],
        };

        let md = format_markdown_report(&report);
        assert!(md.contains("# Review-Harvest Report"));
        assert!(md.contains("- **Records Collected**: 8"));
        assert!(md.contains("| shop | completed | stagnation | 4 / 10 | 3 | 1 | 2 | 1.5s |"));
        assert!(md.contains("`shop`: out/reviews_shop.csv"));
        assert!(md.contains("## Errors"));
        assert!(md.contains("**broken**: Failed to open source 'broken'"));
    }

    #[test]
    fn test_empty_report() {
        let md = format_markdown_report(&HarvestReport::default());
        assert!(md.contains("_No sources were collected._"));
        assert!(!md.contains("## Errors"));
    }

    #[test]
    fn test_write_report_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("harvest.md");

        write_markdown_report(&HarvestReport::default(), &path).unwrap();
        assert!(std::fs::read_to_string(&path)
            .unwrap()
            .starts_with("# Review-Harvest Report"));
    }
}
