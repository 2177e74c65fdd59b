use crate::collector::{BackoffSchedule, CollectorOptions};
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Review-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub collector: CollectorConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default, rename = "source")]
    pub sources: Vec<SourceConfig>,
}

impl Config {
    /// Looks up a configured source by name
    pub fn source(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.name == name)
    }
}

/// Collection loop configuration, shared by every source
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CollectorConfig {
    /// Desired number of unique records per source
    pub target: usize,

    /// Advance attempts per batch before giving up on it
    #[serde(default = "default_max_attempts")]
    pub max_attempts_per_batch: u32,

    /// Consecutive batches without a new record before stopping
    #[serde(default = "default_stagnation_limit")]
    pub stagnation_limit: u32,

    /// Flush to storage every N batches (0 = only at the end)
    #[serde(default = "default_checkpoint_every")]
    pub checkpoint_every: u32,

    /// Delays between advance attempts (milliseconds)
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: Vec<u64>,

    /// Maximum wait for a page to change after an advance (milliseconds)
    #[serde(default = "default_settle_timeout_ms")]
    pub settle_timeout_ms: u64,

    /// Re-scan interval while waiting for a change (milliseconds)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default)]
    pub expand_pass: bool,

    #[serde(default = "default_expand_max_clicks")]
    pub expand_max_clicks: usize,
}

fn default_max_attempts() -> u32 {
    8
}

fn default_stagnation_limit() -> u32 {
    10
}

fn default_checkpoint_every() -> u32 {
    3
}

fn default_backoff_ms() -> Vec<u64> {
    BackoffSchedule::default()
        .steps()
        .iter()
        .map(|step| u64::try_from(step.as_millis()).unwrap_or(u64::MAX))
        .collect()
}

fn default_settle_timeout_ms() -> u64 {
    10_000
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_expand_max_clicks() -> usize {
    80
}

impl CollectorConfig {
    /// Converts the file settings into collector options
    pub fn to_options(&self) -> CollectorOptions {
        CollectorOptions {
            checkpoint_every: self.checkpoint_every,
            backoff: BackoffSchedule::from_millis(&self.backoff_ms),
            settle_timeout: Duration::from_millis(self.settle_timeout_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            expand_pass: self.expand_pass,
            expand_max_clicks: self.expand_max_clicks,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UserAgentConfig {
    pub crawler_name: String,
    pub crawler_version: String,

    /// URL with information about the harvester
    pub contact_url: String,

    pub contact_email: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path to the SQLite database file
    pub database_path: String,

    /// Directory receiving `reviews_{source}.csv`
    pub csv_dir: String,

    /// Path to the markdown run report
    pub summary_path: String,
}

/// One paginated review source
///
/// Selectors are CSS selectors. `rating-attr` and `id-attr` name attributes
/// read from the rating element and the item element respectively; without
/// `rating-attr` the rating element's text is used.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SourceConfig {
    pub name: String,

    /// Page URL with a `{page}` placeholder
    pub url_template: String,

    #[serde(default = "default_start_page")]
    pub start_page: u32,

    pub item_selector: String,
    pub content_selector: String,
    pub date_selector: Option<String>,
    pub rating_selector: Option<String>,
    pub rating_attr: Option<String>,
    pub id_attr: Option<String>,

    /// Present on pages that have a successor
    pub next_selector: Option<String>,
}

fn default_start_page() -> u32 {
    1
}

impl SourceConfig {
    /// Substitutes a page number into the URL template
    pub fn page_url(&self, page: u32) -> String {
        self.url_template.replace("{page}", &page.to_string())
    }
}
