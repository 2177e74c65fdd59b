//! Review-Harvest main entry point
//!
//! This is the command-line interface for the Review-Harvest collector.

use anyhow::{bail, Context};
use clap::Parser;
use review_harvest::config::{load_config_with_hash, Config};
use review_harvest::harvest::{select_sources, Harvester};
use review_harvest::output::{load_statistics, print_statistics};
use review_harvest::storage::SqliteStorage;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Review-Harvest: paginated review collection
///
/// Review-Harvest walks paginated review listings, keeps each review once,
/// stops when a target is met or the source stops yielding new reviews, and
/// stores the result in SQLite and CSV.
#[derive(Parser, Debug)]
#[command(name = "review-harvest")]
#[command(version)]
#[command(about = "Paginated review collection with idempotent storage", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Only work on the source with this name
    #[arg(short, long, value_name = "NAME")]
    source: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be collected without fetching anything
    #[arg(long, conflicts_with_all = ["stats", "export_csv"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_csv"])]
    stats: bool,

    /// Rewrite the CSV artifacts from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    export_csv: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let filter = cli.source.as_deref();

    if cli.dry_run {
        handle_dry_run(&config, filter)
    } else if cli.stats {
        handle_stats(&config, filter)
    } else if cli.export_csv {
        handle_export_csv(config, config_hash, filter)
    } else {
        handle_harvest(config, config_hash, filter).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("review_harvest=info,warn"),
            1 => EnvFilter::new("review_harvest=debug,info"),
            2 => EnvFilter::new("review_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be collected
fn handle_dry_run(config: &Config, filter: Option<&str>) -> anyhow::Result<()> {
    let sources = select_sources(config, filter)?;
    let collector = &config.collector;

    println!("=== Review-Harvest Dry Run ===\n");

    println!("Collector Configuration:");
    println!("  Target per source: {}", collector.target);
    println!(
        "  Max attempts per batch: {}",
        collector.max_attempts_per_batch
    );
    println!("  Stagnation limit: {}", collector.stagnation_limit);
    println!("  Checkpoint every: {} batches", collector.checkpoint_every);
    println!("  Backoff: {:?} ms", collector.backoff_ms);
    println!(
        "  Settle timeout: {}ms (poll every {}ms)",
        collector.settle_timeout_ms, collector.poll_interval_ms
    );
    if collector.expand_pass {
        println!(
            "  Expansion pass: on (max {} clicks)",
            collector.expand_max_clicks
        );
    }

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  CSV directory: {}", config.output.csv_dir);
    println!("  Report: {}", config.output.summary_path);

    println!("\nSources ({}):", sources.len());
    for source in &sources {
        println!("  - {}", source.name);
        println!("    first page: {}", source.page_url(source.start_page));
        println!("    items: {}", source.item_selector);
        if let Some(next) = &source.next_selector {
            println!("    next page marker: {}", next);
        }
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config, filter: Option<&str>) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let names: Vec<&str> = select_sources(config, filter)?
        .into_iter()
        .map(|s| s.name.as_str())
        .collect();

    let stats = load_statistics(&storage, &names)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --export-csv mode: rewrites CSV artifacts from stored reviews
fn handle_export_csv(
    config: Config,
    config_hash: String,
    filter: Option<&str>,
) -> anyhow::Result<()> {
    let harvester = Harvester::new(config, config_hash)?;

    println!("=== Exporting CSV Artifacts ===\n");
    for (path, rows) in harvester.export_csv(filter)? {
        println!("✓ {} ({} reviews)", path.display(), rows);
    }

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(
    config: Config,
    config_hash: String,
    filter: Option<&str>,
) -> anyhow::Result<()> {
    tracing::info!(
        "Target {} reviews per source, {} source(s) configured",
        config.collector.target,
        config.sources.len()
    );

    let mut harvester = Harvester::new(config, config_hash)?;
    let report = harvester.run(filter).await?;

    tracing::info!(
        "Harvest finished: {} collected, {} newly stored",
        report.total_collected(),
        report.total_inserted()
    );

    let failed = report.failed_sources();
    if failed > 0 {
        bail!("{} of {} source(s) failed", failed, report.sources.len());
    }

    Ok(())
}
