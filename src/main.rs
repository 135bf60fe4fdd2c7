//! Relay-Crawler main entry point
//!
//! This is the command-line interface for the Relay-Crawler crawl controller.

use anyhow::Context;
use clap::Parser;
use relay_crawler::config::{load_config_with_hash, validate, Config};
use relay_crawler::crawler::run_crawl;
use relay_crawler::output::{load_statistics, print_statistics};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Relay-Crawler: a resumable crawl controller for a remote fetch executor
///
/// Relay-Crawler sends every URL of a backlog to a remote fetch function,
/// records the outcome in append-only ledgers so the crawl can be resumed,
/// and rotates the function's network identity when it gets blocked.
#[derive(Parser, Debug)]
#[command(name = "relay-crawler")]
#[command(version = "1.0.0")]
#[command(about = "A resumable crawl controller for a remote fetch executor", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Name of the remote fetch function
    #[arg(short = 'f', long)]
    function_name: Option<String>,

    /// File with one URL per line
    #[arg(short = 'i', long, value_name = "FILE")]
    in_filename: Option<PathBuf>,

    /// Directory for ledgers, artifacts and the log file
    #[arg(short = 'o', long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Credentials profile forwarded with identity resets
    #[arg(short = 'p', long)]
    profile: Option<String>,

    /// Region forwarded with identity resets
    #[arg(short = 'r', long)]
    region: Option<String>,

    /// Seconds to wait between requests
    #[arg(long, value_name = "SECONDS")]
    sleep: Option<u64>,

    /// Test mode: artifacts are written but the ledgers are left untouched
    #[arg(long)]
    test: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only show warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the ledgers and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(name) = &self.function_name {
            config.invoker.function_name = name.clone();
        }
        if let Some(profile) = &self.profile {
            config.invoker.profile = Some(profile.clone());
        }
        if let Some(region) = &self.region {
            config.invoker.region = Some(region.clone());
        }
        if let Some(path) = &self.in_filename {
            config.crawl.input_path = path.clone();
        }
        if let Some(dir) = &self.out_dir {
            config.crawl.output_dir = dir.clone();
        }
        if let Some(sleep) = self.sleep {
            config.crawl.sleep_seconds = sleep;
        }
        if self.test {
            config.crawl.test_mode = true;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (mut config, config_hash) = load_config_with_hash(&cli.config).with_context(|| {
        format!(
            "Failed to load configuration from {}",
            cli.config.display()
        )
    })?;
    cli.apply_overrides(&mut config);
    validate(&config).context("Invalid configuration after command-line overrides")?;

    // Only a real crawl writes to the output directory
    let log_path = if cli.dry_run || cli.stats {
        None
    } else {
        std::fs::create_dir_all(&config.crawl.output_dir).with_context(|| {
            format!(
                "Failed to create output directory {}",
                config.crawl.output_dir.display()
            )
        })?;
        Some(config.crawl.log_path())
    };
    setup_logging(cli.verbose, cli.quiet, log_path.as_deref())?;

    tracing::info!(
        "Configuration loaded from {} (hash: {})",
        cli.config.display(),
        config_hash
    );

    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config).await?;
    }

    Ok(())
}

/// Sets up the console subscriber and, when crawling, the log file
fn setup_logging(verbose: u8, quiet: bool, log_path: Option<&Path>) -> anyhow::Result<()> {
    let filter = if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("relay_crawler=info,warn"),
            1 => EnvFilter::new("relay_crawler=debug,info"),
            _ => EnvFilter::new("relay_crawler=trace,debug"),
        }
    };

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_filter(filter);

    let file = match log_path {
        Some(path) => {
            let log_file = open_log_file(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(log_file))
                    .with_filter(LevelFilter::DEBUG),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .init();

    Ok(())
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Relay-Crawler Dry Run ===\n");

    println!("Invoker:");
    println!("  Function: {}", config.invoker.function_name);
    println!("  Endpoint: {}", config.invoker.endpoint);
    println!("  Reset endpoint: {}", config.invoker.reset_endpoint);
    println!(
        "  Profile: {}",
        config.invoker.profile.as_deref().unwrap_or("(default)")
    );
    println!(
        "  Region: {}",
        config.invoker.region.as_deref().unwrap_or("(default)")
    );
    println!("  Settle delay: {}s", config.invoker.settle_seconds);
    println!("  Timeout: {}s", config.invoker.timeout_seconds);

    println!("\nCrawl:");
    println!("  Backlog: {}", config.crawl.input_path.display());
    println!("  Output: {}", config.crawl.output_dir.display());
    println!("  Sleep between requests: {}s", config.crawl.sleep_seconds);
    println!(
        "  Max requests per reset: {}",
        config.crawl.max_requests_per_reset
    );
    println!(
        "  Max blocked per reset: {}",
        config.crawl.max_blocks_per_reset
    );
    println!("  Test mode: {}", config.crawl.test_mode);

    let stats = load_statistics(&config.crawl)?;

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would send {} of {} backlog URLs ({} already in a ledger)",
        stats.pending,
        stats.backlog_total,
        stats.backlog_total - stats.pending
    );

    Ok(())
}

/// Handles the --stats mode: shows statistics from the ledgers
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Output: {}\n", config.crawl.output_dir.display());

    let stats = load_statistics(&config.crawl)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    if config.crawl.test_mode {
        tracing::warn!("Test mode: the ledgers will not be updated");
    }

    match run_crawl(config).await {
        Ok(summary) => {
            tracing::info!(
                "Crawl finished: {} invoked, {} skipped, {} resets",
                summary.invoked(),
                summary.skipped,
                summary.resets
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
