//! Store-Walker main entry point
//!
//! This is the command-line interface for the Store-Walker directory scraper.

use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use store_walker::config::{load_config_with_hash, validate, Config, DriverKind};
use store_walker::crawler::scrape;
use store_walker::WalkerError;
use tracing_subscriber::EnvFilter;

/// Store-Walker: a browser-driven store directory scraper
///
/// Store-Walker walks a retail store directory from its state index down
/// to every city page and writes one row per city listing the stores found
/// there, as both CSV and JSON.
#[derive(Parser, Debug)]
#[command(name = "store-walker")]
#[command(version = "1.0.0")]
#[command(about = "A browser-driven store directory scraper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used if omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// URL of the state directory page
    #[arg(long, value_name = "URL")]
    root_url: Option<String>,

    /// Page driver: chromium or markup
    #[arg(long, value_name = "KIND")]
    driver: Option<DriverKind>,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Maximum number of city pages fetched at once
    #[arg(long, value_name = "N")]
    max_concurrent: Option<u32>,

    /// CSV output path
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,

    /// JSON output path
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the effective settings without scraping
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match load(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_scrape(config).await;
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("store_walker=info,warn"),
            1 => EnvFilter::new("store_walker=debug,info"),
            2 => EnvFilter::new("store_walker=trace,debug"),
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

/// Loads the config file (if any), applies CLI overrides and validates
fn load(cli: &Cli) -> Result<Config, WalkerError> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    apply_overrides(&mut config, cli);
    validate(&config)?;
    Ok(config)
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(url) = &cli.root_url {
        config.target.root_url = url.clone();
    }
    if let Some(driver) = cli.driver {
        config.browser.driver = driver;
    }
    if cli.headed {
        config.browser.headless = false;
    }
    if let Some(n) = cli.max_concurrent {
        config.crawler.max_concurrent = n;
    }
    if let Some(path) = &cli.csv {
        config.output.csv_path = path.display().to_string();
    }
    if let Some(path) = &cli.json {
        config.output.json_path = path.display().to_string();
    }
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Store-Walker Dry Run ===\n");

    println!("Target:");
    println!("  Root URL: {}", config.target.root_url);

    println!("\nBrowser:");
    println!("  Driver: {}", config.browser.driver);
    println!("  Headless: {}", config.browser.headless);
    println!("  Timeout: {}ms", config.browser.timeout_ms);
    println!(
        "  Viewport: {}x{}",
        config.browser.viewport_width, config.browser.viewport_height
    );
    println!("  Human emulation: {}", config.browser.human_emulation);
    println!("  User agents: {}", config.browser.user_agents.len());

    println!("\nCrawler:");
    println!("  Max concurrent: {}", config.crawler.max_concurrent);
    println!("  Retry attempts: {}", config.crawler.retry_attempts);
    println!(
        "  Backoff: {:.1}-{:.1}s",
        config.crawler.backoff_min_secs, config.crawler.backoff_max_secs
    );

    println!("\nOutput:");
    println!("  CSV: {}", config.output.csv_path);
    println!("  JSON: {}", config.output.json_path);

    println!("\n✓ Configuration is valid");
}

/// Handles the main scrape operation
///
/// Failures are logged rather than returned; whatever was persisted before
/// the failure stays on disk.
async fn handle_scrape(config: Config) {
    tracing::info!("Starting scrape of {}", config.target.root_url);
    let started = Instant::now();

    match scrape(config).await {
        Ok(summary) => {
            tracing::info!(
                "Scrape finished in {:.1}s: {} records from {} states ({} cities, {} failed)",
                started.elapsed().as_secs_f64(),
                summary.records,
                summary.states,
                summary.cities,
                summary.failed_cities
            );
        }
        Err(e) => {
            tracing::error!(
                "Scrape failed after {:.1}s: {}",
                started.elapsed().as_secs_f64(),
                e
            );
        }
    }
}
