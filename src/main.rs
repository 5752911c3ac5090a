//! Herbar main entry point
//!
//! This is the command-line interface for the Herbar herb-record harvester.

use anyhow::Context;
use clap::Parser;
use herbar::config::{load_config_with_hash, Config};
use herbar::crawler::Coordinator;
use herbar::output::{print_statistics, write_all};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Herbar: a polite herb-record harvester
///
/// Herbar walks one category index of a wiki-style site, extracts a
/// structured record from every member article, and writes the collection
/// as a JSON document (optionally mirrored into SQLite).
#[derive(Parser, Debug)]
#[command(name = "herbar")]
#[command(version)]
#[command(about = "A polite herb-record harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the effective settings without crawling
    #[arg(long, conflicts_with_all = ["output", "stats"])]
    dry_run: bool,

    /// Write the JSON document here instead of the configured path
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Print run statistics after the crawl
    #[arg(long)]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(output) = &cli.output {
        config.output.json_path = output.display().to_string();
    }

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(&config, cli.stats).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("herbar=info,warn"),
            1 => EnvFilter::new("herbar=debug,info"),
            2 => EnvFilter::new("herbar=trace,debug"),
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

/// Handles the --dry-run mode: prints the effective settings
fn handle_dry_run(config: &Config) {
    println!("=== Herbar Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Category: {}", config.site.category_path);
    println!("  License: {}", config.site.license);
    if config.site.api_paths.is_empty() {
        println!("  Wiki API: disabled");
    } else {
        println!("  Wiki API: {}", config.site.api_paths.join(", "));
    }

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.signature());

    println!("\nCrawler Configuration:");
    println!("  Default delay: {}ms", config.crawler.default_delay_ms);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Policy timeout: {}s", config.crawler.policy_timeout_secs);
    match config.crawler.overall_timeout_secs {
        Some(secs) => println!("  Overall budget: {}s", secs),
        None => println!("  Overall budget: unlimited"),
    }
    println!("  Max retries: {}", config.crawler.max_retries);
    println!("  Respect robots.txt: {}", config.crawler.respect_robots);
    println!("  Duplicate headings: {:?}", config.crawler.duplicate_headings);

    if !config.headings.synonyms.is_empty() {
        println!("\nExtra Heading Synonyms ({}):", config.headings.synonyms.len());
        for (heading, key) in &config.headings.synonyms {
            println!("  - {} -> {}", heading, key);
        }
    }

    println!("\nOutput:");
    println!("  JSON: {}", config.output.json_path);
    if let Some(database_path) = &config.output.database_path {
        println!("  SQLite: {}", database_path);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
///
/// Ctrl-C stops the crawl; whatever was collected up to then is still
/// written.
async fn handle_crawl(config: &Config, show_stats: bool) -> anyhow::Result<()> {
    let mut coordinator =
        Coordinator::new(config).context("Failed to set up the crawler")?;

    let abort = coordinator.abort_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; finishing with the records collected so far");
            abort.abort();
        }
    });

    tracing::info!("Starting crawl of {}", config.site.base_url);
    let collection = coordinator.run().await.context("Crawl failed")?;

    write_all(&config.output, &collection).context("Failed to write output")?;

    if show_stats {
        print_statistics(coordinator.stats());
    }

    Ok(())
}
