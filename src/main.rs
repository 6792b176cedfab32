//! Books-Crawler main entry point
//!
//! This is the command-line interface for the books.toscrape.com catalog crawler.

use anyhow::Context as _;
use books_crawler::config::{load_config_with_hash, validate, Config, OutputFormat};
use books_crawler::crawler::Coordinator;
use books_crawler::output::{open_sink, print_report};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Books-Crawler: a polite catalog crawler
///
/// Walks every listing page of the catalog, follows each book's detail link
/// and writes one record per book. Respects robots.txt and per-domain delays.
#[derive(Parser, Debug)]
#[command(name = "books-crawler")]
#[command(version)]
#[command(about = "A polite catalog crawler for books.toscrape.com", long_about = None)]
struct Cli {
    /// Path to TOML configuration file; built-in defaults are used when omitted
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Override the output path
    #[arg(short, long, value_name = "PATH")]
    output: Option<String>,

    /// Override the output format (jsonl or sqlite)
    #[arg(short, long, value_name = "FORMAT")]
    format: Option<OutputFormat>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = load(&cli)?;

    if let Some(path) = cli.output {
        config.output.path = path;
    }
    if let Some(format) = cli.format {
        config.output.format = format;
    }
    validate(&config).context("invalid configuration")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config).await
}

/// Loads the configuration file, or the defaults when none is given
fn load(cli: &Cli) -> anyhow::Result<Config> {
    let Some(path) = &cli.config else {
        tracing::info!("No configuration file given, using built-in defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("load configuration: {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    Ok(config)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("books_crawler=info,warn"),
            1 => EnvFilter::new("books_crawler=debug,info"),
            2 => EnvFilter::new("books_crawler=trace,debug"),
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

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Books-Crawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max concurrent requests: {}", config.crawler.max_concurrent_requests);
    println!("  Download delay: {}ms", config.crawler.download_delay);
    println!("  Request timeout: {}s", config.crawler.request_timeout);
    println!(
        "  Retries: {} (backoff {}ms)",
        config.crawler.max_retries, config.crawler.retry_backoff
    );
    println!("  Max redirects: {}", config.crawler.max_redirects);
    println!("  Obey robots.txt: {}", config.crawler.obey_robots);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Format: {}", config.output.format);
    println!("  Path: {}", config.output.path);

    println!("\nStart URLs ({}):", config.crawler.start_urls.len());
    for url in &config.crawler.start_urls {
        println!("  - {}", url);
    }

    println!("\nAllowed Domains ({}):", config.crawler.allowed_domains.len());
    for domain in &config.crawler.allowed_domains {
        println!("  - {}", domain);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    let sink = open_sink(&config.output)
        .with_context(|| format!("open output: {}", config.output.path))?;
    let handle = Coordinator::new(config, sink)
        .context("build crawler")?
        .start();

    let cancel = handle.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping crawl");
            cancel.cancel();
        }
    });

    let report = handle.wait().await.context("crawl failed")?;
    print_report(&report);

    Ok(())
}
