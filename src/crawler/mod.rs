//! Crawler module for catalog fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - Frontier scheduling with duplicate filtering
//! - Overall crawl coordination and cancellation

mod coordinator;
mod fetcher;
mod scheduler;

pub use coordinator::{Coordinator, CrawlHandle};
pub use fetcher::{
    build_http_client, fetch_with_retry, FetchAttempt, FetchError, FetchedPage, HttpFetcher,
    PageFetcher, RetryPolicy,
};
pub use scheduler::{CrawlTask, PageKind, Scheduler};

use crate::config::Config;
use crate::output::{open_sink, CrawlReport};

/// Runs a complete crawl with the sink selected by the configuration
///
/// This is the main entry point for library callers. It will:
/// 1. Open the configured output sink
/// 2. Build the HTTP client
/// 3. Crawl until the frontier drains
///
/// # Example
///
/// ```no_run
/// use books_crawler::config::Config;
/// use books_crawler::crawler::crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let report = crawl(Config::default()).await?;
/// println!("{} books", report.stats.items_scraped);
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: Config) -> crate::Result<CrawlReport> {
    let sink = open_sink(&config.output)?;
    Coordinator::new(config, sink)?.run().await
}
