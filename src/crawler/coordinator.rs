//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Seeding the frontier with the configured start URLs
//! - Dispatching fetch tasks under the global concurrency limit
//! - Routing listing pages to link discovery and detail pages to extraction
//! - Filtering off-site and duplicate requests
//! - Emitting records to the sink and collecting statistics
//! - Handling cancellation

use crate::catalog::{discover_links, extract_book, BookRecord, ListingLinks};
use crate::config::Config;
use crate::crawler::fetcher::{
    fetch_with_retry, FetchError, FetchedPage, HttpFetcher, PageFetcher, RetryPolicy,
};
use crate::crawler::scheduler::{CrawlTask, PageKind, Scheduler};
use crate::output::{BookSink, CrawlReport, CrawlStats};
use crate::robots::RobotsCache;
use crate::state::DomainStates;
use crate::url::is_allowed_url;
use crate::BooksError;
use chrono::Utc;
use scraper::Html;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Progress is logged every this many parsed pages
const PROGRESS_INTERVAL: u64 = 50;

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    fetcher: Arc<dyn PageFetcher>,
    sink: Arc<dyn BookSink>,
    cancel: CancellationToken,
}

/// Handle to a crawl running on the tokio runtime
pub struct CrawlHandle {
    cancel: CancellationToken,
    join: JoinHandle<crate::Result<CrawlReport>>,
}

impl CrawlHandle {
    /// Requests cancellation; in-flight fetches are aborted
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that cancels this crawl when triggered
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Returns true once the crawl task has completed
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Waits for the crawl to finish and returns its report
    pub async fn wait(self) -> crate::Result<CrawlReport> {
        match self.join.await {
            Ok(result) => result,
            Err(e) => Err(BooksError::Task(e.to_string())),
        }
    }
}

/// What a fetch task produced
enum Page {
    Listing(ListingLinks),
    Detail(BookRecord),
}

/// Result of one fetch task, reported back to the driver loop
struct TaskOutcome {
    task: CrawlTask,

    /// HTTP requests issued (0 when robots.txt denied the URL)
    attempts: u32,

    /// Status of the successful response, if any
    status: Option<u16>,

    result: Result<Page, BooksError>,
}

/// Everything a fetch task needs, shared between tasks
struct FetchContext {
    fetcher: Arc<dyn PageFetcher>,
    robots: Option<RobotsCache>,
    politeness: DomainStates,
    retry: RetryPolicy,
}

impl Coordinator {
    /// Creates a coordinator that fetches over HTTP
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `sink` - Destination for extracted records
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(BooksError)` - The HTTP client could not be built
    pub fn new(config: Config, sink: Arc<dyn BookSink>) -> crate::Result<Self> {
        let fetcher = HttpFetcher::new(&config.crawler, &config.user_agent)?;
        Ok(Self::with_fetcher(config, Arc::new(fetcher), sink))
    }

    /// Creates a coordinator with a custom page fetcher
    pub fn with_fetcher(
        config: Config,
        fetcher: Arc<dyn PageFetcher>,
        sink: Arc<dyn BookSink>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            fetcher,
            sink,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that cancels [`Coordinator::run`] when triggered
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Spawns the crawl on the current tokio runtime
    pub fn start(self) -> CrawlHandle {
        let cancel = self.cancel.clone();
        let join = tokio::spawn(self.run());
        CrawlHandle { cancel, join }
    }

    /// Runs the crawl until the frontier drains or the crawl is cancelled
    ///
    /// Page-level failures are logged and counted; only an invalid start URL
    /// or a failing sink flush is returned as an error.
    pub async fn run(self) -> crate::Result<CrawlReport> {
        let started_at = Utc::now();
        let crawler = &self.config.crawler;

        tracing::info!(
            "Starting crawl of {} start URL(s) with {} concurrent requests",
            crawler.start_urls.len(),
            crawler.max_concurrent_requests
        );

        let mut stats = CrawlStats::new();
        let mut scheduler = Scheduler::new();

        for start_url in &crawler.start_urls {
            let url = Url::parse(start_url)?;
            self.schedule(&mut scheduler, &mut stats, url, PageKind::Listing);
        }

        let ctx = Arc::new(self.fetch_context());
        let semaphore = Arc::new(Semaphore::new(crawler.max_concurrent_requests.max(1) as usize));
        let mut tasks: JoinSet<TaskOutcome> = JoinSet::new();
        let mut pages_done: u64 = 0;

        let cancelled = loop {
            while !scheduler.is_empty() && !self.cancel.is_cancelled() {
                let Ok(permit) = Arc::clone(&semaphore).try_acquire_owned() else {
                    break;
                };
                let Some(task) = scheduler.next_task() else {
                    break;
                };

                tracing::debug!("Dispatching {:?} {}", task.kind, task.url);
                let ctx = Arc::clone(&ctx);
                tasks.spawn(async move {
                    let _permit = permit;
                    process_task(ctx, task).await
                });
            }

            if tasks.is_empty() {
                break self.cancel.is_cancelled();
            }

            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    tracing::info!("Crawl cancelled, aborting {} in-flight request(s)", tasks.len());
                    tasks.abort_all();
                    break true;
                }

                joined = tasks.join_next() => match joined {
                    Some(Ok(outcome)) => {
                        self.handle_outcome(outcome, &mut scheduler, &mut stats);
                        pages_done += 1;
                        if pages_done % PROGRESS_INTERVAL == 0 {
                            tracing::info!(
                                "Progress: {} pages done, {} items scraped, {} in frontier, {} in flight",
                                pages_done,
                                stats.items_scraped,
                                scheduler.frontier_size(),
                                tasks.len()
                            );
                        }
                    }
                    Some(Err(e)) => {
                        stats.fetch_errors += 1;
                        tracing::error!("{}", BooksError::Task(e.to_string()));
                    }
                    None => {}
                },
            }
        };

        // Reap aborted tasks; their results are discarded
        while tasks.join_next().await.is_some() {}

        self.sink.finish()?;

        let report = CrawlReport {
            started_at,
            finished_at: Utc::now(),
            cancelled,
            stats,
        };

        tracing::info!(
            "Crawl {}: {} items scraped, {} dropped, {} requests in {:.1}s",
            if cancelled { "cancelled" } else { "finished" },
            report.stats.items_scraped,
            report.stats.items_dropped,
            report.stats.requests,
            report.duration_seconds()
        );

        Ok(report)
    }

    fn fetch_context(&self) -> FetchContext {
        let crawler = &self.config.crawler;

        FetchContext {
            fetcher: Arc::clone(&self.fetcher),
            robots: crawler
                .obey_robots
                .then(|| RobotsCache::new(self.config.user_agent.crawler_name.clone())),
            politeness: DomainStates::new(Duration::from_millis(crawler.download_delay)),
            retry: RetryPolicy::from_config(crawler),
        }
    }

    /// Queues a URL after off-site and duplicate filtering
    fn schedule(&self, scheduler: &mut Scheduler, stats: &mut CrawlStats, url: Url, kind: PageKind) {
        if !is_allowed_url(&url, &self.config.crawler.allowed_domains) {
            tracing::debug!("Filtered offsite request to {}", url);
            stats.offsite_filtered += 1;
            return;
        }

        if !scheduler.enqueue(url, kind) {
            stats.duplicates_filtered += 1;
        }
    }

    /// Folds one task result into the frontier, the sink and the statistics
    fn handle_outcome(&self, outcome: TaskOutcome, scheduler: &mut Scheduler, stats: &mut CrawlStats) {
        stats.requests += u64::from(outcome.attempts);
        stats.retries += u64::from(outcome.attempts.saturating_sub(1));
        if let Some(status) = outcome.status {
            stats.record_response(status);
        }

        match outcome.result {
            Ok(Page::Listing(links)) => {
                stats.listing_pages += 1;
                tracing::debug!(
                    "Listing {} yielded {} detail link(s), next page: {}",
                    outcome.task.url,
                    links.detail_links.len(),
                    links
                        .next_page
                        .as_ref()
                        .map_or_else(|| "none".to_string(), Url::to_string)
                );

                for link in links.detail_links {
                    self.schedule(scheduler, stats, link, PageKind::Detail);
                }
                if let Some(next_page) = links.next_page {
                    self.schedule(scheduler, stats, next_page, PageKind::Listing);
                }
            }

            Ok(Page::Detail(record)) => {
                stats.detail_pages += 1;
                match self.sink.emit(&record) {
                    Ok(()) => {
                        stats.items_scraped += 1;
                        tracing::debug!("Scraped {:?} ({})", record.title, record.upc);
                    }
                    Err(e) => {
                        stats.items_dropped += 1;
                        tracing::warn!("Dropped record {}: {}", record.upc, BooksError::Output(e));
                    }
                }
            }

            Err(e) => {
                match &e {
                    BooksError::RobotsDenied { .. } => stats.robots_denied += 1,
                    BooksError::Fetch {
                        source: FetchError::Offsite(_),
                        ..
                    } => stats.offsite_filtered += 1,
                    BooksError::HtmlParse { .. } => stats.parse_errors += 1,
                    BooksError::Extract { .. } => {
                        stats.detail_pages += 1;
                        stats.items_dropped += 1;
                    }
                    _ => stats.fetch_errors += 1,
                }

                if matches!(e, BooksError::RobotsDenied { .. }) {
                    tracing::info!("{}", e);
                } else {
                    tracing::warn!("Skipping {:?} page: {}", outcome.task.kind, e);
                }
            }
        }
    }
}

/// Fetches and parses one page
///
/// Steps: robots.txt check, fetch with retries (each attempt waits for its
/// politeness slot), parse.
async fn process_task(ctx: Arc<FetchContext>, task: CrawlTask) -> TaskOutcome {
    let mut crawl_delay = None;

    if let Some(robots) = &ctx.robots {
        let rules = robots.rules_for(ctx.fetcher.as_ref(), &task.url).await;
        if !rules.is_allowed(task.url.as_str(), robots.agent()) {
            let url = task.url.to_string();
            return TaskOutcome {
                task,
                attempts: 0,
                status: None,
                result: Err(BooksError::RobotsDenied { url }),
            };
        }
        crawl_delay = rules.crawl_delay(robots.agent());
    }

    let attempt = fetch_with_retry(
        ctx.fetcher.as_ref(),
        &task.url,
        &ctx.retry,
        &ctx.politeness,
        crawl_delay,
    )
    .await;
    let attempts = attempt.retries + 1;

    let page = match attempt.result {
        Ok(page) => page,
        Err(source) => {
            let url = task.url.to_string();
            return TaskOutcome {
                task,
                attempts,
                status: None,
                result: Err(BooksError::Fetch { url, source }),
            };
        }
    };

    TaskOutcome {
        status: Some(page.status),
        result: parse_page(task.kind, &page),
        task,
        attempts,
    }
}

/// Parses a fetched body according to the expected page kind
fn parse_page(kind: PageKind, page: &FetchedPage) -> Result<Page, BooksError> {
    if !page.is_html() {
        return Err(BooksError::HtmlParse {
            url: page.final_url.to_string(),
            message: format!(
                "unexpected content type {}",
                page.content_type.as_deref().unwrap_or_default()
            ),
        });
    }

    if page.body.trim().is_empty() {
        return Err(BooksError::HtmlParse {
            url: page.final_url.to_string(),
            message: "empty body".to_string(),
        });
    }

    let document = Html::parse_document(&page.body);
    match kind {
        PageKind::Listing => Ok(Page::Listing(discover_links(&document, &page.final_url))),
        PageKind::Detail => extract_book(&document)
            .map(Page::Detail)
            .map_err(|source| BooksError::Extract {
                url: page.final_url.to_string(),
                source,
            }),
    }
}
