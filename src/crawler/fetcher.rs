//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the configured user agent and timeouts
//! - Following redirects up to a configured limit, never off the allow-list
//! - Classifying failures into transient and permanent ones
//! - Retrying transient failures with exponential backoff

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::state::DomainStates;
use crate::url::{extract_domain, is_allowed_url};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::error::Error as _;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// HTTP status codes worth another attempt
const RETRY_STATUS_CODES: &[u16] = &[408, 429, 500, 502, 503, 504, 522, 524];

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects; relative links resolve against it
    pub final_url: Url,

    /// HTTP status code
    pub status: u16,

    /// Content-Type header value, if sent
    pub content_type: Option<String>,

    /// Decoded page body
    pub body: String,
}

impl FetchedPage {
    /// Returns true unless the server declared a non-HTML content type
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .map_or(true, |ct| ct.contains("text/html") || ct.contains("application/xhtml"))
    }
}

/// Reasons a fetch did not produce a page
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("redirect error: {0}")]
    Redirect(String),

    #[error("redirect to disallowed host: {0}")]
    Offsite(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("failed to read body: {0}")]
    Body(String),
}

impl FetchError {
    /// Returns true if retrying the same request may succeed
    ///
    /// | Condition | Transient |
    /// |-----------|-----------|
    /// | Timeout | yes |
    /// | Connection failure | yes |
    /// | HTTP 408, 429, 500, 502, 503, 504, 522, 524 | yes |
    /// | Other HTTP status (404, 403, ...) | no |
    /// | Redirect loop or limit | no |
    /// | Redirect to a disallowed host | no |
    /// | Body read failure | yes |
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::Connect(_) | Self::Body(_) => true,
            Self::Status(code) => RETRY_STATUS_CODES.contains(code),
            Self::Redirect(_) | Self::Offsite(_) | Self::Network(_) => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if e.is_redirect() {
            match e.source().and_then(|source| source.downcast_ref::<RedirectRefused>()) {
                Some(RedirectRefused::Offsite(target)) => Self::Offsite(target.to_string()),
                _ => Self::Redirect(e.to_string()),
            }
        } else if e.is_body() || e.is_decode() {
            Self::Body(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

/// Why the redirect policy stopped a redirect chain
#[derive(Debug, Error)]
enum RedirectRefused {
    #[error("too many redirects (limit {0})")]
    TooMany(usize),

    #[error("redirect to disallowed host: {0}")]
    Offsite(Url),
}

/// Follows at most `max_redirects` hops and only to allowed domains
fn redirect_policy(crawler: &CrawlerConfig) -> Policy {
    let max_redirects = crawler.max_redirects;
    let allowed_domains = crawler.allowed_domains.clone();

    Policy::custom(move |attempt| {
        if attempt.previous().len() >= max_redirects {
            attempt.error(RedirectRefused::TooMany(max_redirects))
        } else if !is_allowed_url(attempt.url(), &allowed_domains) {
            let target = attempt.url().clone();
            attempt.error(RedirectRefused::Offsite(target))
        } else {
            attempt.follow()
        }
    })
}

/// Something that turns a URL into a page
///
/// The crawler only talks to the network through this trait, so tests and
/// embedding applications can substitute their own transport.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches one URL; non-success statuses are errors
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `crawler` - Timeouts, redirect limit and allowed domains
/// * `user_agent` - Identification sent with every request
///
/// # Example
///
/// ```no_run
/// use books_crawler::config::Config;
/// use books_crawler::crawler::build_http_client;
///
/// let config = Config::default();
/// let client = build_http_client(&config.crawler, &config.user_agent).unwrap();
/// ```
pub fn build_http_client(
    crawler: &CrawlerConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(crawler.request_timeout))
        .connect_timeout(Duration::from_secs(crawler.request_timeout.min(10)))
        .redirect(redirect_policy(crawler))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`PageFetcher`] backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Builds a fetcher with a client configured from the crawler settings
    pub fn new(crawler: &CrawlerConfig, user_agent: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(crawler, user_agent)?,
        })
    }

    /// Wraps an existing client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response.text().await?;

        Ok(FetchedPage {
            final_url,
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}

/// Retry settings for transient failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Delay before the first retry; doubled for each further retry
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Reads the policy from crawler settings
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.retry_backoff),
        }
    }

    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (0-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.backoff.saturating_mul(2u32.saturating_pow(retry))
    }
}

/// Result of a fetch with retries
#[derive(Debug)]
pub struct FetchAttempt {
    pub result: Result<FetchedPage, FetchError>,

    /// Retries performed (0 when the first attempt settled it)
    pub retries: u32,
}

/// Fetches a URL, retrying transient failures per `policy`
///
/// Every attempt, retries included, first waits for its own politeness slot
/// on the URL's domain.
pub async fn fetch_with_retry(
    fetcher: &dyn PageFetcher,
    url: &Url,
    policy: &RetryPolicy,
    politeness: &DomainStates,
    crawl_delay: Option<f64>,
) -> FetchAttempt {
    let domain = extract_domain(url).unwrap_or_default();
    let mut retries = 0;

    loop {
        politeness.wait_turn(&domain, crawl_delay).await;

        match fetcher.fetch(url).await {
            Ok(page) => {
                return FetchAttempt {
                    result: Ok(page),
                    retries,
                }
            }
            Err(e) if e.is_transient() && retries < policy.max_retries => {
                let delay = policy.delay_for(retries);
                retries += 1;
                tracing::debug!(
                    "Retrying {} ({}/{}) in {:?}: {}",
                    url,
                    retries,
                    policy.max_retries,
                    delay,
                    e
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                return FetchAttempt {
                    result: Err(e),
                    retries,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Instant;

    /// Replays a fixed sequence of results
    struct ScriptedFetcher {
        script: Mutex<VecDeque<Result<(), FetchError>>>,
        calls: Mutex<Vec<Instant>>,
    }

    impl ScriptedFetcher {
        fn new(script: Vec<Result<(), FetchError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.lock().unwrap().len() as u32
        }

        fn call_times(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageFetcher for ScriptedFetcher {
        async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
            self.calls.lock().unwrap().push(Instant::now());
            let next = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(FetchError::Status(500)));
            next.map(|()| FetchedPage {
                final_url: url.clone(),
                status: 200,
                content_type: Some("text/html".to_string()),
                body: "<html></html>".to_string(),
            })
        }
    }

    fn url() -> Url {
        Url::parse("https://books.toscrape.com/").unwrap()
    }

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            backoff: Duration::from_millis(1),
        }
    }

    fn no_delay() -> DomainStates {
        DomainStates::new(Duration::ZERO)
    }

    #[test]
    fn test_build_http_client() {
        let config = Config::default();
        assert!(build_http_client(&config.crawler, &config.user_agent).is_ok());
        assert!(HttpFetcher::new(&config.crawler, &config.user_agent).is_ok());
    }

    #[test]
    fn test_transient_classification() {
        assert!(FetchError::Timeout.is_transient());
        assert!(FetchError::Connect("refused".into()).is_transient());
        assert!(FetchError::Status(503).is_transient());
        assert!(FetchError::Status(429).is_transient());
        assert!(!FetchError::Status(404).is_transient());
        assert!(!FetchError::Status(403).is_transient());
        assert!(!FetchError::Redirect("loop".into()).is_transient());
        assert!(!FetchError::Offsite("https://elsewhere.com/".into()).is_transient());
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy {
            max_retries: 3,
            backoff: Duration::from_millis(500),
        };
        assert_eq!(policy.delay_for(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
        assert_eq!(RetryPolicy::none().delay_for(5), Duration::ZERO);
    }

    #[test]
    fn test_is_html() {
        let mut page = FetchedPage {
            final_url: url(),
            status: 200,
            content_type: Some("text/html; charset=utf-8".to_string()),
            body: String::new(),
        };
        assert!(page.is_html());

        page.content_type = None;
        assert!(page.is_html());

        page.content_type = Some("application/json".to_string());
        assert!(!page.is_html());
    }

    #[tokio::test]
    async fn test_retry_then_succeed() {
        let fetcher = ScriptedFetcher::new(vec![
            Err(FetchError::Status(503)),
            Err(FetchError::Timeout),
            Ok(()),
        ]);
        let attempt = fetch_with_retry(&fetcher, &url(), &fast_policy(2), &no_delay(), None).await;
        assert!(attempt.result.is_ok());
        assert_eq!(attempt.retries, 2);
        assert_eq!(fetcher.calls(), 3);
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let fetcher = ScriptedFetcher::new(vec![
            Err(FetchError::Status(500)),
            Err(FetchError::Status(500)),
            Err(FetchError::Status(500)),
        ]);
        let attempt = fetch_with_retry(&fetcher, &url(), &fast_policy(2), &no_delay(), None).await;
        assert_eq!(attempt.result.unwrap_err(), FetchError::Status(500));
        assert_eq!(attempt.retries, 2);
        assert_eq!(fetcher.calls(), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let fetcher = ScriptedFetcher::new(vec![Err(FetchError::Status(404)), Ok(())]);
        let attempt = fetch_with_retry(&fetcher, &url(), &fast_policy(3), &no_delay(), None).await;
        assert_eq!(attempt.result.unwrap_err(), FetchError::Status(404));
        assert_eq!(attempt.retries, 0);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_retry_waits_for_domain_delay() {
        let fetcher = ScriptedFetcher::new(vec![Err(FetchError::Status(503)), Ok(())]);
        let politeness = DomainStates::new(Duration::from_millis(100));

        let attempt = fetch_with_retry(&fetcher, &url(), &fast_policy(1), &politeness, None).await;

        assert!(attempt.result.is_ok());
        assert_eq!(attempt.retries, 1);
        let times = fetcher.call_times();
        assert_eq!(times.len(), 2);
        assert!(times[1] - times[0] >= Duration::from_millis(100));
        assert_eq!(politeness.request_count("books.toscrape.com"), 2);
    }
}
