//! Per-origin robots.txt cache
//!
//! robots.txt is fetched at most once per origin for the lifetime of a crawl.

use crate::crawler::PageFetcher;
use crate::robots::ParsedRobots;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use url::Url;

/// Lazily populated robots.txt rules keyed by origin
pub struct RobotsCache {
    /// Product token matched against `User-agent` lines
    agent: String,

    entries: Mutex<HashMap<String, Arc<ParsedRobots>>>,
}

impl RobotsCache {
    /// Creates an empty cache for the given user agent token
    pub fn new(agent: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The user agent token rules are evaluated for
    pub fn agent(&self) -> &str {
        &self.agent
    }

    /// Returns the rules for the URL's origin, fetching robots.txt on first use
    ///
    /// Any fetch failure (missing file, server error, network error) falls
    /// back to allow-all.
    pub async fn rules_for(&self, fetcher: &dyn PageFetcher, url: &Url) -> Arc<ParsedRobots> {
        let origin = url.origin().ascii_serialization();

        // Held across the fetch: one robots.txt request per origin
        let mut entries = self.entries.lock().await;
        if let Some(rules) = entries.get(&origin) {
            return Arc::clone(rules);
        }

        let rules = Arc::new(fetch_rules(fetcher, url).await);
        entries.insert(origin, Arc::clone(&rules));
        rules
    }

    /// Checks a URL against its origin's robots.txt
    pub async fn is_allowed(&self, fetcher: &dyn PageFetcher, url: &Url) -> bool {
        self.rules_for(fetcher, url)
            .await
            .is_allowed(url.as_str(), &self.agent)
    }

    /// Number of origins cached so far
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Returns true if no origin has been looked up yet
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

async fn fetch_rules(fetcher: &dyn PageFetcher, url: &Url) -> ParsedRobots {
    let robots_url = match url.join("/robots.txt") {
        Ok(robots_url) => robots_url,
        Err(e) => {
            tracing::debug!("Cannot build robots.txt URL for {}: {}", url, e);
            return ParsedRobots::allow_all();
        }
    };

    tracing::debug!("Fetching {}", robots_url);
    match fetcher.fetch(&robots_url).await {
        Ok(page) => ParsedRobots::from_content(&page.body),
        Err(e) => {
            tracing::debug!("No usable robots.txt at {} ({}), allowing all", robots_url, e);
            ParsedRobots::allow_all()
        }
    }
}
