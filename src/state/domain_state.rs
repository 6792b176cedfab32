use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Tracks the politeness state of a domain during crawling
///
/// Each request reserves a start slot. Slots for one domain are spaced by
/// the effective delay and never move backwards.
#[derive(Debug, Clone, Default)]
pub struct DomainState {
    /// Number of requests reserved for this domain in the current crawl
    pub request_count: u32,

    /// Earliest instant the next request may start
    pub next_slot: Option<Instant>,
}

impl DomainState {
    /// Creates a new DomainState with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves the next request slot and returns how long to wait for it
    ///
    /// # Arguments
    ///
    /// * `delay` - Minimum spacing between request starts for this domain
    /// * `now` - The current time instant
    pub fn reserve(&mut self, delay: Duration, now: Instant) -> Duration {
        let start = match self.next_slot {
            Some(slot) if slot > now => slot,
            _ => now,
        };

        self.next_slot = Some(start + delay);
        self.request_count += 1;

        start - now
    }

    /// Calculates the time until the next request can be made
    ///
    /// Returns None if a request can be made now, or the duration to wait otherwise.
    pub fn time_until_next_request(&self, now: Instant) -> Option<Duration> {
        self.next_slot
            .filter(|slot| *slot > now)
            .map(|slot| slot - now)
    }
}

/// Per-domain politeness shared by all fetch tasks
#[derive(Debug)]
pub struct DomainStates {
    /// Configured delay between requests to one domain
    download_delay: Duration,

    domains: Mutex<HashMap<String, DomainState>>,
}

impl DomainStates {
    pub fn new(download_delay: Duration) -> Self {
        Self {
            download_delay,
            domains: Mutex::new(HashMap::new()),
        }
    }

    /// The larger of the configured delay and a robots.txt `Crawl-delay` (seconds)
    pub fn effective_delay(&self, crawl_delay: Option<f64>) -> Duration {
        let robots_delay = crawl_delay
            .filter(|seconds| seconds.is_finite() && *seconds > 0.0)
            .map(Duration::from_secs_f64)
            .unwrap_or(Duration::ZERO);

        std::cmp::max(self.download_delay, robots_delay)
    }

    /// Reserves a slot for `domain` and returns the wait before it starts
    pub fn reserve(&self, domain: &str, crawl_delay: Option<f64>) -> Duration {
        let delay = self.effective_delay(crawl_delay);
        let mut domains = self
            .domains
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        domains
            .entry(domain.to_string())
            .or_default()
            .reserve(delay, Instant::now())
    }

    /// Reserves a slot for `domain` and sleeps until it starts
    pub async fn wait_turn(&self, domain: &str, crawl_delay: Option<f64>) {
        let wait = self.reserve(domain, crawl_delay);
        if !wait.is_zero() {
            tracing::trace!("Waiting {:?} before requesting {}", wait, domain);
            tokio::time::sleep(wait).await;
        }
    }

    /// Number of requests reserved for `domain` so far
    pub fn request_count(&self, domain: &str) -> u32 {
        self.domains
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(domain)
            .map_or(0, |state| state.request_count)
    }
}
