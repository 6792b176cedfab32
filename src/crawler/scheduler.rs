//! Scheduler for managing the crawl frontier
//!
//! This module handles:
//! - Priority queue management for pages to crawl
//! - Duplicate request filtering by URL fingerprint
//!
//! Detail pages are served before listing pages so extracted records flow
//! out while pagination continues. Within one kind, tasks are served in the
//! order they were enqueued.

use crate::url::fingerprint_url;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use url::Url;

/// What a fetched page is expected to contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageKind {
    /// A catalog page with product cards and a pager
    Listing,

    /// A single book page
    Detail,
}

impl PageKind {
    /// Higher values are served first
    fn priority(self) -> u8 {
        match self {
            PageKind::Detail => 1,
            PageKind::Listing => 0,
        }
    }
}

/// A page queued for fetching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    pub url: Url,
    pub kind: PageKind,
}

#[derive(Debug)]
struct QueuedTask {
    task: CrawlTask,

    /// Insertion order, used as the FIFO tie-breaker
    seq: u64,
}

// BinaryHeap is a max-heap: higher priority first, then lower sequence first
impl Ord for QueuedTask {
    fn cmp(&self, other: &Self) -> Ordering {
        self.task
            .kind
            .priority()
            .cmp(&other.task.kind.priority())
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueuedTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueuedTask {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for QueuedTask {}

/// Frontier queue plus the set of every URL ever enqueued
#[derive(Debug, Default)]
pub struct Scheduler {
    frontier: BinaryHeap<QueuedTask>,

    /// Fingerprints of all URLs accepted so far
    seen: HashSet<String>,

    next_seq: u64,
}

impl Scheduler {
    /// Creates an empty scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a URL to the frontier unless it was seen before
    ///
    /// # Returns
    ///
    /// * `true` - The URL was queued
    /// * `false` - The URL is a duplicate or cannot be fingerprinted
    pub fn enqueue(&mut self, url: Url, kind: PageKind) -> bool {
        let fingerprint = match fingerprint_url(&url) {
            Ok(fingerprint) => fingerprint,
            Err(e) => {
                tracing::debug!("Not scheduling {}: {}", url, e);
                return false;
            }
        };

        if !self.seen.insert(fingerprint) {
            tracing::trace!("Filtered duplicate request: {}", url);
            return false;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.frontier.push(QueuedTask {
            task: CrawlTask { url, kind },
            seq,
        });

        true
    }

    /// Pops the highest-priority task
    pub fn next_task(&mut self) -> Option<CrawlTask> {
        self.frontier.pop().map(|queued| queued.task)
    }

    /// Returns the number of tasks in the frontier
    pub fn frontier_size(&self) -> usize {
        self.frontier.len()
    }

    /// Returns whether the frontier is empty
    pub fn is_empty(&self) -> bool {
        self.frontier.is_empty()
    }

    /// Number of distinct URLs accepted so far
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(path: &str) -> Url {
        Url::parse(&format!("https://books.toscrape.com{}", path)).unwrap()
    }

    #[test]
    fn test_new_scheduler() {
        let scheduler = Scheduler::new();
        assert_eq!(scheduler.frontier_size(), 0);
        assert!(scheduler.is_empty());
        assert_eq!(scheduler.seen_count(), 0);
    }

    #[test]
    fn test_detail_before_listing() {
        let mut scheduler = Scheduler::new();
        scheduler.enqueue(url("/catalogue/page-2.html"), PageKind::Listing);
        scheduler.enqueue(url("/catalogue/book_1/index.html"), PageKind::Detail);

        assert_eq!(scheduler.next_task().unwrap().kind, PageKind::Detail);
        assert_eq!(scheduler.next_task().unwrap().kind, PageKind::Listing);
        assert!(scheduler.next_task().is_none());
    }

    #[test]
    fn test_fifo_within_kind() {
        let mut scheduler = Scheduler::new();
        for i in 0..5 {
            scheduler.enqueue(url(&format!("/catalogue/book_{}/index.html", i)), PageKind::Detail);
        }

        let order: Vec<String> = std::iter::from_fn(|| scheduler.next_task())
            .map(|task| task.url.path().to_string())
            .collect();
        assert_eq!(
            order,
            (0..5)
                .map(|i| format!("/catalogue/book_{}/index.html", i))
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_duplicates_rejected() {
        let mut scheduler = Scheduler::new();
        assert!(scheduler.enqueue(url("/catalogue/book_1/index.html"), PageKind::Detail));
        assert!(!scheduler.enqueue(url("/catalogue/book_1/index.html"), PageKind::Detail));
        assert!(!scheduler.enqueue(url("/catalogue/book_1/index.html#reviews"), PageKind::Detail));
        assert!(!scheduler.enqueue(
            Url::parse("https://BOOKS.toscrape.com/catalogue/book_1/index.html").unwrap(),
            PageKind::Detail
        ));

        assert_eq!(scheduler.frontier_size(), 1);
        assert_eq!(scheduler.seen_count(), 1);
    }

    #[test]
    fn test_popped_url_stays_seen() {
        let mut scheduler = Scheduler::new();
        scheduler.enqueue(url("/"), PageKind::Listing);
        scheduler.next_task();

        assert!(!scheduler.enqueue(url("/"), PageKind::Listing));
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_non_http_rejected() {
        let mut scheduler = Scheduler::new();
        let ftp = Url::parse("ftp://books.toscrape.com/file").unwrap();
        assert!(!scheduler.enqueue(ftp, PageKind::Listing));
        assert!(scheduler.is_empty());
    }
}
