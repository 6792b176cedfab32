//! Crawl statistics collected by the driver and printed at the end of a run

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Counters updated by the crawl driver
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStats {
    /// Requests issued, robots.txt excluded
    pub requests: u64,

    /// Successful responses by HTTP status code
    pub responses_by_status: BTreeMap<u16, u64>,

    /// Listing pages parsed
    pub listing_pages: u64,

    /// Detail pages parsed
    pub detail_pages: u64,

    /// Records handed to the sink successfully
    pub items_scraped: u64,

    /// Records that failed extraction or could not be written
    pub items_dropped: u64,

    /// Pages whose fetch failed after all retries
    pub fetch_errors: u64,

    /// Pages with an empty or non-HTML body
    pub parse_errors: u64,

    /// Retries performed across all pages
    pub retries: u64,

    /// URLs skipped because robots.txt disallowed them
    pub robots_denied: u64,

    /// Links dropped for pointing outside the allowed domains
    pub offsite_filtered: u64,

    /// Links dropped as already scheduled
    pub duplicates_filtered: u64,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful response
    pub fn record_response(&mut self, status: u16) {
        *self.responses_by_status.entry(status).or_insert(0) += 1;
    }

    /// Total number of pages that produced no usable result
    pub fn total_errors(&self) -> u64 {
        self.fetch_errors + self.parse_errors + self.items_dropped
    }
}

/// Final outcome of a crawl
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// True if the crawl stopped on cancellation rather than draining
    pub cancelled: bool,

    pub stats: CrawlStats,
}

impl CrawlReport {
    /// Wall-clock duration of the crawl in seconds
    pub fn duration_seconds(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }

    /// Records scraped per minute
    pub fn items_per_minute(&self) -> f64 {
        let seconds = self.duration_seconds();
        if seconds <= 0.0 {
            return 0.0;
        }
        self.stats.items_scraped as f64 * 60.0 / seconds
    }
}

/// Prints the report to stdout in a formatted manner
pub fn print_report(report: &CrawlReport) {
    let stats = &report.stats;

    println!("=== Crawl Statistics ===\n");

    println!("Run:");
    println!("  Started:  {}", report.started_at.to_rfc3339());
    println!("  Finished: {}", report.finished_at.to_rfc3339());
    println!("  Duration: {:.1}s", report.duration_seconds());
    println!(
        "  Status:   {}",
        if report.cancelled { "cancelled" } else { "finished" }
    );
    println!();

    println!("Requests:");
    println!("  Issued: {}", stats.requests);
    println!("  Retries: {}", stats.retries);
    for (status, count) in &stats.responses_by_status {
        println!("  HTTP {}: {}", status, count);
    }
    println!();

    println!("Pages:");
    println!("  Listing pages: {}", stats.listing_pages);
    println!("  Detail pages: {}", stats.detail_pages);
    println!();

    println!("Items:");
    println!("  Scraped: {}", stats.items_scraped);
    println!("  Dropped: {}", stats.items_dropped);
    println!("  Rate: {:.1} items/min", report.items_per_minute());
    println!();

    if stats.total_errors() > 0 || stats.robots_denied > 0 {
        println!("Errors:");
        println!("  Fetch errors: {}", stats.fetch_errors);
        println!("  Parse errors: {}", stats.parse_errors);
        println!("  Robots denied: {}", stats.robots_denied);
        println!();
    }

    println!("Filtered:");
    println!("  Offsite: {}", stats.offsite_filtered);
    println!("  Duplicates: {}", stats.duplicates_filtered);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_response() {
        let mut stats = CrawlStats::new();
        stats.record_response(200);
        stats.record_response(200);
        stats.record_response(203);

        assert_eq!(stats.responses_by_status.get(&200), Some(&2));
        assert_eq!(stats.responses_by_status.get(&203), Some(&1));
    }

    #[test]
    fn test_total_errors() {
        let stats = CrawlStats {
            fetch_errors: 2,
            parse_errors: 1,
            items_dropped: 3,
            robots_denied: 5,
            ..CrawlStats::default()
        };
        assert_eq!(stats.total_errors(), 6);
    }

    #[test]
    fn test_report_rates() {
        let started_at = Utc::now();
        let report = CrawlReport {
            started_at,
            finished_at: started_at + chrono::Duration::seconds(30),
            cancelled: false,
            stats: CrawlStats {
                items_scraped: 10,
                ..CrawlStats::default()
            },
        };

        assert_eq!(report.duration_seconds(), 30.0);
        assert_eq!(report.items_per_minute(), 20.0);
    }

    #[test]
    fn test_zero_duration_rate() {
        let now = Utc::now();
        let report = CrawlReport {
            started_at: now,
            finished_at: now,
            cancelled: true,
            stats: CrawlStats::new(),
        };
        assert_eq!(report.items_per_minute(), 0.0);
    }

    #[test]
    fn test_report_serializes() {
        let now = Utc::now();
        let report = CrawlReport {
            started_at: now,
            finished_at: now,
            cancelled: false,
            stats: CrawlStats::new(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["cancelled"], false);
        assert_eq!(json["stats"]["items_scraped"], 0);
    }
}
