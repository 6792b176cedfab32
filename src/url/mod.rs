//! URL handling module for Books-Crawler
//!
//! This module provides domain extraction, allow-list matching, and request
//! fingerprints for duplicate filtering.

mod fingerprint;
mod matcher;

pub use fingerprint::{fingerprint_url, request_fingerprint};
pub use matcher::matches_domain;

use url::Url;

/// Extracts the lowercase host of a URL
///
/// Returns None if the URL has no host.
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Checks a domain against the allow-list
///
/// An empty allow-list permits every domain.
///
/// # Examples
///
/// ```
/// use books_crawler::url::is_allowed_domain;
///
/// let allowed = vec!["books.toscrape.com".to_string()];
/// assert!(is_allowed_domain("books.toscrape.com", &allowed));
/// assert!(!is_allowed_domain("quotes.toscrape.com", &allowed));
/// assert!(is_allowed_domain("anything.example", &[]));
/// ```
pub fn is_allowed_domain(domain: &str, allowed: &[String]) -> bool {
    allowed.is_empty() || allowed.iter().any(|pattern| matches_domain(pattern, domain))
}

/// Checks a URL against the allow-list; URLs without a host are rejected
pub fn is_allowed_url(url: &Url, allowed: &[String]) -> bool {
    extract_domain(url).is_some_and(|domain| is_allowed_domain(&domain, allowed))
}
