//! Robots.txt handling module
//!
//! This module provides fetching, parsing, and caching of robots.txt files so
//! the crawler honors `Disallow` rules and `Crawl-delay` directives.

mod cache;
mod parser;

pub use cache::RobotsCache;
pub use parser::ParsedRobots;
