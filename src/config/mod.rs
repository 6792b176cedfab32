//! Configuration module for Books-Crawler
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! When no file is given, [`Config::default`] targets books.toscrape.com.
//!
//! # Example
//!
//! ```no_run
//! use books_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawler.toml")).unwrap();
//! println!("Crawler will start from: {:?}", config.crawler.start_urls);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, OutputFormat, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
