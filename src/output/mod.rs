//! Output module for book records and crawl reports
//!
//! This module handles:
//! - Writing records as JSON Lines or into a SQLite table
//! - Collecting records in memory
//! - Recording and printing crawl statistics

mod jsonl;
mod memory;
mod sqlite_output;
pub mod stats;
mod traits;

pub use jsonl::JsonLinesSink;
pub use memory::MemorySink;
pub use sqlite_output::SqliteSink;
pub use stats::{print_report, CrawlReport, CrawlStats};
pub use traits::{BookSink, OutputError, OutputResult};

use crate::config::{OutputConfig, OutputFormat};
use std::path::Path;
use std::sync::Arc;

/// Creates the sink selected by the output configuration
///
/// # Arguments
///
/// * `config` - Output format and destination path
///
/// # Returns
///
/// * `Ok(Arc<dyn BookSink>)` - The opened sink
/// * `Err(OutputError)` - The destination could not be created
pub fn open_sink(config: &OutputConfig) -> OutputResult<Arc<dyn BookSink>> {
    let path = Path::new(&config.path);
    tracing::info!("Writing {} output to {}", config.format, path.display());

    Ok(match config.format {
        OutputFormat::Jsonl => Arc::new(JsonLinesSink::create(path)?),
        OutputFormat::Sqlite => Arc::new(SqliteSink::open(path)?),
    })
}
