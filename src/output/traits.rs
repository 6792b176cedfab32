//! Output sink trait and error types

use crate::catalog::BookRecord;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for extracted book records
///
/// Sinks receive records from the crawl driver in completion order.
/// Implementations must be thread-safe.
pub trait BookSink: Send + Sync {
    /// Stores one record
    ///
    /// # Arguments
    ///
    /// * `record` - A fully extracted book
    fn emit(&self, record: &BookRecord) -> OutputResult<()>;

    /// Flushes buffered output; called once when the crawl ends
    fn finish(&self) -> OutputResult<()> {
        Ok(())
    }
}

impl<S: BookSink + ?Sized> BookSink for std::sync::Arc<S> {
    fn emit(&self, record: &BookRecord) -> OutputResult<()> {
        (**self).emit(record)
    }

    fn finish(&self) -> OutputResult<()> {
        (**self).finish()
    }
}
