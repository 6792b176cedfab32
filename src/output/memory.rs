//! In-memory sink for library callers and tests

use crate::catalog::BookRecord;
use crate::output::traits::{BookSink, OutputError, OutputResult};
use std::sync::Mutex;

/// Collects records in emission order
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<BookRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every record emitted so far
    pub fn records(&self) -> Vec<BookRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map_or(0, |records| records.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BookSink for MemorySink {
    fn emit(&self, record: &BookRecord) -> OutputResult<()> {
        self.records
            .lock()
            .map_err(|e| OutputError::Write(format!("Failed to lock records: {}", e)))?
            .push(record.clone());
        Ok(())
    }
}
