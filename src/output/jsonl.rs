//! JSON Lines sink: one serialized record per line

use crate::catalog::BookRecord;
use crate::output::traits::{BookSink, OutputError, OutputResult};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

/// Appends records to a file as JSON Lines
pub struct JsonLinesSink {
    writer: Mutex<BufWriter<File>>,
}

impl JsonLinesSink {
    /// Creates (or truncates) the output file
    pub fn create(path: &Path) -> OutputResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    fn lock(&self) -> OutputResult<std::sync::MutexGuard<'_, BufWriter<File>>> {
        self.writer
            .lock()
            .map_err(|e| OutputError::Write(format!("Failed to lock writer: {}", e)))
    }
}

impl BookSink for JsonLinesSink {
    fn emit(&self, record: &BookRecord) -> OutputResult<()> {
        let line = serde_json::to_string(record)?;
        let mut writer = self.lock()?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&self) -> OutputResult<()> {
        self.lock()?.flush()?;
        Ok(())
    }
}
