//! SQLite sink implementation
//!
//! Records are stored in a `books` table keyed by UPC. Emitting a UPC that
//! already exists replaces the stored row.

use crate::catalog::{BookRecord, Rating};
use crate::output::traits::{BookSink, OutputError, OutputResult};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQL schema for the books table
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS books (
    upc TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    price REAL NOT NULL,
    amount_in_stock INTEGER NOT NULL,
    rating INTEGER,
    category TEXT NOT NULL,
    description TEXT,
    scraped_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_books_category ON books(category);
"#;

/// Stores records in a SQLite database
pub struct SqliteSink {
    conn: Mutex<Connection>,
}

impl SqliteSink {
    /// Opens or creates the database at `path` and initializes the schema
    pub fn open(path: &Path) -> OutputResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;

        Self::with_connection(conn)
    }

    /// Creates an in-memory database
    pub fn in_memory() -> OutputResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> OutputResult<Self> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> OutputResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| OutputError::Write(format!("Failed to lock database: {}", e)))
    }

    /// Number of stored books
    pub fn count(&self) -> OutputResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Loads one book by UPC
    pub fn get(&self, upc: &str) -> OutputResult<Option<BookRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT title, price, amount_in_stock, rating, category, description, upc
             FROM books WHERE upc = ?1",
        )?;

        let mut rows = stmt.query(params![upc])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };

        let rating: Option<u8> = row.get(3)?;
        Ok(Some(BookRecord {
            title: row.get(0)?,
            price: row.get(1)?,
            amount_in_stock: row.get(2)?,
            rating: rating.and_then(Rating::from_value),
            category: row.get(4)?,
            description: row.get(5)?,
            upc: row.get(6)?,
        }))
    }
}

impl BookSink for SqliteSink {
    fn emit(&self, record: &BookRecord) -> OutputResult<()> {
        let now = chrono::Utc::now().to_rfc3339();
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO books
                (upc, title, price, amount_in_stock, rating, category, description, scraped_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.upc,
                record.title,
                record.price,
                record.amount_in_stock,
                record.rating.map(|r| r.value()),
                record.category,
                record.description,
                now,
            ],
        )?;
        Ok(())
    }

    fn finish(&self) -> OutputResult<()> {
        let conn = self.lock()?;
        conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
