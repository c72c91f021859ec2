//! The five-column row table that records are persisted into.
//!
//! Column layout (1-based, as seen in the spreadsheet):
//!
//! | # | Content                               |
//! |---|---------------------------------------|
//! | 1 | identifier                            |
//! | 2 | display name                          |
//! | 3 | image reference (URL)                 |
//! | 4 | last modified, `YYYY-MM-DD HH:MM:SS`  |
//! | 5 | JSON blob of the full sections tree   |
//!
//! Row 1 is a header (`ID`, `氏名`, `画像URL`, `更新日時`, `全データJSON`)
//! and is never read or written here. Data rows are addressed by zero-based
//! index, so data row `i` lives on sheet row `i + 2`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StoreError;

/// Number of columns a record row occupies.
pub const COLUMN_COUNT: usize = 5;

pub const COL_ID: usize = 0;
pub const COL_NAME: usize = 1;
pub const COL_IMAGE: usize = 2;
pub const COL_MODIFIED: usize = 3;
pub const COL_BLOB: usize = 4;

/// One data row as read from the table. May be shorter than
/// [`COLUMN_COUNT`] when trailing cells are empty.
pub type Row = Vec<String>;

/// Read a cell, treating a missing trailing cell as empty.
pub fn cell(row: &[String], column: usize) -> &str {
    row.get(column).map(String::as_str).unwrap_or_default()
}

/// Values of columns 2-5. Column 1 (the identifier) is never rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowValues {
    pub display_name: String,
    pub image_reference: String,
    pub last_modified: String,
    pub blob: String,
}

impl RowValues {
    pub fn to_cells(&self) -> Vec<String> {
        vec![
            self.display_name.clone(),
            self.image_reference.clone(),
            self.last_modified.clone(),
            self.blob.clone(),
        ]
    }

    /// Full row including the identifier, for appends.
    pub fn to_row(&self, id: &str) -> Row {
        let mut row = Vec::with_capacity(COLUMN_COUNT);
        row.push(id.to_string());
        row.extend(self.to_cells());
        row
    }
}

/// Minimal row-level access to the backing table.
#[async_trait]
pub trait TabularStore: Send + Sync {
    /// All data rows in table order, header excluded.
    async fn read_rows(&self) -> Result<Vec<Row>, StoreError>;

    /// Overwrite columns 2-5 of data row `index` in place.
    async fn update_row(&self, index: usize, values: &RowValues) -> Result<(), StoreError>;

    /// Append a new row after the last data row.
    async fn append_row(&self, id: &str, values: &RowValues) -> Result<(), StoreError>;
}

/* --------------------------------------------------------------------------
In-memory table
-------------------------------------------------------------------------- */

/// A [`TabularStore`] held in process memory.
///
/// Used by tests and by the server's local development mode. It can be
/// switched offline to behave like an unreachable remote store.
#[derive(Debug, Default)]
pub struct MemoryTable {
    rows: Mutex<Vec<Row>>,
    offline: AtomicBool,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<Row>) -> Self {
        Self {
            rows: Mutex::new(rows),
            offline: AtomicBool::new(false),
        }
    }

    /// Copy of the current data rows.
    pub fn snapshot(&self) -> Vec<Row> {
        self.lock().clone()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Row>> {
        // Rows stay consistent even if a holder panicked.
        self.rows.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unreachable("memory table is offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl TabularStore for MemoryTable {
    async fn read_rows(&self) -> Result<Vec<Row>, StoreError> {
        self.check_online()?;
        Ok(self.snapshot())
    }

    async fn update_row(&self, index: usize, values: &RowValues) -> Result<(), StoreError> {
        self.check_online()?;
        let mut rows = self.lock();
        let row = rows.get_mut(index).ok_or_else(|| StoreError::Rejected {
            status: 400,
            body: format!("row index {index} out of range"),
        })?;
        // Like a B:E range write, cells past the blob column are untouched.
        if row.len() < COLUMN_COUNT {
            row.resize(COLUMN_COUNT, String::new());
        }
        row[COL_NAME..=COL_BLOB].clone_from_slice(&values.to_cells());
        Ok(())
    }

    async fn append_row(&self, id: &str, values: &RowValues) -> Result<(), StoreError> {
        self.check_online()?;
        self.lock().push(values.to_row(id));
        Ok(())
    }
}
