//! Record store for the character roster.
//!
//! [`adapter::SheetRecordStore`] implements the core's `RecordStore` on top
//! of any [`table::TabularStore`]. Two tables are provided: the Google
//! Sheets client used in production and an in-memory table for tests and
//! local development.

pub mod adapter;
pub mod config;
pub mod credentials;
pub mod error;
pub mod sheets;
pub mod table;

pub use adapter::SheetRecordStore;
pub use error::StoreError;
pub use sheets::SheetsClient;
pub use table::{MemoryTable, TabularStore};
