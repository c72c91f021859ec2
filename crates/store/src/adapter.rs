//! Record store adapter: maps [`CharacterRecord`]s onto table rows.
//!
//! The identifier column is the only source of truth for "new" versus
//! "existing". An upsert scans it for an exact match and either rewrites
//! that row in place or appends a new one, regardless of what mode the
//! caller believes it is in.

use async_trait::async_trait;
use roster_core::record::{CharacterRecord, Sections};
use roster_core::store::{RecordStore, UpsertOutcome, WriteFailure};
use roster_core::types::{format_timestamp, parse_timestamp, Timestamp};

use crate::error::StoreError;
use crate::table::{
    cell, Row, RowValues, TabularStore, COL_BLOB, COL_ID, COL_IMAGE, COL_MODIFIED, COL_NAME,
};

/// Source of the last-modified timestamp.
pub type Clock = Box<dyn Fn() -> Timestamp + Send + Sync>;

fn local_now() -> Timestamp {
    chrono::Local::now().naive_local()
}

/// [`RecordStore`] over any [`TabularStore`].
pub struct SheetRecordStore<T> {
    table: T,
    clock: Clock,
}

impl<T: TabularStore> SheetRecordStore<T> {
    pub fn new(table: T) -> Self {
        Self {
            table,
            clock: Box::new(local_now),
        }
    }

    /// Replace the wall clock, e.g. with a fixed time in tests.
    pub fn with_clock(mut self, clock: impl Fn() -> Timestamp + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn table(&self) -> &T {
        &self.table
    }

    /// Load every row, surfacing table errors.
    ///
    /// Rows with a blank identifier are skipped. A row whose blob does not
    /// parse still loads, with empty sections.
    pub async fn try_load_all(&self) -> Result<Vec<CharacterRecord>, StoreError> {
        let rows = self.table.read_rows().await?;
        Ok(rows
            .iter()
            .enumerate()
            .filter_map(|(index, row)| {
                if cell(row, COL_ID).trim().is_empty() {
                    tracing::debug!(index, "Skipping row without identifier");
                    return None;
                }
                Some(row_to_record(row))
            })
            .collect())
    }

    /// Insert or overwrite the row for `id`, surfacing table errors.
    pub async fn try_upsert(
        &self,
        id: &str,
        sections: &Sections,
    ) -> Result<UpsertOutcome, StoreError> {
        let values = RowValues {
            display_name: sections.profile.name.clone(),
            image_reference: sections.profile.image_file.clone(),
            last_modified: format_timestamp(&(self.clock)()),
            blob: sections.to_blob()?,
        };

        let rows = self.table.read_rows().await?;
        let matches = find_rows(&rows, id);
        match matches.as_slice() {
            [] => {
                self.table.append_row(id, &values).await?;
                Ok(UpsertOutcome::Inserted)
            }
            [index] => {
                self.table.update_row(*index, &values).await?;
                Ok(UpsertOutcome::Updated)
            }
            many => Err(StoreError::DuplicateIdentifier {
                id: id.to_string(),
                rows: many.len(),
            }),
        }
    }
}

/// Indices of every data row whose identifier cell equals `id` exactly.
fn find_rows(rows: &[Row], id: &str) -> Vec<usize> {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| cell(row, COL_ID) == id)
        .map(|(index, _)| index)
        .collect()
}

fn row_to_record(row: &Row) -> CharacterRecord {
    let id = cell(row, COL_ID).to_string();
    let blob = cell(row, COL_BLOB);
    let sections = match Sections::from_blob(blob) {
        Ok(sections) => sections,
        Err(e) => {
            tracing::warn!(
                id = %id,
                error = %e,
                "Malformed record blob, loading with empty sections"
            );
            Sections::default()
        }
    };
    CharacterRecord {
        id,
        display_name: cell(row, COL_NAME).to_string(),
        image_reference: cell(row, COL_IMAGE).to_string(),
        last_modified: parse_timestamp(cell(row, COL_MODIFIED)),
        sections,
    }
}

#[async_trait]
impl<T: TabularStore> RecordStore for SheetRecordStore<T> {
    async fn load_all(&self) -> Vec<CharacterRecord> {
        match self.try_load_all().await {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load characters; showing empty list");
                Vec::new()
            }
        }
    }

    async fn upsert(&self, id: &str, sections: &Sections) -> Result<UpsertOutcome, WriteFailure> {
        self.try_upsert(id, sections).await.map_err(|e| {
            tracing::error!(id = %id, error = %e, "Failed to write character");
            WriteFailure::new(e.to_string())
        })
    }
}
