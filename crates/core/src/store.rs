//! The seam between the session controller and whatever persists records.

use async_trait::async_trait;
use serde::Serialize;

use crate::record::{CharacterRecord, Sections};

/// How an upsert resolved the identifier. Informational only; the store
/// decides, not the caller's idea of "new" or "edit".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// A save that did not reach the store. Connectivity, authentication and
/// server-side rejection all collapse into this one outcome.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct WriteFailure {
    pub message: String,
}

impl WriteFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Loads and saves whole character records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Every record in store order.
    ///
    /// An unreachable store yields an empty list; a malformed row yields a
    /// record with empty sections. Neither is reported as an error.
    async fn load_all(&self) -> Vec<CharacterRecord>;

    /// Replace the record stored under `id`, or append it if absent.
    async fn upsert(&self, id: &str, sections: &Sections) -> Result<UpsertOutcome, WriteFailure>;
}
