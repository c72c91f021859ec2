//! Form session controller.
//!
//! [`SessionContext`] holds everything one editing session needs: the
//! cached record list, the current [`Mode`], and the values of the open
//! form. Every operation is a method on it, so each state transition is
//! explicit and testable without a UI.
//!
//! ```text
//! Listing --begin_create--> Creating{id}
//! Listing --begin_edit----> Editing{id}
//! Editing --begin_edit----> Editing{other}   (unsaved edits dropped)
//! Creating|Editing --save ok--> Listing      (cache reloaded)
//! Creating|Editing --save err-> unchanged    (last_error set)
//! Creating|Editing --cancel---> Listing
//! ```

use serde::Serialize;

use crate::error::CoreError;
use crate::form::{self, FormPatch, FormValues};
use crate::record::{CharacterRecord, CharacterSummary, LicenseEntry, TimelineEntry};
use crate::store::{RecordStore, UpsertOutcome};
use crate::types::{new_character_id, CharacterId};

/// What the session is currently doing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Mode {
    Listing,
    /// A record that has never been saved. `id` is fixed for the lifetime
    /// of this creation attempt, including failed saves.
    Creating { id: CharacterId },
    Editing { id: CharacterId },
}

impl Mode {
    /// Identifier of the open record, if any.
    pub fn target_id(&self) -> Option<&str> {
        match self {
            Self::Listing => None,
            Self::Creating { id } | Self::Editing { id } => Some(id),
        }
    }
}

/// Which form a caller wants the starting values of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Creating,
    Editing(CharacterId),
}

/// Result of a successful save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    pub id: CharacterId,
    pub outcome: UpsertOutcome,
}

/// State of one user's editing session.
#[derive(Debug, Clone)]
pub struct SessionContext {
    records: Vec<CharacterRecord>,
    mode: Mode,
    form: FormValues,
    last_error: Option<String>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    /// An empty session in `Listing` mode. Call [`Self::reload`] to fill
    /// the cache.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            mode: Mode::Listing,
            form: FormValues::default(),
            last_error: None,
        }
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn form(&self) -> &FormValues {
        &self.form
    }

    pub fn records(&self) -> &[CharacterRecord] {
        &self.records
    }

    /// Message of the most recent failed save, cleared by the next
    /// successful one.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn find(&self, id: &str) -> Option<&CharacterRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    // -----------------------------------------------------------------------
    // Cache
    // -----------------------------------------------------------------------

    /// Replace the cached records wholesale with the store's current rows.
    pub async fn reload(&mut self, store: &dyn RecordStore) {
        self.records = store.load_all().await;
        tracing::debug!(count = self.records.len(), "Reloaded character cache");
    }

    /// Summaries of every cached record, in store order.
    pub fn listing(&self) -> Vec<CharacterSummary> {
        self.records.iter().map(CharacterRecord::summary).collect()
    }

    // -----------------------------------------------------------------------
    // Mode transitions
    // -----------------------------------------------------------------------

    /// Open a blank form under a freshly generated identifier.
    pub fn begin_create(&mut self) -> CharacterId {
        let id = new_character_id();
        self.mode = Mode::Creating { id: id.clone() };
        self.form = form::blank_form();
        id
    }

    /// Open an existing record for editing, discarding any unsaved edits.
    pub fn begin_edit(&mut self, id: &str) -> Result<(), CoreError> {
        let record = self.find(id).ok_or_else(|| CoreError::NotFound {
            entity: "Character",
            id: id.to_string(),
        })?;
        let values = form::flatten(&record.sections);
        self.form = values;
        self.mode = Mode::Editing { id: id.to_string() };
        Ok(())
    }

    /// Close the form without saving.
    pub fn cancel(&mut self) {
        self.mode = Mode::Listing;
        self.form = FormValues::default();
    }

    /// The values a form opened in `mode` would start with.
    pub fn field_defaults(&self, mode: &FormMode) -> Result<FormValues, CoreError> {
        match mode {
            FormMode::Creating => Ok(form::blank_form()),
            FormMode::Editing(id) => self
                .find(id)
                .map(|record| form::flatten(&record.sections))
                .ok_or_else(|| CoreError::NotFound {
                    entity: "Character",
                    id: id.clone(),
                }),
        }
    }

    // -----------------------------------------------------------------------
    // Form editing
    // -----------------------------------------------------------------------

    fn open_form_mut(&mut self) -> Result<&mut FormValues, CoreError> {
        match self.mode {
            Mode::Listing => Err(CoreError::Validation("No character is open".into())),
            Mode::Creating { .. } | Mode::Editing { .. } => Ok(&mut self.form),
        }
    }

    pub fn set_field(&mut self, path: &str, value: impl Into<String>) -> Result<(), CoreError> {
        self.open_form_mut()?.set(path, value)
    }

    pub fn apply_patch(&mut self, patch: FormPatch) -> Result<(), CoreError> {
        self.open_form_mut()?.apply(patch)
    }

    pub fn add_timeline_row(&mut self) -> Result<(), CoreError> {
        self.open_form_mut()?.timeline.push(TimelineEntry::default());
        Ok(())
    }

    pub fn remove_timeline_row(&mut self, index: usize) -> Result<TimelineEntry, CoreError> {
        let rows = &mut self.open_form_mut()?.timeline;
        if index >= rows.len() {
            return Err(CoreError::Validation(format!(
                "Timeline row {index} does not exist"
            )));
        }
        Ok(rows.remove(index))
    }

    pub fn add_license_row(&mut self) -> Result<(), CoreError> {
        self.open_form_mut()?.licenses.push(LicenseEntry::default());
        Ok(())
    }

    pub fn remove_license_row(&mut self, index: usize) -> Result<LicenseEntry, CoreError> {
        let rows = &mut self.open_form_mut()?.licenses;
        if index >= rows.len() {
            return Err(CoreError::Validation(format!(
                "License row {index} does not exist"
            )));
        }
        Ok(rows.remove(index))
    }

    // -----------------------------------------------------------------------
    // Save
    // -----------------------------------------------------------------------

    /// Persist the open form under the current identifier.
    ///
    /// On success the cache is reloaded and the session returns to
    /// `Listing`. On failure mode and form are left intact so the user can
    /// retry, and the message is kept in [`Self::last_error`].
    pub async fn save(&mut self, store: &dyn RecordStore) -> Result<SaveReport, CoreError> {
        let id = self
            .mode
            .target_id()
            .ok_or_else(|| CoreError::Validation("No character is open".into()))?
            .to_string();
        let sections = form::unflatten(&self.form)?;

        match store.upsert(&id, &sections).await {
            Ok(outcome) => {
                tracing::info!(id = %id, ?outcome, "Character saved");
                self.last_error = None;
                self.reload(store).await;
                self.mode = Mode::Listing;
                self.form = FormValues::default();
                Ok(SaveReport { id, outcome })
            }
            Err(failure) => {
                tracing::warn!(id = %id, error = %failure, "Character save failed");
                self.last_error = Some(failure.message.clone());
                Err(CoreError::WriteFailed(failure.message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Sections;
    use crate::store::WriteFailure;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// Minimal in-memory store: lookup-or-append by id.
    #[derive(Default)]
    struct FakeStore {
        rows: Mutex<Vec<CharacterRecord>>,
        fail_writes: AtomicBool,
    }

    impl FakeStore {
        fn with_record(id: &str, name: &str) -> Self {
            let store = Self::default();
            let mut record = CharacterRecord::new(id.to_string());
            record.display_name = name.to_string();
            record.sections.profile.name = name.to_string();
            store.rows.lock().unwrap().push(record);
            store
        }
    }

    #[async_trait]
    impl RecordStore for FakeStore {
        async fn load_all(&self) -> Vec<CharacterRecord> {
            self.rows.lock().unwrap().clone()
        }

        async fn upsert(
            &self,
            id: &str,
            sections: &Sections,
        ) -> Result<UpsertOutcome, WriteFailure> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(WriteFailure::new("store offline"));
            }
            let mut rows = self.rows.lock().unwrap();
            let mut record = CharacterRecord::new(id.to_string());
            record.display_name = sections.profile.name.clone();
            record.sections = sections.clone();
            match rows.iter_mut().find(|r| r.id == id) {
                Some(existing) => {
                    *existing = record;
                    Ok(UpsertOutcome::Updated)
                }
                None => {
                    rows.push(record);
                    Ok(UpsertOutcome::Inserted)
                }
            }
        }
    }

    #[tokio::test]
    async fn empty_store_gives_empty_listing() {
        let store = FakeStore::default();
        let mut session = SessionContext::new();
        session.reload(&store).await;
        assert!(session.listing().is_empty());
        assert_eq!(session.mode(), &Mode::Listing);
    }

    #[tokio::test]
    async fn create_and_save_returns_to_listing() {
        let store = FakeStore::default();
        let mut session = SessionContext::new();
        session.reload(&store).await;

        let id = session.begin_create();
        session.set_field("profile.name", "Aki").unwrap();
        let report = session.save(&store).await.unwrap();

        assert_eq!(report.id, id);
        assert_eq!(report.outcome, UpsertOutcome::Inserted);
        assert_eq!(session.mode(), &Mode::Listing);
        assert_eq!(session.records().len(), 1);
        assert_eq!(session.records()[0].sections.profile.name, "Aki");
    }

    #[tokio::test]
    async fn each_creation_gets_a_fresh_id() {
        let mut session = SessionContext::new();
        let first = session.begin_create();
        session.cancel();
        let second = session.begin_create();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn edit_populates_form_from_record() {
        let store = FakeStore::with_record("c1", "Aki");
        let mut session = SessionContext::new();
        session.reload(&store).await;

        session.begin_edit("c1").unwrap();
        assert_eq!(session.mode(), &Mode::Editing { id: "c1".into() });
        assert_eq!(session.form().get("profile.name"), Some("Aki"));
        assert_eq!(session.form().get("appearance.height"), Some(""));
    }

    #[tokio::test]
    async fn edit_unknown_id_is_not_found() {
        let mut session = SessionContext::new();
        assert_matches!(
            session.begin_edit("missing"),
            Err(CoreError::NotFound { .. })
        );
        assert_eq!(session.mode(), &Mode::Listing);
    }

    #[tokio::test]
    async fn switching_edit_target_discards_unsaved_edits() {
        let store = FakeStore::with_record("c1", "Aki");
        store.upsert("c2", &Sections::default()).await.unwrap();
        let mut session = SessionContext::new();
        session.reload(&store).await;

        session.begin_edit("c1").unwrap();
        session.set_field("profile.name", "Changed").unwrap();
        session.begin_edit("c2").unwrap();
        session.begin_edit("c1").unwrap();
        assert_eq!(session.form().get("profile.name"), Some("Aki"));
    }

    #[tokio::test]
    async fn editing_overwrites_in_place() {
        let store = FakeStore::with_record("c1", "Aki");
        let mut session = SessionContext::new();
        session.reload(&store).await;

        session.begin_edit("c1").unwrap();
        session.set_field("profile.name", "Akira").unwrap();
        let report = session.save(&store).await.unwrap();

        assert_eq!(report.outcome, UpsertOutcome::Updated);
        assert_eq!(session.records().len(), 1);
        assert_eq!(session.records()[0].display_name, "Akira");
    }

    #[tokio::test]
    async fn failed_save_keeps_mode_and_form() {
        let store = FakeStore::default();
        store.fail_writes.store(true, Ordering::SeqCst);
        let mut session = SessionContext::new();

        let id = session.begin_create();
        session.set_field("profile.name", "Aki").unwrap();
        let err = session.save(&store).await.unwrap_err();

        assert_matches!(err, CoreError::WriteFailed(_));
        assert_eq!(session.mode(), &Mode::Creating { id: id.clone() });
        assert_eq!(session.form().get("profile.name"), Some("Aki"));
        assert_eq!(session.last_error(), Some("store offline"));

        // A manual retry reuses the same identifier.
        store.fail_writes.store(false, Ordering::SeqCst);
        let report = session.save(&store).await.unwrap();
        assert_eq!(report.id, id);
        assert!(session.last_error().is_none());
    }

    #[tokio::test]
    async fn editing_operations_need_an_open_form() {
        let mut session = SessionContext::new();
        assert_matches!(
            session.set_field("profile.name", "x"),
            Err(CoreError::Validation(_))
        );
        assert_matches!(session.add_timeline_row(), Err(CoreError::Validation(_)));
        assert_matches!(
            session.save(&FakeStore::default()).await,
            Err(CoreError::Validation(_))
        );
    }

    #[tokio::test]
    async fn table_rows_can_be_added_and_removed() {
        let mut session = SessionContext::new();
        session.begin_create();
        assert_eq!(session.form().timeline.len(), 1);

        session.add_timeline_row().unwrap();
        session.add_license_row().unwrap();
        assert_eq!(session.form().timeline.len(), 2);
        assert_eq!(session.form().licenses.len(), 2);

        session.remove_timeline_row(0).unwrap();
        assert_eq!(session.form().timeline.len(), 1);
        assert_matches!(
            session.remove_license_row(5),
            Err(CoreError::Validation(_))
        );
    }

    #[tokio::test]
    async fn blank_table_rows_are_not_saved() {
        let store = FakeStore::default();
        let mut session = SessionContext::new();
        session.begin_create();
        session
            .apply_patch(FormPatch {
                timeline: Some(vec![
                    TimelineEntry::default(),
                    TimelineEntry {
                        date: "2010年4月".into(),
                        event: "入学".into(),
                        note: String::new(),
                    },
                ]),
                ..Default::default()
            })
            .unwrap();
        session.save(&store).await.unwrap();

        let saved = &session.records()[0].sections;
        assert_eq!(saved.timeline.len(), 1);
        assert!(saved.licenses.is_empty());
    }

    #[tokio::test]
    async fn field_defaults_per_mode() {
        let store = FakeStore::with_record("c1", "Aki");
        let mut session = SessionContext::new();
        session.reload(&store).await;

        let blank = session.field_defaults(&FormMode::Creating).unwrap();
        assert_eq!(blank.get("profile.name"), Some(""));

        let existing = session
            .field_defaults(&FormMode::Editing("c1".into()))
            .unwrap();
        assert_eq!(existing.get("profile.name"), Some("Aki"));

        assert_matches!(
            session.field_defaults(&FormMode::Editing("nope".into())),
            Err(CoreError::NotFound { .. })
        );
    }
}
