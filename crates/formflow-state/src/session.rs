//! # Form Session
//!
//! [`FormSession`] is the explicit session context. It owns the accepted
//! schema, its compiled validator, the data record, the paging state, the
//! current field errors and every collaborator handle. Nothing about a
//! session lives in global state; all mutation goes through its methods.
//!
//! ## Lifecycle
//!
//! 1. [`FormSession::start`] compiles the schema, builds defaults, reads
//!    the stored snapshot and merges it over the defaults.
//! 2. [`FormSession::set_value`] applies one field change: the field's
//!    error is recomputed, previews are synced and a snapshot may be
//!    written.
//! 3. [`FormSession::next`] / [`FormSession::previous`] move between pages.
//! 4. [`FormSession::begin_submit`] / [`FormSession::finish_submit`] bracket
//!    one submission. Only one may be in flight.
//! 5. [`FormSession::reset`] returns to defaults on page 1 and clears the
//!    stored snapshot.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use formflow_core::{DataRecord, FieldValue, FormSchema, Question, QuestionId};
use formflow_rules::{default_record, merge_over_defaults, CompileError, CompiledValidator, FieldErrors};
use thiserror::Error;

use crate::config::SessionConfig;
use crate::paging::{PageMode, PageSize, Pager, PagingError};
use crate::persistence::{SnapshotStore, SnapshotWriter};
use crate::preview::{PreviewAllocator, PreviewRegistry, TrackingPreviewAllocator};
use crate::submission::{submit_checked, SubmissionError, SubmissionReceipt, SubmissionService};

/// Errors from session operations.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The id does not name a question of the schema.
    #[error("unknown field \"{0}\"")]
    UnknownField(String),

    /// A paging rule was violated or validation failed.
    #[error(transparent)]
    Paging(#[from] PagingError),

    /// The schema could not be compiled into rules.
    #[error("failed to compile validation rules: {0}")]
    Compile(#[from] CompileError),

    /// A submission is already outstanding.
    #[error("a submission is already in flight")]
    SubmissionInFlight,

    /// `finish_submit` was called with nothing in flight.
    #[error("no submission is in flight")]
    NoSubmissionInFlight,

    /// The submission endpoint failed.
    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

/// Source of the current date for `"today"` bounds.
pub trait Clock: Send + Sync {
    /// The current calendar date.
    fn today(&self) -> NaiveDate;
}

/// The system clock, in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// A clock stuck on one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// One form-filling session.
pub struct FormSession {
    schema: FormSchema,
    validator: CompiledValidator,
    defaults: DataRecord,
    record: DataRecord,
    errors: FieldErrors,
    pager: Pager,
    page_size: PageSize,
    writer: SnapshotWriter,
    store: Arc<dyn SnapshotStore>,
    storage_key: String,
    banner: Option<String>,
    in_flight: bool,
    previews: PreviewRegistry,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for FormSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormSession")
            .field("questions", &self.schema.len())
            .field("record", &self.record)
            .field("errors", &self.errors)
            .field("pager", &self.pager)
            .field("storage_key", &self.storage_key)
            .field("banner", &self.banner)
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}

impl FormSession {
    /// Start a session over an accepted schema.
    ///
    /// A snapshot stored under the configured key prefills the record. A
    /// store that cannot be read is logged and treated as empty.
    pub fn start(
        schema: FormSchema,
        config: &SessionConfig,
        store: Arc<dyn SnapshotStore>,
    ) -> Result<Self, SessionError> {
        let mode = config.page_mode()?;
        let page_size = PageSize::new(config.page_size)?;
        let validator = CompiledValidator::compile(&schema)?;
        let defaults = default_record(&schema);

        let record = match store.load(&config.storage_key) {
            Ok(Some(stored)) => {
                tracing::info!(key = %config.storage_key, fields = stored.len(), "restoring stored answers");
                merge_over_defaults(&schema, &defaults, &stored)
            }
            Ok(None) => defaults.clone(),
            Err(e) => {
                tracing::warn!(key = %config.storage_key, error = %e, "ignoring unreadable stored answers");
                defaults.clone()
            }
        };

        let mut session = Self {
            schema,
            validator,
            defaults,
            record,
            errors: FieldErrors::new(),
            pager: Pager::new(mode),
            page_size,
            writer: SnapshotWriter::new(),
            store,
            storage_key: config.storage_key.clone(),
            banner: None,
            in_flight: false,
            previews: PreviewRegistry::new(Arc::new(TrackingPreviewAllocator::new())),
            clock: Arc::new(SystemClock),
        };
        // First render: never written.
        session.persist();
        Ok(session)
    }

    /// Use `clock` to resolve `"today"`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Allocate image previews through `allocator`.
    pub fn with_preview_allocator(mut self, allocator: Arc<dyn PreviewAllocator>) -> Self {
        self.previews = PreviewRegistry::new(allocator);
        self
    }

    // ── Accessors ───────────────────────────────────────────────────

    /// The accepted schema.
    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    /// The compiled validator.
    pub fn validator(&self) -> &CompiledValidator {
        &self.validator
    }

    /// The current answers.
    pub fn record(&self) -> &DataRecord {
        &self.record
    }

    /// The current answer of one field.
    pub fn value(&self, id: &str) -> Option<&FieldValue> {
        self.record.get(id)
    }

    /// Field errors shown to the user.
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// The error shown for one field.
    pub fn error(&self, id: &str) -> Option<&str> {
        self.errors.get(id)
    }

    /// Paging state.
    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    /// Current page, 1-based.
    pub fn page(&self) -> usize {
        self.pager.page()
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pager.page_count(&self.schema)
    }

    /// Whether the current page is the last one.
    pub fn is_last_page(&self) -> bool {
        self.pager.is_last_page(&self.schema)
    }

    /// Questions on the current page.
    pub fn current_questions(&self) -> &[Question] {
        self.pager.current_questions(&self.schema)
    }

    /// The configured page size, used whenever multi-step mode is on.
    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    /// Submission failure message, until dismissed.
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    /// Whether a submission is outstanding.
    pub fn is_submitting(&self) -> bool {
        self.in_flight
    }

    /// Live image previews.
    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }

    /// Key of the stored snapshot.
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Date used for `"today"` bounds.
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    // ── Editing ─────────────────────────────────────────────────────

    /// Apply one field change.
    ///
    /// Returns the field's new error, if any. A failed snapshot write is
    /// logged and does not fail the change.
    pub fn set_value(&mut self, id: &str, value: FieldValue) -> Result<Option<String>, SessionError> {
        let id: QuestionId = match self.schema.question(id) {
            Some(question) => question.id.clone(),
            None => return Err(SessionError::UnknownField(id.to_string())),
        };
        self.record.insert(id.clone(), value);

        let message = self.validator.validate_field(id.as_str(), &self.record, self.today());
        // Only an accepted file gets a preview.
        match (&message, self.record.get(id.as_str())) {
            (None, Some(value)) => self.previews.sync(&self.schema, &id, value),
            _ => self.previews.release(id.as_str()),
        }
        self.errors.set(id, message.clone());
        self.persist();
        Ok(message)
    }

    /// Clear a field back to its default.
    pub fn clear_value(&mut self, id: &str) -> Result<Option<String>, SessionError> {
        let default = self
            .defaults
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::UnknownField(id.to_string()))?;
        self.set_value(id, default)
    }

    fn persist(&mut self) {
        match self
            .writer
            .write(&self.schema, &self.record, self.store.as_ref(), &self.storage_key)
        {
            Ok(outcome) => tracing::trace!(?outcome, "snapshot policy applied"),
            Err(e) => tracing::warn!(key = %self.storage_key, error = %e, "failed to save answers"),
        }
    }

    // ── Navigation ──────────────────────────────────────────────────

    /// Validate the current page and advance.
    ///
    /// On failure the page's field errors replace whatever was shown for
    /// those fields.
    pub fn next(&mut self) -> Result<usize, SessionError> {
        let ids = self.pager.current_ids(&self.schema);
        let today = self.today();
        match self.pager.next(&self.schema, &self.validator, &self.record, today) {
            Ok(page) => {
                for id in ids {
                    self.errors.set(id, None);
                }
                Ok(page)
            }
            Err(PagingError::PageInvalid { page, errors }) => {
                for id in ids {
                    let message = errors.get(id.as_str()).map(str::to_string);
                    self.errors.set(id, message);
                }
                Err(PagingError::PageInvalid { page, errors }.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Go back one page.
    pub fn previous(&mut self) -> Result<usize, SessionError> {
        Ok(self.pager.previous(&self.schema)?)
    }

    /// Change the page size. Rejected once past page 1.
    pub fn set_page_size(&mut self, size: usize) -> Result<(), SessionError> {
        let size = PageSize::new(size)?;
        if !self.pager.can_reconfigure() {
            tracing::info!(size = size.get(), "page size change rejected: locked");
            return Err(PagingError::Locked.into());
        }
        if self.pager.mode().is_multi_step() {
            self.pager.set_mode(PageMode::MultiStep(size))?;
        }
        self.page_size = size;
        Ok(())
    }

    /// Switch multi-step mode on or off. A change is rejected once past
    /// page 1; asking for the current mode always succeeds.
    pub fn set_multi_step(&mut self, on: bool) -> Result<(), SessionError> {
        if self.pager.mode().is_multi_step() == on {
            return Ok(());
        }
        let mode = if on {
            PageMode::MultiStep(self.page_size)
        } else {
            PageMode::Single
        };
        Ok(self.pager.set_mode(mode)?)
    }

    // ── Submission ──────────────────────────────────────────────────

    /// Validate the whole record and mark a submission in flight.
    ///
    /// Returns the record to hand to the submission service.
    pub fn begin_submit(&mut self) -> Result<DataRecord, SessionError> {
        if self.in_flight {
            return Err(SessionError::SubmissionInFlight);
        }
        let today = self.today();
        if let Err(e) = self.pager.submit(&self.schema, &self.validator, &self.record, today) {
            if let PagingError::RecordInvalid { errors } = &e {
                self.errors = errors.clone();
            }
            return Err(e.into());
        }
        self.errors.clear();
        self.banner = None;
        self.in_flight = true;
        Ok(self.record.clone())
    }

    /// Record the outcome of the submission started by `begin_submit`.
    ///
    /// Success resets the session and clears the stored snapshot. Failure
    /// keeps the record and shows a banner.
    pub fn finish_submit(
        &mut self,
        outcome: Result<SubmissionReceipt, SubmissionError>,
    ) -> Result<SubmissionReceipt, SessionError> {
        if !self.in_flight {
            return Err(SessionError::NoSubmissionInFlight);
        }
        self.in_flight = false;
        match outcome {
            Ok(receipt) => {
                self.reset();
                Ok(receipt)
            }
            Err(e) => {
                tracing::warn!(error = %e, "submission failed");
                self.banner = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Submit through `service`: begin, call once, finish.
    pub fn submit(&mut self, service: &dyn SubmissionService) -> Result<SubmissionReceipt, SessionError> {
        let record = self.begin_submit()?;
        let outcome = submit_checked(service, &record);
        self.finish_submit(outcome)
    }

    /// Hide the submission failure banner.
    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }

    /// Back to defaults on page 1; clears errors, previews and the stored
    /// snapshot. An outstanding submission is abandoned.
    pub fn reset(&mut self) {
        self.in_flight = false;
        self.record = self.defaults.clone();
        self.errors.clear();
        self.banner = None;
        self.previews.release_all();
        self.pager.reset();
        self.writer.forget();
        if let Err(e) = self.store.clear(&self.storage_key) {
            tracing::warn!(key = %self.storage_key, error = %e, "failed to clear stored answers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemorySnapshotStore;
    use crate::submission::{RecordingSubmissionService, ScriptedOutcome};
    use formflow_core::{QuestionSpec, TextSpec};

    fn schema() -> FormSchema {
        FormSchema::from_questions(
            ["a", "b", "c", "d"]
                .into_iter()
                .map(|id| Question::new(id, id.to_uppercase(), true, QuestionSpec::Text(TextSpec::default())))
                .collect(),
        )
    }

    fn session(store: Arc<MemorySnapshotStore>, config: SessionConfig) -> FormSession {
        FormSession::start(schema(), &config, store)
            .unwrap()
            .with_clock(Arc::new(FixedClock(NaiveDate::from_ymd_opt(2026, 10, 17).unwrap())))
    }

    fn multi() -> SessionConfig {
        SessionConfig {
            multi_step: true,
            page_size: 2,
            ..SessionConfig::default()
        }
    }

    #[test]
    fn test_set_value_rejects_unknown_field() {
        let mut s = session(Arc::new(MemorySnapshotStore::new()), SessionConfig::default());
        assert!(matches!(
            s.set_value("nope", FieldValue::text("x")),
            Err(SessionError::UnknownField(id)) if id == "nope"
        ));
        assert!(!s.record().contains("nope"));
    }

    #[test]
    fn test_set_value_recomputes_field_error() {
        let mut s = session(Arc::new(MemorySnapshotStore::new()), SessionConfig::default());
        assert_eq!(s.set_value("a", FieldValue::text("")).unwrap().as_deref(), Some("A is required"));
        assert_eq!(s.error("a"), Some("A is required"));
        assert_eq!(s.set_value("a", FieldValue::text("ok")).unwrap(), None);
        assert!(s.errors().is_empty());
    }

    #[test]
    fn test_next_surfaces_page_errors_only() {
        let mut s = session(Arc::new(MemorySnapshotStore::new()), multi());
        s.set_value("a", FieldValue::text("x")).unwrap();
        assert!(matches!(s.next(), Err(SessionError::Paging(PagingError::PageInvalid { page: 1, .. }))));
        assert_eq!(s.error("b"), Some("B is required"));
        assert_eq!(s.error("c"), None);
        s.set_value("b", FieldValue::text("y")).unwrap();
        assert_eq!(s.next().unwrap(), 2);
        assert!(s.errors().is_empty());
        assert_eq!(s.current_questions().len(), 2);
    }

    #[test]
    fn test_page_size_locked_after_next() {
        let mut s = session(Arc::new(MemorySnapshotStore::new()), multi());
        s.set_page_size(3).unwrap();
        assert_eq!(s.page_count(), 2);
        for id in ["a", "b", "c"] {
            s.set_value(id, FieldValue::text("x")).unwrap();
        }
        s.next().unwrap();
        assert!(matches!(s.set_page_size(2), Err(SessionError::Paging(PagingError::Locked))));
        assert!(matches!(s.set_multi_step(false), Err(SessionError::Paging(PagingError::Locked))));
        s.reset();
        s.set_page_size(2).unwrap();
        assert_eq!(s.page_count(), 2);
    }

    #[test]
    fn test_unchanged_mode_is_accepted_while_locked() {
        let mut s = session(Arc::new(MemorySnapshotStore::new()), multi());
        s.set_value("a", FieldValue::text("x")).unwrap();
        s.set_value("b", FieldValue::text("y")).unwrap();
        s.next().unwrap();
        s.set_multi_step(true).unwrap();
        assert_eq!(s.page(), 2);
        assert!(matches!(s.set_multi_step(false), Err(SessionError::Paging(PagingError::Locked))));
    }

    #[test]
    fn test_reset_abandons_outstanding_submission() {
        let mut s = session(Arc::new(MemorySnapshotStore::new()), SessionConfig::default());
        for id in ["a", "b", "c", "d"] {
            s.set_value(id, FieldValue::text("x")).unwrap();
        }
        s.begin_submit().unwrap();
        s.reset();
        assert!(!s.is_submitting());
        assert!(matches!(
            s.finish_submit(Ok(SubmissionReceipt {
                success: true,
                message: "stale".into(),
                submission_id: None,
            })),
            Err(SessionError::NoSubmissionInFlight)
        ));
        for id in ["a", "b", "c", "d"] {
            s.set_value(id, FieldValue::text("x")).unwrap();
        }
        s.begin_submit().unwrap();
    }

    #[test]
    fn test_rejected_image_gets_no_preview() {
        use formflow_core::{AcceptList, FileRef, FileUploadSpec};

        let schema = FormSchema::from_questions(vec![Question::new(
            "avatar",
            "Avatar",
            false,
            QuestionSpec::FileUpload(FileUploadSpec {
                accept: AcceptList::parse("image/*").unwrap(),
                max_size: 2.0,
                multiple: false,
            }),
        )]);
        let alloc = Arc::new(TrackingPreviewAllocator::new());
        let mut s = FormSession::start(schema, &SessionConfig::default(), Arc::new(MemorySnapshotStore::new()))
            .unwrap()
            .with_preview_allocator(alloc.clone());

        let big = FieldValue::File(FileRef::new("big.png", 3 * 1024 * 1024, "image/png"));
        assert!(s.set_value("avatar", big.clone()).unwrap().is_some());
        assert!(s.previews().is_empty());
        assert_eq!(alloc.allocated_count(), 0);

        let small = FieldValue::File(FileRef::new("small.png", 1024, "image/png"));
        assert_eq!(s.set_value("avatar", small).unwrap(), None);
        assert_eq!(alloc.live_count(), 1);

        assert!(s.set_value("avatar", big).unwrap().is_some());
        assert!(s.previews().is_empty());
        assert_eq!(alloc.live_count(), 0);
    }

    #[test]
    fn test_second_begin_submit_is_rejected() {
        let mut s = session(Arc::new(MemorySnapshotStore::new()), SessionConfig::default());
        for id in ["a", "b", "c", "d"] {
            s.set_value(id, FieldValue::text("x")).unwrap();
        }
        s.begin_submit().unwrap();
        assert!(s.is_submitting());
        assert!(matches!(s.begin_submit(), Err(SessionError::SubmissionInFlight)));
        s.finish_submit(Err(SubmissionError::Unavailable("down".into()))).unwrap_err();
        assert!(!s.is_submitting());
        assert!(matches!(
            s.finish_submit(Err(SubmissionError::Unavailable("again".into()))),
            Err(SessionError::NoSubmissionInFlight)
        ));
    }

    #[test]
    fn test_failed_submission_keeps_record_and_shows_banner() {
        let store = Arc::new(MemorySnapshotStore::new());
        let mut s = session(store.clone(), SessionConfig::default());
        for id in ["a", "b", "c", "d"] {
            s.set_value(id, FieldValue::text("x")).unwrap();
        }
        let service = RecordingSubmissionService::with_outcome(ScriptedOutcome::Fail("offline".into()));
        assert!(s.submit(&service).is_err());
        assert_eq!(s.banner(), Some("submission failed: offline"));
        assert_eq!(s.value("a"), Some(&FieldValue::text("x")));
        assert!(store.raw("formflow-data").is_some());
        s.dismiss_banner();
        assert!(s.banner().is_none());
    }

    #[test]
    fn test_successful_submission_resets_and_clears_store() {
        let store = Arc::new(MemorySnapshotStore::new());
        let mut s = session(store.clone(), SessionConfig::default());
        for id in ["a", "b", "c", "d"] {
            s.set_value(id, FieldValue::text("x")).unwrap();
        }
        let service = RecordingSubmissionService::new();
        s.submit(&service).unwrap();
        assert_eq!(service.submissions().len(), 1);
        assert_eq!(s.value("a"), Some(&FieldValue::text("")));
        assert!(store.raw("formflow-data").is_none());
        assert_eq!(s.page(), 1);
    }

    #[test]
    fn test_invalid_submit_never_reaches_service() {
        let mut s = session(Arc::new(MemorySnapshotStore::new()), SessionConfig::default());
        let service = RecordingSubmissionService::new();
        assert!(matches!(
            s.submit(&service),
            Err(SessionError::Paging(PagingError::RecordInvalid { .. }))
        ));
        assert_eq!(service.attempts(), 0);
        assert_eq!(s.errors().len(), 4);
    }

    #[test]
    fn test_start_rejects_bad_page_size() {
        let config = SessionConfig {
            page_size: 1,
            ..SessionConfig::default()
        };
        assert!(matches!(
            FormSession::start(schema(), &config, Arc::new(MemorySnapshotStore::new())),
            Err(SessionError::Paging(PagingError::InvalidPageSize(1)))
        ));
    }
}
