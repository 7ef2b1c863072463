//! # Paging State Machine
//!
//! Partitions a schema into pages and gates advancement on page-scoped
//! validation.
//!
//! ## States
//!
//! `Page(n)` for `n` in `1..=page_count`. In single mode there is exactly
//! one page covering the whole schema.
//!
//! ```text
//!            next() [page valid]           next() [page valid]
//! Page(1) ───────────────────────▶ Page(2) ─────────▶ ... ─▶ Page(count)
//!    ▲  ◀───────────────────────────  │                         │
//!    │           previous()           │                 submit() [record valid]
//!    └──────────── reset() ◀──────────┴─────────────────────────┘
//! ```
//!
//! ## Page Membership
//!
//! Membership is a pure function of `(question count, mode, page)`,
//! recomputed on every call. Nothing about a partition is cached, so a
//! mode change can never validate against a stale id set.
//!
//! ## Reconfiguration Lock
//!
//! The first successful `next()` sets a one-way "progressed past page 1"
//! flag. While it is set, neither the page size nor the mode may change;
//! only `reset()` clears it.

use std::ops::Range;

use chrono::NaiveDate;
use formflow_core::{DataRecord, FormSchema, Question, QuestionId, Timestamp};
use formflow_rules::{CompiledValidator, FieldErrors};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest allowed page size.
pub const MIN_PAGE_SIZE: usize = 2;
/// Largest allowed page size.
pub const MAX_PAGE_SIZE: usize = 6;
/// Page size used when none is configured.
pub const DEFAULT_PAGE_SIZE: usize = 3;

/// Errors from the paging state machine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PagingError {
    /// The action is not allowed from the current page.
    #[error("invalid page transition: {action} from page {page} of {page_count}")]
    InvalidTransition {
        /// Attempted action.
        action: PageAction,
        /// Current page (1-based).
        page: usize,
        /// Number of pages.
        page_count: usize,
    },

    /// Fields on the current page failed validation; the page is unchanged.
    #[error("page {page} has invalid fields:\n{errors}")]
    PageInvalid {
        /// Current page (1-based).
        page: usize,
        /// Errors for the page's fields only.
        errors: FieldErrors,
    },

    /// The record failed whole-schema validation at submit.
    #[error("form has invalid fields:\n{errors}")]
    RecordInvalid {
        /// Errors across the whole schema.
        errors: FieldErrors,
    },

    /// Page size or mode changed after progressing past page 1.
    #[error("page layout is locked after progressing past page 1")]
    Locked,

    /// Page size outside `2..=6`.
    #[error("page size must be between 2 and 6, got {0}")]
    InvalidPageSize(usize),
}

/// Number of questions per page in multi-step mode, always in `2..=6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct PageSize(usize);

impl PageSize {
    /// Validate a page size.
    pub fn new(size: usize) -> Result<Self, PagingError> {
        if (MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&size) {
            Ok(Self(size))
        } else {
            Err(PagingError::InvalidPageSize(size))
        }
    }

    /// The size as a plain number.
    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self(DEFAULT_PAGE_SIZE)
    }
}

impl TryFrom<usize> for PageSize {
    type Error = PagingError;

    fn try_from(size: usize) -> Result<Self, Self::Error> {
        Self::new(size)
    }
}

impl From<PageSize> for usize {
    fn from(size: PageSize) -> Self {
        size.0
    }
}

impl std::fmt::Display for PageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the schema is split into pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageMode {
    /// One implicit page with every question.
    #[default]
    Single,
    /// Contiguous pages of a fixed size.
    MultiStep(PageSize),
}

impl PageMode {
    /// Whether this is multi-step mode.
    pub fn is_multi_step(&self) -> bool {
        matches!(self, Self::MultiStep(_))
    }
}

/// Number of pages for `len` questions. Never less than 1.
pub fn page_count(len: usize, mode: PageMode) -> usize {
    match mode {
        PageMode::Single => 1,
        PageMode::MultiStep(size) => len.div_ceil(size.get()).max(1),
    }
}

/// Index range of the questions on a 1-based `page`, or `None` if the
/// page does not exist.
pub fn page_bounds(len: usize, mode: PageMode, page: usize) -> Option<Range<usize>> {
    if page == 0 || page > page_count(len, mode) {
        return None;
    }
    match mode {
        PageMode::Single => Some(0..len),
        PageMode::MultiStep(size) => {
            let start = (page - 1) * size.get();
            Some(start..(start + size.get()).min(len))
        }
    }
}

/// The questions on a page, in schema order. Empty if the page does not
/// exist.
pub fn page_questions(schema: &FormSchema, mode: PageMode, page: usize) -> &[Question] {
    page_bounds(schema.len(), mode, page)
        .map(|range| &schema.questions()[range])
        .unwrap_or(&[])
}

/// The question ids on a page, in schema order.
pub fn page_question_ids(schema: &FormSchema, mode: PageMode, page: usize) -> Vec<QuestionId> {
    page_questions(schema, mode, page)
        .iter()
        .map(|q| q.id.clone())
        .collect()
}

/// Navigation actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageAction {
    /// Advance after validating the current page.
    Next,
    /// Go back one page without validation.
    Previous,
    /// Final submission from the last page.
    Submit,
    /// Return to page 1 and clear the progress flag.
    Reset,
}

impl PageAction {
    /// Returns the canonical action name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Next => "next",
            Self::Previous => "previous",
            Self::Submit => "submit",
            Self::Reset => "reset",
        }
    }
}

impl std::fmt::Display for PageAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Record of a page transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Page before the transition.
    pub from_page: usize,
    /// Page after the transition.
    pub to_page: usize,
    /// Action that caused it.
    pub action: PageAction,
    /// When the transition occurred (UTC).
    pub timestamp: Timestamp,
}

/// Runtime paging state.
#[derive(Debug, Clone, Serialize)]
pub struct Pager {
    mode: PageMode,
    page: usize,
    progressed: bool,
    transition_log: Vec<TransitionRecord>,
}

impl Pager {
    /// A pager on page 1.
    pub fn new(mode: PageMode) -> Self {
        Self {
            mode,
            page: 1,
            progressed: false,
            transition_log: Vec::new(),
        }
    }

    /// Current mode.
    pub fn mode(&self) -> PageMode {
        self.mode
    }

    /// Current page, 1-based.
    pub fn page(&self) -> usize {
        self.page
    }

    /// Number of pages for this schema under the current mode.
    pub fn page_count(&self, schema: &FormSchema) -> usize {
        page_count(schema.len(), self.mode)
    }

    /// Whether the current page is the last one.
    pub fn is_last_page(&self, schema: &FormSchema) -> bool {
        self.page >= self.page_count(schema)
    }

    /// Whether `next()` has succeeded since the last reset.
    pub fn progressed_past_first_page(&self) -> bool {
        self.progressed
    }

    /// Whether the page size and mode may still change.
    pub fn can_reconfigure(&self) -> bool {
        !self.progressed
    }

    /// Every successful transition, oldest first.
    pub fn transition_log(&self) -> &[TransitionRecord] {
        &self.transition_log
    }

    /// Questions on the current page.
    pub fn current_questions<'s>(&self, schema: &'s FormSchema) -> &'s [Question] {
        page_questions(schema, self.mode, self.page)
    }

    /// Ids on the current page.
    pub fn current_ids(&self, schema: &FormSchema) -> Vec<QuestionId> {
        page_question_ids(schema, self.mode, self.page)
    }

    /// Change the mode. Rejected once the user has progressed past page 1.
    pub fn set_mode(&mut self, mode: PageMode) -> Result<(), PagingError> {
        if self.progressed {
            tracing::info!(?mode, "page layout change rejected: locked");
            return Err(PagingError::Locked);
        }
        self.mode = mode;
        self.page = 1;
        Ok(())
    }

    /// Change the page size, switching to multi-step mode.
    pub fn set_page_size(&mut self, size: usize) -> Result<(), PagingError> {
        let size = PageSize::new(size)?;
        self.set_mode(PageMode::MultiStep(size))
    }

    /// Validate the current page and advance.
    ///
    /// On failure the page is unchanged and the error carries the current
    /// page's field errors only.
    pub fn next(
        &mut self,
        schema: &FormSchema,
        validator: &CompiledValidator,
        record: &DataRecord,
        today: NaiveDate,
    ) -> Result<usize, PagingError> {
        let count = self.page_count(schema);
        if self.page >= count {
            return Err(self.invalid(PageAction::Next, count));
        }
        let ids = self.current_ids(schema);
        validator
            .validate_fields(record, &ids, today)
            .map_err(|errors| PagingError::PageInvalid {
                page: self.page,
                errors,
            })?;
        self.progressed = true;
        self.record(PageAction::Next, self.page + 1);
        Ok(self.page)
    }

    /// Go back one page. No validation.
    pub fn previous(&mut self, schema: &FormSchema) -> Result<usize, PagingError> {
        if self.page <= 1 {
            return Err(self.invalid(PageAction::Previous, self.page_count(schema)));
        }
        self.record(PageAction::Previous, self.page - 1);
        Ok(self.page)
    }

    /// Check that submission is allowed: only from the last page, and only
    /// if the whole record passes.
    pub fn submit(
        &mut self,
        schema: &FormSchema,
        validator: &CompiledValidator,
        record: &DataRecord,
        today: NaiveDate,
    ) -> Result<(), PagingError> {
        let count = self.page_count(schema);
        if self.page != count {
            return Err(self.invalid(PageAction::Submit, count));
        }
        validator
            .validate_on(record, today)
            .map_err(|errors| PagingError::RecordInvalid { errors })?;
        self.record(PageAction::Submit, self.page);
        Ok(())
    }

    /// Back to page 1; clears the progress flag. Allowed from any page.
    pub fn reset(&mut self) {
        self.progressed = false;
        self.record(PageAction::Reset, 1);
    }

    fn invalid(&self, action: PageAction, page_count: usize) -> PagingError {
        PagingError::InvalidTransition {
            action,
            page: self.page,
            page_count,
        }
    }

    fn record(&mut self, action: PageAction, to_page: usize) {
        tracing::debug!(from = self.page, to = to_page, %action, "page transition");
        self.transition_log.push(TransitionRecord {
            from_page: self.page,
            to_page,
            action,
            timestamp: Timestamp::now(),
        });
        self.page = to_page;
    }
}
