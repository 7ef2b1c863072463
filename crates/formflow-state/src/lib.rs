//! # formflow-state: Paging, Persistence & Session Orchestration
//!
//! The runtime side of a form: which questions are visible, when the user
//! may advance, what may be written to storage, and how one submission is
//! carried out.
//!
//! ## Components
//!
//! - **Paging** (`paging.rs`): `Page(1) → … → Page(count)` with `Next`,
//!   `Previous`, `Submit` and `Reset`. Page membership is a pure function
//!   of `(question count, mode, page)`. Page size is locked once the user
//!   has progressed past page 1.
//!
//! - **Persistence** (`persistence.rs`): the filter producing a file-free
//!   [`PersistenceSnapshot`], the [`SnapshotWriter`] write policy and the
//!   [`SnapshotStore`] collaborator with memory and directory backends.
//!
//! - **Submission** (`submission.rs`): the [`SubmissionService`]
//!   collaborator, a directory-backed service and a scriptable recording
//!   double.
//!
//! - **Preview** (`preview.rs`): ownership of transient image previews.
//!
//! - **Session** (`session.rs`): [`FormSession`], the explicit session
//!   context tying the above together.
//!
//! ## Design
//!
//! Collaborators are traits (`Send + Sync`, object-safe) held behind
//! `Arc<dyn …>`. The session itself is single-threaded: every mutation is
//! a `&mut self` method invoked for one discrete user event.

pub mod config;
pub mod paging;
pub mod persistence;
pub mod preview;
pub mod session;
pub mod submission;

// ─── Paging re-exports ──────────────────────────────────────────────

pub use paging::{
    page_bounds, page_count, page_question_ids, page_questions, PageAction, PageMode, PageSize,
    Pager, PagingError, TransitionRecord, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, MIN_PAGE_SIZE,
};

// ─── Persistence re-exports ─────────────────────────────────────────

pub use persistence::{
    persistence_snapshot, FileSnapshotStore, MemorySnapshotStore, PersistenceSnapshot,
    SnapshotStore, SnapshotWriter, StoreError, WriteOutcome, SNAPSHOT_FORMAT_VERSION,
};

// ─── Submission re-exports ──────────────────────────────────────────

pub use submission::{
    submit_checked, DirectorySubmissionService, RecordingSubmissionService, ScriptedOutcome,
    SubmissionError, SubmissionLog, SubmissionReceipt, SubmissionService,
};

// ─── Session re-exports ─────────────────────────────────────────────

pub use config::{SessionConfig, DEFAULT_STORAGE_KEY};
pub use preview::{previews_images, PreviewAllocator, PreviewHandle, PreviewRegistry, TrackingPreviewAllocator};
pub use session::{Clock, FixedClock, FormSession, SessionError, SystemClock};
