//! # formflow-core: Foundational Types for formflow
//!
//! Defines the type-level model shared by every other formflow crate:
//! the closed set of question kinds, the question descriptors that carry
//! their constraints, form schemas, and the data records holding answers.
//! It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Single `QuestionKind` enum.** One definition, 8 variants, exhaustive
//!    `match` everywhere. Adding a ninth kind is a compile error in every
//!    consumer until it is handled.
//!
//! 2. **Kind-specific constraints live in the variant.** `QuestionSpec` is a
//!    tagged union; a `minLength` cannot be attached to a number question.
//!
//! 3. **Newtype wrappers for domain primitives.** `QuestionId`, `AcceptList`,
//!    `DateBound` parse once at the boundary.
//!
//! 4. **Files are references, not bytes.** `FileRef` carries name, size and
//!    MIME type only.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `formflow-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod file;
pub mod identity;
pub mod kind;
pub mod question;
pub mod record;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use error::FormflowError;
pub use file::{AcceptList, AcceptPattern, FileRef, BYTES_PER_MB};
pub use identity::QuestionId;
pub use kind::{QuestionKind, QUESTION_KIND_COUNT};
pub use question::{
    ChoiceSpec, DateSpec, DropDownSpec, FileUploadSpec, FormSchema, MultiChoiceSpec, NumberSpec,
    Question, QuestionSpec, TextAreaSpec, TextSpec,
};
pub use record::{DataRecord, FieldValue};
pub use temporal::{is_iso_date_shape, parse_iso_date, DateBound, Timestamp, TODAY_SENTINEL};
