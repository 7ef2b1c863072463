//! # formflow-schema: Form Schema Validation & Loading
//!
//! Turns an untrusted schema document into an accepted
//! [`FormSchema`](formflow_core::FormSchema) or an ordered list of
//! structured issues.
//!
//! ## Validation (`validate`)
//!
//! [`SchemaValidator`] checks each question against the embedded
//! Draft 2020-12 meta-schema (`schemas/question.schema.json`), then applies
//! range, calendar and uniqueness checks in code. Issues accumulate across
//! questions and carry the question index and a JSON Pointer.
//!
//! ## Loading (`loader`)
//!
//! [`SchemaLoader`] reads JSON or YAML files (by extension) and reports
//! malformed syntax separately from schema-shape errors.
//!
//! ## Crate Policy
//!
//! - Depends only on `formflow-core` internally.
//! - A rejected document is never partially applied: either every question
//!   passes and a `FormSchema` is returned, or nothing is.
//! - The meta-schema's `$defs` names must match the kind wire tags in
//!   `formflow_core::QuestionKind::as_str`.

pub mod loader;
pub mod validate;

pub use loader::{parse_document, DocumentFormat, SchemaLoader, DEFAULT_SCHEMA_PATH};
pub use validate::{
    SchemaIssue, SchemaIssues, SchemaValidationError, SchemaValidator, QUESTION_META_SCHEMA,
};
