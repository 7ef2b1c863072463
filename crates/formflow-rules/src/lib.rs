//! # formflow-rules: Validation Rules & Default Values
//!
//! Everything derived from an accepted [`FormSchema`](formflow_core::FormSchema)
//! that operates on a [`DataRecord`](formflow_core::DataRecord):
//!
//! - [`CompiledValidator`]: one [`FieldRule`] per question, producing at
//!   most one message per field. Whole-record, page-scoped
//!   ([`CompiledValidator::validate_fields`]) and single-field
//!   ([`CompiledValidator::validate_field`]) entry points.
//! - [`default_record`]: the empty record, one entry per question.
//! - [`merge_over_defaults`]: prefill from a stored snapshot, keeping only
//!   values of the right shape for non-file questions.
//!
//! ## Crate Policy
//!
//! - Depends only on `formflow-core` internally.
//! - Compiling is pure: the same schema always yields validators with
//!   identical accept/reject behavior.
//! - The current date is an input. Only [`CompiledValidator::validate`]
//!   reads the clock.

pub mod compiler;
pub mod defaults;

pub use compiler::{CompileError, CompiledValidator, FieldErrors, FieldRule};
pub use defaults::{default_record, default_value, merge_over_defaults, shape_matches};
