//! # Default Value Builder
//!
//! Derives the initial data record of a schema, and prefills it from a
//! stored snapshot.

use formflow_core::{DataRecord, FieldValue, FormSchema, Question, QuestionSpec};

/// Zero value of one question, matching its record shape.
pub fn default_value(question: &Question) -> FieldValue {
    match &question.spec {
        QuestionSpec::Text(_)
        | QuestionSpec::TextArea(_)
        | QuestionSpec::RadioButtons(_)
        | QuestionSpec::DropDown(_)
        | QuestionSpec::DatePicker(_) => FieldValue::Text(String::new()),
        QuestionSpec::Number(_) => FieldValue::Empty,
        QuestionSpec::MultiChoice(_) => FieldValue::Choices(Vec::new()),
        QuestionSpec::FileUpload(spec) if spec.multiple => FieldValue::Files(Vec::new()),
        QuestionSpec::FileUpload(_) => FieldValue::Empty,
    }
}

/// The empty record of a schema: exactly one entry per question id.
pub fn default_record(schema: &FormSchema) -> DataRecord {
    schema
        .questions()
        .iter()
        .map(|q| (q.id.clone(), default_value(q)))
        .collect()
}

/// Whether `value` has the record shape of the question's kind.
pub fn shape_matches(question: &Question, value: &FieldValue) -> bool {
    match (&question.spec, value) {
        (
            QuestionSpec::Text(_)
            | QuestionSpec::TextArea(_)
            | QuestionSpec::RadioButtons(_)
            | QuestionSpec::DropDown(_)
            | QuestionSpec::DatePicker(_),
            FieldValue::Text(_),
        ) => true,
        (QuestionSpec::Number(_), FieldValue::Number(_) | FieldValue::Empty) => true,
        (QuestionSpec::MultiChoice(_), FieldValue::Choices(_)) => true,
        (QuestionSpec::FileUpload(spec), FieldValue::Files(_)) => spec.multiple,
        (QuestionSpec::FileUpload(spec), FieldValue::File(_) | FieldValue::Empty) => !spec.multiple,
        _ => false,
    }
}

/// Prefill `defaults` from a stored snapshot.
///
/// Only ids present in the schema are taken, never file-upload ids, and
/// only when the stored value has the kind's shape. Everything else keeps
/// its default.
pub fn merge_over_defaults(schema: &FormSchema, defaults: &DataRecord, stored: &DataRecord) -> DataRecord {
    let mut merged = defaults.clone();
    for question in schema.questions() {
        if question.kind().holds_files() {
            continue;
        }
        match stored.get(question.id.as_str()) {
            Some(value) if shape_matches(question, value) => {
                merged.insert(question.id.clone(), value.clone());
            }
            Some(value) => {
                tracing::debug!(id = %question.id, ?value, "ignoring stored value of the wrong shape");
            }
            None => {}
        }
    }
    merged
}
