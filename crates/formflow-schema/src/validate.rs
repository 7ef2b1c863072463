//! # Schema Validation
//!
//! Structural validation of untrusted form-schema documents.
//!
//! ## Trust Boundary
//!
//! A schema document arrives as an arbitrary JSON value. It is only turned
//! into a typed [`FormSchema`] after every question has passed:
//!
//! 1. the `base` definition of the embedded meta-schema (`id`, `label`,
//!    `type` present and string-shaped, `required` boolean),
//! 2. the kind's own definition (attribute shapes, mandatory file-upload
//!    attributes, unique non-empty `options`),
//! 3. the range and calendar checks that JSON Schema cannot express
//!    (`minLength <= maxLength`, `min <= max`, real calendar dates,
//!    `minDate <= maxDate`, a usable `accept` list),
//! 4. id uniqueness across the whole document.
//!
//! Checks run independently per question and issues accumulate, so a
//! rejected document reports every problem at once. A rejected document is
//! never partially applied.
//!
//! The meta-schema (Draft 2020-12) is embedded at compile time from
//! `schemas/question.schema.json`; each kind is compiled once into its own
//! `jsonschema::Validator` by referencing `#/$defs/<tag>`.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

use formflow_core::{parse_iso_date, AcceptList, FormSchema, Question, QuestionKind, TODAY_SENTINEL};
use jsonschema::Validator;
use serde_json::{json, Value};
use thiserror::Error;

/// The embedded question meta-schema.
pub const QUESTION_META_SCHEMA: &str = include_str!("../schemas/question.schema.json");

const META_SCHEMA_NAME: &str = "question.schema.json";

/// Error during schema validation or loading.
#[derive(Error, Debug)]
pub enum SchemaValidationError {
    /// The document is not an acceptable form schema.
    #[error("schema rejected:\n{issues}")]
    Rejected {
        /// Every problem found, in document order.
        issues: SchemaIssues,
    },

    /// The document text is not well-formed JSON or YAML.
    #[error("document parse error for '{source_name}': {reason}")]
    Parse {
        /// File path or other name of the document source.
        source_name: String,
        /// Parser message.
        reason: String,
    },

    /// The document file could not be read.
    #[error("document load error for '{path}': {reason}")]
    DocumentLoad {
        /// Path to the document that failed to load.
        path: String,
        /// Reason the document could not be loaded.
        reason: String,
    },

    /// A meta-schema definition could not be compiled.
    #[error("meta-schema error in definition '{definition}': {reason}")]
    MetaSchema {
        /// `$defs` entry that failed.
        definition: String,
        /// Reason the validator could not be built.
        reason: String,
    },

    /// IO error reading a document.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SchemaValidationError {
    /// The issues of a rejected document, if this is a rejection.
    pub fn issues(&self) -> Option<&SchemaIssues> {
        match self {
            Self::Rejected { issues } => Some(issues),
            _ => None,
        }
    }
}

/// One problem found in a schema document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaIssue {
    /// 0-based index of the offending question; `None` for document-level
    /// problems (not a list, empty list).
    pub question_index: Option<usize>,
    /// JSON Pointer to the offending attribute, relative to the question.
    /// Empty when the question itself is at fault.
    pub pointer: String,
    /// Human-readable description.
    pub message: String,
}

impl SchemaIssue {
    fn document(message: impl Into<String>) -> Self {
        Self {
            question_index: None,
            pointer: String::new(),
            message: message.into(),
        }
    }

    fn question(index: usize, pointer: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            question_index: Some(index),
            pointer: pointer.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.question_index, self.pointer.is_empty()) {
            (None, _) => write!(f, "Schema: {}", self.message),
            (Some(i), true) => write!(f, "Question {}: {}", i + 1, self.message),
            (Some(i), false) => write!(f, "Question {} ({}): {}", i + 1, self.pointer, self.message),
        }
    }
}

/// Ordered collection of schema issues.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaIssues {
    issues: Vec<SchemaIssue>,
}

impl SchemaIssues {
    /// Returns the number of issues.
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Returns true if there are no issues.
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns a slice of all issues.
    pub fn issues(&self) -> &[SchemaIssue] {
        &self.issues
    }

    /// Rendered messages, one per issue, in document order.
    pub fn messages(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }

    /// Issues reported against one question.
    pub fn for_question(&self, index: usize) -> impl Iterator<Item = &SchemaIssue> {
        self.issues
            .iter()
            .filter(move |i| i.question_index == Some(index))
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<SchemaIssue> {
        self.issues
    }
}

impl fmt::Display for SchemaIssues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  {issue}")?;
        }
        Ok(())
    }
}

/// Validator for form-schema documents.
///
/// Compiles the `base` definition and one definition per kind at
/// construction. `SchemaValidator` is `Send + Sync` and can be shared.
pub struct SchemaValidator {
    base: Validator,
    kinds: HashMap<QuestionKind, Validator>,
}

impl fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("kinds", &self.kinds.len())
            .finish_non_exhaustive()
    }
}

impl SchemaValidator {
    /// Build a validator from the embedded meta-schema.
    ///
    /// # Errors
    ///
    /// Returns `SchemaValidationError::MetaSchema` if the embedded
    /// meta-schema cannot be parsed or compiled.
    pub fn new() -> Result<Self, SchemaValidationError> {
        let meta: Value = serde_json::from_str(QUESTION_META_SCHEMA).map_err(|e| {
            SchemaValidationError::MetaSchema {
                definition: META_SCHEMA_NAME.to_string(),
                reason: format!("invalid JSON: {e}"),
            }
        })?;
        Self::from_meta_schema(&meta)
    }

    /// Build a validator from a meta-schema value with a `$defs` table
    /// holding `base` and one entry per kind tag.
    pub fn from_meta_schema(meta: &Value) -> Result<Self, SchemaValidationError> {
        let defs = meta
            .get("$defs")
            .ok_or_else(|| SchemaValidationError::MetaSchema {
                definition: "$defs".to_string(),
                reason: "meta-schema has no $defs table".to_string(),
            })?;

        let base = compile_definition(defs, "base")?;
        let mut kinds = HashMap::with_capacity(QuestionKind::all_kinds().len());
        for kind in QuestionKind::all_kinds() {
            kinds.insert(*kind, compile_definition(defs, kind.as_str())?);
        }

        Ok(Self { base, kinds })
    }

    /// Validate a parsed document and produce the accepted schema.
    ///
    /// # Errors
    ///
    /// Returns `SchemaValidationError::Rejected` with every issue found if
    /// the document is not an acceptable form schema.
    pub fn validate(&self, document: &Value) -> Result<FormSchema, SchemaValidationError> {
        let items = match document {
            Value::Array(items) if items.is_empty() => {
                return Err(reject(vec![SchemaIssue::document(
                    "schema must contain at least one question",
                )]));
            }
            Value::Array(items) => items,
            other => {
                return Err(reject(vec![SchemaIssue::document(format!(
                    "schema must be a list of questions, found {}",
                    json_type_name(other)
                ))]));
            }
        };

        let mut issues = Vec::new();
        let mut first_seen: HashMap<&str, usize> = HashMap::new();
        let mut questions = Vec::with_capacity(items.len());

        for (index, item) in items.iter().enumerate() {
            if let Some(question) = self.check_question(index, item, &mut first_seen, &mut issues) {
                questions.push(question);
            }
        }

        if issues.is_empty() {
            tracing::debug!(questions = questions.len(), "schema accepted");
            Ok(FormSchema::from_questions(questions))
        } else {
            tracing::info!(issues = issues.len(), "schema rejected");
            Err(reject(issues))
        }
    }

    /// Collect every issue of one question; return the typed question only
    /// if none was found.
    fn check_question<'a>(
        &self,
        index: usize,
        item: &'a Value,
        first_seen: &mut HashMap<&'a str, usize>,
        issues: &mut Vec<SchemaIssue>,
    ) -> Option<Question> {
        let start = issues.len();

        if !item.is_object() {
            issues.push(SchemaIssue::question(
                index,
                "",
                format!("question must be an object, found {}", json_type_name(item)),
            ));
            return None;
        }

        collect_errors(&self.base, index, item, issues);

        if let Some(id) = item.get("id").and_then(Value::as_str).filter(|s| !s.is_empty()) {
            match first_seen.entry(id) {
                Entry::Occupied(first) => issues.push(SchemaIssue::question(
                    index,
                    "/id",
                    format!("duplicate id {id:?} (already used by Question {})", first.get() + 1),
                )),
                Entry::Vacant(slot) => {
                    slot.insert(index);
                }
            }
        }

        // A missing or non-string tag is already reported by `base`.
        let mut kind = None;
        if let Some(tag) = item.get("type").and_then(Value::as_str) {
            match tag.parse::<QuestionKind>() {
                Ok(parsed) => {
                    self.check_kind(parsed, index, item, issues);
                    kind = Some(parsed);
                }
                Err(e) => issues.push(SchemaIssue::question(
                    index,
                    "/type",
                    format!("{e}; expected one of: {}", QuestionKind::tag_list()),
                )),
            }
        }

        if issues.len() > start {
            return None;
        }

        let mut item = item.clone();
        if let Some(kind) = kind {
            normalize_counts(kind, &mut item);
        }
        match serde_json::from_value::<Question>(item) {
            Ok(question) => Some(question),
            Err(e) => {
                issues.push(SchemaIssue::question(index, "", format!("question could not be read: {e}")));
                None
            }
        }
    }

    fn check_kind(&self, kind: QuestionKind, index: usize, item: &Value, issues: &mut Vec<SchemaIssue>) {
        let start = issues.len();
        if let Some(validator) = self.kinds.get(&kind) {
            collect_errors(validator, index, item, issues);
        }
        // Range checks assume well-shaped attributes.
        if issues.len() > start {
            return;
        }
        for (pointer, message) in semantic_issues(kind, item) {
            issues.push(SchemaIssue::question(index, pointer, message));
        }
    }
}

fn reject(issues: Vec<SchemaIssue>) -> SchemaValidationError {
    SchemaValidationError::Rejected {
        issues: SchemaIssues { issues },
    }
}

fn compile_definition(defs: &Value, name: &str) -> Result<Validator, SchemaValidationError> {
    if defs.get(name).is_none() {
        return Err(SchemaValidationError::MetaSchema {
            definition: name.to_string(),
            reason: "definition not found".to_string(),
        });
    }
    let schema = json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$defs": defs,
        "$ref": format!("#/$defs/{name}"),
    });

    let mut opts = jsonschema::options();
    opts.with_draft(jsonschema::Draft::Draft202012);
    opts.build(&schema).map_err(|e| SchemaValidationError::MetaSchema {
        definition: name.to_string(),
        reason: e.to_string(),
    })
}

fn collect_errors(validator: &Validator, index: usize, item: &Value, issues: &mut Vec<SchemaIssue>) {
    issues.extend(
        validator
            .iter_errors(item)
            .map(|e| SchemaIssue::question(index, e.instance_path.to_string(), e.to_string())),
    );
}

/// Checks JSON Schema cannot express. Attributes are known to be
/// well-shaped when this runs.
fn semantic_issues(kind: QuestionKind, item: &Value) -> Vec<(String, String)> {
    let mut found = Vec::new();
    match kind {
        QuestionKind::Text | QuestionKind::TextArea => {
            check_ordered(item, "minLength", "maxLength", &mut found);
        }
        QuestionKind::MultiChoice | QuestionKind::Number => {
            check_ordered(item, "min", "max", &mut found);
        }
        QuestionKind::DatePicker => check_date_bounds(item, &mut found),
        QuestionKind::FileUpload => {
            if let Some(accept) = item.get("accept").and_then(Value::as_str) {
                if let Err(e) = AcceptList::parse(accept) {
                    found.push(("/accept".to_string(), e.to_string()));
                }
            }
        }
        QuestionKind::RadioButtons | QuestionKind::DropDown => {}
    }
    found
}

/// Attributes of `kind` declared as `count` in the meta-schema.
fn count_attributes(kind: QuestionKind) -> &'static [&'static str] {
    match kind {
        QuestionKind::Text => &["minLength", "maxLength"],
        QuestionKind::TextArea => &["minLength", "maxLength", "rows"],
        QuestionKind::MultiChoice => &["min", "max"],
        _ => &[],
    }
}

/// Rewrite counts written with a zero fraction (`2.0`) as integers.
///
/// The meta-schema's `integer` type admits them; typed decoding does not.
fn normalize_counts(kind: QuestionKind, item: &mut Value) {
    let Some(object) = item.as_object_mut() else {
        return;
    };
    for key in count_attributes(kind) {
        let Some(slot) = object.get_mut(*key) else {
            continue;
        };
        if slot.is_f64() {
            if let Some(whole) = slot.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u32::MAX as f64) {
                *slot = Value::from(whole as u64);
            }
        }
    }
}

fn check_ordered(item: &Value, low: &str, high: &str, found: &mut Vec<(String, String)>) {
    let (Some(lo), Some(hi)) = (item.get(low), item.get(high)) else {
        return;
    };
    if let (Some(a), Some(b)) = (lo.as_f64(), hi.as_f64()) {
        if a > b {
            found.push((
                format!("/{low}"),
                format!("'{low}' ({lo}) cannot be greater than '{high}' ({hi})"),
            ));
        }
    }
}

fn check_date_bounds(item: &Value, found: &mut Vec<(String, String)>) {
    let mut literal = |key: &str| {
        let raw = item.get(key).and_then(Value::as_str)?;
        if raw == TODAY_SENTINEL {
            return None;
        }
        let date = parse_iso_date(raw);
        if date.is_none() {
            found.push((format!("/{key}"), format!("{raw:?} is not a valid calendar date")));
        }
        date
    };
    let min = literal("minDate");
    let max = literal("maxDate");
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            found.push((
                "/minDate".to_string(),
                format!("'minDate' ({min}) cannot be later than 'maxDate' ({max})"),
            ));
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formflow_core::QuestionSpec;

    fn validator() -> SchemaValidator {
        SchemaValidator::new().expect("embedded meta-schema compiles")
    }

    fn rejected(document: Value) -> SchemaIssues {
        match validator().validate(&document) {
            Err(SchemaValidationError::Rejected { issues }) => issues,
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    fn kyc_document() -> Value {
        json!([
            {"id": "full_name", "label": "Full Name", "type": "text", "required": true,
             "placeholder": "Enter your full name", "minLength": 2, "maxLength": 100},
            {"id": "email", "label": "Email Address", "type": "text", "required": true},
            {"id": "bio", "label": "Bio", "type": "textarea", "rows": 4, "maxLength": 500},
            {"id": "gender", "label": "Gender", "type": "radio_buttons", "required": true,
             "options": ["Male", "Female", "Other"]},
            {"id": "hobbies", "label": "Hobbies", "type": "multi_choice",
             "options": ["Reading", "Gaming", "Sports"], "min": 1, "max": 2},
            {"id": "country", "label": "Country", "type": "drop_down", "required": true,
             "options": ["India", "USA", "UK"], "placeholder": "Select a country"},
            {"id": "birth_date", "label": "Birth Date", "type": "date_picker", "required": true,
             "minDate": "1900-01-01", "maxDate": "today"},
            {"id": "documents", "label": "Documents", "type": "file_upload", "required": true,
             "accept": ".pdf,.jpg,.png", "maxSize": 5, "multiple": true},
            {"id": "age", "label": "Age", "type": "number", "min": 18, "max": 120, "step": 1}
        ])
    }

    // ── Acceptance ──────────────────────────────────────────────────

    #[test]
    fn test_embedded_meta_schema_compiles_every_kind() {
        let v = validator();
        assert_eq!(v.kinds.len(), formflow_core::QUESTION_KIND_COUNT);
    }

    #[test]
    fn test_accepts_all_eight_kinds() {
        let schema = validator().validate(&kyc_document()).unwrap();
        assert_eq!(schema.len(), 9);
        assert_eq!(schema.kind_of("documents"), Some(QuestionKind::FileUpload));
        assert_eq!(schema.kind_of("birth_date"), Some(QuestionKind::DatePicker));
        let ids: Vec<&str> = schema.ids().map(|id| id.as_str()).collect();
        assert_eq!(ids[0], "full_name");
        assert_eq!(ids[8], "age");
    }

    #[test]
    fn test_required_defaults_to_false_when_absent() {
        let schema = validator()
            .validate(&json!([{"id": "a", "label": "A", "type": "text"}]))
            .unwrap();
        assert!(!schema.questions()[0].required);
    }

    // ── Document level ──────────────────────────────────────────────

    #[test]
    fn test_empty_document_is_single_top_level_issue() {
        let issues = rejected(json!([]));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues.issues()[0].question_index, None);
        assert!(issues.messages()[0].starts_with("Schema: "));
    }

    #[test]
    fn test_non_list_document_rejected() {
        let issues = rejected(json!({"id": "a"}));
        assert_eq!(issues.len(), 1);
        assert!(issues.issues()[0].message.contains("an object"));
    }

    #[test]
    fn test_non_object_question_rejected() {
        let issues = rejected(json!(["text"]));
        assert_eq!(issues.issues()[0].question_index, Some(0));
        assert!(issues.issues()[0].message.contains("must be an object"));
    }

    // ── Common attributes ───────────────────────────────────────────

    #[test]
    fn test_missing_id_and_label_both_reported() {
        let issues = rejected(json!([{"type": "text"}]));
        assert_eq!(issues.len(), 2);
        let text = issues.to_string();
        assert!(text.contains("\"id\""), "{text}");
        assert!(text.contains("\"label\""), "{text}");
    }

    #[test]
    fn test_required_must_be_boolean() {
        let issues = rejected(json!([{"id": "a", "label": "A", "type": "text", "required": "yes"}]));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues.issues()[0].pointer, "/required");
    }

    #[test]
    fn test_unknown_type_names_tag_and_lists_valid_tags() {
        let issues = rejected(json!([{"id": "a", "label": "A", "type": "slider"}]));
        assert_eq!(issues.len(), 1);
        let issue = &issues.issues()[0];
        assert_eq!(issue.pointer, "/type");
        assert!(issue.message.contains("\"slider\""));
        assert!(issue.message.contains("radio_buttons"));
        assert!(issue.message.contains("date_picker"));
    }

    #[test]
    fn test_non_string_type_reported_once() {
        let issues = rejected(json!([{"id": "a", "label": "A", "type": 3}]));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues.issues()[0].pointer, "/type");
    }

    // ── Kind-specific shapes ────────────────────────────────────────

    #[test]
    fn test_choice_kinds_require_non_empty_options() {
        for tag in ["radio_buttons", "multi_choice", "drop_down"] {
            let issues = rejected(json!([{"id": "a", "label": "A", "type": tag}]));
            assert_eq!(issues.len(), 1, "{tag}");
            let issues = rejected(json!([{"id": "a", "label": "A", "type": tag, "options": []}]));
            assert_eq!(issues.issues()[0].pointer, "/options", "{tag}");
        }
    }

    #[test]
    fn test_options_must_be_unique_strings() {
        let issues = rejected(json!([
            {"id": "a", "label": "A", "type": "radio_buttons", "options": ["Yes", "Yes"]}
        ]));
        assert_eq!(issues.issues()[0].pointer, "/options");
        let issues = rejected(json!([
            {"id": "a", "label": "A", "type": "drop_down", "options": ["Yes", 2]}
        ]));
        assert_eq!(issues.issues()[0].pointer, "/options/1");
    }

    #[test]
    fn test_file_upload_requires_accept_max_size_and_multiple() {
        let issues = rejected(json!([{"id": "f", "label": "F", "type": "file_upload"}]));
        assert_eq!(issues.len(), 3);
        let issues = rejected(json!([
            {"id": "f", "label": "F", "type": "file_upload", "accept": ".pdf", "maxSize": 1}
        ]));
        assert_eq!(issues.len(), 1);
        assert!(issues.issues()[0].message.contains("multiple"));
    }

    #[test]
    fn test_max_size_must_be_positive() {
        let issues = rejected(json!([
            {"id": "f", "label": "F", "type": "file_upload", "accept": ".pdf", "maxSize": 0, "multiple": false}
        ]));
        assert_eq!(issues.issues()[0].pointer, "/maxSize");
    }

    #[test]
    fn test_unusable_accept_list_rejected() {
        let issues = rejected(json!([
            {"id": "f", "label": "F", "type": "file_upload", "accept": "pdf", "maxSize": 1, "multiple": false}
        ]));
        assert_eq!(issues.issues()[0].pointer, "/accept");
    }

    #[test]
    fn test_lengths_must_be_non_negative_integers() {
        let issues = rejected(json!([{"id": "a", "label": "A", "type": "text", "minLength": -1}]));
        assert_eq!(issues.issues()[0].pointer, "/minLength");
        let issues = rejected(json!([{"id": "a", "label": "A", "type": "textarea", "rows": 2.5}]));
        assert_eq!(issues.issues()[0].pointer, "/rows");
    }

    #[test]
    fn test_whole_number_counts_written_as_floats_are_accepted() {
        let schema = validator()
            .validate(&json!([
                {"id": "bio", "label": "Bio", "type": "textarea", "minLength": 2.0, "rows": 3.0},
                {"id": "tags", "label": "Tags", "type": "multi_choice",
                 "options": ["x", "y"], "min": 1.0, "max": 2.0}
            ]))
            .unwrap();
        match &schema.question("bio").unwrap().spec {
            QuestionSpec::TextArea(spec) => {
                assert_eq!(spec.min_length, Some(2));
                assert_eq!(spec.rows, Some(3));
            }
            other => panic!("expected textarea, got {other:?}"),
        }
        match &schema.question("tags").unwrap().spec {
            QuestionSpec::MultiChoice(spec) => assert_eq!(spec.min, Some(1)),
            other => panic!("expected multi_choice, got {other:?}"),
        }
    }

    #[test]
    fn test_step_must_be_positive() {
        let issues = rejected(json!([{"id": "n", "label": "N", "type": "number", "step": 0}]));
        assert_eq!(issues.issues()[0].pointer, "/step");
    }

    // ── Range sanity ────────────────────────────────────────────────

    #[test]
    fn test_min_length_greater_than_max_length() {
        let issues = rejected(json!([
            {"id": "a", "label": "A", "type": "text", "minLength": 10, "maxLength": 5}
        ]));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues.issues()[0].pointer, "/minLength");
        assert!(issues.issues()[0].message.contains("cannot be greater than 'maxLength'"));
    }

    #[test]
    fn test_min_greater_than_max_for_number_and_multi_choice() {
        let issues = rejected(json!([
            {"id": "n", "label": "N", "type": "number", "min": 5, "max": 1},
            {"id": "m", "label": "M", "type": "multi_choice", "options": ["a", "b"], "min": 2, "max": 1}
        ]));
        assert_eq!(issues.len(), 2);
        assert_eq!(issues.issues()[0].question_index, Some(0));
        assert_eq!(issues.issues()[1].question_index, Some(1));
    }

    #[test]
    fn test_min_date_cannot_be_today() {
        let issues = rejected(json!([
            {"id": "d", "label": "D", "type": "date_picker", "minDate": "today"}
        ]));
        assert_eq!(issues.issues()[0].pointer, "/minDate");
    }

    #[test]
    fn test_date_patterns() {
        let issues = rejected(json!([
            {"id": "d", "label": "D", "type": "date_picker", "maxDate": "01/01/2020"}
        ]));
        assert_eq!(issues.issues()[0].pointer, "/maxDate");
        assert!(validator()
            .validate(&json!([{"id": "d", "label": "D", "type": "date_picker", "maxDate": "today"}]))
            .is_ok());
    }

    #[test]
    fn test_impossible_calendar_date_rejected() {
        let issues = rejected(json!([
            {"id": "d", "label": "D", "type": "date_picker", "minDate": "2025-02-30"}
        ]));
        assert_eq!(issues.len(), 1);
        assert!(issues.issues()[0].message.contains("not a valid calendar date"));
    }

    #[test]
    fn test_min_date_after_max_date_rejected() {
        let issues = rejected(json!([
            {"id": "d", "label": "D", "type": "date_picker", "minDate": "2020-01-02", "maxDate": "2020-01-01"}
        ]));
        assert_eq!(issues.len(), 1);
        assert!(issues.issues()[0].message.contains("cannot be later than"));
    }

    // ── Uniqueness and accumulation ─────────────────────────────────

    #[test]
    fn test_duplicate_ids_name_the_first_occurrence() {
        let issues = rejected(json!([
            {"id": "name", "label": "Name", "type": "text"},
            {"id": "age", "label": "Age", "type": "number"},
            {"id": "name", "label": "Name 2", "type": "text"},
            {"id": "name", "label": "Name 3", "type": "textarea"}
        ]));
        assert_eq!(issues.len(), 2);
        assert_eq!(issues.issues()[0].question_index, Some(2));
        assert_eq!(issues.issues()[1].question_index, Some(3));
        assert!(issues.issues()[0].message.contains("Question 1"));
    }

    #[test]
    fn test_issues_accumulate_across_questions_in_order() {
        let issues = rejected(json!([
            {"label": "A", "type": "text"},
            {"id": "b", "label": "B", "type": "text"},
            {"id": "c", "label": "C", "type": "mystery"},
            {"id": "d", "label": "D", "type": "number", "min": 3, "max": 1}
        ]));
        let indices: Vec<Option<usize>> = issues.issues().iter().map(|i| i.question_index).collect();
        assert_eq!(indices, vec![Some(0), Some(2), Some(3)]);
        assert_eq!(issues.for_question(1).count(), 0);
    }

    // ── Display ─────────────────────────────────────────────────────

    #[test]
    fn test_issue_display_format() {
        let issue = SchemaIssue::question(2, "/options", "[] has less than 1 item");
        assert_eq!(issue.to_string(), "Question 3 (/options): [] has less than 1 item");
        let issue = SchemaIssue::question(0, "", "question must be an object");
        assert_eq!(issue.to_string(), "Question 1: question must be an object");
        let issue = SchemaIssue::document("schema must contain at least one question");
        assert_eq!(issue.to_string(), "Schema: schema must contain at least one question");
    }

    #[test]
    fn test_rejected_error_display_lists_issues() {
        let err = validator().validate(&json!([{"id": "a", "type": "text"}])).unwrap_err();
        let text = err.to_string();
        assert!(text.starts_with("schema rejected:"));
        assert!(text.contains("Question 1"));
        assert!(err.issues().is_some());
    }

    #[test]
    fn test_meta_schema_without_defs_is_an_error() {
        let err = SchemaValidator::from_meta_schema(&json!({})).unwrap_err();
        assert!(matches!(err, SchemaValidationError::MetaSchema { .. }));
        let err = SchemaValidator::from_meta_schema(&json!({"$defs": {"base": {}}})).unwrap_err();
        assert!(matches!(err, SchemaValidationError::MetaSchema { definition, .. } if definition == "text"));
    }
}
