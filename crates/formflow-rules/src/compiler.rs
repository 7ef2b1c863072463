//! # Validation Rule Compiler
//!
//! Compiles an accepted [`FormSchema`] into a [`CompiledValidator`]: one
//! [`FieldRule`] per question, evaluated against a [`DataRecord`].
//!
//! ## Evaluation Order
//!
//! Each field yields at most one message. Rules run in a fixed order and
//! the first failure wins:
//!
//! ```text
//! required ─▶ type/format ─▶ length/range ─▶ membership/cardinality ─▶ date bounds
//! ```
//!
//! Length, range and format rules only apply to non-empty answers: an
//! optional text field with `minLength` accepts the empty string.
//!
//! ## Dates
//!
//! A `"today"` bound is resolved at validation time. [`CompiledValidator::validate`]
//! uses the current UTC date; every other entry point takes it explicitly.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, Utc};
use formflow_core::{
    parse_iso_date, AcceptList, DataRecord, DateBound, FieldValue, FileRef, FormSchema,
    FormflowError, Question, QuestionId, QuestionSpec,
};
use regex::Regex;
use thiserror::Error;

const EMAIL_PATTERN: &str =
    r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$";

/// Failure to compile a schema into rules.
#[derive(Error, Debug)]
pub enum CompileError {
    /// A built-in pattern failed to compile.
    #[error("pattern compile error: {0}")]
    Pattern(#[from] regex::Error),
}

/// Field-level validation errors: question id to message, at most one
/// message per field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: BTreeMap<QuestionId, String>,
}

impl FieldErrors {
    /// No errors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Message for one field.
    pub fn get(&self, id: &str) -> Option<&str> {
        self.errors.get(id).map(String::as_str)
    }

    /// Set or clear the message of one field.
    pub fn set(&mut self, id: QuestionId, message: Option<String>) {
        match message {
            Some(message) => {
                self.errors.insert(id, message);
            }
            None => {
                self.errors.remove(id.as_str());
            }
        }
    }

    /// Remove every message.
    pub fn clear(&mut self) {
        self.errors.clear();
    }

    /// Number of failing fields.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether no field failed.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Iterate over `(id, message)` in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&QuestionId, &str)> {
        self.errors.iter().map(|(id, m)| (id, m.as_str()))
    }

    /// Consume into the underlying map.
    pub fn into_map(self) -> BTreeMap<QuestionId, String> {
        self.errors
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (id, message)) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  {id}: {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

impl From<FieldErrors> for FormflowError {
    fn from(errors: FieldErrors) -> Self {
        FormflowError::FieldValidation(format!("{} field(s) invalid:\n{errors}", errors.len()))
    }
}

/// Kind-specific part of a compiled rule.
#[derive(Debug, Clone)]
enum Check {
    Text {
        min_length: Option<usize>,
        max_length: Option<usize>,
        email: Option<Regex>,
    },
    Number {
        min: Option<f64>,
        max: Option<f64>,
    },
    Choice {
        options: Vec<String>,
    },
    MultiChoice {
        options: Vec<String>,
        min: usize,
        max: Option<usize>,
    },
    Date {
        min: Option<DateBound>,
        max: Option<DateBound>,
    },
    File {
        accept: AcceptList,
        max_size: f64,
        max_bytes: f64,
        multiple: bool,
    },
}

/// The compiled rule of one question.
#[derive(Debug, Clone)]
pub struct FieldRule {
    id: QuestionId,
    label: String,
    required: bool,
    check: Check,
}

impl FieldRule {
    fn compile(question: &Question, email: &Regex) -> Self {
        let check = match &question.spec {
            QuestionSpec::Text(spec) => Check::Text {
                min_length: spec.min_length,
                max_length: spec.max_length,
                email: question.id.is_email_like().then(|| email.clone()),
            },
            QuestionSpec::TextArea(spec) => Check::Text {
                min_length: spec.min_length,
                max_length: spec.max_length,
                email: question.id.is_email_like().then(|| email.clone()),
            },
            QuestionSpec::Number(spec) => Check::Number {
                min: spec.min,
                max: spec.max,
            },
            QuestionSpec::RadioButtons(spec) => Check::Choice {
                options: spec.options.clone(),
            },
            QuestionSpec::DropDown(spec) => Check::Choice {
                options: spec.options.clone(),
            },
            QuestionSpec::MultiChoice(spec) => Check::MultiChoice {
                options: spec.options.clone(),
                min: spec.effective_min(question.required),
                max: spec.max,
            },
            QuestionSpec::DatePicker(spec) => Check::Date {
                min: spec.min_date,
                max: spec.max_date,
            },
            QuestionSpec::FileUpload(spec) => Check::File {
                accept: spec.accept.clone(),
                max_size: spec.max_size,
                max_bytes: spec.max_bytes(),
                multiple: spec.multiple,
            },
        };
        Self {
            id: question.id.clone(),
            label: question.label.clone(),
            required: question.required,
            check,
        }
    }

    /// The question id this rule belongs to.
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    /// Whether the question is required.
    pub fn required(&self) -> bool {
        self.required
    }

    /// Evaluate the rule. A missing value is treated as the empty answer.
    pub fn check(&self, value: Option<&FieldValue>, today: NaiveDate) -> Option<String> {
        let value = value.unwrap_or(&FieldValue::Empty);
        match &self.check {
            Check::Text {
                min_length,
                max_length,
                email,
            } => self.check_text(value, *min_length, *max_length, email.as_ref()),
            Check::Number { min, max } => self.check_number(value, *min, *max),
            Check::Choice { options } => self.check_choice(value, options),
            Check::MultiChoice { options, min, max } => {
                self.check_multi_choice(value, options, *min, *max)
            }
            Check::Date { min, max } => self.check_date(value, *min, *max, today),
            Check::File {
                accept,
                max_size,
                max_bytes,
                multiple,
            } => self.check_files(value, accept, *max_size, *max_bytes, *multiple),
        }
    }

    fn required_message(&self) -> Option<String> {
        self.required.then(|| format!("{} is required", self.label))
    }

    fn invalid_value(&self) -> Option<String> {
        Some(format!("{} has an invalid value", self.label))
    }

    fn check_text(
        &self,
        value: &FieldValue,
        min_length: Option<usize>,
        max_length: Option<usize>,
        email: Option<&Regex>,
    ) -> Option<String> {
        let text = match value {
            FieldValue::Empty => "",
            FieldValue::Text(s) => s.as_str(),
            _ => return self.invalid_value(),
        };
        if text.is_empty() {
            return self.required_message();
        }
        if email.is_some_and(|re| !re.is_match(text)) {
            return Some("Please enter a valid email address".to_string());
        }
        let len = text.chars().count();
        if let Some(min) = min_length.filter(|min| len < *min) {
            return Some(format!("{} must be at least {min} characters", self.label));
        }
        if let Some(max) = max_length.filter(|max| len > *max) {
            return Some(format!("{} must be at most {max} characters", self.label));
        }
        None
    }

    fn check_number(&self, value: &FieldValue, min: Option<f64>, max: Option<f64>) -> Option<String> {
        let n = match value {
            FieldValue::Empty => return self.required_message(),
            FieldValue::Number(n) if n.is_finite() => *n,
            _ => return Some(format!("{} must be a number", self.label)),
        };
        if let Some(min) = min.filter(|min| n < *min) {
            return Some(format!("{} must be at least {min}", self.label));
        }
        if let Some(max) = max.filter(|max| n > *max) {
            return Some(format!("{} must be no more than {max}", self.label));
        }
        None
    }

    fn check_choice(&self, value: &FieldValue, options: &[String]) -> Option<String> {
        let choice = match value {
            FieldValue::Empty => "",
            FieldValue::Text(s) => s.as_str(),
            _ => return self.invalid_value(),
        };
        if choice.is_empty() {
            return self.required_message();
        }
        if !options.iter().any(|o| o == choice) {
            return Some(format!("{} must be one of the listed options", self.label));
        }
        None
    }

    fn check_multi_choice(
        &self,
        value: &FieldValue,
        options: &[String],
        min: usize,
        max: Option<usize>,
    ) -> Option<String> {
        let selected: &[String] = match value {
            FieldValue::Empty => &[],
            FieldValue::Choices(items) => items,
            _ => return self.invalid_value(),
        };
        if selected.len() < min {
            return Some(format!(
                "Please select at least {min} option(s) for {}",
                self.label
            ));
        }
        if let Some(max) = max.filter(|max| selected.len() > *max) {
            return Some(format!(
                "Please select no more than {max} option(s) for {}",
                self.label
            ));
        }
        if selected.iter().any(|s| !options.contains(s)) {
            return Some(format!("{} contains an option that is not listed", self.label));
        }
        None
    }

    fn check_date(
        &self,
        value: &FieldValue,
        min: Option<DateBound>,
        max: Option<DateBound>,
        today: NaiveDate,
    ) -> Option<String> {
        let raw = match value {
            FieldValue::Empty => "",
            FieldValue::Text(s) => s.as_str(),
            _ => return self.invalid_value(),
        };
        if raw.is_empty() {
            return self.required_message();
        }
        let Some(date) = parse_iso_date(raw) else {
            return Some("Please enter a valid date".to_string());
        };
        if let Some(min) = min.filter(|b| date < b.resolve(today)) {
            return Some(format!("Date must be on or after {min}"));
        }
        if let Some(max) = max.filter(|b| date > b.resolve(today)) {
            return Some(format!("Date must be on or before {max}"));
        }
        None
    }

    fn check_files(
        &self,
        value: &FieldValue,
        accept: &AcceptList,
        max_size: f64,
        max_bytes: f64,
        multiple: bool,
    ) -> Option<String> {
        let files: &[FileRef] = match (value, multiple) {
            (FieldValue::Empty, _) => &[],
            // An untyped `[]` reads as `Choices`.
            (FieldValue::Choices(items), _) if items.is_empty() => &[],
            (FieldValue::Files(files), true) => files,
            (FieldValue::Files(files), false) if files.is_empty() => &[],
            (FieldValue::File(file), false) => std::slice::from_ref(file),
            _ => return Some(format!("{} has an invalid file value", self.label)),
        };
        if files.is_empty() {
            return self.required_message();
        }
        files.iter().find_map(|file| {
            if file.size as f64 > max_bytes {
                Some(format!("{}: File size must be less than {max_size}MB", file.name))
            } else if !accept.admits(file) {
                Some(format!(
                    "{}: File type not supported. Accepted types: {accept}",
                    file.name
                ))
            } else {
                None
            }
        })
    }
}

/// Per-schema validator over data records.
#[derive(Debug, Clone)]
pub struct CompiledValidator {
    rules: Vec<FieldRule>,
}

impl CompiledValidator {
    /// Compile one rule per question, in schema order.
    pub fn compile(schema: &FormSchema) -> Result<Self, CompileError> {
        let email = Regex::new(EMAIL_PATTERN)?;
        let rules: Vec<FieldRule> = schema
            .questions()
            .iter()
            .map(|q| FieldRule::compile(q, &email))
            .collect();
        tracing::debug!(rules = rules.len(), "compiled validator");
        Ok(Self { rules })
    }

    /// The compiled rules in schema order.
    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// The rule for one question id.
    pub fn rule(&self, id: &str) -> Option<&FieldRule> {
        self.rules.iter().find(|r| r.id.as_str() == id)
    }

    /// Validate the whole record against today's UTC date.
    pub fn validate(&self, record: &DataRecord) -> Result<(), FieldErrors> {
        self.validate_on(record, Utc::now().date_naive())
    }

    /// Validate the whole record, resolving `"today"` to `today`.
    pub fn validate_on(&self, record: &DataRecord, today: NaiveDate) -> Result<(), FieldErrors> {
        self.collect(self.rules.iter(), record, today)
    }

    /// Validate only the given ids. Ids not in the schema are ignored.
    pub fn validate_fields<'a, I>(
        &self,
        record: &DataRecord,
        ids: I,
        today: NaiveDate,
    ) -> Result<(), FieldErrors>
    where
        I: IntoIterator<Item = &'a QuestionId>,
    {
        let rules = ids.into_iter().filter_map(|id| self.rule(id.as_str()));
        self.collect(rules, record, today)
    }

    /// The message of a single field, or `None` if it passes or the id is
    /// not in the schema.
    pub fn validate_field(&self, id: &str, record: &DataRecord, today: NaiveDate) -> Option<String> {
        self.rule(id)?.check(record.get(id), today)
    }

    fn collect<'r>(
        &self,
        rules: impl Iterator<Item = &'r FieldRule>,
        record: &DataRecord,
        today: NaiveDate,
    ) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        for rule in rules {
            if let Some(message) = rule.check(record.get(rule.id.as_str()), today) {
                errors.set(rule.id.clone(), Some(message));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            tracing::trace!(failed = errors.len(), "record failed validation");
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formflow_core::{
        ChoiceSpec, DateSpec, DropDownSpec, FileUploadSpec, MultiChoiceSpec, NumberSpec,
        TextAreaSpec, TextSpec,
    };

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    fn compile(questions: Vec<Question>) -> CompiledValidator {
        CompiledValidator::compile(&FormSchema::from_questions(questions)).unwrap()
    }

    fn text(id: &str, label: &str, required: bool) -> Question {
        Question::new(id, label, required, QuestionSpec::Text(TextSpec::default()))
    }

    fn record<const N: usize>(entries: [(&str, FieldValue); N]) -> DataRecord {
        entries
            .into_iter()
            .map(|(id, v)| (QuestionId::new(id), v))
            .collect()
    }

    fn message(v: &CompiledValidator, id: &str, value: FieldValue) -> Option<String> {
        v.validate_field(id, &record([(id, value)]), today())
    }

    // ── Text ────────────────────────────────────────────────────────

    #[test]
    fn test_required_name_and_valid_email() {
        let v = compile(vec![text("name", "Name", true), text("email", "Email", true)]);
        let errors = v
            .validate_on(
                &record([("name", FieldValue::text("")), ("email", FieldValue::text("a@b.com"))]),
                today(),
            )
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("name"), Some("Name is required"));
    }

    #[test]
    fn test_email_format_applies_to_email_like_ids() {
        let v = compile(vec![text("work_Email", "Work email", false), text("name", "Name", false)]);
        assert_eq!(
            message(&v, "work_Email", FieldValue::text("not-an-email")).as_deref(),
            Some("Please enter a valid email address")
        );
        assert_eq!(message(&v, "work_Email", FieldValue::text("a.b+c@example.co.uk")), None);
        assert_eq!(message(&v, "work_Email", FieldValue::text("")), None);
        assert_eq!(message(&v, "name", FieldValue::text("not-an-email")), None);
    }

    #[test]
    fn test_text_length_bounds() {
        let spec = TextAreaSpec {
            min_length: Some(2),
            max_length: Some(5),
            ..TextAreaSpec::default()
        };
        let v = compile(vec![Question::new("bio", "Bio", false, QuestionSpec::TextArea(spec))]);
        assert_eq!(
            message(&v, "bio", FieldValue::text("a")).as_deref(),
            Some("Bio must be at least 2 characters")
        );
        assert_eq!(
            message(&v, "bio", FieldValue::text("abcdef")).as_deref(),
            Some("Bio must be at most 5 characters")
        );
        assert_eq!(message(&v, "bio", FieldValue::text("héllo")), None);
        // Optional and empty passes despite minLength.
        assert_eq!(message(&v, "bio", FieldValue::text("")), None);
    }

    #[test]
    fn test_required_wins_over_length() {
        let spec = TextSpec {
            min_length: Some(2),
            ..TextSpec::default()
        };
        let v = compile(vec![Question::new("n", "Full Name", true, QuestionSpec::Text(spec))]);
        assert_eq!(message(&v, "n", FieldValue::text("")).as_deref(), Some("Full Name is required"));
        assert_eq!(message(&v, "n", FieldValue::Empty).as_deref(), Some("Full Name is required"));
    }

    #[test]
    fn test_wrong_shape_is_invalid_value() {
        let v = compile(vec![text("name", "Name", false)]);
        assert_eq!(
            message(&v, "name", FieldValue::Number(3.0)).as_deref(),
            Some("Name has an invalid value")
        );
    }

    // ── Number ──────────────────────────────────────────────────────

    #[test]
    fn test_number_rules() {
        let spec = NumberSpec {
            min: Some(18.0),
            max: Some(120.0),
            ..NumberSpec::default()
        };
        let v = compile(vec![Question::new("age", "Age", true, QuestionSpec::Number(spec))]);
        assert_eq!(message(&v, "age", FieldValue::Empty).as_deref(), Some("Age is required"));
        assert_eq!(message(&v, "age", FieldValue::text("x")).as_deref(), Some("Age must be a number"));
        assert_eq!(message(&v, "age", FieldValue::Number(17.0)).as_deref(), Some("Age must be at least 18"));
        assert_eq!(
            message(&v, "age", FieldValue::Number(120.5)).as_deref(),
            Some("Age must be no more than 120")
        );
        assert_eq!(message(&v, "age", FieldValue::Number(18.0)), None);
        assert_eq!(message(&v, "age", FieldValue::Number(0.0)).as_deref(), Some("Age must be at least 18"));
    }

    #[test]
    fn test_optional_number_may_be_absent() {
        let v = compile(vec![Question::new("n", "N", false, QuestionSpec::Number(NumberSpec::default()))]);
        assert!(v.validate_on(&DataRecord::new(), today()).is_ok());
    }

    // ── Choices ─────────────────────────────────────────────────────

    #[test]
    fn test_single_select_membership() {
        let v = compile(vec![
            Question::new(
                "gender",
                "Gender",
                true,
                QuestionSpec::RadioButtons(ChoiceSpec {
                    options: vec!["Male".into(), "Female".into()],
                }),
            ),
            Question::new(
                "country",
                "Country",
                false,
                QuestionSpec::DropDown(DropDownSpec {
                    options: vec!["USA".into()],
                    placeholder: None,
                }),
            ),
        ]);
        assert_eq!(message(&v, "gender", FieldValue::text("")).as_deref(), Some("Gender is required"));
        assert_eq!(
            message(&v, "gender", FieldValue::text("Robot")).as_deref(),
            Some("Gender must be one of the listed options")
        );
        assert_eq!(message(&v, "gender", FieldValue::text("Female")), None);
        assert_eq!(message(&v, "country", FieldValue::text("")), None);
    }

    fn hobbies(required: bool) -> CompiledValidator {
        compile(vec![Question::new(
            "hobbies",
            "Hobbies",
            required,
            QuestionSpec::MultiChoice(MultiChoiceSpec {
                options: vec!["Reading".into(), "Gaming".into(), "Sports".into()],
                min: Some(1),
                max: Some(2),
            }),
        )])
    }

    #[test]
    fn test_multi_select_max_exceeded() {
        let v = hobbies(false);
        assert_eq!(
            message(&v, "hobbies", FieldValue::choices(["Reading", "Gaming", "Sports"])).as_deref(),
            Some("Please select no more than 2 option(s) for Hobbies")
        );
    }

    #[test]
    fn test_multi_select_required_with_nothing_selected() {
        let v = hobbies(true);
        assert_eq!(
            message(&v, "hobbies", FieldValue::Choices(vec![])).as_deref(),
            Some("Please select at least 1 option(s) for Hobbies")
        );
        assert_eq!(message(&v, "hobbies", FieldValue::choices(["Reading"])), None);
    }

    #[test]
    fn test_multi_select_rejects_unlisted_option() {
        assert_eq!(
            message(&hobbies(false), "hobbies", FieldValue::choices(["Knitting"])).as_deref(),
            Some("Hobbies contains an option that is not listed")
        );
    }

    #[test]
    fn test_multi_select_effective_min_without_min() {
        let v = compile(vec![Question::new(
            "m",
            "Tags",
            true,
            QuestionSpec::MultiChoice(MultiChoiceSpec {
                options: vec!["a".into()],
                min: None,
                max: None,
            }),
        )]);
        assert_eq!(
            message(&v, "m", FieldValue::Empty).as_deref(),
            Some("Please select at least 1 option(s) for Tags")
        );
    }

    // ── Dates ───────────────────────────────────────────────────────

    fn birth_date(min: Option<&str>, max: Option<&str>) -> CompiledValidator {
        let spec = DateSpec {
            min_date: min.map(|m| DateBound::parse(m).unwrap()),
            max_date: max.map(|m| DateBound::parse(m).unwrap()),
            placeholder: None,
        };
        compile(vec![Question::new("dob", "Birth Date", true, QuestionSpec::DatePicker(spec))])
    }

    #[test]
    fn test_date_format_and_bounds() {
        let v = birth_date(Some("1900-01-01"), Some("2005-12-31"));
        assert_eq!(message(&v, "dob", FieldValue::text("")).as_deref(), Some("Birth Date is required"));
        assert_eq!(
            message(&v, "dob", FieldValue::text("01/02/1990")).as_deref(),
            Some("Please enter a valid date")
        );
        assert_eq!(
            message(&v, "dob", FieldValue::text("1990-02-30")).as_deref(),
            Some("Please enter a valid date")
        );
        assert_eq!(
            message(&v, "dob", FieldValue::text("1899-12-31")).as_deref(),
            Some("Date must be on or after 1900-01-01")
        );
        assert_eq!(
            message(&v, "dob", FieldValue::text("2006-01-01")).as_deref(),
            Some("Date must be on or before 2005-12-31")
        );
        assert_eq!(message(&v, "dob", FieldValue::text("2005-12-31")), None);
    }

    #[test]
    fn test_today_bound_resolves_at_validation_time() {
        let v = birth_date(None, Some("today"));
        let rec = record([("dob", FieldValue::text("2026-10-18"))]);
        assert_eq!(
            v.validate_field("dob", &rec, today()).as_deref(),
            Some("Date must be on or before today")
        );
        let tomorrow = today().succ_opt().unwrap();
        assert_eq!(v.validate_field("dob", &rec, tomorrow), None);
    }

    // ── Files ───────────────────────────────────────────────────────

    fn documents(multiple: bool) -> CompiledValidator {
        compile(vec![Question::new(
            "documents",
            "Documents",
            true,
            QuestionSpec::FileUpload(FileUploadSpec {
                accept: AcceptList::parse(".pdf,.png").unwrap(),
                max_size: 5.0,
                multiple,
            }),
        )])
    }

    const MB: u64 = 1_048_576;

    #[test]
    fn test_file_size_and_type() {
        let v = documents(true);
        let big_pdf = FileRef::new("big.pdf", 6 * MB, "application/pdf");
        let docx = FileRef::new("letter.docx", 2 * MB, "application/msword");
        let pdf = FileRef::new("ok.pdf", 2 * MB, "application/pdf");
        assert_eq!(
            message(&v, "documents", FieldValue::Files(vec![big_pdf])).as_deref(),
            Some("big.pdf: File size must be less than 5MB")
        );
        assert_eq!(
            message(&v, "documents", FieldValue::Files(vec![docx])).as_deref(),
            Some("letter.docx: File type not supported. Accepted types: .pdf,.png")
        );
        assert_eq!(message(&v, "documents", FieldValue::Files(vec![pdf])), None);
    }

    #[test]
    fn test_exactly_max_size_is_accepted() {
        let v = documents(false);
        let edge = FileRef::new("edge.png", 5 * MB, "image/png");
        assert_eq!(message(&v, "documents", FieldValue::File(edge)), None);
    }

    #[test]
    fn test_required_files() {
        assert_eq!(
            message(&documents(true), "documents", FieldValue::Files(vec![])).as_deref(),
            Some("Documents is required")
        );
        assert_eq!(
            message(&documents(false), "documents", FieldValue::Empty).as_deref(),
            Some("Documents is required")
        );
    }

    #[test]
    fn test_file_shape_mismatch() {
        let pdf = FileRef::new("a.pdf", 1, "application/pdf");
        assert_eq!(
            message(&documents(false), "documents", FieldValue::Files(vec![pdf.clone(), pdf])).as_deref(),
            Some("Documents has an invalid file value")
        );
        assert_eq!(
            message(&documents(true), "documents", FieldValue::text("a.pdf")).as_deref(),
            Some("Documents has an invalid file value")
        );
    }

    // ── Scoping ─────────────────────────────────────────────────────

    #[test]
    fn test_validate_fields_restricts_to_ids() {
        let v = compile(vec![text("a", "A", true), text("b", "B", true), text("c", "C", true)]);
        let ids = [QuestionId::new("a"), QuestionId::new("b"), QuestionId::new("zzz")];
        let errors = v.validate_fields(&DataRecord::new(), &ids, today()).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.get("c").is_none());
    }

    #[test]
    fn test_unknown_ids_in_record_are_ignored() {
        let v = compile(vec![text("a", "A", false)]);
        let rec = record([("other", FieldValue::Number(1.0))]);
        assert!(v.validate_on(&rec, today()).is_ok());
        assert_eq!(v.validate_field("other", &rec, today()), None);
    }

    #[test]
    fn test_field_errors_display_and_conversion() {
        let mut errors = FieldErrors::new();
        errors.set(QuestionId::new("name"), Some("Name is required".into()));
        errors.set(QuestionId::new("age"), Some("Age must be a number".into()));
        assert_eq!(errors.to_string(), "  age: Age must be a number\n  name: Name is required");
        errors.set(QuestionId::new("age"), None);
        assert_eq!(errors.len(), 1);
        let err: FormflowError = errors.into();
        assert!(matches!(err, FormflowError::FieldValidation(m) if m.contains("Name is required")));
    }
}
