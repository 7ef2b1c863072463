//! # Questions and Form Schemas
//!
//! A [`Question`] is one field descriptor: the attributes common to every
//! kind (`id`, `label`, `required`) plus a [`QuestionSpec`], a closed
//! tagged union carrying the kind-specific constraints. The JSON shape is
//! flat, with the variant selected by the `type` tag:
//!
//! ```json
//! { "id": "hobbies", "label": "Hobbies", "type": "multi_choice",
//!   "required": true, "options": ["Reading", "Gaming"], "min": 1, "max": 2 }
//! ```
//!
//! A [`FormSchema`] is an ordered list of questions with unique ids. Typed
//! values are only produced by the schema validator in `formflow-schema`,
//! which checks an untrusted document before deserializing it.

use serde::{Deserialize, Serialize};

use crate::file::{AcceptList, BYTES_PER_MB};
use crate::identity::QuestionId;
use crate::kind::QuestionKind;
use crate::temporal::DateBound;

/// Constraints of a `text` question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSpec {
    /// Hint shown in the empty input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Minimum character count of a non-empty answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    /// Maximum character count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

/// Constraints of a `textarea` question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextAreaSpec {
    /// Hint shown in the empty input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Minimum character count of a non-empty answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    /// Maximum character count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Visible rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<u32>,
}

/// Constraints of a `radio_buttons` question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChoiceSpec {
    /// Selectable options, non-empty and unique.
    pub options: Vec<String>,
}

/// Constraints of a `multi_choice` question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiChoiceSpec {
    /// Selectable options, non-empty and unique.
    pub options: Vec<String>,
    /// Minimum number of selections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<usize>,
    /// Maximum number of selections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<usize>,
}

impl MultiChoiceSpec {
    /// Effective minimum selection count: `max(required ? 1 : 0, min or 0)`.
    pub fn effective_min(&self, required: bool) -> usize {
        usize::from(required).max(self.min.unwrap_or(0))
    }
}

/// Constraints of a `drop_down` question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DropDownSpec {
    /// Selectable options, non-empty and unique.
    pub options: Vec<String>,
    /// Hint shown before a choice is made.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

/// Constraints of a `file_upload` question. All three are mandatory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUploadSpec {
    /// Accepted extensions and MIME patterns.
    pub accept: AcceptList,
    /// Per-file size limit in megabytes.
    pub max_size: f64,
    /// Whether several files may be attached.
    pub multiple: bool,
}

impl FileUploadSpec {
    /// Per-file size limit in bytes.
    pub fn max_bytes(&self) -> f64 {
        self.max_size * BYTES_PER_MB as f64
    }
}

/// Constraints of a `date_picker` question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateSpec {
    /// Earliest accepted date (a literal; never `"today"` in accepted schemas).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_date: Option<DateBound>,
    /// Latest accepted date, a literal or `"today"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_date: Option<DateBound>,
    /// Hint shown in the empty input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

/// Constraints of a `number` question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NumberSpec {
    /// Hint shown in the empty input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Inclusive lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Inclusive upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Input increment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}

/// Kind-specific part of a question, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionSpec {
    /// `text`
    Text(TextSpec),
    /// `textarea`
    #[serde(rename = "textarea")]
    TextArea(TextAreaSpec),
    /// `radio_buttons`
    RadioButtons(ChoiceSpec),
    /// `multi_choice`
    MultiChoice(MultiChoiceSpec),
    /// `drop_down`
    DropDown(DropDownSpec),
    /// `file_upload`
    FileUpload(FileUploadSpec),
    /// `date_picker`
    DatePicker(DateSpec),
    /// `number`
    Number(NumberSpec),
}

impl QuestionSpec {
    /// The kind this spec belongs to.
    pub fn kind(&self) -> QuestionKind {
        match self {
            Self::Text(_) => QuestionKind::Text,
            Self::TextArea(_) => QuestionKind::TextArea,
            Self::RadioButtons(_) => QuestionKind::RadioButtons,
            Self::MultiChoice(_) => QuestionKind::MultiChoice,
            Self::DropDown(_) => QuestionKind::DropDown,
            Self::FileUpload(_) => QuestionKind::FileUpload,
            Self::DatePicker(_) => QuestionKind::DatePicker,
            Self::Number(_) => QuestionKind::Number,
        }
    }

    /// The declared options of a choice kind.
    pub fn options(&self) -> Option<&[String]> {
        match self {
            Self::RadioButtons(s) => Some(&s.options),
            Self::MultiChoice(s) => Some(&s.options),
            Self::DropDown(s) => Some(&s.options),
            Self::Text(_)
            | Self::TextArea(_)
            | Self::FileUpload(_)
            | Self::DatePicker(_)
            | Self::Number(_) => None,
        }
    }
}

/// One field descriptor of a form schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Record key, unique within the schema.
    pub id: QuestionId,
    /// Display label and subject of error messages.
    pub label: String,
    /// Whether an answer must be given.
    #[serde(default)]
    pub required: bool,
    /// Kind-specific constraints.
    #[serde(flatten)]
    pub spec: QuestionSpec,
}

impl Question {
    /// Build a question.
    pub fn new(
        id: impl Into<QuestionId>,
        label: impl Into<String>,
        required: bool,
        spec: QuestionSpec,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            required,
            spec,
        }
    }

    /// The question's kind.
    pub fn kind(&self) -> QuestionKind {
        self.spec.kind()
    }
}

/// An ordered list of questions with unique ids.
///
/// Order defines both rendering order and page partitioning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormSchema {
    questions: Vec<Question>,
}

impl FormSchema {
    /// Wrap an already-validated question list.
    ///
    /// Callers outside the schema validator are responsible for id
    /// uniqueness; [`FormSchema::first_duplicate_id`] checks it.
    pub fn from_questions(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    /// The questions in schema order.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Number of questions.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether the schema has no questions.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Look up a question by id.
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id.as_str() == id)
    }

    /// Kind of the question with the given id.
    pub fn kind_of(&self, id: &str) -> Option<QuestionKind> {
        self.question(id).map(Question::kind)
    }

    /// Question ids in schema order.
    pub fn ids(&self) -> impl Iterator<Item = &QuestionId> {
        self.questions.iter().map(|q| &q.id)
    }

    /// The first id that appears more than once, if any.
    pub fn first_duplicate_id(&self) -> Option<&QuestionId> {
        let mut seen = std::collections::HashSet::new();
        self.ids().find(|id| !seen.insert(id.as_str()))
    }
}
