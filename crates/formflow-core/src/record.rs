//! # Data Records
//!
//! A [`DataRecord`] maps question ids to answers. The shape of each
//! [`FieldValue`] depends on the question kind:
//!
//! | Kind | Shape |
//! |------|-------|
//! | text, textarea, radio_buttons, drop_down, date_picker | `Text` |
//! | number | `Number` or `Empty` |
//! | multi_choice | `Choices` |
//! | file_upload (single) | `File` or `Empty` |
//! | file_upload (multiple) | `Files` |

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::file::FileRef;
use crate::identity::QuestionId;

/// One answer in a data record.
///
/// Serialized untagged: `null`, a string, a number, a list of strings,
/// a file object, or a list of file objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// No answer (absent number or single file).
    Empty,
    /// A string answer.
    Text(String),
    /// A numeric answer.
    Number(f64),
    /// Selected options of a multi-select.
    Choices(Vec<String>),
    /// A single file.
    File(FileRef),
    /// Several files.
    Files(Vec<FileRef>),
}

impl FieldValue {
    /// Build a text value.
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Build a multi-select value.
    pub fn choices<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Choices(items.into_iter().map(Into::into).collect())
    }

    /// Whether the value carries an actual answer.
    ///
    /// Empty strings, empty lists and `Empty` do not.
    pub fn has_content(&self) -> bool {
        match self {
            Self::Empty => false,
            Self::Text(s) => !s.is_empty(),
            Self::Number(_) | Self::File(_) => true,
            Self::Choices(items) => !items.is_empty(),
            Self::Files(files) => !files.is_empty(),
        }
    }

    /// Whether the value holds binary file references.
    pub fn holds_files(&self) -> bool {
        matches!(self, Self::File(_) | Self::Files(_))
    }

    /// The string payload, if this is a `Text` value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Answers keyed by question id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataRecord {
    fields: BTreeMap<QuestionId, FieldValue>,
}

impl DataRecord {
    /// An empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Value stored for an id.
    pub fn get(&self, id: &str) -> Option<&FieldValue> {
        self.fields.get(id)
    }

    /// Store a value, returning the previous one.
    pub fn insert(&mut self, id: impl Into<QuestionId>, value: FieldValue) -> Option<FieldValue> {
        self.fields.insert(id.into(), value)
    }

    /// Remove a value.
    pub fn remove(&mut self, id: &str) -> Option<FieldValue> {
        self.fields.remove(id)
    }

    /// Whether a value is stored for the id.
    pub fn contains(&self, id: &str) -> bool {
        self.fields.contains_key(id)
    }

    /// Iterate over `(id, value)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&QuestionId, &FieldValue)> {
        self.fields.iter()
    }

    /// Stored ids in id order.
    pub fn keys(&self) -> impl Iterator<Item = &QuestionId> {
        self.fields.keys()
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no value is stored.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether at least one field carries an actual answer.
    pub fn has_content(&self) -> bool {
        self.fields.values().any(FieldValue::has_content)
    }

    /// Keep only the entries for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&QuestionId, &FieldValue) -> bool) {
        self.fields.retain(|id, value| keep(id, value));
    }
}

impl FromIterator<(QuestionId, FieldValue)> for DataRecord {
    fn from_iter<T: IntoIterator<Item = (QuestionId, FieldValue)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
