//! # Question Kinds: Single Source of Truth
//!
//! Defines the `QuestionKind` enum with all 8 field kinds. Every `match`
//! on `QuestionKind` must be exhaustive: adding a ninth kind forces every
//! consumer (schema validator, rule compiler, default builder, persistence
//! filter) to handle it at compile time.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::FormflowError;

/// All field kinds a form schema may declare.
///
/// | # | Kind | Wire tag | Record shape |
/// |---|------|----------|--------------|
/// | 1 | Text | `text` | string |
/// | 2 | TextArea | `textarea` | string |
/// | 3 | RadioButtons | `radio_buttons` | string (single-select) |
/// | 4 | MultiChoice | `multi_choice` | list of strings (multi-select) |
/// | 5 | DropDown | `drop_down` | string |
/// | 6 | FileUpload | `file_upload` | file or list of files |
/// | 7 | DatePicker | `date_picker` | `YYYY-MM-DD` string |
/// | 8 | Number | `number` | number or absent |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// Single-line free text.
    Text,
    /// Multi-line free text.
    #[serde(rename = "textarea")]
    TextArea,
    /// Single-select choice rendered as radio buttons.
    RadioButtons,
    /// Multi-select choice rendered as a checkbox group.
    MultiChoice,
    /// Single-select choice rendered as a drop-down.
    DropDown,
    /// One or more uploaded files.
    FileUpload,
    /// Calendar date.
    DatePicker,
    /// Numeric value.
    Number,
}

/// Total number of question kinds. Used for compile-time assertions.
pub const QUESTION_KIND_COUNT: usize = 8;

impl QuestionKind {
    /// Returns all 8 kinds in canonical order.
    pub fn all_kinds() -> &'static [QuestionKind] {
        &[
            Self::Text,
            Self::TextArea,
            Self::RadioButtons,
            Self::MultiChoice,
            Self::DropDown,
            Self::FileUpload,
            Self::DatePicker,
            Self::Number,
        ]
    }

    /// Returns the wire tag for this kind.
    ///
    /// Must match the serde serialization format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::TextArea => "textarea",
            Self::RadioButtons => "radio_buttons",
            Self::MultiChoice => "multi_choice",
            Self::DropDown => "drop_down",
            Self::FileUpload => "file_upload",
            Self::DatePicker => "date_picker",
            Self::Number => "number",
        }
    }

    /// Whether the kind picks its value from a declared `options` list.
    pub fn has_options(&self) -> bool {
        matches!(self, Self::RadioButtons | Self::MultiChoice | Self::DropDown)
    }

    /// Whether answers of this kind hold binary file references.
    ///
    /// File-bearing fields are never written to durable storage.
    pub fn holds_files(&self) -> bool {
        matches!(self, Self::FileUpload)
    }

    /// Comma-separated list of all wire tags, for error messages.
    pub fn tag_list() -> String {
        Self::all_kinds()
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionKind {
    type Err = FormflowError;

    /// Parse a kind from its wire tag.
    ///
    /// Unknown tags produce [`FormflowError::UnsupportedKind`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "textarea" => Ok(Self::TextArea),
            "radio_buttons" => Ok(Self::RadioButtons),
            "multi_choice" => Ok(Self::MultiChoice),
            "drop_down" => Ok(Self::DropDown),
            "file_upload" => Ok(Self::FileUpload),
            "date_picker" => Ok(Self::DatePicker),
            "number" => Ok(Self::Number),
            other => Err(FormflowError::UnsupportedKind(other.to_string())),
        }
    }
}
