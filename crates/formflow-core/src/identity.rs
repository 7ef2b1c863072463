//! # Question Identity
//!
//! Newtype wrapper for question identifiers. A question id is the key a
//! question's answer is stored under in a [`DataRecord`](crate::DataRecord),
//! so it is kept distinct from labels and other free-form strings.

use std::borrow::Borrow;

use serde::{Deserialize, Serialize};

/// Identifier of a question, unique within a form schema.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(String);

impl QuestionId {
    /// Wrap an identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Access the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier names an email field.
    ///
    /// Text questions whose id contains `email` (any case) are validated
    /// as email addresses.
    pub fn is_email_like(&self) -> bool {
        self.0.to_ascii_lowercase().contains("email")
    }
}

impl Borrow<str> for QuestionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for QuestionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for QuestionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for QuestionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
