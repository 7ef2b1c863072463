//! # File References and Accept Patterns
//!
//! The core never reads file contents. A selected file is represented by
//! its name, size and MIME type, which is all the validation rules need.
//! The `accept` attribute of a file-upload question is parsed once into
//! an [`AcceptList`] of extension and MIME patterns.

use serde::{Deserialize, Serialize};

use crate::error::FormflowError;

/// Bytes per megabyte as used by `maxSize`.
pub const BYTES_PER_MB: u64 = 1_048_576;

const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg"];

/// Reference to a binary blob selected by the user.
///
/// Serialized as metadata only: `{"type":"File","name":..,"size":..,"mimeType":..}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename = "File", rename_all = "camelCase")]
pub struct FileRef {
    /// File name as supplied by the environment.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// MIME type, possibly empty when the environment could not tell.
    #[serde(default)]
    pub mime_type: String,
}

impl FileRef {
    /// Build a file reference.
    pub fn new(name: impl Into<String>, size: u64, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            mime_type: mime_type.into(),
        }
    }

    /// Lower-cased extension including the leading dot, e.g. `.pdf`.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() && ext.is_empty() {
            return None;
        }
        Some(format!(".{}", ext.to_ascii_lowercase()))
    }

    /// Whether the MIME type marks this file as an image.
    pub fn is_image(&self) -> bool {
        self.mime_type.to_ascii_lowercase().starts_with("image/")
    }
}

/// One entry of an `accept` list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AcceptPattern {
    /// Exact extension match, stored lower-cased with its leading dot.
    Extension(String),
    /// MIME type, either exact (`application/pdf`) or wildcard (`image/*`).
    Mime(String),
}

impl AcceptPattern {
    /// Parse a single trimmed entry.
    pub fn parse(entry: &str) -> Result<Self, FormflowError> {
        let entry = entry.trim();
        if entry.len() > 1 && entry.starts_with('.') {
            Ok(Self::Extension(entry.to_ascii_lowercase()))
        } else if entry.contains('/') {
            Ok(Self::Mime(entry.to_ascii_lowercase()))
        } else {
            Err(FormflowError::InvalidValue(format!(
                "accept entry {entry:?} is neither an extension nor a MIME pattern"
            )))
        }
    }

    /// Whether the file satisfies this pattern.
    pub fn matches(&self, file: &FileRef) -> bool {
        match self {
            Self::Extension(ext) => file.extension().as_deref() == Some(ext.as_str()),
            Self::Mime(pattern) => {
                let mime = file.mime_type.to_ascii_lowercase();
                match pattern.strip_suffix('*') {
                    Some("") | Some("*/") => true,
                    Some(prefix) => mime.starts_with(prefix),
                    None => mime == *pattern,
                }
            }
        }
    }

    fn admits_images(&self) -> bool {
        match self {
            Self::Extension(ext) => IMAGE_EXTENSIONS.contains(&ext.as_str()),
            Self::Mime(pattern) => pattern.starts_with("image/"),
        }
    }
}

/// Parsed `accept` attribute: a comma-separated list of extensions or
/// MIME patterns. Keeps the original text for messages and round-trips.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AcceptList {
    raw: String,
    patterns: Vec<AcceptPattern>,
}

impl AcceptList {
    /// Parse a comma-separated accept list. Empty entries are ignored;
    /// a list with no usable entry is rejected.
    pub fn parse(raw: &str) -> Result<Self, FormflowError> {
        let patterns = raw
            .split(',')
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(AcceptPattern::parse)
            .collect::<Result<Vec<_>, _>>()?;
        if patterns.is_empty() {
            return Err(FormflowError::InvalidValue(
                "accept list must name at least one extension or MIME pattern".into(),
            ));
        }
        Ok(Self {
            raw: raw.to_string(),
            patterns,
        })
    }

    /// The accept list as written in the schema.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The parsed patterns, in declaration order.
    pub fn patterns(&self) -> &[AcceptPattern] {
        &self.patterns
    }

    /// Whether any pattern matches the file.
    pub fn admits(&self, file: &FileRef) -> bool {
        self.patterns.iter().any(|p| p.matches(file))
    }

    /// Whether the list admits image files (drives image previews).
    pub fn admits_images(&self) -> bool {
        self.patterns.iter().any(AcceptPattern::admits_images)
    }
}

impl std::fmt::Display for AcceptList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl TryFrom<String> for AcceptList {
    type Error = FormflowError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<AcceptList> for String {
    fn from(list: AcceptList) -> Self {
        list.raw
    }
}
