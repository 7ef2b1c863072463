//! # Schema Loading
//!
//! Reads a form-schema document from a file or string, parses it as JSON
//! or YAML and runs it through the [`SchemaValidator`]. Malformed syntax is
//! reported as [`SchemaValidationError::Parse`], distinct from a
//! well-formed document that fails validation
//! ([`SchemaValidationError::Rejected`]).

use std::path::{Path, PathBuf};

use formflow_core::FormSchema;
use serde_json::Value;

use crate::validate::{SchemaValidationError, SchemaValidator};

/// Well-known location of the default schema, relative to the working
/// directory.
pub const DEFAULT_SCHEMA_PATH: &str = "schemas/default-schema.json";

/// Syntax of a schema document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// JSON text.
    Json,
    /// YAML text, converted to a JSON value before validation.
    Yaml,
}

impl DocumentFormat {
    /// Pick the format from a file extension: `.yaml`/`.yml` are YAML,
    /// everything else is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Self::Yaml
            }
            _ => Self::Json,
        }
    }
}

/// Parse document text into an untyped JSON value.
pub fn parse_document(
    text: &str,
    format: DocumentFormat,
    source_name: &str,
) -> Result<Value, SchemaValidationError> {
    let parsed = match format {
        DocumentFormat::Json => serde_json::from_str::<Value>(text).map_err(|e| e.to_string()),
        DocumentFormat::Yaml => serde_yaml::from_str::<Value>(text).map_err(|e| e.to_string()),
    };
    parsed.map_err(|reason| SchemaValidationError::Parse {
        source_name: source_name.to_string(),
        reason,
    })
}

/// Loads and validates schema documents.
#[derive(Debug)]
pub struct SchemaLoader {
    validator: SchemaValidator,
    default_path: PathBuf,
}

impl SchemaLoader {
    /// A loader using the embedded meta-schema and the well-known default
    /// schema location.
    pub fn new() -> Result<Self, SchemaValidationError> {
        Ok(Self::with_validator(SchemaValidator::new()?))
    }

    /// A loader around an existing validator.
    pub fn with_validator(validator: SchemaValidator) -> Self {
        Self {
            validator,
            default_path: PathBuf::from(DEFAULT_SCHEMA_PATH),
        }
    }

    /// Override the default schema location used by [`load_default`](Self::load_default).
    pub fn with_default_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_path = path.into();
        self
    }

    /// The configured default schema location.
    pub fn default_path(&self) -> &Path {
        &self.default_path
    }

    /// The underlying validator.
    pub fn validator(&self) -> &SchemaValidator {
        &self.validator
    }

    /// Parse and validate document text.
    pub fn load_str(
        &self,
        text: &str,
        format: DocumentFormat,
        source_name: &str,
    ) -> Result<FormSchema, SchemaValidationError> {
        let document = parse_document(text, format, source_name)?;
        self.validator.validate(&document)
    }

    /// Read, parse and validate a schema file. The format follows the
    /// file extension.
    ///
    /// # Errors
    ///
    /// - `DocumentLoad` if the file cannot be read.
    /// - `Parse` if the text is not well-formed.
    /// - `Rejected` if the document is not an acceptable schema.
    pub fn load_file(&self, path: &Path) -> Result<FormSchema, SchemaValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SchemaValidationError::DocumentLoad {
                path: path.display().to_string(),
                reason: e.to_string(),
            }
        })?;
        tracing::debug!(path = %path.display(), "loading schema");
        self.load_str(&content, DocumentFormat::from_path(path), &path.display().to_string())
    }

    /// Load the schema at the default location.
    pub fn load_default(&self) -> Result<FormSchema, SchemaValidationError> {
        self.load_file(&self.default_path)
    }
}
