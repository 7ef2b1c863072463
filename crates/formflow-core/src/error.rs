//! # Error Types
//!
//! Top-level error type for formflow. Component crates define their own
//! `thiserror` enums (schema issues, paging, persistence, submission) and
//! convert into [`FormflowError`] where a single error surface is needed.

use thiserror::Error;

/// Top-level error type for formflow.
#[derive(Error, Debug)]
pub enum FormflowError {
    /// A schema document failed structural validation.
    #[error("schema structure error: {0}")]
    SchemaStructure(String),

    /// One or more fields of a data record failed validation.
    #[error("field validation error: {0}")]
    FieldValidation(String),

    /// The external submission endpoint failed.
    #[error("submission error: {0}")]
    Submission(String),

    /// A question kind tag is not one of the recognized kinds.
    #[error("unsupported field type: {0:?}")]
    UnsupportedKind(String),

    /// A value could not be parsed into a domain type.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
