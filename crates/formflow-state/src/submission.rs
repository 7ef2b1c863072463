//! # Submission Collaborators
//!
//! The submission endpoint is an opaque, possibly failing dependency. It
//! is called at most once per attempt and never retried; a failure leaves
//! the data record intact for the user to resubmit.

use std::path::{Path, PathBuf};

use formflow_core::{DataRecord, Timestamp};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors from a submission attempt.
#[derive(Error, Debug)]
pub enum SubmissionError {
    /// The endpoint answered but did not accept the submission.
    #[error("submission rejected: {0}")]
    Rejected(String),

    /// The endpoint could not be reached or failed internally.
    #[error("submission failed: {0}")]
    Unavailable(String),

    /// Writing the submission log failed.
    #[error("io error on '{path}': {source}")]
    Io {
        /// File involved.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The record could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Answer of a submission endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    /// Whether the endpoint accepted the submission.
    pub success: bool,
    /// Human-readable outcome.
    pub message: String,
    /// Identifier assigned by the endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<String>,
}

/// Submission endpoint adapter.
///
/// Implementations must be `Send + Sync` so they can be shared behind an
/// `Arc`. The trait is object-safe to support runtime selection.
pub trait SubmissionService: Send + Sync {
    /// Submit a complete, validated record.
    fn submit(&self, record: &DataRecord) -> Result<SubmissionReceipt, SubmissionError>;

    /// Return the human-readable name of this service.
    fn service_name(&self) -> &str;
}

/// Submit and treat a receipt with `success == false` as a failure.
pub fn submit_checked(
    service: &dyn SubmissionService,
    record: &DataRecord,
) -> Result<SubmissionReceipt, SubmissionError> {
    let receipt = service.submit(record)?;
    if receipt.success {
        tracing::info!(
            service = service.service_name(),
            submission_id = receipt.submission_id.as_deref().unwrap_or("-"),
            "submission accepted"
        );
        Ok(receipt)
    } else {
        Err(SubmissionError::Rejected(receipt.message))
    }
}

/// Log entry written for each submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionLog {
    /// When the submission was made.
    pub timestamp: Timestamp,
    /// Assigned identifier.
    pub submission_id: String,
    /// The submitted record; files appear as metadata only.
    pub form_data: DataRecord,
}

/// Writes each submission to `<dir>/submission_<id>.json`.
#[derive(Debug, Clone)]
pub struct DirectorySubmissionService {
    dir: PathBuf,
}

impl DirectorySubmissionService {
    /// A service writing into `dir`, created on first submission.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File a submission id is written to.
    pub fn path_for(&self, submission_id: &str) -> PathBuf {
        self.dir.join(format!("submission_{submission_id}.json"))
    }
}

impl SubmissionService for DirectorySubmissionService {
    fn submit(&self, record: &DataRecord) -> Result<SubmissionReceipt, SubmissionError> {
        let submission_id = format!("sub_{}", Uuid::new_v4().simple());
        let log = SubmissionLog {
            timestamp: Timestamp::now(),
            submission_id: submission_id.clone(),
            form_data: record.clone(),
        };
        let text = serde_json::to_string_pretty(&log)?;

        std::fs::create_dir_all(&self.dir).map_err(|source| SubmissionError::Io {
            path: self.dir.display().to_string(),
            source,
        })?;
        let path = self.path_for(&submission_id);
        std::fs::write(&path, text).map_err(|source| SubmissionError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Ok(SubmissionReceipt {
            success: true,
            message: format!("Form submitted successfully. Saved to {}", path.display()),
            submission_id: Some(submission_id),
        })
    }

    fn service_name(&self) -> &str {
        "directory"
    }
}

/// How a [`RecordingSubmissionService`] answers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ScriptedOutcome {
    /// Accept and record the submission.
    #[default]
    Accept,
    /// Answer with `success = false` and this message.
    Decline(String),
    /// Fail with [`SubmissionError::Unavailable`] and this message.
    Fail(String),
}

/// In-memory service that records accepted submissions.
#[derive(Debug, Default)]
pub struct RecordingSubmissionService {
    outcome: Mutex<ScriptedOutcome>,
    submissions: Mutex<Vec<DataRecord>>,
    attempts: Mutex<usize>,
}

impl RecordingSubmissionService {
    /// A service that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// A service that answers with the given outcome.
    pub fn with_outcome(outcome: ScriptedOutcome) -> Self {
        let service = Self::default();
        service.set_outcome(outcome);
        service
    }

    /// Change how later calls answer.
    pub fn set_outcome(&self, outcome: ScriptedOutcome) {
        *self.outcome.lock() = outcome;
    }

    /// Accepted submissions, oldest first.
    pub fn submissions(&self) -> Vec<DataRecord> {
        self.submissions.lock().clone()
    }

    /// Number of calls, accepted or not.
    pub fn attempts(&self) -> usize {
        *self.attempts.lock()
    }
}

impl SubmissionService for RecordingSubmissionService {
    fn submit(&self, record: &DataRecord) -> Result<SubmissionReceipt, SubmissionError> {
        *self.attempts.lock() += 1;
        match self.outcome.lock().clone() {
            ScriptedOutcome::Accept => {
                let mut submissions = self.submissions.lock();
                submissions.push(record.clone());
                Ok(SubmissionReceipt {
                    success: true,
                    message: "recorded".to_string(),
                    submission_id: Some(format!("rec_{}", submissions.len())),
                })
            }
            ScriptedOutcome::Decline(message) => Ok(SubmissionReceipt {
                success: false,
                message,
                submission_id: None,
            }),
            ScriptedOutcome::Fail(message) => Err(SubmissionError::Unavailable(message)),
        }
    }

    fn service_name(&self) -> &str {
        "recording"
    }
}
