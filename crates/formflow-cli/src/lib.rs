//! # formflow-cli: Command-Line Tool for formflow
//!
//! Provides the `formflow` binary.
//!
//! ## Subcommands
//!
//! - `formflow validate [SCHEMA]`: Structural schema validation.
//! - `formflow defaults [SCHEMA]`: Print the default record.
//! - `formflow pages [SCHEMA] --page-size N`: Print the page partition.
//! - `formflow check SCHEMA RECORD`: Run the compiled validator over a
//!   record, whole or one page.
//! - `formflow fill SCHEMA ANSWERS`: Drive a session page by page and
//!   submit.
//!
//! ## Exit Codes
//!
//! `0` success, `1` rejected schema or invalid record, `2` usage or IO
//! failure.

pub mod config;
pub mod fill;
pub mod inspect;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use formflow_core::{DataRecord, FormSchema};
use formflow_schema::{SchemaLoader, SchemaValidationError};

use crate::config::CliConfig;

/// Success.
pub const EXIT_OK: u8 = 0;
/// Schema rejected or record invalid.
pub const EXIT_INVALID: u8 = 1;
/// Usage or IO failure.
pub const EXIT_FAILURE: u8 = 2;

/// The schema path a command operates on: the argument, else the
/// configured default.
pub fn schema_path(arg: Option<&Path>, config: &CliConfig) -> PathBuf {
    arg.map_or_else(|| config.default_schema.clone(), Path::to_path_buf)
}

/// Load and validate a schema file.
///
/// Returns `Ok(None)` after printing the problems when the document is
/// malformed or rejected. Unreadable files are errors.
pub fn load_schema(path: &Path) -> Result<Option<FormSchema>> {
    let loader = SchemaLoader::new().context("failed to build schema validator")?;
    match loader.load_file(path) {
        Ok(schema) => Ok(Some(schema)),
        Err(SchemaValidationError::Rejected { issues }) => {
            eprintln!("INVALID: {}", path.display());
            eprintln!("{issues}");
            Ok(None)
        }
        Err(e @ SchemaValidationError::Parse { .. }) => {
            eprintln!("INVALID: {e}");
            Ok(None)
        }
        Err(e) => Err(e).with_context(|| format!("failed to load schema {}", path.display())),
    }
}

/// Read a data record from a JSON file.
pub fn load_record(path: &Path) -> Result<DataRecord> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read record {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid record JSON in {}", path.display()))
}

/// Parse a `--today` value.
pub fn parse_today(s: &str) -> Result<NaiveDate, String> {
    formflow_core::parse_iso_date(s).ok_or_else(|| format!("expected YYYY-MM-DD, got {s:?}"))
}

/// The date `"today"` resolves to: the override, else the UTC date.
pub fn today_or_now(today: Option<NaiveDate>) -> NaiveDate {
    today.unwrap_or_else(|| chrono::Utc::now().date_naive())
}
