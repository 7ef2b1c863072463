//! # Temporal Types
//!
//! - [`Timestamp`]: UTC-only timestamp truncated to seconds, used for
//!   transition logs and submission logs.
//! - [`DateBound`]: a date-picker bound, either a literal `YYYY-MM-DD`
//!   date or the sentinel `"today"` resolved at validation time.
//! - [`parse_iso_date`]: strict `YYYY-MM-DD` parsing shared by the schema
//!   validator and the rule compiler.

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FormflowError;

/// Sentinel accepted by date bounds in place of a literal date.
pub const TODAY_SENTINEL: &str = "today";

/// A UTC-only timestamp, truncated to seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// From a `chrono::DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// The UTC calendar date of this instant.
    pub fn date(&self) -> NaiveDate {
        self.0.date_naive()
    }

    /// Render as ISO8601 with Z suffix (e.g., `2026-01-15T12:00:00Z`).
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

/// Whether `s` has the exact `YYYY-MM-DD` shape (digits and hyphens only).
pub fn is_iso_date_shape(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Parse a strict `YYYY-MM-DD` calendar date.
///
/// Returns `None` when the shape is wrong or the date does not exist
/// (e.g. `2025-02-30`).
pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    if !is_iso_date_shape(s) {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// A bound on a date-picker answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DateBound {
    /// The current date at validation time.
    Today,
    /// A fixed calendar date.
    On(NaiveDate),
}

impl DateBound {
    /// Parse a bound from `"today"` or a `YYYY-MM-DD` literal.
    pub fn parse(s: &str) -> Result<Self, FormflowError> {
        if s == TODAY_SENTINEL {
            return Ok(Self::Today);
        }
        parse_iso_date(s)
            .map(Self::On)
            .ok_or_else(|| FormflowError::InvalidValue(format!("invalid date bound: {s:?}")))
    }

    /// Resolve the bound to a concrete date.
    pub fn resolve(&self, today: NaiveDate) -> NaiveDate {
        match self {
            Self::Today => today,
            Self::On(date) => *date,
        }
    }

    /// Whether this bound is the `"today"` sentinel.
    pub fn is_today(&self) -> bool {
        matches!(self, Self::Today)
    }
}

impl std::fmt::Display for DateBound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Today => f.write_str(TODAY_SENTINEL),
            Self::On(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

impl TryFrom<String> for DateBound {
    type Error = FormflowError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<DateBound> for String {
    fn from(bound: DateBound) -> Self {
        bound.to_string()
    }
}
