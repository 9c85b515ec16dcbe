//! Source adapters turn one chamber's raw payload into [`CanonicalRecord`]s.
//!
//! Each source exposes its own row shape ([`house::ApiRow`], [`senate::TableRow`]);
//! the two meet in [`RawRecord`] and leave as canonical records, so nothing
//! downstream sees source-specific fields. Rows that cannot produce a complete
//! record are dropped and counted, never reported as errors.

pub mod house;
pub mod senate;

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::types::CanonicalRecord;

static RE_ONWARDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*\bonwards?\b\.?").expect("invalid regex: onwards"));

static RE_CANCELLED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[\[(]?\s*\bcancell?ed\b\s*[\])]?").expect("invalid regex: cancelled")
});

pub(crate) const ONWARDS_NOTE: &str = "Onwards";
pub(crate) const STATUS_SEPARATOR: &str = " | ";

#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("Payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("Unexpected payload structure: {0}")]
    Structure(String),
}

/// A raw row from either source, before normalization.
#[derive(Debug, Clone)]
pub enum RawRecord {
    Api(house::ApiRow),
    Table(senate::TableRow),
}

impl RawRecord {
    pub fn into_canonical(self, fallback_year: Option<i32>) -> Option<CanonicalRecord> {
        let record = match self {
            RawRecord::Api(row) => house::adapt_row(row, fallback_year),
            RawRecord::Table(row) => senate::adapt_row(row),
        }?;
        record.is_complete().then_some(record)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AdapterReport {
    pub kept: usize,
    pub dropped: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Adapted {
    pub records: Vec<CanonicalRecord>,
    pub report: AdapterReport,
}

impl Adapted {
    pub(crate) fn collect<I>(raw: I, fallback_year: Option<i32>) -> Self
    where
        I: IntoIterator<Item = RawRecord>,
    {
        let mut adapted = Adapted::default();
        for row in raw {
            match row.into_canonical(fallback_year) {
                Some(record) => adapted.records.push(record),
                None => adapted.report.dropped += 1,
            }
        }
        adapted.report.kept = adapted.records.len();
        adapted
    }
}

/// Removes a trailing "onwards" from a clock string, reporting whether it was
/// there.
pub(crate) fn split_onwards(time: &str) -> (String, bool) {
    if RE_ONWARDS.is_match(time) {
        (crate::text::normalize(&RE_ONWARDS.replace_all(time, "")), true)
    } else {
        (time.to_string(), false)
    }
}

/// Strips "(Cancelled)" style markers from `text`, reporting whether one was
/// found.
pub(crate) fn take_cancelled_marker(text: &str) -> (String, bool) {
    if RE_CANCELLED.is_match(text) {
        (crate::text::normalize(&RE_CANCELLED.replace_all(text, " ")), true)
    } else {
        (text.to_string(), false)
    }
}

pub(crate) fn compose_status(cancelled: bool, rescheduled: &str, remarks: &str) -> String {
    let mut parts = Vec::new();
    if cancelled {
        parts.push("Cancelled".to_string());
    }
    if !rescheduled.is_empty() {
        parts.push(format!("Rescheduled: {}", rescheduled));
    }
    if parts.is_empty() {
        parts.push(crate::types::DEFAULT_STATUS.to_string());
    }
    if !remarks.is_empty() && !parts.iter().any(|p| p.eq_ignore_ascii_case(remarks)) {
        parts.push(remarks.to_string());
    }
    parts.join(STATUS_SEPARATOR)
}

pub(crate) fn slugify(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
