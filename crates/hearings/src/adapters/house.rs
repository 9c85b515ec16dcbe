use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::{Adapted, AdapterError, RawRecord};
use crate::dates::{resolve_date, to_iso_timestamp};
use crate::text::{canonicalize_clock, cell_to_lines, html_fragment_to_text, normalize};
use crate::types::{CanonicalRecord, Chamber};

pub const SOURCE_LABEL: &str = "house-api";

static RE_NATIVE_TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2})[T ](\d{2}):(\d{2})(?::(\d{2}))?")
        .expect("invalid regex: native timestamp")
});

/// One row of the House committee schedule API. Field types and names vary
/// between deployments, so every field is read leniently and each alternate
/// name is its own field; the first non-empty one wins.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiRow {
    #[serde(default, deserialize_with = "loose_string")]
    pub id: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub date: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub time: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub committee: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub comm_name: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub committee_name: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub venue: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub agenda: String,
    #[serde(default, deserialize_with = "loose_flag")]
    pub cancelled: bool,
    #[serde(default, deserialize_with = "loose_flag")]
    pub is_cancelled: bool,
    #[serde(default, deserialize_with = "loose_string")]
    pub reschedule: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub resched: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub rescheduled: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub remarks: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub date_time: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub datetime: String,
}

impl ApiRow {
    fn committee_html(&self) -> &str {
        first_filled([&self.committee, &self.comm_name, &self.committee_name])
    }

    fn reschedule_html(&self) -> &str {
        first_filled([&self.reschedule, &self.resched, &self.rescheduled])
    }

    fn timestamp(&self) -> &str {
        first_filled([&self.date_time, &self.datetime])
    }

    fn cancelled_flag(&self) -> bool {
        self.cancelled || self.is_cancelled
    }
}

fn first_filled<const N: usize>(candidates: [&String; N]) -> &str {
    candidates
        .into_iter()
        .find(|value| !value.trim().is_empty())
        .map_or("", String::as_str)
}

#[derive(Debug, Deserialize)]
struct Envelope {
    data: EnvelopeData,
}

#[derive(Debug, Deserialize)]
struct EnvelopeData {
    rows: Vec<Value>,
}

/// Adapts a `{ "data": { "rows": [...] } }` payload from the House API.
///
/// A payload that is not that envelope is an [`AdapterError`]; a row that
/// cannot be read or lacks a date or committee is dropped and counted.
pub fn adapt(payload: &str, fallback_year: Option<i32>) -> Result<Adapted, AdapterError> {
    let envelope: Envelope = serde_json::from_str(payload)?;

    let mut unreadable = 0;
    let rows: Vec<RawRecord> = envelope
        .data
        .rows
        .into_iter()
        .filter_map(|row| match serde_json::from_value::<ApiRow>(row) {
            Ok(row) => Some(RawRecord::Api(row)),
            Err(e) => {
                log::debug!("Skipping unreadable House row: {}", e);
                unreadable += 1;
                None
            }
        })
        .collect();

    let mut adapted = Adapted::collect(rows, fallback_year);
    adapted.report.dropped += unreadable;

    log::info!(
        "House API: kept {} row(s), dropped {}",
        adapted.report.kept,
        adapted.report.dropped
    );
    Ok(adapted)
}

pub(crate) fn adapt_row(row: ApiRow, fallback_year: Option<i32>) -> Option<CanonicalRecord> {
    let native = native_timestamp(row.timestamp());
    let year_hint = native
        .as_deref()
        .and_then(|ts| ts[..4].parse::<i32>().ok())
        .or(fallback_year);

    let Some(date) = resolve_date(&normalize(&row.date), year_hint) else {
        log::debug!("Dropping House row {:?}: unresolvable date {:?}", row.id, row.date);
        return None;
    };
    let committee = html_fragment_to_text(row.committee_html());
    if committee.is_empty() {
        log::debug!("Dropping House row {:?}: no committee", row.id);
        return None;
    }

    let (time, onwards) = super::split_onwards(&canonicalize_clock(&row.time));
    let iso_date = native
        .filter(|ts| ts.starts_with(&date))
        .or_else(|| to_iso_timestamp(&date, &time))
        .unwrap_or_default();

    let id = if row.id.trim().is_empty() {
        format!("hrep-{}", uuid::Uuid::new_v4())
    } else {
        format!("hrep-{}", row.id.trim())
    };

    let mut record = CanonicalRecord::new(Chamber::House, SOURCE_LABEL);
    record.id = id;
    record.status = super::compose_status(
        row.cancelled_flag(),
        &html_fragment_to_text(row.reschedule_html()),
        &html_fragment_to_text(&row.remarks),
    );
    record.committee = committee;
    record.date = date;
    record.time = time;
    record.venue = html_fragment_to_text(&row.venue);
    record.agenda = cell_to_lines(&row.agenda).join("; ");
    record.iso_date = iso_date;
    if onwards {
        record.notes = super::ONWARDS_NOTE.to_string();
    }
    Some(record)
}

fn native_timestamp(raw: &str) -> Option<String> {
    let caps = RE_NATIVE_TIMESTAMP.captures(raw.trim())?;
    let seconds = caps.get(4).map_or("00", |m| m.as_str());
    Some(format!("{}T{}:{}:{}", &caps[1], &caps[2], &caps[3], seconds))
}

fn loose_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

fn loose_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "y" | "cancelled" | "canceled"
        ),
        _ => false,
    })
}
