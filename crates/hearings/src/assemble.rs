use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::dates::to_iso_timestamp;
use crate::types::{CanonicalRecord, Chamber};

/// Fills `iso_date` when missing and rebuilds `search_text`. Idempotent.
pub fn decorate(mut record: CanonicalRecord) -> CanonicalRecord {
    if record.iso_date.is_empty() {
        record.iso_date = to_iso_timestamp(&record.date, &record.time).unwrap_or_default();
    }
    let chamber = record.chamber.to_string();
    let parts: [&str; 6] = [
        &chamber,
        &record.committee,
        &record.venue,
        &record.agenda,
        &record.status,
        &record.notes,
    ];
    let search_text = parts
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    record.search_text = search_text;
    record
}

/// Orders by `iso_date` ascending, records without one last, ties by committee.
pub fn sort_records(mut records: Vec<CanonicalRecord>) -> Vec<CanonicalRecord> {
    records.sort_by(compare_records);
    records
}

fn compare_records(a: &CanonicalRecord, b: &CanonicalRecord) -> Ordering {
    let by_date = match (a.iso_date.is_empty(), b.iso_date.is_empty()) {
        (false, false) => a.iso_date.cmp(&b.iso_date),
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (true, true) => Ordering::Equal,
    };
    by_date.then_with(|| a.committee.cmp(&b.committee))
}

/// How one source fared in this run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SourceReport {
    pub label: String,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub kept: usize,
    #[serde(default)]
    pub dropped: usize,
}

impl SourceReport {
    pub fn failed(label: impl Into<String>, error: impl ToString) -> Self {
        Self {
            label: label.into(),
            ok: false,
            error: Some(error.to_string()),
            kept: 0,
            dropped: 0,
        }
    }
}

/// Records of one chamber after adaptation and reconciliation.
#[derive(Debug, Clone)]
pub struct SourceResult {
    pub records: Vec<CanonicalRecord>,
    pub report: SourceReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Counts {
    pub house: usize,
    pub senate: usize,
    pub all: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Sources {
    pub house: SourceReport,
    pub senate: SourceReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistorySummary {
    pub entries: usize,
    pub first_seen_min: Option<DateTime<Utc>>,
    pub first_seen_max: Option<DateTime<Utc>>,
    pub last_seen_min: Option<DateTime<Utc>>,
    pub last_seen_max: Option<DateTime<Utc>>,
}

impl HistorySummary {
    pub fn from_records(records: &[CanonicalRecord]) -> Self {
        let first = records.iter().filter_map(|r| r.first_seen_at);
        let last = records.iter().filter_map(|r| r.last_seen_at);
        Self {
            entries: records.len(),
            first_seen_min: first.clone().min(),
            first_seen_max: first.max(),
            last_seen_min: last.clone().min(),
            last_seen_max: last.max(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RunMetadata {
    pub generated_at: DateTime<Utc>,
    pub counts: Counts,
    pub sources: Sources,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<HistorySummary>,
}

/// Everything a run hands to the renderer.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub house: Vec<CanonicalRecord>,
    pub senate: Vec<CanonicalRecord>,
    pub combined: Vec<CanonicalRecord>,
    pub metadata: RunMetadata,
}

/// Decorates and sorts each chamber's records, builds the combined list and the
/// run metadata. `senate.records` is expected to be the merged history set.
pub fn assemble(house: SourceResult, senate: SourceResult, generated_at: DateTime<Utc>) -> Assembly {
    let finish = |records: Vec<CanonicalRecord>, chamber: Chamber| {
        sort_records(
            records
                .into_iter()
                .filter(|r| r.chamber == chamber && r.is_complete())
                .map(decorate)
                .collect(),
        )
    };

    let house_records = finish(house.records, Chamber::House);
    let senate_records = finish(senate.records, Chamber::Senate);
    // Chambers hold separate hearings, so the same slot and committee name in
    // both is kept twice.
    let combined = sort_records(
        house_records
            .iter()
            .chain(senate_records.iter())
            .cloned()
            .collect(),
    );

    let history = senate
        .report
        .ok
        .then(|| HistorySummary::from_records(&senate_records));

    let metadata = RunMetadata {
        generated_at,
        counts: Counts {
            house: house_records.len(),
            senate: senate_records.len(),
            all: combined.len(),
        },
        sources: Sources {
            house: house.report,
            senate: senate.report,
        },
        history,
    };

    Assembly {
        house: house_records,
        senate: senate_records,
        combined,
        metadata,
    }
}
