//! Identity, de-duplication and history accumulation for canonical records.
//!
//! Two records describe the same hearing when their [`dedup_key`]s match. History
//! merging is append-mostly: an entry absent from a newer scrape is carried
//! forward untouched, never removed or marked stale.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use chrono::{DateTime, Utc};

use crate::dates::{infer_fallback_year, resolve_date, to_iso_timestamp};
use crate::types::CanonicalRecord;

/// Case-insensitive `date|time|committee`.
pub fn dedup_key(record: &CanonicalRecord) -> String {
    format!("{}|{}|{}", record.date, record.time, record.committee).to_lowercase()
}

/// Keeps the first record for each key, preserving input order.
pub fn dedupe(records: Vec<CanonicalRecord>) -> Vec<CanonicalRecord> {
    let mut seen = std::collections::HashSet::new();
    let before = records.len();
    let kept: Vec<CanonicalRecord> = records
        .into_iter()
        .filter(|record| seen.insert(dedup_key(record)))
        .collect();
    if kept.len() < before {
        log::debug!("Removed {} duplicate record(s)", before - kept.len());
    }
    kept
}

/// Merges `current` (this run's scrape) into `previous` (the persisted history).
///
/// History entries are ingested first, keeping their own `firstSeenAt`/`lastSeenAt`
/// or `baseline_seen_at` when they carry none. Current records are stamped with
/// `now`. Where both sides share a key, the current record's fields win unless
/// they are empty, the first-seen time is the earliest and the last-seen time the
/// latest. Output holds one record per key in first-ingested order.
pub fn merge_with_history(
    current: Vec<CanonicalRecord>,
    previous: Vec<CanonicalRecord>,
    now: DateTime<Utc>,
    baseline_seen_at: DateTime<Utc>,
) -> Vec<CanonicalRecord> {
    let mut merged: Vec<CanonicalRecord> = Vec::with_capacity(previous.len() + current.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    let history = previous.into_iter().filter_map(|mut record| {
        record = normalize_history_entry(record)?;
        record.first_seen_at = record.first_seen_at.or(record.last_seen_at).or(Some(baseline_seen_at));
        record.last_seen_at = record.last_seen_at.or(record.first_seen_at);
        Some(record)
    });

    let scraped = current.into_iter().map(|mut record| {
        record.first_seen_at = Some(now);
        record.last_seen_at = Some(now);
        record
    });

    for incoming in history.chain(scraped) {
        match index.entry(dedup_key(&incoming)) {
            Entry::Occupied(slot) => {
                let existing = &mut merged[*slot.get()];
                *existing = merge_pair(existing, incoming);
            }
            Entry::Vacant(slot) => {
                slot.insert(merged.len());
                merged.push(incoming);
            }
        }
    }

    merged
}

/// History files written by older runs may hold unresolved date labels; those are
/// resolved against the year of the entry's own timestamps.
fn normalize_history_entry(mut record: CanonicalRecord) -> Option<CanonicalRecord> {
    let year = infer_fallback_year(
        &record.iso_date,
        &[record.first_seen_at, record.last_seen_at],
    );
    let Some(date) = resolve_date(&record.date, year) else {
        log::warn!(
            "Dropping history entry {:?}: unresolvable date {:?}",
            record.id,
            record.date
        );
        return None;
    };
    if date != record.date {
        record.date = date;
        record.iso_date = to_iso_timestamp(&record.date, &record.time).unwrap_or_default();
    }
    if record.committee.trim().is_empty() {
        log::warn!("Dropping history entry {:?}: no committee", record.id);
        return None;
    }
    Some(record)
}

fn merge_pair(existing: &CanonicalRecord, incoming: CanonicalRecord) -> CanonicalRecord {
    fn pick(new: String, old: &str) -> String {
        if new.trim().is_empty() && !old.trim().is_empty() {
            old.to_string()
        } else {
            new
        }
    }

    CanonicalRecord {
        id: pick(incoming.id, &existing.id),
        chamber: incoming.chamber,
        committee: pick(incoming.committee, &existing.committee),
        date: pick(incoming.date, &existing.date),
        time: pick(incoming.time, &existing.time),
        venue: pick(incoming.venue, &existing.venue),
        agenda: pick(incoming.agenda, &existing.agenda),
        status: pick(incoming.status, &existing.status),
        notes: pick(incoming.notes, &existing.notes),
        iso_date: pick(incoming.iso_date, &existing.iso_date),
        source: pick(incoming.source, &existing.source),
        search_text: pick(incoming.search_text, &existing.search_text),
        first_seen_at: earliest(existing.first_seen_at, incoming.first_seen_at),
        last_seen_at: latest(existing.last_seen_at, incoming.last_seen_at),
    }
}

fn earliest(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn latest(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}
