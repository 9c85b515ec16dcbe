use crate::types::{CanonicalRecord, Chamber};

use chrono::NaiveDate;

#[derive(Debug, Default)]
pub struct RecordFilter {
    pub chamber: Option<Chamber>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Case-insensitive substring of the record's search text.
    pub query: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl RecordFilter {
    pub fn apply(self, mut records: Vec<CanonicalRecord>) -> Vec<CanonicalRecord> {
        if let Some(chamber) = self.chamber {
            records.retain(|r| r.chamber == chamber);
        }
        if let Some(start) = self.start_date {
            records.retain(|r| record_date(r).is_some_and(|d| d >= start));
        }
        if let Some(end) = self.end_date {
            records.retain(|r| record_date(r).is_some_and(|d| d <= end));
        }
        if let Some(query) = self.query {
            let query = query.to_lowercase();
            records.retain(|r| {
                r.search_text.contains(&query) || r.committee.to_lowercase().contains(&query)
            });
        }
        if let Some(off) = self.offset {
            records = records.into_iter().skip(off).collect();
        }
        if let Some(lim) = self.limit {
            records.truncate(lim);
        }
        records
    }

    pub fn validate(self) -> Result<Self, String> {
        if let Some(start) = self.start_date
            && let Some(end) = self.end_date
            && start > end
        {
            return Err(format!(
                "Start date ({start}) cannot be after end date ({end})"
            ));
        }
        if self.query.as_deref().is_some_and(|q| q.trim().is_empty()) {
            return Err("Query must not be empty".to_string());
        }
        if self.offset.is_some_and(|o| o == 0) {
            return Err("Offset must be greater than 0".to_string());
        }
        if self.limit.is_some_and(|l| l == 0) {
            return Err("Limit must be greater than 0".to_string());
        }
        Ok(self)
    }
}

fn record_date(record: &CanonicalRecord) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&record.date, "%Y-%m-%d").ok()
}

#[derive(Debug)]
pub struct RecordStats {
    pub house: usize,
    pub senate: usize,
    pub cancelled: usize,
    pub total: usize,
}

impl RecordStats {
    pub fn from_records(records: &[CanonicalRecord]) -> RecordStats {
        RecordStats {
            house: records.iter().filter(|r| r.chamber == Chamber::House).count(),
            senate: records.iter().filter(|r| r.chamber == Chamber::Senate).count(),
            cancelled: records
                .iter()
                .filter(|r| r.status.starts_with("Cancelled"))
                .count(),
            total: records.len(),
        }
    }
}

impl std::fmt::Display for RecordStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nStatistics:")?;
        writeln!(f, "  House hearings:  {}", self.house)?;
        writeln!(f, "  Senate hearings: {}", self.senate)?;
        writeln!(f, "  Cancelled:       {}", self.cancelled)?;
        writeln!(f, "  Total:           {}", self.total)
    }
}
