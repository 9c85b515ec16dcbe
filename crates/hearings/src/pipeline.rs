use chrono::{DateTime, Utc};

use crate::adapters::{self, AdapterError, Adapted, house, senate};
use crate::assemble::{Assembly, SourceReport, SourceResult, assemble};
use crate::config::PipelineConfig;
use crate::reconcile::{dedupe, merge_with_history};
use crate::scraper::{ScraperError, SourcePayloads};
use crate::store::{ArtifactStore, StoreError};

pub const HOUSE_KEY: &str = "house";
pub const SENATE_KEY: &str = "senate";
pub const COMBINED_KEY: &str = "all";
pub const HISTORY_KEY: &str = "senate_history";
pub const META_KEY: &str = "meta";

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One scrape-normalize-merge-publish cycle over already fetched payloads.
///
/// A failing source yields an empty list and a failed [`SourceReport`]; only a
/// failure to write the artifacts aborts the run.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    store: ArtifactStore,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let store = ArtifactStore::new(config.out_dir.clone());
        Self { config, store }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn run(&self, payloads: SourcePayloads, now: DateTime<Utc>) -> Result<Assembly, PipelineError> {
        log::info!("Starting run at {}", now.to_rfc3339());

        let house = self.house_result(payloads.house);
        let senate = self.senate_result(payloads.senate, now);
        let assembly = assemble(house, senate, now);

        self.persist(&assembly)?;

        log::info!(
            "Run complete: {} House, {} Senate, {} total",
            assembly.metadata.counts.house,
            assembly.metadata.counts.senate,
            assembly.metadata.counts.all
        );
        Ok(assembly)
    }

    fn house_result(&self, payload: Result<String, ScraperError>) -> SourceResult {
        let fallback_year = self.config.fallback_year;
        self.source_result(house::SOURCE_LABEL, "house.json", payload, |text| {
            house::adapt(text, fallback_year)
        })
    }

    /// The Senate list is the merge of this run's rows into the stored history.
    /// A failed source leaves the history untouched.
    fn senate_result(&self, payload: Result<String, ScraperError>, now: DateTime<Utc>) -> SourceResult {
        let fallback_year = self.config.fallback_year;
        let mut result = self.source_result(senate::SOURCE_LABEL, "senate.html", payload, |text| {
            senate::adapt(text, fallback_year)
        });
        if !result.report.ok {
            return result;
        }

        let previous = self.store.read_records(HISTORY_KEY).unwrap_or_else(|| {
            log::info!("Starting Senate history from an empty baseline");
            Vec::new()
        });
        let before = previous.len();
        result.records = merge_with_history(result.records, previous, now, now);
        log::info!(
            "Senate history: {} entr(ies) before merge, {} after",
            before,
            result.records.len()
        );
        result
    }

    fn source_result<F>(
        &self,
        label: &str,
        raw_name: &str,
        payload: Result<String, ScraperError>,
        adapt: F,
    ) -> SourceResult
    where
        F: FnOnce(&str) -> Result<Adapted, AdapterError>,
    {
        let text = match payload {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Source {} failed: {}", label, e);
                return failed(label, e);
            }
        };

        if self.config.keep_raw
            && let Err(e) = self.store.write_raw(raw_name, &text)
        {
            log::warn!("Could not keep raw {} payload: {}", label, e);
        }

        match adapt(&text) {
            Ok(adapted) => succeeded(label, adapted),
            Err(e) => {
                log::warn!("Source {} could not be adapted: {}", label, e);
                failed(label, e)
            }
        }
    }

    fn persist(&self, assembly: &Assembly) -> Result<(), PipelineError> {
        self.store.write_records(HOUSE_KEY, &assembly.house)?;
        self.store.write_records(SENATE_KEY, &assembly.senate)?;
        self.store.write_records(COMBINED_KEY, &assembly.combined)?;
        if assembly.metadata.sources.senate.ok {
            self.store.write_records(HISTORY_KEY, &assembly.senate)?;
        } else {
            log::warn!("Senate source failed; keeping existing history untouched");
        }
        self.store.write_json(META_KEY, &assembly.metadata)?;
        Ok(())
    }
}

fn succeeded(label: &str, adapted: Adapted) -> SourceResult {
    let adapters::AdapterReport { kept, dropped } = adapted.report;
    let records = dedupe(adapted.records);
    let duplicates = kept - records.len();
    SourceResult {
        report: SourceReport {
            label: label.to_string(),
            ok: true,
            error: None,
            kept: records.len(),
            dropped: dropped + duplicates,
        },
        records,
    }
}

fn failed(label: &str, error: impl ToString) -> SourceResult {
    SourceResult {
        records: Vec::new(),
        report: SourceReport::failed(label, error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::RunMetadata;
    use crate::types::{CanonicalRecord, Chamber};
    use chrono::TimeZone;
    use std::fs;
    use tempfile::tempdir;

    fn fixture(name: &str) -> String {
        fs::read_to_string(format!("fixtures/{name}")).expect("Failed to read fixture")
    }

    fn pipeline(out_dir: &std::path::Path) -> Pipeline {
        Pipeline::new(PipelineConfig {
            out_dir: out_dir.to_path_buf(),
            fallback_year: Some(2025),
            keep_raw: false,
        })
    }

    fn both_fixtures() -> SourcePayloads {
        SourcePayloads {
            house: Ok(fixture("house_schedule.json")),
            senate: Ok(fixture("senate_schedule.html")),
        }
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, day, 6, 0, 0).unwrap()
    }

    #[test]
    fn test_run_writes_all_artifacts() {
        let dir = tempdir().unwrap();
        let pipeline = pipeline(dir.path());

        let assembly = pipeline.run(both_fixtures(), at(10)).expect("Run should succeed");

        assert_eq!(assembly.metadata.counts.house, 5);
        assert_eq!(assembly.metadata.counts.senate, 5);
        assert_eq!(assembly.metadata.counts.all, 10);
        assert_eq!(assembly.metadata.sources.house.dropped, 1);

        for key in [HOUSE_KEY, SENATE_KEY, COMBINED_KEY, HISTORY_KEY, META_KEY] {
            assert!(pipeline.store().path_for(key).exists(), "{key}.json missing");
        }

        let combined = pipeline.store().read_records(COMBINED_KEY).unwrap();
        assert_eq!(combined, assembly.combined);
        assert!(combined.windows(2).all(|w| w[0].iso_date <= w[1].iso_date));
        assert!(combined.iter().all(|r| !r.search_text.is_empty()));

        let meta: RunMetadata =
            serde_json::from_str(&fs::read_to_string(pipeline.store().path_for(META_KEY)).unwrap())
                .unwrap();
        assert_eq!(meta, assembly.metadata);
        assert_eq!(meta.history.map(|h| h.entries), Some(5));
    }

    #[test]
    fn test_failed_source_does_not_block_the_other() {
        let dir = tempdir().unwrap();
        let pipeline = pipeline(dir.path());

        let payloads = SourcePayloads {
            house: Err(ScraperError::Blocked("https://example.org/house".to_string())),
            senate: Ok(fixture("senate_schedule.html")),
        };
        let assembly = pipeline.run(payloads, at(10)).unwrap();

        assert!(assembly.house.is_empty());
        assert_eq!(assembly.senate.len(), 5);
        assert!(!assembly.metadata.sources.house.ok);
        assert!(assembly.metadata.sources.house.error.is_some());
        assert_eq!(pipeline.store().read_records(HOUSE_KEY), Some(Vec::new()));
    }

    #[test]
    fn test_unadaptable_payload_is_a_failed_source() {
        let dir = tempdir().unwrap();
        let pipeline = pipeline(dir.path());

        let payloads = SourcePayloads {
            house: Ok("<html>maintenance</html>".to_string()),
            senate: Ok("<p>no tables today</p>".to_string()),
        };
        let assembly = pipeline.run(payloads, at(10)).unwrap();

        assert_eq!(assembly.metadata.counts.all, 0);
        assert!(!assembly.metadata.sources.house.ok);
        assert!(!assembly.metadata.sources.senate.ok);
        assert!(assembly.metadata.history.is_none());
    }

    #[test]
    fn test_history_accumulates_across_runs() {
        let dir = tempdir().unwrap();
        let pipeline = pipeline(dir.path());

        pipeline.run(both_fixtures(), at(10)).unwrap();

        let single_day = r#"
            <table>
              <tr><td colspan="3">Tuesday, August 12</td></tr>
              <tr><th>Committee</th><th>Time and Venue</th><th>Agenda</th></tr>
              <tr><td>Committee on Finance</td><td>10:00 a.m.<br>Plenary Hall</td><td>Budget hearing</td></tr>
              <tr><td>Committee on Labor</td><td>2:00 p.m.<br>Room A</td><td>Wage bills</td></tr>
            </table>"#;
        let assembly = pipeline
            .run(
                SourcePayloads {
                    house: Ok(fixture("house_schedule.json")),
                    senate: Ok(single_day.to_string()),
                },
                at(11),
            )
            .unwrap();

        assert_eq!(assembly.senate.len(), 6);
        let finance = assembly
            .senate
            .iter()
            .find(|r| r.committee == "Committee on Finance")
            .unwrap();
        assert_eq!(finance.first_seen_at, Some(at(10)));
        assert_eq!(finance.last_seen_at, Some(at(11)));

        let labor = assembly
            .senate
            .iter()
            .find(|r| r.committee == "Committee on Labor")
            .unwrap();
        assert_eq!(labor.first_seen_at, Some(at(11)));

        let vanished: Vec<&CanonicalRecord> = assembly
            .senate
            .iter()
            .filter(|r| r.last_seen_at == Some(at(10)))
            .collect();
        assert_eq!(vanished.len(), 4);

        let stored = pipeline.store().read_records(HISTORY_KEY).unwrap();
        assert_eq!(stored.len(), 6);
    }

    #[test]
    fn test_failed_senate_keeps_history() {
        let dir = tempdir().unwrap();
        let pipeline = pipeline(dir.path());

        pipeline.run(both_fixtures(), at(10)).unwrap();
        let before = fs::read_to_string(pipeline.store().path_for(HISTORY_KEY)).unwrap();

        let assembly = pipeline
            .run(
                SourcePayloads {
                    house: Ok(fixture("house_schedule.json")),
                    senate: Err(ScraperError::NotConfigured("Senate")),
                },
                at(11),
            )
            .unwrap();

        assert!(assembly.senate.is_empty());
        assert_eq!(assembly.metadata.counts.senate, 0);
        assert!(assembly.metadata.history.is_none());
        assert_eq!(
            fs::read_to_string(pipeline.store().path_for(HISTORY_KEY)).unwrap(),
            before
        );
    }

    #[test]
    fn test_corrupt_history_is_an_empty_baseline() {
        let dir = tempdir().unwrap();
        let pipeline = pipeline(dir.path());
        fs::write(pipeline.store().path_for(HISTORY_KEY), "{ not json").unwrap();

        let assembly = pipeline.run(both_fixtures(), at(10)).unwrap();

        assert_eq!(assembly.senate.len(), 5);
        assert!(assembly.senate.iter().all(|r| r.first_seen_at == Some(at(10))));
        assert!(assembly.senate.iter().all(|r| r.chamber == Chamber::Senate));
    }

    #[test]
    fn test_history_survives_an_unreadable_entry() {
        let dir = tempdir().unwrap();
        let pipeline = pipeline(dir.path());
        fs::write(
            pipeline.store().path_for(HISTORY_KEY),
            r#"[
                { "chamber": "senate", "committee": "Committee on Old", "date": "2025-07-01",
                  "time": "9:00 AM", "firstSeenAt": "2025-07-01T00:00:00Z" },
                { "chamber": "Senate", "committee": "Committee on Mixed Case", "date": "2025-07-02",
                  "time": "9:00 AM", "firstSeenAt": "2025-07-01T00:00:00Z" },
                { "chamber": 42, "committee": "Committee on Garbage" }
            ]"#,
        )
        .unwrap();

        let assembly = pipeline.run(both_fixtures(), at(10)).unwrap();

        assert_eq!(assembly.senate.len(), 7);
        for committee in ["Committee on Old", "Committee on Mixed Case"] {
            assert!(
                assembly.senate.iter().any(|r| r.committee == committee),
                "{committee} should survive the merge"
            );
        }

        let stored = pipeline.store().read_records(HISTORY_KEY).unwrap();
        assert_eq!(stored.len(), 7);
        assert!(stored.iter().any(|r| r.committee == "Committee on Old"));
    }

    #[test]
    fn test_keep_raw_stores_payloads() {
        let dir = tempdir().unwrap();
        let pipeline = Pipeline::new(PipelineConfig {
            out_dir: dir.path().to_path_buf(),
            fallback_year: Some(2025),
            keep_raw: true,
        });

        pipeline.run(both_fixtures(), at(10)).unwrap();

        assert!(dir.path().join("raw/house.json").exists());
        assert!(dir.path().join("raw/senate.html").exists());
    }

    #[test]
    fn test_unwritable_output_is_fatal() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file, not a directory").unwrap();

        let result = pipeline(&blocker).run(both_fixtures(), at(10));

        assert!(matches!(result, Err(PipelineError::Store(_))));
    }
}
