use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::types::CanonicalRecord;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize {key}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// JSON artifacts of a run, one file per key under a root directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    /// Reads a previously written record array.
    ///
    /// `None` means there is no usable artifact: either it was never written or
    /// it could not be read or parsed. An empty array reads back as `Some(vec![])`.
    pub fn read_records(&self, key: &str) -> Option<Vec<CanonicalRecord>> {
        let path = self.path_for(key);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("No prior artifact at {}", path.display());
                return None;
            }
            Err(e) => {
                log::warn!("Could not read {}: {}", path.display(), e);
                return None;
            }
        };

        let entries = match serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!(
                    "Ignoring corrupt artifact {}: {}; continuing with an empty baseline",
                    path.display(),
                    e
                );
                return None;
            }
        };

        // One unreadable entry must not cost the rest of the file.
        let total = entries.len();
        let records: Vec<CanonicalRecord> = entries
            .into_iter()
            .enumerate()
            .filter_map(|(i, entry)| match serde_json::from_value(entry) {
                Ok(record) => Some(record),
                Err(e) => {
                    log::warn!("Skipping unreadable entry {} in {}: {}", i, path.display(), e);
                    None
                }
            })
            .collect();

        log::info!(
            "Loaded {} of {} record(s) from {}",
            records.len(),
            total,
            path.display()
        );
        Some(records)
    }

    pub fn write_records(&self, key: &str, records: &[CanonicalRecord]) -> Result<(), StoreError> {
        self.write_json(key, records)?;
        log::info!("Wrote {} record(s) to {}", records.len(), self.path_for(key).display());
        Ok(())
    }

    /// Pretty-printed full overwrite, staged in a sibling temp file and renamed
    /// into place.
    pub fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(value).map_err(|source| StoreError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.write_atomic(&self.path_for(key), json.as_bytes())
    }

    /// Stores a raw source payload under `raw/`, for diagnosing adapter drops.
    pub fn write_raw(&self, name: &str, contents: &str) -> Result<(), StoreError> {
        self.write_atomic(&self.root.join("raw").join(name), contents.as_bytes())
    }

    fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let staging = path.with_extension("tmp");
        fs::write(&staging, contents).map_err(io_err)?;
        fs::rename(&staging, path).map_err(io_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Chamber;
    use tempfile::tempdir;

    fn sample() -> Vec<CanonicalRecord> {
        let mut record = CanonicalRecord::new(Chamber::Senate, "senate-table");
        record.committee = "Committee on Finance".to_string();
        record.date = "2025-08-12".to_string();
        record.time = "10:00 AM".to_string();
        vec![record]
    }

    #[test]
    fn test_missing_artifact_reads_as_none() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        assert!(store.read_records("senate_history").is_none());
    }

    #[test]
    fn test_empty_artifact_reads_as_empty_list() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        store.write_records("senate_history", &[]).unwrap();

        assert_eq!(store.read_records("senate_history"), Some(Vec::new()));
    }

    #[test]
    fn test_corrupt_artifact_reads_as_none() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        fs::write(store.path_for("senate_history"), "[{\"chamber\": \"senate\",").unwrap();

        assert!(store.read_records("senate_history").is_none());
    }

    #[test]
    fn test_unreadable_entry_does_not_discard_the_rest() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        fs::write(
            store.path_for("senate_history"),
            r#"[
                { "chamber": "senate", "committee": "Committee on Old", "date": "2025-07-01" },
                { "chamber": "Senate", "committee": "Committee on Finance", "date": "2025-07-02" },
                { "chamber": "assembly", "committee": "Committee on Rules", "date": "2025-07-03" },
                "not a record"
            ]"#,
        )
        .unwrap();

        let records = store.read_records("senate_history").expect("Should read entries");

        let committees: Vec<&str> = records.iter().map(|r| r.committee.as_str()).collect();
        assert_eq!(committees, vec!["Committee on Old", "Committee on Finance"]);
        assert!(records.iter().all(|r| r.chamber == Chamber::Senate));
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("nested/out"));

        store.write_records("senate", &sample()).unwrap();

        let raw = fs::read_to_string(store.path_for("senate")).unwrap();
        assert!(raw.contains("\n  {"), "Output should be pretty-printed");
        assert_eq!(store.read_records("senate"), Some(sample()));
        assert!(!store.path_for("senate").with_extension("tmp").exists());
    }

    #[test]
    fn test_write_overwrites() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        store.write_records("house", &sample()).unwrap();
        store.write_records("house", &[]).unwrap();

        assert_eq!(store.read_records("house"), Some(Vec::new()));
    }

    #[test]
    fn test_write_raw() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        store.write_raw("senate.html", "<table></table>").unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("raw/senate.html")).unwrap(),
            "<table></table>"
        );
    }

    #[test]
    fn test_unwritable_root_is_an_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let store = ArtifactStore::new(&blocker);

        assert!(matches!(
            store.write_records("all", &sample()),
            Err(StoreError::Io { .. })
        ));
    }
}
