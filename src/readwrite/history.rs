use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::NATIONAL_SCOPE;
use crate::core::VariantRecord;
use crate::core::record::{format_timestamp, parse_timestamp};
use crate::errors::{Result, TrackerError};

/// Persists the record observed by the most recent run.
pub trait HistoryStore {
    /// Returns `None` before the first run.
    fn load(&self) -> Result<Option<VariantRecord>>;

    /// Replaces the stored record.
    fn save(&self, record: &VariantRecord) -> Result<()>;
}

/// Row layout of the history file.
///
/// Only `variant` and `share` are required so files written by older versions,
/// which carried an index column and the whole filtered table, still load.
#[derive(Debug, Serialize, Deserialize)]
struct HistoryRow {
    variant: String,
    share: f64,
    #[serde(default)]
    week_ending: Option<String>,
    #[serde(default)]
    creation_date: Option<String>,
    #[serde(default)]
    usa_or_hhsregion: Option<String>,
}

impl From<&VariantRecord> for HistoryRow {
    fn from(record: &VariantRecord) -> Self {
        Self {
            variant: record.variant.clone(),
            share: record.share,
            week_ending: Some(format_timestamp(&record.week_ending)),
            creation_date: Some(format_timestamp(&record.creation_date)),
            usa_or_hhsregion: Some(record.jurisdiction.clone()),
        }
    }
}

impl HistoryRow {
    fn into_record(self, path: &Path) -> Result<VariantRecord> {
        let week_ending = timestamp_field(self.week_ending.as_deref(), "week_ending", path)?;
        let creation_date = timestamp_field(self.creation_date.as_deref(), "creation_date", path)?;
        Ok(VariantRecord::new(
            self.variant,
            self.share,
            week_ending,
            creation_date,
            self.usa_or_hhsregion
                .unwrap_or_else(|| NATIONAL_SCOPE.to_string()),
        ))
    }
}

fn timestamp_field(value: Option<&str>, field: &str, path: &Path) -> Result<NaiveDateTime> {
    match value {
        None => {
            log::debug!("{} has no {field}, using epoch", path.display());
            Ok(NaiveDateTime::default())
        }
        Some(value) => parse_timestamp(value).ok_or_else(|| {
            TrackerError::persistence(format!(
                "Invalid {field} {value:?} in {}",
                path.display()
            ))
        }),
    }
}

/// History kept as a single-row csv file.
#[derive(Debug, Clone)]
pub struct CsvHistoryStore {
    path: PathBuf,
}

impl CsvHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl HistoryStore for CsvHistoryStore {
    /// Reads row zero; any further rows are ignored.
    fn load(&self) -> Result<Option<VariantRecord>> {
        if !self.path.exists() {
            log::info!("No history at {}", self.path.display());
            return Ok(None);
        }

        let mut reader = csv::Reader::from_path(&self.path).map_err(|err| {
            TrackerError::persistence_caused(
                format!("Failed to read from {}", self.path.display()),
                err,
            )
        })?;

        let Some(row) = reader.deserialize::<HistoryRow>().next() else {
            log::warn!("History at {} has no rows", self.path.display());
            return Ok(None);
        };
        let row = row.map_err(|err| {
            TrackerError::persistence_caused(
                format!("Failed to parse record in {}", self.path.display()),
                err,
            )
        })?;

        let record = row.into_record(&self.path)?;
        log::info!("Loaded previous {record}");
        Ok(Some(record))
    }

    fn save(&self, record: &VariantRecord) -> Result<()> {
        let write_error = |err: csv::Error| {
            TrackerError::persistence_caused(
                format!("Failed to write to {}", self.path.display()),
                err,
            )
        };

        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| {
                TrackerError::persistence_caused(
                    format!("Unable to create {}", parent.display()),
                    err,
                )
            })?;
        }
        let mut writer = csv::Writer::from_path(&self.path).map_err(write_error)?;
        writer
            .serialize(HistoryRow::from(record))
            .map_err(write_error)?;
        writer.flush().map_err(|err| {
            TrackerError::persistence_caused(
                format!("Failed to flush {}", self.path.display()),
                err,
            )
        })?;

        log::info!("Stored {record} in {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::tests::record;

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvHistoryStore::new(dir.path().join("history.csv"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvHistoryStore::new(dir.path().join("history.csv"));
        let saved = record("JN.1", 0.3127, "2024-05-11", "2024-05-14");

        store.save(&saved).unwrap();
        let loaded = store.load().unwrap().unwrap();

        assert_eq!(loaded.variant, "JN.1");
        assert!((loaded.share - 0.3127).abs() < 1e-12);
        assert_eq!(loaded.week_ending, saved.week_ending);
        assert_eq!(loaded.creation_date, saved.creation_date);
        assert_eq!(loaded.jurisdiction, "USA");
    }

    #[test]
    fn save_keeps_exactly_one_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        let store = CsvHistoryStore::new(&path);

        store
            .save(&record("XBB.1.5", 0.5, "2024-05-04", "2024-05-07"))
            .unwrap();
        store
            .save(&record("JN.1", 0.3, "2024-05-11", "2024-05-14"))
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert_eq!(store.load().unwrap().unwrap().variant, "JN.1");
    }

    #[test]
    fn loads_row_zero_of_legacy_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.csv");
        fs::write(
            &path,
            ",usa_or_hhsregion,week_ending,variant,share,creation_date,time_elapsed\n\
             12,USA,2024-05-11,JN.1,0.31,2024-05-14,10 days 00:00:00\n\
             3,USA,2024-05-11,KP.2,0.28,2024-05-14,10 days 00:00:00\n",
        )
        .unwrap();

        let loaded = CsvHistoryStore::new(&path).load().unwrap().unwrap();
        assert_eq!(loaded.variant, "JN.1");
        assert_eq!(loaded.share, 0.31);
        assert_eq!(loaded.week_ending.date().to_string(), "2024-05-11");
    }

    #[test]
    fn variant_and_share_suffice() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("minimal.csv");
        fs::write(&path, "variant,share\nXBB.1.5,0.42\n").unwrap();

        let loaded = CsvHistoryStore::new(&path).load().unwrap().unwrap();
        assert_eq!(loaded.variant, "XBB.1.5");
        assert_eq!(loaded.share, 0.42);
        assert_eq!(loaded.jurisdiction, NATIONAL_SCOPE);
    }

    #[test]
    fn header_only_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        fs::write(&path, "variant,share\n").unwrap();
        assert_eq!(CsvHistoryStore::new(&path).load().unwrap(), None);
    }

    #[test]
    fn malformed_share_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.csv");
        fs::write(&path, "variant,share\nXBB.1.5,lots\n").unwrap();

        let result = CsvHistoryStore::new(&path).load();
        assert!(matches!(result, Err(TrackerError::Persistence { .. })));
    }

    #[test]
    fn save_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("var/lib/variant-tracker/history.csv");
        let store = CsvHistoryStore::new(&path);

        store
            .save(&record("JN.1", 0.3, "2024-05-11", "2024-05-14"))
            .unwrap();
        assert!(path.exists());
        assert_eq!(store.load().unwrap().unwrap().variant, "JN.1");
    }

    #[test]
    fn unwritable_location_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();

        let store = CsvHistoryStore::new(blocker.join("history.csv"));
        let result = store.save(&record("JN.1", 0.3, "2024-05-11", "2024-05-14"));
        assert!(matches!(result, Err(TrackerError::Persistence { .. })));
    }
}
