//! Reduces the raw variant proportion feed to the current predominant record.

use chrono::{Months, NaiveDateTime};
use serde::Deserialize;

use super::record::{VariantRecord, parse_timestamp};
use crate::errors::{Result, TrackerError};

/// A row as delivered by the statistics service; every field is a string.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SourceRow {
    pub variant: String,
    pub share: String,
    pub week_ending: String,
    pub creation_date: String,
    pub usa_or_hhsregion: String,
}

/// Supplier of variant proportion rows with `week_ending` after `since`.
pub trait VariantSource {
    fn fetch_rows(&self, since: NaiveDateTime) -> Result<Vec<SourceRow>>;
}

pub struct DatasetReducer {
    source: Box<dyn VariantSource>,
    jurisdiction: String,
}

impl DatasetReducer {
    pub fn new(source: Box<dyn VariantSource>, jurisdiction: impl Into<String>) -> Self {
        Self {
            source,
            jurisdiction: jurisdiction.into(),
        }
    }

    /// Fetches the last month of rows and selects the current record.
    pub fn fetch_current(&self, reference_time: NaiveDateTime) -> Result<VariantRecord> {
        let since = window_start(reference_time)?;
        log::info!("Requesting variant proportions with week_ending > {since}");
        let rows = self.source.fetch_rows(since)?;
        log::debug!("Received {} rows", rows.len());
        reduce(&rows, &self.jurisdiction, reference_time)
    }
}

/// Start of the one month window ending at `reference_time`.
///
/// The day of month is clamped when the previous month is shorter.
pub fn window_start(reference_time: NaiveDateTime) -> Result<NaiveDateTime> {
    reference_time
        .checked_sub_months(Months::new(1))
        .ok_or_else(|| {
            TrackerError::data_unavailable(format!(
                "Cannot compute one month window before {reference_time}"
            ))
        })
}

/// Parses a feed row. Rows that do not parse are reported and skipped.
pub fn normalize(row: &SourceRow) -> Option<VariantRecord> {
    let share = match row.share.trim().parse::<f64>() {
        Ok(share) => share,
        Err(_) => {
            log::warn!("Skipping {}: invalid share {:?}", row.variant, row.share);
            return None;
        }
    };
    let Some(week_ending) = parse_timestamp(&row.week_ending) else {
        log::warn!("Skipping {}: invalid week_ending {:?}", row.variant, row.week_ending);
        return None;
    };
    let Some(creation_date) = parse_timestamp(&row.creation_date) else {
        log::warn!("Skipping {}: invalid creation_date {:?}", row.variant, row.creation_date);
        return None;
    };
    Some(VariantRecord::new(
        row.variant.trim(),
        share,
        week_ending,
        creation_date,
        row.usa_or_hhsregion.trim(),
    ))
}

/// Selects the eligible record with the smallest time elapsed, ties broken by
/// latest creation date and then by largest share.
pub fn reduce(
    rows: &[SourceRow],
    jurisdiction: &str,
    reference_time: NaiveDateTime,
) -> Result<VariantRecord> {
    rows.iter()
        .filter_map(normalize)
        .filter(|record| record.jurisdiction == jurisdiction)
        .filter(|record| {
            let valid = record.has_valid_share();
            if !valid {
                log::warn!("Dropping {record}: share outside [0, 1]");
            }
            valid
        })
        .filter(|record| {
            let past = record.time_elapsed(reference_time) >= chrono::TimeDelta::zero();
            if !past {
                log::warn!("Dropping {record}: week ends after {reference_time}");
            }
            past
        })
        .min_by(|a, b| a.currency_order(b))
        .ok_or_else(|| {
            TrackerError::data_unavailable(format!(
                "No eligible {jurisdiction} rows among {} received",
                rows.len()
            ))
        })
}
