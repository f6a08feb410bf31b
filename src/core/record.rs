//! Normalized variant share observations.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use std::cmp::Ordering;
use std::fmt;

const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// One variant's share as of one observation window.
#[derive(Clone, Debug, PartialEq)]
pub struct VariantRecord {
    pub variant: String,
    /// Fraction of sequenced cases in [0, 1].
    pub share: f64,
    pub week_ending: NaiveDateTime,
    pub creation_date: NaiveDateTime,
    pub jurisdiction: String,
}

impl VariantRecord {
    pub fn new(
        variant: impl Into<String>,
        share: f64,
        week_ending: NaiveDateTime,
        creation_date: NaiveDateTime,
        jurisdiction: impl Into<String>,
    ) -> Self {
        Self {
            variant: variant.into(),
            share,
            week_ending,
            creation_date,
            jurisdiction: jurisdiction.into(),
        }
    }

    /// Age of the observation window at `reference_time`; smaller is fresher.
    pub fn time_elapsed(&self, reference_time: NaiveDateTime) -> TimeDelta {
        reference_time - self.week_ending
    }

    pub fn has_valid_share(&self) -> bool {
        (0.0..=1.0).contains(&self.share)
    }

    /// Freshest first, then latest publication, then largest share.
    ///
    /// Comparing `week_ending` in reverse is equivalent to comparing
    /// `time_elapsed` for any fixed reference time.
    pub fn currency_order(&self, other: &Self) -> Ordering {
        other
            .week_ending
            .cmp(&self.week_ending)
            .then_with(|| other.creation_date.cmp(&self.creation_date))
            .then_with(|| other.share.total_cmp(&self.share))
    }

    pub fn share_percent(&self) -> String {
        format_percent(self.share)
    }
}

impl fmt::Display for VariantRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "VariantRecord(variant={},share={},week_ending={},jurisdiction={})",
            self.variant,
            self.share_percent(),
            self.week_ending.date(),
            self.jurisdiction
        )
    }
}

/// Renders a fraction as a percentage with two decimals, e.g. `0.42` as `42.00%`.
pub fn format_percent(share: f64) -> String {
    format!("{:.2}%", share * 100.0)
}

/// Parses the timestamp shapes found in the statistics feed and in history files.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, DATE_FORMAT)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Inverse of [`parse_timestamp`] for the iso shape.
pub fn format_timestamp(value: &NaiveDateTime) -> String {
    value.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
}
