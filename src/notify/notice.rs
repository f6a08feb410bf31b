//! Rendering of outcomes into operator facing messages.

use chrono::{Months, NaiveDate};

use crate::config::ReportSettings;
use crate::core::Outcome;
use crate::core::record::format_percent;

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub title: String,
    pub subtitle: String,
    pub body: String,
    /// Name of the dated log file inside the output directory.
    pub file_name: String,
    /// Short status line for the terminal.
    pub console: String,
}

impl Notice {
    pub fn render(outcome: &Outcome, run_date: NaiveDate, report: &ReportSettings) -> Self {
        let title = format!("SARS-CoV-2 variant update, {run_date}");
        let update_file = format!("{run_date}_variant_update.txt");

        match outcome {
            Outcome::NewVariant {
                old,
                new,
                new_share,
                features,
            } => Self {
                title,
                subtitle: "New predominant US variant".to_string(),
                body: format!(
                    "There is a new predominant SARS-CoV-2 variant in the US.\n\
                     Old variant: {old}. New variant: {new} ({}).\n\
                     Genetic features of new variant from WHO: {features}.\n\
                     For more info, see: {}",
                    format_percent(*new_share),
                    reference_link(new, run_date, report)
                ),
                file_name: update_file,
                console: format!("There is a new predominant variant. Old= {old}, New= {new}"),
            },
            Outcome::NoChange { variant, share } => Self {
                title,
                subtitle: "No new predominant US variant".to_string(),
                body: format!(
                    "No change to predominant variant ({variant}, {})",
                    format_percent(*share)
                ),
                file_name: update_file,
                console: "No new variant".to_string(),
            },
            Outcome::FirstRun { variant, share } => Self {
                title,
                subtitle: "First observation of US variant".to_string(),
                body: format!(
                    "First recorded predominant variant ({variant}, {}). \
                     Later runs compare against it.",
                    format_percent(*share)
                ),
                file_name: update_file,
                console: format!("First observation: {variant}"),
            },
            Outcome::Error { detail } => {
                let file_name = format!("{run_date}_error_log.txt");
                Self {
                    title,
                    subtitle: "Error encountered with variant calling tool".to_string(),
                    body: detail.clone(),
                    console: format!("Error encountered, see {file_name}"),
                    file_name,
                }
            }
        }
    }
}

/// Situation report covering the configured window up to the run date.
pub fn reference_link(variant: &str, run_date: NaiveDate, report: &ReportSettings) -> String {
    let start = run_date
        .checked_sub_months(Months::new(report.window_months))
        .unwrap_or(run_date);
    format!(
        "{}?xmin={start}&xmax={run_date}&pango={variant}",
        report.link_base
    )
}
