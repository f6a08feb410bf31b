use chrono::NaiveDateTime;
use reqwest::blocking::Client;

use crate::config::SourceSettings;
use crate::core::record::format_timestamp;
use crate::core::{SourceRow, VariantSource};
use crate::errors::{Result, TrackerError};

/// Variant proportions served by a Socrata open data endpoint.
#[derive(Debug)]
pub struct SocrataSource {
    client: Client,
    endpoint: String,
    limit: usize,
}

impl SocrataSource {
    pub fn new(settings: &SourceSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .gzip(true)
            .build()
            .map_err(|err| {
                TrackerError::data_unavailable_caused("Unable to build statistics client", err)
            })?;
        Ok(Self {
            client,
            endpoint: endpoint(settings),
            limit: settings.limit,
        })
    }

    /// Query string for rows whose week ends after `since`.
    pub fn query(&self, since: NaiveDateTime) -> Vec<(&'static str, String)> {
        vec![
            ("$limit", self.limit.to_string()),
            (
                "$where",
                format!("week_ending > \"{}\"", format_timestamp(&since)),
            ),
        ]
    }
}

fn endpoint(settings: &SourceSettings) -> String {
    format!(
        "{}/{}.json",
        settings.base_url.trim_end_matches('/'),
        settings.dataset
    )
}

impl VariantSource for SocrataSource {
    fn fetch_rows(&self, since: NaiveDateTime) -> Result<Vec<SourceRow>> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&self.query(since))
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|err| {
                TrackerError::data_unavailable_caused(
                    format!("Request to {} failed", self.endpoint),
                    err,
                )
            })?;

        response.json::<Vec<SourceRow>>().map_err(|err| {
            TrackerError::data_unavailable_caused(
                format!("Unexpected payload from {}", self.endpoint),
                err,
            )
        })
    }
}
