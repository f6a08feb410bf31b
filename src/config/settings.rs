//! Settings module.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_HISTORY_PATH: &str = "/var/lib/variant-tracker/COVID_variant_tracker.csv";
pub const DEFAULT_OUTPUT_DIR: &str = "./SARS-CoV-2_variant_updates";
pub const NATIONAL_SCOPE: &str = "USA";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Single-row csv holding the record observed by the previous run.
    pub history_path: PathBuf,
    /// Directory receiving the dated update and error logs.
    pub output_dir: PathBuf,
    /// Only rows in this jurisdiction are eligible.
    pub jurisdiction: String,
    pub source: SourceSettings,
    pub reference: ReferenceSettings,
    pub report: ReportSettings,
}

/// Statistics service (Socrata open data api).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SourceSettings {
    pub base_url: String,
    pub dataset: String,
    pub limit: usize,
    pub timeout_secs: u64,
}

/// Website with the VOI and VUM classification tables.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ReferenceSettings {
    pub url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

/// Link embedded in new variant reports.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ReportSettings {
    pub link_base: String,
    pub window_months: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            history_path: PathBuf::from(DEFAULT_HISTORY_PATH),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            jurisdiction: NATIONAL_SCOPE.to_string(),
            source: SourceSettings::default(),
            reference: ReferenceSettings::default(),
            report: ReportSettings::default(),
        }
    }
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            base_url: "https://data.cdc.gov/resource".to_string(),
            dataset: "jr58-6ysp".to_string(),
            limit: 100,
            timeout_secs: 30,
        }
    }
}

impl Default for ReferenceSettings {
    fn default() -> Self {
        Self {
            url: "https://www.who.int/activities/tracking-SARS-CoV-2-variants".to_string(),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/50.0.2661.75 Safari/537.36"
                .to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            link_base: "https://outbreak.info/situation-reports".to_string(),
            window_months: 6,
        }
    }
}

impl SourceSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ReferenceSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug)]
pub enum SettingsError {
    IoError(std::io::Error),
    YamlError(serde_yaml::Error),
}

impl std::error::Error for SettingsError {}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::IoError(error) => write!(formatter, "IO error: {}", error),
            SettingsError::YamlError(error) => write!(formatter, "YAML error: {}", error),
        }
    }
}

impl std::fmt::Display for Settings {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let output = serde_yaml::to_string(self).map_err(|_| std::fmt::Error)?;
        write!(formatter, "{}", output)
    }
}

impl Settings {
    pub fn write(&self, writer: &mut dyn std::io::Write) -> Result<(), SettingsError> {
        serde_yaml::to_writer(writer, self).map_err(SettingsError::YamlError)
    }

    pub fn read(reader: &mut dyn std::io::Read) -> Result<Settings, SettingsError> {
        serde_yaml::from_reader(reader).map_err(SettingsError::YamlError)
    }

    pub fn read_from_file(filename: &str) -> Result<Settings, SettingsError> {
        let file = fs::File::open(filename).map_err(SettingsError::IoError)?;
        let mut reader = std::io::BufReader::new(file);
        Self::read(&mut reader)
    }
}
