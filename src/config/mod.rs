//! Configuration data structures for a tracking run.

mod settings;

pub use settings::{
    DEFAULT_HISTORY_PATH, DEFAULT_OUTPUT_DIR, NATIONAL_SCOPE, ReferenceSettings, ReportSettings,
    Settings, SettingsError, SourceSettings,
};
