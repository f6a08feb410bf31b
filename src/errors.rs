//! All errors that can occur while tracking variants.

use thiserror::Error;

pub type Source = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum TrackerError {
    /// The statistics source is unreachable or yielded no eligible rows.
    #[error("DataUnavailable: {message}")]
    DataUnavailable {
        message: String,
        #[source]
        source: Option<Source>,
    },

    /// The reference website could not be read. Absorbed by the feature lookup.
    #[error("ReferenceLookup: {message}")]
    ReferenceLookup {
        message: String,
        #[source]
        source: Option<Source>,
    },

    /// The history file could not be read or written.
    #[error("Persistence: {message}")]
    Persistence {
        message: String,
        #[source]
        source: Option<Source>,
    },

    /// One of the notification sinks failed.
    #[error("NotificationDelivery: {message}")]
    NotificationDelivery {
        message: String,
        #[source]
        source: Option<Source>,
    },

    #[error("Settings: {message}")]
    Settings {
        message: String,
        #[source]
        source: Option<Source>,
    },
}

pub type Result<T> = std::result::Result<T, TrackerError>;

macro_rules! constructors {
    ($(($plain:ident, $caused:ident, $variant:ident)),* $(,)?) => {
        impl TrackerError {
            $(
                pub fn $plain(message: impl Into<String>) -> Self {
                    TrackerError::$variant {
                        message: message.into(),
                        source: None,
                    }
                }

                pub fn $caused<E>(message: impl Into<String>, source: E) -> Self
                where
                    E: std::error::Error + Send + Sync + 'static,
                {
                    TrackerError::$variant {
                        message: message.into(),
                        source: Some(Box::new(source)),
                    }
                }
            )*
        }
    };
}

constructors!(
    (data_unavailable, data_unavailable_caused, DataUnavailable),
    (reference_lookup, reference_lookup_caused, ReferenceLookup),
    (persistence, persistence_caused, Persistence),
    (notification_delivery, notification_delivery_caused, NotificationDelivery),
    (settings, settings_caused, Settings),
);

impl TrackerError {
    /// Only missing data and broken persistence abort a run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TrackerError::DataUnavailable { .. } | TrackerError::Persistence { .. }
        )
    }
}
