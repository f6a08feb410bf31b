use chrono::NaiveDateTime;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::args::Args;
use crate::config::Settings;
use crate::core::{DatasetReducer, Outcome, VariantComparator};
use crate::errors::{Result, TrackerError};
use crate::notify::{Delivery, NotificationSink};
use crate::providers::{FeatureLookup, SocrataSource, WhoFeatureLookup};
use crate::readwrite::{CsvHistoryStore, HistoryStore};

/// One tracking run: fetch, compare, persist and report.
pub struct Runner {
    reducer: DatasetReducer,
    history: Box<dyn HistoryStore>,
    features: Box<dyn FeatureLookup>,
    sink: NotificationSink,
}

impl Runner {
    pub fn new(
        reducer: DatasetReducer,
        history: Box<dyn HistoryStore>,
        features: Box<dyn FeatureLookup>,
        sink: NotificationSink,
    ) -> Self {
        Self {
            reducer,
            history,
            features,
            sink,
        }
    }

    /// Wires the production collaborators described by `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let source = SocrataSource::new(&settings.source)?;
        let features = WhoFeatureLookup::new(&settings.reference)?;
        Ok(Self::new(
            DatasetReducer::new(Box::new(source), settings.jurisdiction.clone()),
            Box::new(CsvHistoryStore::new(&settings.history_path)),
            Box::new(features),
            NotificationSink::from_settings(settings),
        ))
    }

    /// Setup logging level and file
    pub fn setup_logger(args: &Args) {
        let log_level = match args.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };
        match &args.log_file {
            Some(log_file) => {
                simple_logging::log_to_file(log_file.as_str(), log_level).unwrap_or_else(|_| {
                    eprintln!("Unable to open log file.");
                    std::process::exit(1);
                })
            }
            None => simple_logging::log_to_stderr(log_level),
        }
    }

    /// Load settings from file and apply command line overrides
    pub fn load_settings(args: &Args) -> Result<Settings> {
        let mut settings = match &args.settings {
            Some(path) => Settings::read_from_file(path).map_err(|err| {
                TrackerError::settings_caused(format!("Unable to load {path}"), err)
            })?,
            None => Settings::default(),
        };
        if let Some(history) = &args.history {
            settings.history_path = history.clone();
        }
        if let Some(outdir) = &args.outdir {
            settings.output_dir = outdir.clone();
        }
        log::debug!("Effective settings\n{}", settings);
        Ok(settings)
    }

    /// Runs the pipeline and delivers its outcome.
    pub fn start(&self, reference_time: NaiveDateTime) -> Outcome {
        let outcome = self.run(reference_time);
        self.report(&outcome, reference_time);
        outcome
    }

    pub fn report(&self, outcome: &Outcome, reference_time: NaiveDateTime) -> Delivery {
        log::info!("Reporting {outcome}");
        let delivery = self.sink.notify(outcome, reference_time.date());
        if !delivery.is_complete() {
            log::warn!("{outcome} did not reach every notification channel");
        }
        delivery
    }

    /// Runs the pipeline, turning any error or panic into [`Outcome::Error`].
    pub fn run(&self, reference_time: NaiveDateTime) -> Outcome {
        match catch_unwind(AssertUnwindSafe(|| self.track(reference_time))) {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(err)) => {
                if err.is_fatal() {
                    log::error!("Run aborted: {err}");
                } else {
                    log::warn!("Run stopped by unexpected {err}");
                }
                error_outcome(err)
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::error!("Run panicked: {message}");
                Outcome::Error {
                    detail: format!("panic: {message}"),
                }
            }
        }
    }

    /// Loads the previous record, selects the current one, stores it and
    /// compares the two.
    ///
    /// The history is overwritten on every successful fetch, also when the
    /// variant did not change.
    pub fn track(&self, reference_time: NaiveDateTime) -> Result<Outcome> {
        let previous = self.history.load()?;
        let current = self.reducer.fetch_current(reference_time)?;
        log::info!("Current {current}");
        self.history.save(&current)?;

        let comparator = VariantComparator::new(self.features.as_ref());
        Ok(comparator.compare(previous.as_ref(), &current))
    }
}

/// Error outcome carrying the error and its full chain of causes.
pub fn error_outcome(err: TrackerError) -> Outcome {
    Outcome::Error {
        detail: format!("{:?}", anyhow::Error::new(err)),
    }
}

/// Reports an error that occurred before a [`Runner`] existed.
pub fn report_setup_failure(
    sink: &NotificationSink,
    err: TrackerError,
    reference_time: NaiveDateTime,
) -> Outcome {
    log::error!("Unable to set up run: {err}");
    let outcome = error_outcome(err);
    sink.notify(&outcome, reference_time.date());
    outcome
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
