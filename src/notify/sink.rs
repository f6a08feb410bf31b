use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

use super::notice::Notice;
use crate::config::{ReportSettings, Settings};
use crate::core::Outcome;
use crate::errors::{Result, TrackerError};

/// Shows a notice on the operator's desktop.
pub trait DesktopNotifier {
    fn show(&self, notice: &Notice) -> Result<()>;
}

/// Native notification through the platform notification service.
#[derive(Debug, Default)]
pub struct SystemNotifier;

impl DesktopNotifier for SystemNotifier {
    fn show(&self, notice: &Notice) -> Result<()> {
        notify_rust::Notification::new()
            .appname("variant-tracker")
            .summary(&notice.title)
            .subtitle(&notice.subtitle)
            .body(&notice.body)
            .show()
            .map(|_| ())
            .map_err(|err| {
                TrackerError::notification_delivery(format!("Desktop notification failed: {err}"))
            })
    }
}

/// Writes each notice to a dated text file.
#[derive(Debug, Clone)]
pub struct LogFileWriter {
    dir: PathBuf,
}

impl LogFileWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Replaces any file of the same date and kind.
    pub fn write(&self, notice: &Notice) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|err| {
            TrackerError::notification_delivery_caused(
                format!("Unable to create {}", self.dir.display()),
                err,
            )
        })?;
        let path = self.dir.join(&notice.file_name);
        fs::write(&path, &notice.body).map_err(|err| {
            TrackerError::notification_delivery_caused(
                format!("Unable to write {}", path.display()),
                err,
            )
        })?;
        Ok(path)
    }
}

/// Result of each delivery channel; one failing never prevents the other.
#[derive(Debug)]
pub struct Delivery {
    pub desktop: Result<()>,
    pub log_file: Result<PathBuf>,
}

impl Delivery {
    pub fn is_complete(&self) -> bool {
        self.desktop.is_ok() && self.log_file.is_ok()
    }
}

pub struct NotificationSink {
    desktop: Box<dyn DesktopNotifier>,
    log_files: LogFileWriter,
    report: ReportSettings,
}

impl NotificationSink {
    pub fn new(
        desktop: Box<dyn DesktopNotifier>,
        log_files: LogFileWriter,
        report: ReportSettings,
    ) -> Self {
        Self {
            desktop,
            log_files,
            report,
        }
    }

    /// Native desktop notifications plus log files in the configured directory.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            Box::new(SystemNotifier),
            LogFileWriter::new(&settings.output_dir),
            settings.report.clone(),
        )
    }

    /// Prints the status line, then delivers to the desktop and the log file.
    pub fn notify(&self, outcome: &Outcome, run_date: NaiveDate) -> Delivery {
        let notice = Notice::render(outcome, run_date, &self.report);
        println!("{}", notice.console);

        let desktop = self.desktop.show(&notice);
        if let Err(err) = &desktop {
            log::warn!("{err}");
        }

        let log_file = self.log_files.write(&notice);
        match &log_file {
            Ok(path) => log::info!("Wrote {}", path.display()),
            Err(err) => log::warn!("{err}"),
        }

        Delivery { desktop, log_file }
    }
}
