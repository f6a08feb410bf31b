//! Delivery of run outcomes to the operator.

mod notice;
mod sink;

pub use notice::{Notice, reference_link};
pub use sink::{Delivery, DesktopNotifier, LogFileWriter, NotificationSink, SystemNotifier};

#[cfg(test)]
pub(crate) use sink::tests::RecordingNotifier;
