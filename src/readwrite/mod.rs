//! Persistence of the record observed by the previous run.

mod history;

pub use history::{CsvHistoryStore, HistoryStore};
