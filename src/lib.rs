//! Tracks the predominant SARS-CoV-2 variant in the USA and reports changes.

pub mod args;
pub mod config;
pub mod core;
pub mod errors;
pub mod notify;
pub mod providers;
pub mod readwrite;
pub mod runner;
