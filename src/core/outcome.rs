//! Result of one tracking run.

use std::fmt;

use super::record::format_percent;

/// What a run found, in the shape the notification sink renders.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// No history existed, so there was nothing to compare against.
    FirstRun { variant: String, share: f64 },

    NewVariant {
        old: String,
        new: String,
        new_share: f64,
        features: String,
    },

    NoChange { variant: String, share: f64 },

    /// Full diagnostic trace of whatever stopped the run.
    Error { detail: String },
}

impl Outcome {
    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::Error { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::FirstRun { variant, share } => {
                write!(f, "FirstRun(variant={variant},share={})", format_percent(*share))
            }
            Outcome::NewVariant {
                old,
                new,
                new_share,
                ..
            } => write!(
                f,
                "NewVariant(old={old},new={new},share={})",
                format_percent(*new_share)
            ),
            Outcome::NoChange { variant, share } => {
                write!(f, "NoChange(variant={variant},share={})", format_percent(*share))
            }
            Outcome::Error { .. } => write!(f, "Error"),
        }
    }
}
