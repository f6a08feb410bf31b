//! This module contains the decision core: records, reduction and comparison.

pub mod comparator;
pub mod outcome;
pub mod record;
pub mod reducer;

pub use comparator::VariantComparator;
pub use outcome::Outcome;
pub use record::VariantRecord;
pub use reducer::{DatasetReducer, SourceRow, VariantSource};
