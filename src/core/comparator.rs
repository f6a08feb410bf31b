//! Decides whether the predominant variant changed since the last run.

use super::outcome::Outcome;
use super::record::VariantRecord;
use crate::providers::FeatureLookup;

pub struct VariantComparator<'a> {
    features: &'a dyn FeatureLookup,
}

impl<'a> VariantComparator<'a> {
    pub fn new(features: &'a dyn FeatureLookup) -> Self {
        Self { features }
    }

    /// Classifies `current` against the record stored by the previous run.
    ///
    /// The feature lookup is only consulted when the variant changed.
    pub fn compare(&self, previous: Option<&VariantRecord>, current: &VariantRecord) -> Outcome {
        let Some(previous) = previous else {
            log::info!("No previous record, first observation is {current}");
            return Outcome::FirstRun {
                variant: current.variant.clone(),
                share: current.share,
            };
        };

        if previous.variant != current.variant {
            log::info!(
                "Predominant variant changed from {} to {}",
                previous.variant,
                current.variant
            );
            Outcome::NewVariant {
                old: previous.variant.clone(),
                new: current.variant.clone(),
                new_share: current.share,
                features: self.features.lookup(&current.variant),
            }
        } else {
            log::info!("Predominant variant unchanged: {current}");
            Outcome::NoChange {
                variant: current.variant.clone(),
                share: current.share,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::tests::record;
    use crate::providers::NO_FEATURES;
    use std::cell::RefCell;

    #[derive(Default)]
    struct CountingLookup {
        calls: RefCell<Vec<String>>,
    }

    impl FeatureLookup for CountingLookup {
        fn lookup(&self, variant: &str) -> String {
            self.calls.borrow_mut().push(variant.to_string());
            match variant {
                "JN.1" => "BA.2.86 + S:L455S".to_string(),
                _ => NO_FEATURES.to_string(),
            }
        }
    }

    #[test]
    fn same_variant_is_no_change() {
        let lookup = CountingLookup::default();
        let comparator = VariantComparator::new(&lookup);
        let previous = record("XBB.1.5", 0.55, "2024-05-04", "2024-05-07");
        let current = record("XBB.1.5", 0.42, "2024-05-11", "2024-05-14");

        let outcome = comparator.compare(Some(&previous), &current);
        assert_eq!(
            outcome,
            Outcome::NoChange {
                variant: "XBB.1.5".to_string(),
                share: 0.42
            }
        );
        assert!(lookup.calls.borrow().is_empty());
    }

    #[test]
    fn different_variant_is_new_variant_with_features() {
        let lookup = CountingLookup::default();
        let comparator = VariantComparator::new(&lookup);
        let previous = record("XBB.1.5", 0.55, "2024-05-04", "2024-05-07");
        let current = record("JN.1", 0.31, "2024-05-11", "2024-05-14");

        let outcome = comparator.compare(Some(&previous), &current);
        assert_eq!(
            outcome,
            Outcome::NewVariant {
                old: "XBB.1.5".to_string(),
                new: "JN.1".to_string(),
                new_share: 0.31,
                features: "BA.2.86 + S:L455S".to_string(),
            }
        );
        assert_eq!(*lookup.calls.borrow(), vec!["JN.1".to_string()]);
    }

    #[test]
    fn unknown_variant_carries_sentinel() {
        let lookup = CountingLookup::default();
        let comparator = VariantComparator::new(&lookup);
        let previous = record("JN.1", 0.55, "2024-05-04", "2024-05-07");
        let current = record("KP.2", 0.31, "2024-05-11", "2024-05-14");

        match comparator.compare(Some(&previous), &current) {
            Outcome::NewVariant { features, .. } => assert_eq!(features, NO_FEATURES),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn missing_history_is_first_run() {
        let lookup = CountingLookup::default();
        let comparator = VariantComparator::new(&lookup);
        let current = record("JN.1", 0.31, "2024-05-11", "2024-05-14");

        assert_eq!(
            comparator.compare(None, &current),
            Outcome::FirstRun {
                variant: "JN.1".to_string(),
                share: 0.31
            }
        );
        assert!(lookup.calls.borrow().is_empty());
    }

    #[test]
    fn variant_match_is_case_sensitive() {
        let lookup = CountingLookup::default();
        let comparator = VariantComparator::new(&lookup);
        let previous = record("jn.1", 0.55, "2024-05-04", "2024-05-07");
        let current = record("JN.1", 0.31, "2024-05-11", "2024-05-14");

        assert!(matches!(
            comparator.compare(Some(&previous), &current),
            Outcome::NewVariant { .. }
        ));
    }
}
