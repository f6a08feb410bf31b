//! Implementations of the external data providers
mod reference;
mod socrata;

pub use reference::{
    FeatureLookup, FeatureTable, NO_FEATURES, ReferencePage, WhoFeatureLookup, WhoPage,
    features_from_html, parse_tables,
};
pub use socrata::SocrataSource;
