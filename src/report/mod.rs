//! Plain-text reports
//!
//! [`DatasetSummary`] describes a launch table, [`PredictionReport`]
//! compares the evaluated classifiers.

mod prediction;
mod summary;

pub use prediction::{DatasetInfo, PredictionReport};
pub use summary::{DatasetSummary, FeatureImpact, GroupStats, PayloadStats};
