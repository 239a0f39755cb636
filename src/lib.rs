//! Falcon 9 first-stage landing prediction
//!
//! Launch records are generated or collected, summarized, and fed through a
//! typed classification pipeline:
//!
//! ```text
//! LaunchTable -> FeatureSet -> PreparedData -> Vec<TrainedModel> -> PipelineReport
//! ```
//!
//! # Modules
//!
//! - [`data`] - Launch records, CSV loading, synthetic generation, API collection
//! - [`preprocessing`] - Feature extraction, imputation, stratified split, scaling
//! - [`training`] - Classifiers and cross-validated grid search
//! - [`evaluation`] - Held-out metrics and ranking
//! - [`report`] - Plain-text dataset and prediction reports
//! - [`pipeline`] - End-to-end orchestration and configuration
//! - [`cli`] - Command-line interface

pub mod error;

pub mod data;
pub mod preprocessing;
pub mod training;
pub mod evaluation;

pub mod report;
pub mod pipeline;
pub mod cli;

pub use error::{LandingError, Result};

/// Prelude for common imports
pub mod prelude {
    pub use crate::data::{DatasetLoader, GeneratorConfig, LaunchCollector, LaunchRecord, LaunchTable, SampleGenerator};
    pub use crate::error::{LandingError, Result};
    pub use crate::evaluation::{ConfusionMatrix, EvaluationResult, Evaluator};
    pub use crate::pipeline::{ModelOutcome, Pipeline, PipelineConfig, PipelineReport};
    pub use crate::preprocessing::{FeatureBuilder, FeatureSet, ImputationScope, PreparedData, SplitConfig};
    pub use crate::report::{DatasetSummary, PredictionReport};
    pub use crate::training::{Algorithm, GridConfig, ModelTrainer, TrainedModel};
}
