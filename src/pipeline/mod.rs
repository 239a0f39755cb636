//! End-to-end landing prediction pipeline
//!
//! Each stage consumes the previous stage's value and returns a new one:
//!
//! ```text
//! LaunchTable -> FeatureSet -> PreparedData -> Vec<TrainedModel> -> PipelineReport
//! ```

mod config;

pub use config::PipelineConfig;

use crate::data::LaunchTable;
use crate::error::Result;
use crate::evaluation::{EvaluationResult, Evaluator};
use crate::preprocessing::{prepare, FeatureBuilder, FeatureSet, PreparedData};
use crate::report::{DatasetInfo, PredictionReport};
use crate::training::{DegradedModelWarning, ModelTrainer, TrainedModel};
use std::time::Instant;
use tracing::info;

/// A trained model together with its held-out evaluation
#[derive(Debug, Clone)]
pub struct ModelOutcome {
    pub trained: TrainedModel,
    pub evaluation: EvaluationResult,
}

/// Result of a full run. `outcomes` follow the configured algorithm order,
/// the report's leaderboard is ranked.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub outcomes: Vec<ModelOutcome>,
    pub report: PredictionReport,
}

impl PipelineReport {
    pub fn leaderboard(&self) -> &[EvaluationResult] {
        &self.report.leaderboard
    }

    pub fn best(&self) -> Option<&EvaluationResult> {
        self.report.best()
    }

    pub fn warnings(&self) -> &[DegradedModelWarning] {
        &self.report.warnings
    }
}

#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn build_features(&self, table: &LaunchTable) -> Result<FeatureSet> {
        FeatureBuilder::new().with_scope(self.config.imputation).build(table)
    }

    pub fn prepare(&self, features: &FeatureSet) -> Result<PreparedData> {
        prepare(features, &self.config.split_config())
    }

    pub fn train(&self, data: &PreparedData) -> Result<Vec<TrainedModel>> {
        ModelTrainer::new(self.config.grids.clone())
            .with_cv_folds(self.config.cv_folds)
            .with_seed(self.config.seed)
            .with_parallel(self.config.parallel)
            .train_all(&self.config.algorithms, &data.x_train, &data.y_train)
    }

    pub fn evaluate(&self, data: &PreparedData, models: Vec<TrainedModel>) -> Result<Vec<ModelOutcome>> {
        let evaluator = Evaluator::new();
        models
            .into_iter()
            .map(|trained| {
                let evaluation = evaluator.evaluate(&trained, &data.x_test, &data.y_test)?;
                Ok(ModelOutcome { trained, evaluation })
            })
            .collect()
    }

    /// Run every stage on a launch table
    pub fn run(&self, table: &LaunchTable) -> Result<PipelineReport> {
        self.config.validate()?;
        let start = Instant::now();

        let features = self.build_features(table)?;
        let data = self.prepare(&features)?;
        let models = self.train(&data)?;
        let outcomes = self.evaluate(&data, models)?;

        let warnings: Vec<DegradedModelWarning> = outcomes
            .iter()
            .filter_map(|o| o.trained.warning.clone())
            .collect();
        let dataset = DatasetInfo {
            total: features.n_samples(),
            n_train: data.n_train(),
            n_test: data.n_test(),
            feature_names: data.feature_names.clone(),
            imputation: self.config.imputation,
        };
        let results = outcomes.iter().map(|o| o.evaluation.clone()).collect();
        let report = PredictionReport::new(dataset, results, warnings);

        if let Some(best) = report.best() {
            info!(
                best = %best.algorithm,
                accuracy = best.accuracy,
                degraded = report.warnings.len(),
                elapsed_secs = start.elapsed().as_secs_f64(),
                "Pipeline complete"
            );
        }

        Ok(PipelineReport { outcomes, report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{GeneratorConfig, SampleGenerator};
    use crate::training::{Algorithm, GridConfig, KnnGrid, TreeGrid};

    fn small_config() -> PipelineConfig {
        let grids = GridConfig {
            decision_tree: TreeGrid {
                max_depth: vec![Some(3), None],
                min_samples_split: vec![2],
                min_samples_leaf: vec![1],
                ..Default::default()
            },
            knn: KnnGrid {
                n_neighbors: vec![3, 5],
                ..Default::default()
            },
            ..Default::default()
        };
        PipelineConfig::default()
            .with_algorithms(vec![Algorithm::DecisionTree, Algorithm::Knn])
            .with_grids(grids)
            .with_cv_folds(3)
    }

    fn table(n: usize) -> LaunchTable {
        let records = SampleGenerator::new(GeneratorConfig::default().with_samples(n)).generate().unwrap();
        LaunchTable::from_records(&records).unwrap()
    }

    #[test]
    fn test_run_produces_ranked_report() {
        let report = Pipeline::new(small_config()).run(&table(80)).unwrap();

        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.outcomes[0].trained.algorithm, Algorithm::DecisionTree);
        assert_eq!(report.outcomes[1].trained.algorithm, Algorithm::Knn);
        assert_eq!(report.report.dataset.total, 80);
        assert_eq!(report.report.dataset.n_train + report.report.dataset.n_test, 80);

        let lb = report.leaderboard();
        assert!(lb.windows(2).all(|w| w[0].accuracy >= w[1].accuracy));
    }

    #[test]
    fn test_empty_table_is_insufficient_data() {
        let err = Pipeline::new(small_config()).run(&LaunchTable::empty()).unwrap_err();
        assert!(matches!(err, crate::error::LandingError::InsufficientData(_)));
    }

    #[test]
    fn test_invalid_config_rejected_before_work() {
        let config = small_config().with_test_size(1.5);
        let err = Pipeline::new(config).run(&table(20)).unwrap_err();
        assert!(matches!(err, crate::error::LandingError::InvalidParameter { .. }));
    }
}
