//! Pipeline configuration

use crate::data::{CollectorConfig, GeneratorConfig};
use crate::error::{LandingError, Result};
use crate::preprocessing::{ImputationScope, SplitConfig};
use crate::training::{Algorithm, GridConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for a full pipeline run. Every field has a default, so a
/// JSON file only needs the keys it overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Held-out fraction, in (0, 1)
    pub test_size: f64,
    /// Seed for the split, fold assignment and SMO partner selection
    pub seed: u64,
    pub cv_folds: usize,
    pub imputation: ImputationScope,
    /// Algorithms to train, in report order
    pub algorithms: Vec<Algorithm>,
    /// Evaluate grid combinations on the rayon pool
    pub parallel: bool,
    pub grids: GridConfig,
    pub generator: GeneratorConfig,
    pub collector: CollectorConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
            cv_folds: 5,
            imputation: ImputationScope::default(),
            algorithms: Algorithm::ALL.to_vec(),
            parallel: true,
            grids: GridConfig::default(),
            generator: GeneratorConfig::default(),
            collector: CollectorConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and validate a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_cv_folds(mut self, cv_folds: usize) -> Self {
        self.cv_folds = cv_folds;
        self
    }

    pub fn with_imputation(mut self, scope: ImputationScope) -> Self {
        self.imputation = scope;
        self
    }

    pub fn with_algorithms(mut self, algorithms: Vec<Algorithm>) -> Self {
        self.algorithms = algorithms;
        self
    }

    pub fn with_grids(mut self, grids: GridConfig) -> Self {
        self.grids = grids;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn split_config(&self) -> SplitConfig {
        SplitConfig::default()
            .with_test_size(self.test_size)
            .with_seed(self.seed)
    }

    pub fn validate(&self) -> Result<()> {
        self.split_config().validate()?;
        if self.cv_folds < 2 {
            return Err(LandingError::InvalidParameter {
                name: "cv_folds".to_string(),
                value: self.cv_folds.to_string(),
                reason: "need at least 2 folds".to_string(),
            });
        }
        if self.algorithms.is_empty() {
            return Err(LandingError::InvalidParameter {
                name: "algorithms".to_string(),
                value: "[]".to_string(),
                reason: "select at least one algorithm".to_string(),
            });
        }
        for algorithm in &self.algorithms {
            self.grids.candidates(*algorithm, self.seed)?;
        }
        Ok(())
    }
}
