//! Grid search with cross-validation

use super::{Algorithm, CVResults, CVSplit, Classifier, CrossValidator, DegradedModelWarning, GridConfig, ModelParams};
use crate::error::Result;
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

/// The selected configuration of one algorithm, refit on all training rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    pub algorithm: Algorithm,
    pub params: ModelParams,
    pub model: Classifier,
    /// Cross-validation summary of the selected configuration
    pub cv: CVResults,
    pub candidates_evaluated: usize,
    pub training_time_secs: f64,
    pub warning: Option<DegradedModelWarning>,
}

impl TrainedModel {
    pub fn is_degraded(&self) -> bool {
        self.warning.is_some()
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.model.predict(x)
    }
}

/// Runs per-algorithm grid searches
#[derive(Debug, Clone)]
pub struct ModelTrainer {
    grids: GridConfig,
    cv_folds: usize,
    seed: u64,
    parallel: bool,
}

impl Default for ModelTrainer {
    fn default() -> Self {
        Self::new(GridConfig::default())
    }
}

impl ModelTrainer {
    pub fn new(grids: GridConfig) -> Self {
        Self {
            grids,
            cv_folds: 5,
            seed: 42,
            parallel: true,
        }
    }

    pub fn with_cv_folds(mut self, cv_folds: usize) -> Self {
        self.cv_folds = cv_folds;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Evaluate grid combinations on the rayon pool
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Train every algorithm in the given order
    pub fn train_all(&self, algorithms: &[Algorithm], x: &Array2<f64>, y: &Array1<f64>) -> Result<Vec<TrainedModel>> {
        algorithms.iter().map(|&a| self.train(a, x, y)).collect()
    }

    /// Grid search one algorithm and refit the winner
    pub fn train(&self, algorithm: Algorithm, x: &Array2<f64>, y: &Array1<f64>) -> Result<TrainedModel> {
        let start = Instant::now();
        let candidates = self.grids.candidates(algorithm, self.seed)?;
        let splits = CrossValidator::new(self.cv_folds)
            .with_random_state(self.seed)
            .split(y)?;

        // collected in enumeration order regardless of completion order
        let results: Vec<CVResults> = if self.parallel {
            candidates
                .par_iter()
                .map(|params| cross_validate(params, x, y, &splits))
                .collect::<Result<Vec<_>>>()?
        } else {
            candidates
                .iter()
                .map(|params| cross_validate(params, x, y, &splits))
                .collect::<Result<Vec<_>>>()?
        };

        let best_idx = select_best(&results);
        let params = candidates[best_idx];
        let cv = results[best_idx].clone();

        debug!(
            algorithm = %algorithm,
            params = %params,
            cv_mean = cv.mean_score,
            "Selected configuration"
        );

        let mut model = params.build();
        model.fit(x, y)?;

        let warning = match model.convergence() {
            Some((iterations, false)) => {
                let warning = DegradedModelWarning {
                    algorithm,
                    params: params.to_string(),
                    iterations,
                };
                warn!(warning = %warning, "Model degraded");
                Some(warning)
            }
            _ => None,
        };

        let training_time_secs = start.elapsed().as_secs_f64();
        info!(
            algorithm = %algorithm,
            candidates = candidates.len(),
            cv_accuracy = cv.mean_score,
            elapsed_secs = training_time_secs,
            "Grid search complete"
        );

        Ok(TrainedModel {
            algorithm,
            params,
            model,
            cv,
            candidates_evaluated: candidates.len(),
            training_time_secs,
            warning,
        })
    }
}

/// Mean fold accuracy of one configuration
fn cross_validate(params: &ModelParams, x: &Array2<f64>, y: &Array1<f64>, splits: &[CVSplit]) -> Result<CVResults> {
    let scores = splits
        .iter()
        .map(|split| {
            let x_train = x.select(Axis(0), &split.train_indices);
            let y_train = y.select(Axis(0), &split.train_indices);
            let x_val = x.select(Axis(0), &split.test_indices);
            let y_val = y.select(Axis(0), &split.test_indices);

            let mut model = params.build();
            model.fit(&x_train, &y_train)?;
            model.score(&x_val, &y_val)
        })
        .collect::<Result<Vec<f64>>>()?;

    Ok(CVResults::from_scores(scores))
}

/// Index of the highest mean score; the earliest candidate wins ties
fn select_best(results: &[CVResults]) -> usize {
    let mut best = 0;
    for (i, r) in results.iter().enumerate().skip(1) {
        if r.mean_score > results[best].mean_score {
            best = i;
        }
    }
    best
}
