//! Hyperparameter grids
//!
//! Each grid is a Cartesian product over its parameters taken in name order
//! (`c`, `gamma`, `kernel` for the SVM), with the last name varying fastest.

use super::{
    Algorithm, Criterion, DistanceMetric, Gamma, Kernel, KnnParams, LogisticParams, ModelParams, Penalty, Solver,
    SvmParams, TreeParams, WeightScheme,
};
use crate::error::{LandingError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticGrid {
    pub c: Vec<f64>,
    pub penalty: Vec<Penalty>,
    pub solver: Vec<Solver>,
    pub max_iter: usize,
}

impl Default for LogisticGrid {
    fn default() -> Self {
        Self {
            c: vec![0.01, 0.1, 1.0, 10.0],
            penalty: vec![Penalty::L2],
            solver: vec![Solver::Newton, Solver::GradientDescent],
            max_iter: 1000,
        }
    }
}

impl LogisticGrid {
    /// Combinations in enumeration order; solver/penalty pairs the solver
    /// cannot handle are skipped
    pub fn candidates(&self) -> Vec<LogisticParams> {
        let mut out = Vec::new();
        for &c in &self.c {
            for &penalty in &self.penalty {
                for &solver in &self.solver {
                    if !solver.supports(penalty) {
                        debug!(?solver, ?penalty, "Skipping unsupported logistic regression combination");
                        continue;
                    }
                    out.push(LogisticParams {
                        c,
                        penalty,
                        solver,
                        max_iter: self.max_iter,
                        ..Default::default()
                    });
                }
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvmGrid {
    pub kernel: Vec<Kernel>,
    pub c: Vec<f64>,
    pub gamma: Vec<Gamma>,
    pub max_iter: usize,
}

impl Default for SvmGrid {
    fn default() -> Self {
        Self {
            kernel: vec![Kernel::Linear, Kernel::Rbf, Kernel::Poly],
            c: vec![0.1, 1.0, 10.0],
            gamma: vec![Gamma::Scale, Gamma::Auto],
            max_iter: 1000,
        }
    }
}

impl SvmGrid {
    pub fn candidates(&self, seed: u64) -> Vec<SvmParams> {
        let mut out = Vec::new();
        for &c in &self.c {
            for &gamma in &self.gamma {
                for &kernel in &self.kernel {
                    out.push(SvmParams {
                        kernel,
                        c,
                        gamma,
                        max_iter: self.max_iter,
                        seed,
                        ..Default::default()
                    });
                }
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeGrid {
    pub criterion: Vec<Criterion>,
    /// `null` means unlimited depth
    pub max_depth: Vec<Option<usize>>,
    pub min_samples_split: Vec<usize>,
    pub min_samples_leaf: Vec<usize>,
}

impl Default for TreeGrid {
    fn default() -> Self {
        Self {
            criterion: vec![Criterion::Gini, Criterion::Entropy],
            max_depth: vec![Some(3), Some(5), Some(7), Some(10), None],
            min_samples_split: vec![2, 5, 10],
            min_samples_leaf: vec![1, 2, 4],
        }
    }
}

impl TreeGrid {
    pub fn candidates(&self) -> Vec<TreeParams> {
        let mut out = Vec::new();
        for &criterion in &self.criterion {
            for &max_depth in &self.max_depth {
                for &min_samples_leaf in &self.min_samples_leaf {
                    for &min_samples_split in &self.min_samples_split {
                        out.push(TreeParams {
                            criterion,
                            max_depth,
                            min_samples_split,
                            min_samples_leaf,
                        });
                    }
                }
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnnGrid {
    pub n_neighbors: Vec<usize>,
    pub weights: Vec<WeightScheme>,
    pub metric: Vec<DistanceMetric>,
}

impl Default for KnnGrid {
    fn default() -> Self {
        Self {
            n_neighbors: vec![3, 5, 7, 9, 11],
            weights: vec![WeightScheme::Uniform, WeightScheme::Distance],
            metric: vec![DistanceMetric::Euclidean, DistanceMetric::Manhattan],
        }
    }
}

impl KnnGrid {
    pub fn candidates(&self) -> Vec<KnnParams> {
        let mut out = Vec::new();
        for &metric in &self.metric {
            for &n_neighbors in &self.n_neighbors {
                for &weights in &self.weights {
                    out.push(KnnParams {
                        n_neighbors,
                        weights,
                        metric,
                    });
                }
            }
        }
        out
    }
}

/// Search grids for every algorithm
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub logistic_regression: LogisticGrid,
    pub svm: SvmGrid,
    pub decision_tree: TreeGrid,
    pub knn: KnnGrid,
}

impl GridConfig {
    /// All candidates for `algorithm`, in enumeration order
    pub fn candidates(&self, algorithm: Algorithm, seed: u64) -> Result<Vec<ModelParams>> {
        let candidates: Vec<ModelParams> = match algorithm {
            Algorithm::LogisticRegression => self
                .logistic_regression
                .candidates()
                .into_iter()
                .map(ModelParams::LogisticRegression)
                .collect(),
            Algorithm::Svm => self.svm.candidates(seed).into_iter().map(ModelParams::Svm).collect(),
            Algorithm::DecisionTree => self
                .decision_tree
                .candidates()
                .into_iter()
                .map(ModelParams::DecisionTree)
                .collect(),
            Algorithm::Knn => self.knn.candidates().into_iter().map(ModelParams::Knn).collect(),
        };

        if let Some(bad) = candidates.iter().find_map(out_of_range) {
            return Err(bad);
        }
        if candidates.is_empty() {
            return Err(LandingError::InvalidParameter {
                name: format!("grid.{:?}", algorithm),
                value: "[]".to_string(),
                reason: "grid yields no valid combination".to_string(),
            });
        }
        Ok(candidates)
    }
}

/// Values the classifiers would reject at fit time
fn out_of_range(params: &ModelParams) -> Option<LandingError> {
    let (name, value, reason) = match params {
        ModelParams::Knn(p) if p.n_neighbors == 0 => ("grid.knn.n_neighbors", 0, "must be at least 1"),
        ModelParams::DecisionTree(p) if p.min_samples_split < 2 => {
            ("grid.decision_tree.min_samples_split", p.min_samples_split, "must be at least 2")
        }
        ModelParams::DecisionTree(p) if p.min_samples_leaf == 0 => {
            ("grid.decision_tree.min_samples_leaf", 0, "must be at least 1")
        }
        _ => return None,
    };
    Some(LandingError::InvalidParameter {
        name: name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    })
}
