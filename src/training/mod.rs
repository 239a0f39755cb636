//! Model training
//!
//! Four binary classifiers share one hyperparameter search:
//! - Logistic regression (gradient descent or Newton)
//! - Support vector machine (SMO with linear, rbf and poly kernels)
//! - Decision tree (gini or entropy)
//! - K-nearest neighbors
//!
//! [`ModelTrainer`] runs a grid search with stratified k-fold
//! cross-validation for each algorithm and refits the best configuration on
//! the full training partition.

mod cross_validation;
mod decision_tree;
mod grid;
mod knn;
mod logistic;
mod svm;
mod trainer;

pub use cross_validation::{CVResults, CVSplit, CrossValidator};
pub use decision_tree::{Criterion, DecisionTreeClassifier, TreeNode, TreeParams};
pub use grid::{GridConfig, KnnGrid, LogisticGrid, SvmGrid, TreeGrid};
pub use knn::{DistanceMetric, KnnClassifier, KnnParams, WeightScheme};
pub use logistic::{LogisticParams, LogisticRegression, Penalty, Solver};
pub use svm::{Gamma, Kernel, SvmClassifier, SvmParams};
pub use trainer::{ModelTrainer, TrainedModel};

use crate::error::{LandingError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported algorithms. Declaration order is the ranking tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    LogisticRegression,
    Svm,
    DecisionTree,
    Knn,
}

impl Algorithm {
    pub const ALL: [Algorithm; 4] = [
        Algorithm::LogisticRegression,
        Algorithm::Svm,
        Algorithm::DecisionTree,
        Algorithm::Knn,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::LogisticRegression => "Logistic Regression",
            Algorithm::Svm => "SVM",
            Algorithm::DecisionTree => "Decision Tree",
            Algorithm::Knn => "KNN",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One hyperparameter configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum ModelParams {
    LogisticRegression(LogisticParams),
    Svm(SvmParams),
    DecisionTree(TreeParams),
    Knn(KnnParams),
}

impl ModelParams {
    pub fn algorithm(&self) -> Algorithm {
        match self {
            ModelParams::LogisticRegression(_) => Algorithm::LogisticRegression,
            ModelParams::Svm(_) => Algorithm::Svm,
            ModelParams::DecisionTree(_) => Algorithm::DecisionTree,
            ModelParams::Knn(_) => Algorithm::Knn,
        }
    }

    /// Unfitted classifier for this configuration
    pub fn build(&self) -> Classifier {
        match *self {
            ModelParams::LogisticRegression(p) => Classifier::LogisticRegression(LogisticRegression::new(p)),
            ModelParams::Svm(p) => Classifier::Svm(SvmClassifier::new(p)),
            ModelParams::DecisionTree(p) => Classifier::DecisionTree(DecisionTreeClassifier::new(p)),
            ModelParams::Knn(p) => Classifier::Knn(KnnClassifier::new(p)),
        }
    }
}

impl fmt::Display for ModelParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelParams::LogisticRegression(p) => fmt::Display::fmt(p, f),
            ModelParams::Svm(p) => fmt::Display::fmt(p, f),
            ModelParams::DecisionTree(p) => fmt::Display::fmt(p, f),
            ModelParams::Knn(p) => fmt::Display::fmt(p, f),
        }
    }
}

/// A classifier of any supported algorithm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Classifier {
    LogisticRegression(LogisticRegression),
    Svm(SvmClassifier),
    DecisionTree(DecisionTreeClassifier),
    Knn(KnnClassifier),
}

impl Classifier {
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        match self {
            Classifier::LogisticRegression(m) => m.fit(x, y).map(|_| ()),
            Classifier::Svm(m) => m.fit(x, y).map(|_| ()),
            Classifier::DecisionTree(m) => m.fit(x, y).map(|_| ()),
            Classifier::Knn(m) => m.fit(x, y).map(|_| ()),
        }
    }

    /// Predicted labels in {0.0, 1.0}
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            Classifier::LogisticRegression(m) => m.predict(x),
            Classifier::Svm(m) => m.predict(x),
            Classifier::DecisionTree(m) => m.predict(x),
            Classifier::Knn(m) => m.predict(x),
        }
    }

    /// Mean accuracy on the given rows
    pub fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        let pred = self.predict(x)?;
        Ok(crate::evaluation::accuracy(y, &pred))
    }

    /// Iterations used and whether the solver converged, for iterative solvers
    pub fn convergence(&self) -> Option<(usize, bool)> {
        match self {
            Classifier::LogisticRegression(m) => Some((m.n_iter, m.converged)),
            Classifier::Svm(m) => Some((m.n_iter, m.converged)),
            Classifier::DecisionTree(_) | Classifier::Knn(_) => None,
        }
    }
}

/// A solver exhausted its iteration budget. The model is still usable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegradedModelWarning {
    pub algorithm: Algorithm,
    pub params: String,
    pub iterations: usize,
}

impl fmt::Display for DegradedModelWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) did not converge within {} iterations",
            self.algorithm, self.params, self.iterations
        )
    }
}

pub(crate) fn check_fit_input(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(LandingError::Shape {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    if x.nrows() == 0 {
        return Err(LandingError::InsufficientData("cannot fit on zero rows".to_string()));
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(LandingError::Data("feature matrix contains non-finite values".to_string()));
    }
    if let Some(bad) = y.iter().find(|v| **v != 0.0 && **v != 1.0) {
        return Err(LandingError::Data(format!("labels must be 0 or 1, got {}", bad)));
    }
    Ok(())
}

/// The only label present, if the labels contain a single class
pub(crate) fn single_class(y: &Array1<f64>) -> Option<f64> {
    let first = *y.first()?;
    y.iter().all(|v| *v == first).then_some(first)
}
