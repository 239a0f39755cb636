//! Held-out evaluation and ranking

use crate::error::{LandingError, Result};
use crate::training::{Algorithm, TrainedModel};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use tracing::info;

/// Fraction of matching labels, 0 for empty input
pub fn accuracy(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| (*t - *p).abs() < 0.5)
        .count();
    correct as f64 / y_true.len() as f64
}

/// Binary confusion matrix, laid out as `[[tn, fp], [fn, tp]]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub tn: usize,
    pub fp: usize,
    #[serde(rename = "fn")]
    pub fn_: usize,
    pub tp: usize,
}

impl ConfusionMatrix {
    pub fn from_predictions(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        let mut m = Self::default();
        for (t, p) in y_true.iter().zip(y_pred.iter()) {
            match (*t > 0.5, *p > 0.5) {
                (true, true) => m.tp += 1,
                (false, true) => m.fp += 1,
                (false, false) => m.tn += 1,
                (true, false) => m.fn_ += 1,
            }
        }
        m
    }

    pub fn as_array(&self) -> [[usize; 2]; 2] {
        [[self.tn, self.fp], [self.fn_, self.tp]]
    }

    pub fn total(&self) -> usize {
        self.tn + self.fp + self.fn_ + self.tp
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.tp + self.tn, self.total())
    }

    /// tp / (tp + fp), 0 when nothing is predicted positive
    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    /// tp / (tp + fn), 0 when there are no actual positives
    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r > 0.0 {
            2.0 * p * r / (p + r)
        } else {
            0.0
        }
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.as_array().iter().flatten().map(|v| v.to_string().len()).max().unwrap_or(1);
        writeln!(f, "[[{:>w$} {:>w$}]", self.tn, self.fp, w = width)?;
        write!(f, " [{:>w$} {:>w$}]]", self.fn_, self.tp, w = width)
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Test-set metrics of one trained model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub algorithm: Algorithm,
    /// Selected hyperparameters
    pub params: String,
    pub cv_accuracy: f64,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub confusion: ConfusionMatrix,
    /// Solver did not converge
    pub degraded: bool,
}

/// Applies trained models to the held-out rows
#[derive(Debug, Clone, Default)]
pub struct Evaluator;

impl Evaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(&self, model: &TrainedModel, x_test: &Array2<f64>, y_test: &Array1<f64>) -> Result<EvaluationResult> {
        if x_test.nrows() != y_test.len() {
            return Err(LandingError::Shape {
                expected: format!("y length = {}", x_test.nrows()),
                actual: format!("y length = {}", y_test.len()),
            });
        }

        let y_pred = model.predict(x_test)?;
        let confusion = ConfusionMatrix::from_predictions(y_test, &y_pred);

        let result = EvaluationResult {
            algorithm: model.algorithm,
            params: model.params.to_string(),
            cv_accuracy: model.cv.mean_score,
            accuracy: confusion.accuracy(),
            precision: confusion.precision(),
            recall: confusion.recall(),
            f1: confusion.f1(),
            confusion,
            degraded: model.is_degraded(),
        };

        info!(
            algorithm = %result.algorithm,
            accuracy = result.accuracy,
            f1 = result.f1,
            degraded = result.degraded,
            "Evaluated model"
        );
        Ok(result)
    }

    pub fn evaluate_all(
        &self,
        models: &[TrainedModel],
        x_test: &Array2<f64>,
        y_test: &Array1<f64>,
    ) -> Result<Vec<EvaluationResult>> {
        models.iter().map(|m| self.evaluate(m, x_test, y_test)).collect()
    }
}

/// Accuracy descending, then F1 descending, then algorithm order
pub fn ranking_order(a: &EvaluationResult, b: &EvaluationResult) -> Ordering {
    b.accuracy
        .total_cmp(&a.accuracy)
        .then_with(|| b.f1.total_cmp(&a.f1))
        .then_with(|| a.algorithm.cmp(&b.algorithm))
}

/// Sort results into leaderboard order
pub fn rank(mut results: Vec<EvaluationResult>) -> Vec<EvaluationResult> {
    results.sort_by(ranking_order);
    results
}
