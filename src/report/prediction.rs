//! Model comparison report

use crate::evaluation::{rank, EvaluationResult};
use crate::preprocessing::ImputationScope;
use crate::training::DegradedModelWarning;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Sizes of the data the models saw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub total: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub feature_names: Vec<String>,
    pub imputation: ImputationScope,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionReport {
    pub dataset: DatasetInfo,
    /// Results in ranking order
    pub leaderboard: Vec<EvaluationResult>,
    pub warnings: Vec<DegradedModelWarning>,
}

impl PredictionReport {
    pub fn new(dataset: DatasetInfo, results: Vec<EvaluationResult>, warnings: Vec<DegradedModelWarning>) -> Self {
        Self {
            dataset,
            leaderboard: rank(results),
            warnings,
        }
    }

    pub fn best(&self) -> Option<&EvaluationResult> {
        self.leaderboard.first()
    }

    pub fn render(&self) -> String {
        let rule = "=".repeat(70);
        let thin = "-".repeat(70);
        let mut out = String::new();

        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "FALCON 9 FIRST STAGE LANDING PREDICTION REPORT");
        let _ = writeln!(out, "{}\n", rule);

        let _ = writeln!(out, "DATASET INFORMATION\n{}", thin);
        let _ = writeln!(out, "   Total samples:     {}", self.dataset.total);
        let _ = writeln!(out, "   Training samples:  {}", self.dataset.n_train);
        let _ = writeln!(out, "   Test samples:      {}", self.dataset.n_test);
        let _ = writeln!(out, "   Features used:     {}", self.dataset.feature_names.join(", "));
        let scope = match self.dataset.imputation {
            ImputationScope::FullDataset => "full dataset",
            ImputationScope::TrainingOnly => "training rows only",
        };
        let _ = writeln!(out, "   Imputation fit on: {}\n", scope);

        let _ = writeln!(out, "MODEL PERFORMANCE COMPARISON\n{}", thin);
        let _ = writeln!(
            out,
            "   {:<4} {:<20} {:>9} {:>9} {:>10} {:>8} {:>8}",
            "Rank", "Model", "CV Acc", "Accuracy", "Precision", "Recall", "F1"
        );
        for (i, r) in self.leaderboard.iter().enumerate() {
            let marker = if r.degraded { " *" } else { "" };
            let _ = writeln!(
                out,
                "   {:<4} {:<20} {:>9.4} {:>9.4} {:>10.4} {:>8.4} {:>8.4}{}",
                i + 1,
                r.algorithm.name(),
                r.cv_accuracy,
                r.accuracy,
                r.precision,
                r.recall,
                r.f1,
                marker
            );
        }
        out.push('\n');

        let _ = writeln!(out, "CONFUSION MATRICES [[tn fp] [fn tp]]\n{}", thin);
        for r in &self.leaderboard {
            let _ = writeln!(out, "   {} ({})", r.algorithm, r.params);
            for line in r.confusion.to_string().lines() {
                let _ = writeln!(out, "      {}", line);
            }
        }
        out.push('\n');

        if let Some(best) = self.best() {
            let _ = writeln!(out, "BEST MODEL\n{}", thin);
            let _ = writeln!(out, "   Model:       {}", best.algorithm);
            let _ = writeln!(out, "   Parameters:  {}", best.params);
            let _ = writeln!(out, "   Accuracy:    {:.4} ({:.2}%)", best.accuracy, best.accuracy * 100.0);
            let _ = writeln!(out, "   F1 score:    {:.4}\n", best.f1);
        }

        if !self.warnings.is_empty() {
            let _ = writeln!(out, "WARNINGS (* = solver did not converge)\n{}", thin);
            for w in &self.warnings {
                let _ = writeln!(out, "   {}", w);
            }
            out.push('\n');
        }

        let _ = writeln!(out, "{}", rule);
        out
    }
}
