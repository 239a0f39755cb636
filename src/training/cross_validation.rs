//! Stratified k-fold cross-validation

use crate::error::{LandingError, Result};
use ndarray::Array1;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single train/validation split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CVSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Stratified k-fold splitter
#[derive(Debug, Clone)]
pub struct CrossValidator {
    n_splits: usize,
    shuffle: bool,
    random_state: u64,
}

impl CrossValidator {
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            shuffle: true,
            random_state: 42,
        }
    }

    /// Set random state for reproducibility
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Folds that keep each class spread evenly. Class members are dealt
    /// round-robin, continuing from where the previous class stopped, so fold
    /// sizes differ by at most one. Index lists are sorted.
    pub fn split(&self, y: &Array1<f64>) -> Result<Vec<CVSplit>> {
        let n_samples = y.len();
        if self.n_splits < 2 {
            return Err(LandingError::InvalidParameter {
                name: "cv_folds".to_string(),
                value: self.n_splits.to_string(),
                reason: "at least 2 folds are required".to_string(),
            });
        }
        if n_samples < self.n_splits {
            return Err(LandingError::InsufficientData(format!(
                "{} training rows cannot fill {} folds",
                n_samples, self.n_splits
            )));
        }

        let mut class_indices: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (idx, &val) in y.iter().enumerate() {
            class_indices.entry(val.round() as i64).or_default().push(idx);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);
        if self.shuffle {
            for indices in class_indices.values_mut() {
                indices.shuffle(&mut rng);
            }
        }

        let mut folds: Vec<Vec<usize>> = vec![Vec::new(); self.n_splits];
        let mut next_fold = 0;
        for indices in class_indices.values() {
            for &idx in indices {
                folds[next_fold].push(idx);
                next_fold = (next_fold + 1) % self.n_splits;
            }
        }
        for fold in &mut folds {
            fold.sort_unstable();
        }

        let splits = (0..self.n_splits)
            .map(|fold_idx| {
                let mut train_indices: Vec<usize> = folds
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != fold_idx)
                    .flat_map(|(_, f)| f.iter().copied())
                    .collect();
                train_indices.sort_unstable();

                CVSplit {
                    train_indices,
                    test_indices: folds[fold_idx].clone(),
                    fold_idx,
                }
            })
            .collect();

        Ok(splits)
    }
}

/// Cross-validation results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CVResults {
    /// Score of each fold, in fold order
    pub scores: Vec<f64>,
    pub mean_score: f64,
    /// Population standard deviation of the fold scores
    pub std_score: f64,
    pub n_folds: usize,
}

impl CVResults {
    pub fn from_scores(scores: Vec<f64>) -> Self {
        let n_folds = scores.len();
        if n_folds == 0 {
            return Self {
                scores,
                mean_score: 0.0,
                std_score: 0.0,
                n_folds,
            };
        }

        let mean_score = scores.iter().sum::<f64>() / n_folds as f64;
        let variance = scores.iter().map(|s| (s - mean_score).powi(2)).sum::<f64>() / n_folds as f64;

        Self {
            scores,
            mean_score,
            std_score: variance.sqrt(),
            n_folds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Array1<f64> {
        Array1::from_iter((0..23).map(|i| if i % 3 == 0 { 1.0 } else { 0.0 }))
    }

    #[test]
    fn test_folds_partition_rows() {
        let y = labels();
        let splits = CrossValidator::new(5).split(&y).unwrap();
        assert_eq!(splits.len(), 5);

        let mut all_test: Vec<usize> = splits.iter().flat_map(|s| s.test_indices.clone()).collect();
        all_test.sort_unstable();
        assert_eq!(all_test, (0..23).collect::<Vec<_>>());

        for split in &splits {
            assert_eq!(split.train_indices.len() + split.test_indices.len(), 23);
            assert!(split.test_indices.iter().all(|i| !split.train_indices.contains(i)));
        }
    }

    #[test]
    fn test_folds_are_stratified_and_balanced() {
        let y = labels();
        let splits = CrossValidator::new(5).split(&y).unwrap();

        let sizes: Vec<usize> = splits.iter().map(|s| s.test_indices.len()).collect();
        let (min, max) = (sizes.iter().min().unwrap(), sizes.iter().max().unwrap());
        assert!(max - min <= 1);

        for split in &splits {
            let pos = split.test_indices.iter().filter(|&&i| y[i] == 1.0).count();
            assert!((1..=2).contains(&pos));
        }
    }

    #[test]
    fn test_same_seed_same_folds() {
        let y = labels();
        let a = CrossValidator::new(4).with_random_state(9).split(&y).unwrap();
        let b = CrossValidator::new(4).with_random_state(9).split(&y).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_too_few_rows() {
        let y = Array1::from_vec(vec![0.0, 1.0, 0.0]);
        assert!(matches!(CrossValidator::new(5).split(&y), Err(LandingError::InsufficientData(_))));
        assert!(matches!(CrossValidator::new(1).split(&y), Err(LandingError::InvalidParameter { .. })));
    }

    #[test]
    fn test_cv_results() {
        let results = CVResults::from_scores(vec![0.8, 1.0, 0.9]);
        assert!((results.mean_score - 0.9).abs() < 1e-12);
        assert_eq!(results.n_folds, 3);
    }
}
