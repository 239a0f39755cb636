//! Stratified train/test partitioning

use crate::error::{LandingError, Result};
use ndarray::Array1;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Split configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Held-out fraction, in (0, 1)
    pub test_size: f64,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
        }
    }
}

impl SplitConfig {
    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(LandingError::InvalidParameter {
                name: "test_size".to_string(),
                value: self.test_size.to_string(),
                reason: "must lie strictly between 0 and 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Disjoint row index sets, each sorted ascending
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Partition rows so both sides keep the label proportions.
///
/// The test side receives `ceil(test_size * n)` rows (clamped to `[2, n - 2]`)
/// with `round(n_test * n_pos / n)` positives, adjusted so that each class
/// has at least one row on each side.
pub fn stratified_split(y: &Array1<f64>, config: &SplitConfig) -> Result<TrainTestSplit> {
    config.validate()?;

    let n = y.len();
    if n == 0 {
        return Err(LandingError::InsufficientData("dataset is empty".to_string()));
    }

    let (positives, negatives): (Vec<usize>, Vec<usize>) = (0..n).partition(|&i| y[i] == 1.0);
    let (n_pos, n_neg) = (positives.len(), negatives.len());
    if n_pos < 2 || n_neg < 2 {
        return Err(LandingError::InsufficientData(format!(
            "at least 2 examples of each class are required, got {} positive and {} negative",
            n_pos, n_neg
        )));
    }

    let n_test = ((config.test_size * n as f64).ceil() as usize).clamp(2, n - 2);

    let expected_pos = (n_test as f64 * n_pos as f64 / n as f64).round() as usize;
    let lower = 1.max((n_test + 1).saturating_sub(n_neg));
    let upper = (n_pos - 1).min(n_test - 1);
    let test_pos = expected_pos.clamp(lower, upper);
    let test_neg = n_test - test_pos;

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut shuffled_pos = positives;
    let mut shuffled_neg = negatives;
    shuffled_pos.shuffle(&mut rng);
    shuffled_neg.shuffle(&mut rng);

    let mut test: Vec<usize> = shuffled_pos[..test_pos]
        .iter()
        .chain(&shuffled_neg[..test_neg])
        .copied()
        .collect();
    let mut train: Vec<usize> = shuffled_pos[test_pos..]
        .iter()
        .chain(&shuffled_neg[test_neg..])
        .copied()
        .collect();
    test.sort_unstable();
    train.sort_unstable();

    debug!(
        train = train.len(),
        test = test.len(),
        test_positive = test_pos,
        "Stratified split"
    );

    Ok(TrainTestSplit { train, test })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(n: usize, n_pos: usize) -> Array1<f64> {
        Array1::from_iter((0..n).map(|i| if i < n_pos { 1.0 } else { 0.0 }))
    }

    #[test]
    fn test_ten_rows_six_positive() {
        let y = labels(10, 6);
        for seed in 0..20 {
            let split = stratified_split(&y, &SplitConfig::default().with_seed(seed)).unwrap();
            assert_eq!(split.test.len(), 2);
            assert_eq!(split.train.len(), 8);
            let pos = split.test.iter().filter(|&&i| y[i] == 1.0).count();
            assert!(pos == 1 || pos == 2);
        }
    }

    #[test]
    fn test_partitions_are_disjoint_and_sorted() {
        let y = labels(37, 15);
        let split = stratified_split(&y, &SplitConfig::default().with_test_size(0.3)).unwrap();

        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..37).collect::<Vec<_>>());
        assert!(split.train.windows(2).all(|w| w[0] < w[1]));
        assert!(split.test.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_same_seed_same_split() {
        let y = labels(50, 20);
        let a = stratified_split(&y, &SplitConfig::default().with_seed(3)).unwrap();
        let b = stratified_split(&y, &SplitConfig::default().with_seed(3)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_stratification_bound() {
        for (n, n_pos) in [(10, 6), (23, 4), (40, 35), (100, 50), (7, 2)] {
            let y = labels(n, n_pos);
            let overall = n_pos as f64 / n as f64;
            for f in [0.1, 0.2, 0.33, 0.5, 0.8] {
                let split = stratified_split(&y, &SplitConfig::default().with_test_size(f)).unwrap();
                let train_pos = split.train.iter().filter(|&&i| y[i] == 1.0).count();
                let train_rate = train_pos as f64 / split.train.len() as f64;
                let bound = 1.0 / split.train.len().min(split.test.len()) as f64;
                assert!((train_rate - overall).abs() <= bound + 1e-12, "n={} pos={} f={}", n, n_pos, f);
            }
        }
    }

    #[test]
    fn test_invalid_fraction() {
        let y = labels(10, 5);
        for f in [0.0, 1.0, -0.5, f64::NAN] {
            let result = stratified_split(&y, &SplitConfig::default().with_test_size(f));
            assert!(matches!(result, Err(LandingError::InvalidParameter { .. })));
        }
    }

    #[test]
    fn test_single_minority_example() {
        let result = stratified_split(&labels(10, 1), &SplitConfig::default());
        assert!(matches!(result, Err(LandingError::InsufficientData(_))));

        let result = stratified_split(&Array1::zeros(0), &SplitConfig::default());
        assert!(matches!(result, Err(LandingError::InsufficientData(_))));
    }
}
