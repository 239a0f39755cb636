//! K-nearest neighbors classifier

use super::check_fit_input;
use crate::error::{LandingError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Distance metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// L2
    #[default]
    Euclidean,
    /// L1
    Manhattan,
}

impl DistanceMetric {
    fn distance(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        let pairs = a.iter().zip(b.iter());
        match self {
            DistanceMetric::Euclidean => pairs.map(|(x, y)| (x - y) * (x - y)).sum::<f64>().sqrt(),
            DistanceMetric::Manhattan => pairs.map(|(x, y)| (x - y).abs()).sum(),
        }
    }
}

/// Neighbor vote weighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightScheme {
    #[default]
    Uniform,
    /// Inverse distance; exact matches take the whole vote
    Distance,
}

/// KNN hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KnnParams {
    pub n_neighbors: usize,
    pub weights: WeightScheme,
    pub metric: DistanceMetric,
}

impl Default for KnnParams {
    fn default() -> Self {
        Self {
            n_neighbors: 5,
            weights: WeightScheme::Uniform,
            metric: DistanceMetric::Euclidean,
        }
    }
}

impl fmt::Display for KnnParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n_neighbors={}, weights={:?}, metric={:?}",
            self.n_neighbors, self.weights, self.metric
        )
    }
}

/// K-nearest neighbors classifier for labels in {0, 1}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnClassifier {
    pub params: KnnParams,
    x_train: Option<Array2<f64>>,
    y_train: Option<Array1<f64>>,
}

impl Default for KnnClassifier {
    fn default() -> Self {
        Self::new(KnnParams::default())
    }
}

impl KnnClassifier {
    pub fn new(params: KnnParams) -> Self {
        Self {
            params,
            x_train: None,
            y_train: None,
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        check_fit_input(x, y)?;
        if self.params.n_neighbors == 0 {
            return Err(LandingError::InvalidParameter {
                name: "n_neighbors".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        self.x_train = Some(x.clone());
        self.y_train = Some(y.clone());
        Ok(self)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let (x_train, y_train) = match (&self.x_train, &self.y_train) {
            (Some(x), Some(y)) => (x, y),
            _ => return Err(LandingError::ModelNotFitted),
        };
        if x.ncols() != x_train.ncols() {
            return Err(LandingError::Shape {
                expected: format!("{} features", x_train.ncols()),
                actual: format!("{} features", x.ncols()),
            });
        }

        let k = self.params.n_neighbors.min(x_train.nrows());
        let predictions: Vec<f64> = (0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let neighbors = k_nearest(x.row(i), x_train, k, self.params.metric);
                vote(&neighbors, y_train, self.params.weights)
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }
}

/// The `k` closest training rows as (distance, index); ties by lower index
fn k_nearest(point: ArrayView1<f64>, x_train: &Array2<f64>, k: usize, metric: DistanceMetric) -> Vec<(f64, usize)> {
    let mut distances: Vec<(f64, usize)> = x_train
        .rows()
        .into_iter()
        .enumerate()
        .map(|(i, row)| (metric.distance(point, row), i))
        .collect();

    if k < distances.len() {
        distances.select_nth_unstable_by(k, |a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        distances.truncate(k);
    }
    distances.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    distances
}

/// Weighted binary vote, ties go to class 0
fn vote(neighbors: &[(f64, usize)], y_train: &Array1<f64>, weights: WeightScheme) -> f64 {
    let mut votes = [0.0f64; 2];
    let exact = neighbors.iter().any(|(d, _)| *d == 0.0);

    for &(dist, idx) in neighbors {
        let weight = match weights {
            WeightScheme::Uniform => 1.0,
            WeightScheme::Distance if exact => {
                if dist == 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            WeightScheme::Distance => 1.0 / dist,
        };
        let class = if y_train[idx] == 1.0 { 1 } else { 0 };
        votes[class] += weight;
    }

    if votes[1] > votes[0] {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn training_data() -> (Array2<f64>, Array1<f64>) {
        let x = array![[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [5.0, 5.0], [5.0, 6.0], [6.0, 5.0]];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_majority_vote() {
        let (x, y) = training_data();
        let mut knn = KnnClassifier::new(KnnParams { n_neighbors: 3, ..Default::default() });
        knn.fit(&x, &y).unwrap();
        let pred = knn.predict(&array![[0.5, 0.5], [5.5, 5.5]]).unwrap();
        assert_eq!(pred.to_vec(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_manhattan_distance() {
        let a = array![0.0, 0.0];
        let b = array![3.0, 4.0];
        assert_eq!(DistanceMetric::Manhattan.distance(a.view(), b.view()), 7.0);
        assert_eq!(DistanceMetric::Euclidean.distance(a.view(), b.view()), 5.0);
    }

    #[test]
    fn test_distance_weighting() {
        // two far negatives outvote one near positive only when unweighted
        let x = array![[1.0], [10.0], [11.0]];
        let y = array![1.0, 0.0, 0.0];
        let query = array![[0.0]];

        let mut uniform = KnnClassifier::new(KnnParams { n_neighbors: 3, ..Default::default() });
        uniform.fit(&x, &y).unwrap();
        assert_eq!(uniform.predict(&query).unwrap()[0], 0.0);

        let mut weighted = KnnClassifier::new(KnnParams {
            n_neighbors: 3,
            weights: WeightScheme::Distance,
            ..Default::default()
        });
        weighted.fit(&x, &y).unwrap();
        assert_eq!(weighted.predict(&query).unwrap()[0], 1.0);
    }

    #[test]
    fn test_tied_vote_goes_to_lower_class() {
        let x = array![[-1.0], [1.0]];
        let y = array![1.0, 0.0];
        let mut knn = KnnClassifier::new(KnnParams { n_neighbors: 2, ..Default::default() });
        knn.fit(&x, &y).unwrap();
        assert_eq!(knn.predict(&array![[0.0]]).unwrap()[0], 0.0);
    }

    #[test]
    fn test_k_larger_than_training_set() {
        let (x, y) = training_data();
        let mut knn = KnnClassifier::new(KnnParams { n_neighbors: 11, ..Default::default() });
        knn.fit(&x, &y).unwrap();
        assert_eq!(knn.predict(&x).unwrap().len(), 6);
    }
}
