//! Binary decision tree classifier

use super::check_fit_input;
use crate::error::{LandingError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        /// Predicted class
        value: f64,
        /// [negatives, positives] reaching this leaf
        counts: [usize; 2],
    },
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        impurity: f64,
    },
}

/// Impurity criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Gini,
    Entropy,
}

impl Criterion {
    fn impurity(&self, counts: [usize; 2]) -> f64 {
        let total = (counts[0] + counts[1]) as f64;
        if total == 0.0 {
            return 0.0;
        }
        let p = [counts[0] as f64 / total, counts[1] as f64 / total];
        match self {
            Criterion::Gini => 1.0 - p[0] * p[0] - p[1] * p[1],
            Criterion::Entropy => -p.iter().filter(|v| **v > 0.0).map(|v| v * v.log2()).sum::<f64>(),
        }
    }
}

/// Tree hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    pub criterion: Criterion,
    /// `None` grows until leaves are pure or too small
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            criterion: Criterion::Gini,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

impl fmt::Display for TreeParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let depth = self.max_depth.map_or_else(|| "none".to_string(), |d| d.to_string());
        write!(
            f,
            "criterion={:?}, max_depth={}, min_samples_split={}, min_samples_leaf={}",
            self.criterion, depth, self.min_samples_split, self.min_samples_leaf
        )
    }
}

/// Decision tree classifier for labels in {0, 1}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeClassifier {
    pub params: TreeParams,
    root: Option<TreeNode>,
    n_features: usize,
    feature_importances: Option<Array1<f64>>,
}

impl Default for DecisionTreeClassifier {
    fn default() -> Self {
        Self::new(TreeParams::default())
    }
}

impl DecisionTreeClassifier {
    pub fn new(params: TreeParams) -> Self {
        Self {
            params,
            root: None,
            n_features: 0,
            feature_importances: None,
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        check_fit_input(x, y)?;
        if self.params.min_samples_split < 2 {
            return Err(LandingError::InvalidParameter {
                name: "min_samples_split".to_string(),
                value: self.params.min_samples_split.to_string(),
                reason: "must be at least 2".to_string(),
            });
        }
        if self.params.min_samples_leaf < 1 {
            return Err(LandingError::InvalidParameter {
                name: "min_samples_leaf".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        self.n_features = x.ncols();
        let mut importances = vec![0.0; self.n_features];
        let indices: Vec<usize> = (0..x.nrows()).collect();
        self.root = Some(self.build_tree(x, y, &indices, 0, &mut importances));

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|v| *v /= total);
        }
        self.feature_importances = Some(Array1::from_vec(importances));
        Ok(self)
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        importances: &mut [f64],
    ) -> TreeNode {
        let counts = class_counts(y, indices);
        let n_samples = indices.len();

        let should_stop = n_samples < self.params.min_samples_split
            || n_samples < 2 * self.params.min_samples_leaf
            || self.params.max_depth.map_or(false, |d| depth >= d)
            || counts[0] == 0
            || counts[1] == 0;

        if should_stop {
            return leaf(counts);
        }

        let Some((feature_idx, threshold, gain)) = self.find_best_split(x, y, indices, counts) else {
            return leaf(counts);
        };

        let (left, right): (Vec<usize>, Vec<usize>) =
            indices.iter().partition(|&&i| x[[i, feature_idx]] <= threshold);

        importances[feature_idx] += n_samples as f64 * gain;

        TreeNode::Split {
            feature_idx,
            threshold,
            left: Box::new(self.build_tree(x, y, &left, depth + 1, importances)),
            right: Box::new(self.build_tree(x, y, &right, depth + 1, importances)),
            n_samples,
            impurity: self.params.criterion.impurity(counts),
        }
    }

    /// Best (feature, threshold, gain) by impurity decrease. Features are
    /// scanned in order and thresholds ascending; the first strict maximum wins.
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        parent: [usize; 2],
    ) -> Option<(usize, f64, f64)> {
        let n = indices.len() as f64;
        let parent_impurity = self.params.criterion.impurity(parent);
        let min_leaf = self.params.min_samples_leaf;

        let mut best: Option<(usize, f64, f64)> = None;

        for feature_idx in 0..x.ncols() {
            let mut sorted: Vec<(f64, usize)> = indices.iter().map(|&i| (x[[i, feature_idx]], i)).collect();
            sorted.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

            let mut left = [0usize; 2];
            for pos in 0..sorted.len() - 1 {
                let (value, idx) = sorted[pos];
                left[label_index(y[idx])] += 1;

                let next_value = sorted[pos + 1].0;
                if next_value <= value {
                    continue;
                }

                let n_left = pos + 1;
                let n_right = sorted.len() - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let right = [parent[0] - left[0], parent[1] - left[1]];
                let weighted = (n_left as f64 * self.params.criterion.impurity(left)
                    + n_right as f64 * self.params.criterion.impurity(right))
                    / n;
                let gain = parent_impurity - weighted;

                if gain > 1e-12 && best.map_or(true, |(_, _, g)| gain > g) {
                    best = Some((feature_idx, (value + next_value) / 2.0, gain));
                }
            }
        }

        best
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(LandingError::ModelNotFitted)?;
        if x.ncols() != self.n_features {
            return Err(LandingError::Shape {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        Ok(x.rows()
            .into_iter()
            .map(|row| {
                let mut node = root;
                loop {
                    match node {
                        TreeNode::Leaf { value, .. } => break *value,
                        TreeNode::Split { feature_idx, threshold, left, right, .. } => {
                            node = if row[*feature_idx] <= *threshold { left } else { right };
                        }
                    }
                }
            })
            .collect())
    }

    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    pub fn depth(&self) -> usize {
        fn node_depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + node_depth(left).max(node_depth(right)),
            }
        }
        self.root.as_ref().map_or(0, node_depth)
    }

    pub fn n_leaves(&self) -> usize {
        fn count(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => count(left) + count(right),
            }
        }
        self.root.as_ref().map_or(0, count)
    }
}

#[inline]
fn label_index(v: f64) -> usize {
    if v == 1.0 {
        1
    } else {
        0
    }
}

fn class_counts(y: &Array1<f64>, indices: &[usize]) -> [usize; 2] {
    let mut counts = [0usize; 2];
    for &i in indices {
        counts[label_index(y[i])] += 1;
    }
    counts
}

/// Majority class, ties to class 0
fn leaf(counts: [usize; 2]) -> TreeNode {
    TreeNode::Leaf {
        value: if counts[1] > counts[0] { 1.0 } else { 0.0 },
        counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn and_gate() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [0.1, 0.1], [0.2, 0.8], [0.3, 0.4], [0.4, 0.9],
            [0.7, 0.2], [0.8, 0.3], [0.6, 0.7], [0.9, 0.8]
        ];
        let y = array![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_fits_training_data() {
        let (x, y) = and_gate();
        for criterion in [Criterion::Gini, Criterion::Entropy] {
            let mut tree = DecisionTreeClassifier::new(TreeParams { criterion, ..Default::default() });
            tree.fit(&x, &y).unwrap();
            assert_eq!(tree.predict(&x).unwrap(), y);
            assert!(tree.depth() >= 1);
        }
    }

    #[test]
    fn test_max_depth_limits_tree() {
        let (x, y) = and_gate();
        let mut tree = DecisionTreeClassifier::new(TreeParams {
            max_depth: Some(1),
            ..Default::default()
        });
        tree.fit(&x, &y).unwrap();
        assert!(tree.depth() <= 1);
    }

    #[test]
    fn test_min_samples_leaf_respected() {
        let (x, y) = and_gate();
        let mut tree = DecisionTreeClassifier::new(TreeParams {
            min_samples_leaf: 4,
            ..Default::default()
        });
        tree.fit(&x, &y).unwrap();
        fn check(node: &TreeNode) {
            match node {
                TreeNode::Leaf { counts, .. } => assert!(counts[0] + counts[1] >= 4),
                TreeNode::Split { left, right, .. } => {
                    check(left);
                    check(right);
                }
            }
        }
        check(tree.root.as_ref().unwrap());
    }

    #[test]
    fn test_tied_leaf_predicts_lower_class() {
        let x = array![[1.0], [1.0]];
        let y = array![1.0, 0.0];
        let mut tree = DecisionTreeClassifier::default();
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.n_leaves(), 1);
        assert_eq!(tree.predict(&array![[1.0]]).unwrap()[0], 0.0);
    }

    #[test]
    fn test_importances_sum_to_one() {
        let (x, y) = and_gate();
        let mut tree = DecisionTreeClassifier::default();
        tree.fit(&x, &y).unwrap();
        let total: f64 = tree.feature_importances().unwrap().sum();
        assert!((total - 1.0).abs() < 1e-12);
    }
}
