//! Binary logistic regression
//!
//! The objective follows the inverse-regularization convention: the penalty
//! weight is `1 / C`, so larger `C` means weaker regularization. The
//! intercept is never penalized.

use super::check_fit_input;
use crate::error::{LandingError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Regularization penalty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Penalty {
    L2,
    L1,
    None,
}

/// Optimization routine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Solver {
    /// Full-batch gradient descent, proximal steps for L1
    GradientDescent,
    /// Newton-Raphson (IRLS); smooth penalties only
    Newton,
}

impl Solver {
    pub fn supports(&self, penalty: Penalty) -> bool {
        match self {
            Solver::GradientDescent => true,
            Solver::Newton => penalty != Penalty::L1,
        }
    }
}

/// Logistic regression hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    /// Inverse regularization strength
    pub c: f64,
    pub penalty: Penalty,
    pub solver: Solver,
    pub max_iter: usize,
    pub tol: f64,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            penalty: Penalty::L2,
            solver: Solver::Newton,
            max_iter: 1000,
            tol: 1e-4,
        }
    }
}

impl fmt::Display for LogisticParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C={}, penalty={:?}, solver={:?}", self.c, self.penalty, self.solver)
    }
}

/// Logistic regression for binary classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub params: LogisticParams,
    /// Fitted coefficients
    pub coefficients: Option<Array1<f64>>,
    pub intercept: f64,
    /// Whether the solver met its tolerance before `max_iter`
    pub converged: bool,
    pub n_iter: usize,
    /// Set when the training labels contain a single class
    constant: Option<f64>,
    is_fitted: bool,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new(LogisticParams::default())
    }
}

impl LogisticRegression {
    pub fn new(params: LogisticParams) -> Self {
        Self {
            params,
            coefficients: None,
            intercept: 0.0,
            converged: false,
            n_iter: 0,
            constant: None,
            is_fitted: false,
        }
    }

    fn sigmoid(z: f64) -> f64 {
        if z >= 0.0 {
            1.0 / (1.0 + (-z).exp())
        } else {
            let e = z.exp();
            e / (1.0 + e)
        }
    }

    fn validate(&self) -> Result<()> {
        let p = &self.params;
        if !(p.c > 0.0 && p.c.is_finite()) {
            return Err(LandingError::InvalidParameter {
                name: "c".to_string(),
                value: p.c.to_string(),
                reason: "must be a positive finite number".to_string(),
            });
        }
        if !p.solver.supports(p.penalty) {
            return Err(LandingError::InvalidParameter {
                name: "solver".to_string(),
                value: format!("{:?}", p.solver),
                reason: format!("does not support penalty {:?}", p.penalty),
            });
        }
        Ok(())
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        check_fit_input(x, y)?;
        self.validate()?;

        let n_features = x.ncols();
        self.constant = super::single_class(y);
        if self.constant.is_some() {
            self.coefficients = Some(Array1::zeros(n_features));
            self.intercept = 0.0;
            self.converged = true;
            self.n_iter = 0;
            self.is_fitted = true;
            return Ok(self);
        }

        // penalty weight per sample, matching sum-of-losses scaled by 1/n
        let lambda = match self.params.penalty {
            Penalty::None => 0.0,
            _ => 1.0 / (self.params.c * x.nrows() as f64),
        };

        let (weights, bias, converged, n_iter) = match self.params.solver {
            Solver::GradientDescent => self.fit_gradient_descent(x, y, lambda),
            Solver::Newton => self.fit_newton(x, y, lambda),
        };

        self.coefficients = Some(weights);
        self.intercept = bias;
        self.converged = converged;
        self.n_iter = n_iter;
        self.is_fitted = true;
        Ok(self)
    }

    fn fit_gradient_descent(&self, x: &Array2<f64>, y: &Array1<f64>, lambda: f64) -> (Array1<f64>, f64, bool, usize) {
        let n_samples = x.nrows() as f64;
        let n_features = x.ncols();

        // step from a Lipschitz bound on the mean logistic loss
        let lipschitz = 0.25 * x.mapv(|v| v * v).sum() / n_samples + 0.25 + lambda;
        let lr = 1.0 / lipschitz.max(1e-12);

        let mut weights = Array1::<f64>::zeros(n_features);
        let mut bias = 0.0;

        for iter in 0..self.params.max_iter {
            let proba = (x.dot(&weights) + bias).mapv(Self::sigmoid);
            let errors = &proba - y;

            let mut dw = x.t().dot(&errors) / n_samples;
            if self.params.penalty == Penalty::L2 {
                dw = dw + lambda * &weights;
            }
            let db = errors.mean().unwrap_or(0.0);

            let mut next = &weights - &(lr * &dw);
            if self.params.penalty == Penalty::L1 {
                let threshold = lr * lambda;
                next.mapv_inplace(|w| w.signum() * (w.abs() - threshold).max(0.0));
            }
            let next_bias = bias - lr * db;

            let step = (&next - &weights)
                .iter()
                .chain(std::iter::once(&(next_bias - bias)))
                .fold(0.0f64, |m, v| m.max(v.abs()));

            weights = next;
            bias = next_bias;

            if step / lr < self.params.tol {
                return (weights, bias, true, iter + 1);
            }
        }

        (weights, bias, false, self.params.max_iter)
    }

    fn fit_newton(&self, x: &Array2<f64>, y: &Array1<f64>, lambda: f64) -> (Array1<f64>, f64, bool, usize) {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        // design matrix with a leading intercept column
        let mut design = Array2::<f64>::ones((n_samples, n_features + 1));
        design.slice_mut(ndarray::s![.., 1..]).assign(x);

        let mut theta = Array1::<f64>::zeros(n_features + 1);

        for iter in 0..self.params.max_iter {
            let proba = design.dot(&theta).mapv(Self::sigmoid);
            let errors = &proba - y;

            let mut grad = design.t().dot(&errors) / n_samples as f64;
            let w = proba.mapv(|p| (p * (1.0 - p)).max(1e-10));
            let weighted = &design * &w.view().insert_axis(Axis(1));
            let mut hessian = design.t().dot(&weighted) / n_samples as f64;

            for j in 1..=n_features {
                grad[j] += lambda * theta[j];
                hessian[[j, j]] += lambda;
            }

            let delta = match cholesky_solve(&hessian, &grad) {
                Some(d) => d,
                None => return split_theta(theta, false, iter),
            };

            theta = &theta - &delta;
            if theta.iter().any(|v| !v.is_finite()) {
                return split_theta(Array1::zeros(n_features + 1), false, iter + 1);
            }

            let step = delta.iter().fold(0.0f64, |m, v| m.max(v.abs()));
            if step < self.params.tol {
                return split_theta(theta, true, iter + 1);
            }
        }

        split_theta(theta, false, self.params.max_iter)
    }

    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.is_fitted {
            return Err(LandingError::ModelNotFitted);
        }
        if let Some(class) = self.constant {
            return Ok(Array1::from_elem(x.nrows(), class));
        }

        let coefficients = self.coefficients.as_ref().ok_or(LandingError::ModelNotFitted)?;
        if x.ncols() != coefficients.len() {
            return Err(LandingError::Shape {
                expected: format!("{} features", coefficients.len()),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok((x.dot(coefficients) + self.intercept).mapv(Self::sigmoid))
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.mapv(|p| if p > 0.5 { 1.0 } else { 0.0 }))
    }
}

fn split_theta(theta: Array1<f64>, converged: bool, n_iter: usize) -> (Array1<f64>, f64, bool, usize) {
    let bias = theta[0];
    let weights = theta.slice(ndarray::s![1..]).to_owned();
    (weights, bias, converged, n_iter)
}

/// Solve the symmetric positive-definite system `a x = b` by Cholesky
/// decomposition, retrying once with a small ridge if `a` is not positive
/// definite.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    cholesky_solve_with_ridge(a, b, 0.0).or_else(|| {
        let n = a.nrows().max(1);
        let ridge = 1e-8 * a.diag().iter().map(|v| v.abs()).sum::<f64>() / n as f64;
        cholesky_solve_with_ridge(a, b, ridge.max(1e-12))
    })
}

fn cholesky_solve_with_ridge(a: &Array2<f64>, b: &Array1<f64>, ridge: f64) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    // A = L * L^T
    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let sum: f64 = (0..j).map(|k| l[[i, k]] * l[[j, k]]).sum();
            if i == j {
                let diag = a[[i, i]] + ridge - sum;
                if diag <= 0.0 || !diag.is_finite() {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // L * z = b
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let sum: f64 = (0..i).map(|j| l[[i, j]] * z[j]).sum();
        z[i] = (b[i] - sum) / l[[i, i]];
    }

    // L^T * x = z
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let sum: f64 = ((i + 1)..n).map(|j| l[[j, i]] * x[j]).sum();
        x[i] = (z[i] - sum) / l[[i, i]];
    }

    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn overlapping_data() -> (Array2<f64>, Array1<f64>) {
        let x = array![[-2.0], [-1.5], [-1.0], [-0.5], [0.2], [-0.2], [0.5], [1.0], [1.5], [2.0]];
        let y = array![0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_newton_and_gradient_descent_agree() {
        let (x, y) = overlapping_data();

        let mut newton = LogisticRegression::new(LogisticParams::default());
        newton.fit(&x, &y).unwrap();
        assert!(newton.converged);

        let mut gd = LogisticRegression::new(LogisticParams {
            solver: Solver::GradientDescent,
            max_iter: 20_000,
            tol: 1e-8,
            ..Default::default()
        });
        gd.fit(&x, &y).unwrap();

        let a = newton.coefficients.as_ref().unwrap()[0];
        let b = gd.coefficients.as_ref().unwrap()[0];
        assert!((a - b).abs() < 1e-3, "newton={} gd={}", a, b);
    }

    #[test]
    fn test_predicts_separable_classes() {
        let (x, y) = overlapping_data();
        let mut model = LogisticRegression::default();
        model.fit(&x, &y).unwrap();
        let pred = model.predict(&array![[-3.0], [3.0]]).unwrap();
        assert_eq!(pred.to_vec(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_l1_shrinks_irrelevant_feature() {
        let x = array![
            [-2.0, 0.1], [-1.0, -0.1], [-0.5, 0.2], [0.5, -0.2],
            [1.0, 0.1], [2.0, -0.1], [-1.5, 0.0], [1.5, 0.0]
        ];
        let y = array![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0];
        let mut model = LogisticRegression::new(LogisticParams {
            c: 0.5,
            penalty: Penalty::L1,
            solver: Solver::GradientDescent,
            ..Default::default()
        });
        model.fit(&x, &y).unwrap();
        assert_eq!(model.coefficients.as_ref().unwrap()[1], 0.0);
    }

    #[test]
    fn test_exhausted_budget_not_converged() {
        let (x, y) = overlapping_data();
        let mut model = LogisticRegression::new(LogisticParams {
            solver: Solver::GradientDescent,
            max_iter: 2,
            ..Default::default()
        });
        model.fit(&x, &y).unwrap();
        assert!(!model.converged);
        assert_eq!(model.n_iter, 2);
    }

    #[test]
    fn test_single_class_training() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![1.0, 1.0, 1.0];
        let mut model = LogisticRegression::default();
        model.fit(&x, &y).unwrap();
        assert_eq!(model.predict(&array![[-10.0]]).unwrap()[0], 1.0);
    }

    #[test]
    fn test_newton_rejects_l1() {
        let (x, y) = overlapping_data();
        let mut model = LogisticRegression::new(LogisticParams {
            penalty: Penalty::L1,
            solver: Solver::Newton,
            ..Default::default()
        });
        assert!(matches!(model.fit(&x, &y), Err(LandingError::InvalidParameter { .. })));
    }

    #[test]
    fn test_cholesky_solve() {
        let a = array![[4.0, 2.0], [2.0, 3.0]];
        let b = array![2.0, 1.0];
        let x = cholesky_solve(&a, &b).unwrap();
        let residual = a.dot(&x) - &b;
        assert!(residual.iter().all(|r| r.abs() < 1e-12));
    }
}
