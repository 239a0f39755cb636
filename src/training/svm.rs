//! Support vector classifier trained with SMO (Sequential Minimal Optimization)

use super::check_fit_input;
use crate::error::{LandingError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of samples for eager kernel matrix computation
const MAX_KERNEL_MATRIX_SAMPLES: usize = 10_000;

/// Rows below which the kernel matrix is built sequentially
const PARALLEL_KERNEL_THRESHOLD: usize = 100;

/// Kernel family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kernel {
    Linear,
    Rbf,
    Poly,
}

/// Kernel coefficient for rbf and poly kernels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GammaRepr", into = "GammaRepr")]
pub enum Gamma {
    /// `1 / (n_features * var(X))`
    Scale,
    /// `1 / n_features`
    Auto,
    Value(f64),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum GammaRepr {
    Name(String),
    Value(f64),
}

impl TryFrom<GammaRepr> for Gamma {
    type Error = String;

    fn try_from(repr: GammaRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            GammaRepr::Name(name) => match name.as_str() {
                "scale" => Ok(Gamma::Scale),
                "auto" => Ok(Gamma::Auto),
                other => Err(format!("unknown gamma '{}', expected scale, auto or a number", other)),
            },
            GammaRepr::Value(v) if v > 0.0 => Ok(Gamma::Value(v)),
            GammaRepr::Value(v) => Err(format!("gamma must be positive, got {}", v)),
        }
    }
}

impl From<Gamma> for GammaRepr {
    fn from(gamma: Gamma) -> Self {
        match gamma {
            Gamma::Scale => GammaRepr::Name("scale".to_string()),
            Gamma::Auto => GammaRepr::Name("auto".to_string()),
            Gamma::Value(v) => GammaRepr::Value(v),
        }
    }
}

impl Gamma {
    /// Numeric gamma for the given training matrix
    pub fn resolve(&self, x: &Array2<f64>) -> f64 {
        let n_features = x.ncols().max(1) as f64;
        match self {
            Gamma::Scale => {
                let var = if x.is_empty() { 0.0 } else { x.var(0.0) };
                if var > 0.0 {
                    1.0 / (n_features * var)
                } else {
                    1.0
                }
            }
            Gamma::Auto => 1.0 / n_features,
            Gamma::Value(v) => *v,
        }
    }
}

/// Resolved kernel function
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
enum KernelFn {
    /// K(x, y) = x · y
    Linear,
    /// K(x, y) = (γ x · y + r)^d
    Polynomial { degree: i32, gamma: f64, coef0: f64 },
    /// K(x, y) = exp(-γ ||x - y||²)
    Rbf { gamma: f64 },
}

impl KernelFn {
    fn eval(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        match *self {
            KernelFn::Linear => a.dot(&b),
            KernelFn::Polynomial { degree, gamma, coef0 } => (gamma * a.dot(&b) + coef0).powi(degree),
            KernelFn::Rbf { gamma } => {
                let sq: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum();
                (-gamma * sq).exp()
            }
        }
    }
}

/// SVM hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SvmParams {
    pub kernel: Kernel,
    /// Regularization parameter
    pub c: f64,
    pub gamma: Gamma,
    /// Polynomial degree
    pub degree: u32,
    pub coef0: f64,
    /// KKT tolerance
    pub tol: f64,
    /// Maximum passes over the training set
    pub max_iter: usize,
    pub seed: u64,
}

impl Default for SvmParams {
    fn default() -> Self {
        Self {
            kernel: Kernel::Rbf,
            c: 1.0,
            gamma: Gamma::Scale,
            degree: 3,
            coef0: 0.0,
            tol: 1e-3,
            max_iter: 1000,
            seed: 42,
        }
    }
}

impl fmt::Display for SvmParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let gamma = match self.gamma {
            Gamma::Scale => "scale".to_string(),
            Gamma::Auto => "auto".to_string(),
            Gamma::Value(v) => v.to_string(),
        };
        write!(f, "kernel={:?}, C={}, gamma={}", self.kernel, self.c, gamma)
    }
}

/// Binary support vector classifier with labels in {0, 1}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvmClassifier {
    pub params: SvmParams,
    kernel: Option<KernelFn>,
    support_vectors: Option<Array2<f64>>,
    /// alpha_i * y_i for each support vector
    dual_coef: Option<Array1<f64>>,
    bias: f64,
    /// Whether SMO settled before exhausting `max_iter`
    pub converged: bool,
    pub n_iter: usize,
    constant: Option<f64>,
    is_fitted: bool,
}

impl Default for SvmClassifier {
    fn default() -> Self {
        Self::new(SvmParams::default())
    }
}

impl SvmClassifier {
    pub fn new(params: SvmParams) -> Self {
        Self {
            params,
            kernel: None,
            support_vectors: None,
            dual_coef: None,
            bias: 0.0,
            converged: false,
            n_iter: 0,
            constant: None,
            is_fitted: false,
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        check_fit_input(x, y)?;
        if !(self.params.c > 0.0 && self.params.c.is_finite()) {
            return Err(LandingError::InvalidParameter {
                name: "c".to_string(),
                value: self.params.c.to_string(),
                reason: "must be a positive finite number".to_string(),
            });
        }

        let n = x.nrows();
        if n > MAX_KERNEL_MATRIX_SAMPLES {
            return Err(LandingError::InvalidParameter {
                name: "n_samples".to_string(),
                value: n.to_string(),
                reason: format!("SVM kernel matrix is limited to {} samples", MAX_KERNEL_MATRIX_SAMPLES),
            });
        }

        self.constant = super::single_class(y);
        if self.constant.is_some() {
            self.converged = true;
            self.n_iter = 0;
            self.is_fitted = true;
            return Ok(self);
        }

        let gamma = self.params.gamma.resolve(x);
        let kernel = match self.params.kernel {
            Kernel::Linear => KernelFn::Linear,
            Kernel::Rbf => KernelFn::Rbf { gamma },
            Kernel::Poly => KernelFn::Polynomial {
                degree: self.params.degree.min(i32::MAX as u32) as i32,
                gamma,
                coef0: self.params.coef0,
            },
        };

        let y_signed = y.mapv(|v| if v == 1.0 { 1.0 } else { -1.0 });
        let k = compute_kernel_matrix(kernel, x);
        let (alphas, bias, converged, n_iter) = self.smo(&k, &y_signed);

        let support: Vec<usize> = (0..n).filter(|&i| alphas[i] > 1e-8).collect();
        let mut support_vectors = Array2::zeros((support.len(), x.ncols()));
        let mut dual_coef = Array1::zeros(support.len());
        for (row, &idx) in support.iter().enumerate() {
            support_vectors.row_mut(row).assign(&x.row(idx));
            dual_coef[row] = alphas[idx] * y_signed[idx];
        }

        self.kernel = Some(kernel);
        self.support_vectors = Some(support_vectors);
        self.dual_coef = Some(dual_coef);
        self.bias = bias;
        self.converged = converged;
        self.n_iter = n_iter;
        self.is_fitted = true;
        Ok(self)
    }

    /// Simplified SMO with seeded random partner selection.
    /// Returns (alphas, bias, converged, passes).
    fn smo(&self, k: &Array2<f64>, y: &Array1<f64>) -> (Array1<f64>, f64, bool, usize) {
        let n = y.len();
        let c = self.params.c;
        let tol = self.params.tol;

        let mut alphas = Array1::<f64>::zeros(n);
        let mut bias = 0.0;
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.params.seed);

        let f = |alphas: &Array1<f64>, bias: f64, idx: usize| -> f64 {
            (0..n).map(|i| alphas[i] * y[i] * k[[i, idx]]).sum::<f64>() + bias
        };

        let max_quiet_passes = 5;
        let mut quiet = 0;
        let mut iter = 0;

        while quiet < max_quiet_passes {
            if iter >= self.params.max_iter {
                return (alphas, bias, false, iter);
            }

            let mut changed = 0;
            for i in 0..n {
                let e_i = f(&alphas, bias, i) - y[i];
                let violates = (y[i] * e_i < -tol && alphas[i] < c) || (y[i] * e_i > tol && alphas[i] > 0.0);
                if !violates {
                    continue;
                }

                let j = loop {
                    let j = rng.gen_range(0..n);
                    if j != i {
                        break j;
                    }
                };
                let e_j = f(&alphas, bias, j) - y[j];

                let (a_i_old, a_j_old) = (alphas[i], alphas[j]);
                let (lo, hi) = if y[i] != y[j] {
                    ((a_j_old - a_i_old).max(0.0), (c + a_j_old - a_i_old).min(c))
                } else {
                    ((a_i_old + a_j_old - c).max(0.0), (a_i_old + a_j_old).min(c))
                };
                if (hi - lo).abs() < 1e-10 {
                    continue;
                }

                let eta = 2.0 * k[[i, j]] - k[[i, i]] - k[[j, j]];
                if eta >= 0.0 {
                    continue;
                }

                let a_j = (a_j_old - y[j] * (e_i - e_j) / eta).clamp(lo, hi);
                if (a_j - a_j_old).abs() < 1e-5 {
                    continue;
                }
                let a_i = a_i_old + y[i] * y[j] * (a_j_old - a_j);
                alphas[i] = a_i;
                alphas[j] = a_j;

                let b1 = bias - e_i - y[i] * (a_i - a_i_old) * k[[i, i]] - y[j] * (a_j - a_j_old) * k[[i, j]];
                let b2 = bias - e_j - y[i] * (a_i - a_i_old) * k[[i, j]] - y[j] * (a_j - a_j_old) * k[[j, j]];
                bias = if a_i > 0.0 && a_i < c {
                    b1
                } else if a_j > 0.0 && a_j < c {
                    b2
                } else {
                    (b1 + b2) / 2.0
                };

                changed += 1;
            }

            iter += 1;
            if changed == 0 {
                quiet += 1;
            } else {
                quiet = 0;
            }
        }

        (alphas, bias, true, iter)
    }

    /// Signed distance to the separating surface; positive means class 1
    pub fn decision_function(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.is_fitted {
            return Err(LandingError::ModelNotFitted);
        }
        if let Some(class) = self.constant {
            return Ok(Array1::from_elem(x.nrows(), if class == 1.0 { 1.0 } else { -1.0 }));
        }

        let (kernel, sv, coef) = match (&self.kernel, &self.support_vectors, &self.dual_coef) {
            (Some(kernel), Some(sv), Some(coef)) => (*kernel, sv, coef),
            _ => return Err(LandingError::ModelNotFitted),
        };
        if sv.nrows() > 0 && x.ncols() != sv.ncols() {
            return Err(LandingError::Shape {
                expected: format!("{} features", sv.ncols()),
                actual: format!("{} features", x.ncols()),
            });
        }

        let scores = x
            .rows()
            .into_iter()
            .map(|row| {
                sv.rows()
                    .into_iter()
                    .zip(coef.iter())
                    .map(|(s, c)| c * kernel.eval(row, s))
                    .sum::<f64>()
                    + self.bias
            })
            .collect();
        Ok(scores)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(self.decision_function(x)?.mapv(|s| if s > 0.0 { 1.0 } else { 0.0 }))
    }

    pub fn n_support_vectors(&self) -> usize {
        self.support_vectors.as_ref().map_or(0, |sv| sv.nrows())
    }
}

/// Gram matrix, upper-triangle rows computed in parallel for larger inputs
fn compute_kernel_matrix(kernel: KernelFn, x: &Array2<f64>) -> Array2<f64> {
    let n = x.nrows();
    let mut k = Array2::zeros((n, n));

    if n < PARALLEL_KERNEL_THRESHOLD {
        for i in 0..n {
            for j in i..n {
                let val = kernel.eval(x.row(i), x.row(j));
                k[[i, j]] = val;
                k[[j, i]] = val;
            }
        }
        return k;
    }

    let rows: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|i| (i..n).map(|j| kernel.eval(x.row(i), x.row(j))).collect())
        .collect();

    for (i, row) in rows.into_iter().enumerate() {
        for (offset, val) in row.into_iter().enumerate() {
            let j = i + offset;
            k[[i, j]] = val;
            k[[j, i]] = val;
        }
    }
    k
}
