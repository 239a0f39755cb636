//! Missing value imputation
//!
//! Missing cells are represented as NaN inside feature matrices.

use crate::error::{LandingError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Trait for imputers operating on NaN-marked matrices
pub trait Imputer: Send + Sync {
    /// Fit the imputer on data with missing values
    fn fit(&mut self, x: &Array2<f64>) -> Result<()>;

    /// Replace missing values using the fitted statistics
    fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>>;

    fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }
}

#[inline]
pub fn is_missing(v: f64) -> bool {
    v.is_nan()
}

/// Column-mean imputer. A column with no observed values is filled with 0.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeanImputer {
    means: Option<Array1<f64>>,
}

impl MeanImputer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fitted column means
    pub fn means(&self) -> Option<&Array1<f64>> {
        self.means.as_ref()
    }
}

impl Imputer for MeanImputer {
    fn fit(&mut self, x: &Array2<f64>) -> Result<()> {
        let means = x
            .axis_iter(Axis(1))
            .map(|col| {
                let (sum, count) = col
                    .iter()
                    .filter(|v| !is_missing(**v))
                    .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
                if count == 0 {
                    0.0
                } else {
                    sum / count as f64
                }
            })
            .collect();

        self.means = Some(means);
        Ok(())
    }

    fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let means = self.means.as_ref().ok_or(LandingError::ModelNotFitted)?;
        if x.ncols() != means.len() {
            return Err(LandingError::Shape {
                expected: format!("{} columns", means.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }

        let mut out = x.clone();
        for (mut col, &mean) in out.axis_iter_mut(Axis(1)).zip(means.iter()) {
            col.mapv_inplace(|v| if is_missing(v) { mean } else { v });
        }
        Ok(out)
    }
}
