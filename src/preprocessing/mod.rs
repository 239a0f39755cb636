//! Feature preprocessing
//!
//! Turns a launch table into model-ready matrices:
//! - Feature selection, type coercion and mean imputation
//! - Stratified train/test split
//! - Standardization fitted on training rows only

mod features;
mod imputer;
mod scaler;
mod split;

pub use features::{extract_labels, FeatureBuilder, FeatureSet, ImputationScope, FEATURE_COLUMNS};
pub use imputer::{is_missing, Imputer, MeanImputer};
pub use scaler::{ScalingTransform, StandardScaler};
pub use split::{stratified_split, SplitConfig, TrainTestSplit};

use crate::error::Result;
use ndarray::{Array1, Array2};
use tracing::info;

/// Split, imputed and scaled data ready for training
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub feature_names: Vec<String>,
    pub split: TrainTestSplit,
    pub x_train: Array2<f64>,
    pub y_train: Array1<f64>,
    pub x_test: Array2<f64>,
    pub y_test: Array1<f64>,
    pub scaler: StandardScaler,
}

impl PreparedData {
    pub fn n_train(&self) -> usize {
        self.x_train.nrows()
    }

    pub fn n_test(&self) -> usize {
        self.x_test.nrows()
    }
}

/// Split the feature set, fill any remaining missing cells from training
/// statistics, then standardize both partitions with a training-fitted scaler.
pub fn prepare(features: &FeatureSet, config: &SplitConfig) -> Result<PreparedData> {
    let split = stratified_split(&features.y, config)?;

    let (mut x_train, y_train) = features.select_rows(&split.train);
    let (mut x_test, y_test) = features.select_rows(&split.test);

    if !features.imputed {
        let mut imputer = MeanImputer::new();
        x_train = imputer.fit_transform(&x_train)?;
        x_test = imputer.transform(&x_test)?;
    }

    let mut scaler = StandardScaler::new();
    let x_train = scaler.fit_transform(&x_train)?;
    let x_test = scaler.transform(&x_test)?;

    info!(
        train = x_train.nrows(),
        test = x_test.nrows(),
        features = x_train.ncols(),
        "Prepared training data"
    );

    Ok(PreparedData {
        feature_names: features.feature_names.clone(),
        split,
        x_train,
        y_train,
        x_test,
        y_test,
        scaler,
    })
}
