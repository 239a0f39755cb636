//! Feature selection and label extraction

use super::imputer::{Imputer, MeanImputer};
use crate::data::columns::*;
use crate::data::{float_column, LaunchTable};
use crate::error::{LandingError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Feature columns in output order
pub const FEATURE_COLUMNS: [&str; 6] = [FLIGHT_NUMBER, PAYLOAD_MASS, GRID_FINS, REUSED, LEGS, PAYLOAD_COUNT];

/// Which rows the mean imputation statistics are computed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputationScope {
    /// Means over the whole table, before the split
    #[default]
    FullDataset,
    /// Means over training rows only, applied after the split
    TrainingOnly,
}

/// Numeric feature matrix with aligned binary labels
#[derive(Debug, Clone)]
pub struct FeatureSet {
    /// Names of the matrix columns, in order
    pub feature_names: Vec<String>,
    pub x: Array2<f64>,
    /// 0.0 / 1.0 labels
    pub y: Array1<f64>,
    /// False while `x` may still contain NaN cells
    pub imputed: bool,
}

impl FeatureSet {
    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    pub fn n_positive(&self) -> usize {
        self.y.iter().filter(|v| **v == 1.0).count()
    }

    /// Rows at `indices`, in the given order
    pub fn select_rows(&self, indices: &[usize]) -> (Array2<f64>, Array1<f64>) {
        (self.x.select(Axis(0), indices), self.y.select(Axis(0), indices))
    }
}

/// Builds a [`FeatureSet`] from a launch table
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    columns: Vec<String>,
    scope: ImputationScope,
}

impl Default for FeatureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureBuilder {
    pub fn new() -> Self {
        Self {
            columns: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            scope: ImputationScope::default(),
        }
    }

    pub fn with_scope(mut self, scope: ImputationScope) -> Self {
        self.scope = scope;
        self
    }

    /// Override the candidate feature columns
    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }

    pub fn scope(&self) -> ImputationScope {
        self.scope
    }

    pub fn build(&self, table: &LaunchTable) -> Result<FeatureSet> {
        if table.is_empty() {
            return Err(LandingError::InsufficientData("launch table has no rows".to_string()));
        }

        let df = table.frame();
        let n = df.height();
        let y = extract_labels(table)?;

        let mut feature_names = Vec::new();
        let mut columns: Vec<Vec<Option<f64>>> = Vec::new();
        for name in &self.columns {
            match float_column(df, name)? {
                Some(values) => {
                    feature_names.push(name.clone());
                    columns.push(values);
                }
                None => debug!(column = %name, "Feature column absent, skipping"),
            }
        }

        if feature_names.is_empty() {
            return Err(LandingError::Schema(format!(
                "none of the feature columns {:?} is present",
                self.columns
            )));
        }

        let missing: usize = columns.iter().map(|c| c.iter().filter(|v| v.is_none()).count()).sum();

        let mut x = Array2::from_shape_fn((n, feature_names.len()), |(i, j)| {
            columns[j][i].unwrap_or(f64::NAN)
        });

        let imputed = match self.scope {
            ImputationScope::FullDataset => {
                x = MeanImputer::new().fit_transform(&x)?;
                true
            }
            ImputationScope::TrainingOnly => missing == 0,
        };

        info!(
            rows = n,
            features = feature_names.len(),
            missing_cells = missing,
            scope = ?self.scope,
            "Built feature matrix"
        );

        Ok(FeatureSet {
            feature_names,
            x,
            y,
            imputed,
        })
    }
}

/// Read the `Class` column as 0/1 labels
pub fn extract_labels(table: &LaunchTable) -> Result<Array1<f64>> {
    let values = float_column(table.frame(), CLASS)?.ok_or_else(|| LandingError::missing_column(CLASS))?;

    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| match v {
            Some(label) if label == 0.0 || label == 1.0 => Ok(label),
            other => Err(LandingError::Schema(format!(
                "row {}: '{}' must be 0 or 1, got {:?}",
                i, CLASS, other
            ))),
        })
        .collect::<Result<Vec<f64>>>()
        .map(Array1::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn table() -> LaunchTable {
        let df = df!(
            "Class" => &[1i64, 0, 1, 0],
            "PayloadMass" => &[Some(100.0), None, Some(300.0), None],
            "FlightNumber" => &[1i64, 2, 3, 4],
            "GridFins" => &["True", "False", "true", "0"],
            "Orbit" => &["LEO", "GTO", "ISS", "LEO"]
        )
        .unwrap();
        LaunchTable::new(df)
    }

    #[test]
    fn test_feature_order_and_width() {
        let features = FeatureBuilder::new().build(&table()).unwrap();
        assert_eq!(features.feature_names, vec!["FlightNumber", "PayloadMass", "GridFins"]);
        assert_eq!(features.n_samples(), 4);
        assert_eq!(features.y.len(), 4);
        assert_eq!(features.x.column(2).to_vec(), vec![1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_full_dataset_mean_imputation() {
        let features = FeatureBuilder::new().build(&table()).unwrap();
        assert!(features.imputed);
        assert_eq!(features.x[[1, 1]], 200.0);
        assert_eq!(features.x[[3, 1]], 200.0);
    }

    #[test]
    fn test_training_only_scope_keeps_nan() {
        let features = FeatureBuilder::new()
            .with_scope(ImputationScope::TrainingOnly)
            .build(&table())
            .unwrap();
        assert!(!features.imputed);
        assert!(features.x[[1, 1]].is_nan());
    }

    #[test]
    fn test_missing_class_column() {
        let df = df!("FlightNumber" => &[1i64, 2]).unwrap();
        let err = FeatureBuilder::new().build(&LaunchTable::new(df)).unwrap_err();
        assert!(matches!(err, LandingError::Schema(ref msg) if msg.contains("Class")));
    }

    #[test]
    fn test_invalid_label_value() {
        let df = df!("FlightNumber" => &[1i64, 2], "Class" => &[1i64, 2]).unwrap();
        let err = FeatureBuilder::new().build(&LaunchTable::new(df)).unwrap_err();
        assert!(matches!(err, LandingError::Schema(_)));
    }

    #[test]
    fn test_empty_table() {
        let err = FeatureBuilder::new().build(&LaunchTable::empty()).unwrap_err();
        assert!(matches!(err, LandingError::InsufficientData(_)));
    }
}
