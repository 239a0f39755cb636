//! Integration tests for feature building, splitting and scaling

use falcon_landing::data::LaunchTable;
use falcon_landing::preprocessing::{
    prepare, stratified_split, FeatureBuilder, ImputationScope, SplitConfig, StandardScaler,
};
use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;

fn table_with_gaps() -> LaunchTable {
    let frame = df!(
        "FlightNumber" => &[1i64, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12],
        "PayloadMass" => &[Some(500.0), None, Some(2500.0), Some(3000.0), None, Some(5200.0),
                           Some(6100.0), Some(3300.0), None, Some(9000.0), Some(4100.0), Some(7000.0)],
        "GridFins" => &["False", "False", "True", "True", "False", "True",
                        "True", "true", "1", "True", "False", "True"],
        "Legs" => &[false, false, true, true, false, true, true, true, true, true, false, true],
        "Orbit" => &["LEO", "ISS", "GTO", "LEO", "PO", "GTO", "ISS", "LEO", "SSO", "GTO", "LEO", "ISS"],
        "Class" => &[0i64, 0, 1, 1, 0, 1, 1, 0, 1, 1, 0, 1]
    )
    .unwrap();
    LaunchTable::new(frame)
}

#[test]
fn test_row_counts_align() {
    let table = table_with_gaps();
    let features = FeatureBuilder::new().build(&table).unwrap();
    assert_eq!(features.x.nrows(), table.height());
    assert_eq!(features.y.len(), table.height());
    assert_eq!(features.feature_names, vec!["FlightNumber", "PayloadMass", "GridFins", "Legs"]);
}

#[test]
fn test_feature_building_is_idempotent() {
    let table = table_with_gaps();
    let builder = FeatureBuilder::new();
    let a = builder.build(&table).unwrap();
    let b = builder.build(&table).unwrap();
    assert_eq!(a.x, b.x);
    assert!(a.x.iter().all(|v| v.is_finite()));

    // mean of the nine known masses
    let known = [500.0, 2500.0, 3000.0, 5200.0, 6100.0, 3300.0, 9000.0, 4100.0, 7000.0];
    let mean = known.iter().sum::<f64>() / known.len() as f64;
    assert!((a.x[[1, 1]] - mean).abs() < 1e-9);
}

#[test]
fn test_string_flags_coerce() {
    let features = FeatureBuilder::new().build(&table_with_gaps()).unwrap();
    let grid_fins = features.x.column(2);
    assert_eq!(grid_fins[0], 0.0);
    assert_eq!(grid_fins[7], 1.0);
    assert_eq!(grid_fins[8], 1.0);
}

#[test]
fn test_stratification_bound_holds() {
    for n in [10usize, 17, 25, 40, 61] {
        for n_pos in [2, n / 3, n / 2, n - 2] {
            let y = Array1::from_iter((0..n).map(|i| if (i * 7) % n < n_pos { 1.0 } else { 0.0 }));
            let p_full = y.sum() / n as f64;
            for test_size in [0.1, 0.2, 0.33, 0.5] {
                for seed in [0u64, 1, 42] {
                    let config = SplitConfig::default().with_test_size(test_size).with_seed(seed);
                    let split = stratified_split(&y, &config).unwrap();
                    let y_train = y.select(Axis(0), &split.train);
                    let p_train = y_train.sum() / y_train.len() as f64;
                    let bound = 1.0 / split.train.len().min(split.test.len()) as f64;
                    assert!(
                        (p_train - p_full).abs() <= bound + 1e-12,
                        "n={n} pos={n_pos} f={test_size} seed={seed}"
                    );
                }
            }
        }
    }
}

#[test]
fn test_ten_row_scenario() {
    let y = Array1::from_iter((0..10).map(|i| if i < 6 { 1.0 } else { 0.0 }));
    for seed in 0..50 {
        let split = stratified_split(&y, &SplitConfig::default().with_seed(seed)).unwrap();
        assert_eq!(split.test.len(), 2);
        let positives = split.test.iter().filter(|&&i| y[i] == 1.0).count();
        assert!((1..=2).contains(&positives));
    }
}

#[test]
fn test_scaling_invariants() {
    let x = Array2::from_shape_fn((30, 3), |(i, j)| match j {
        0 => i as f64 * 1.5 - 4.0,
        1 => 5.0,
        _ => ((i * 13) % 7) as f64,
    });
    let mut scaler = StandardScaler::new();
    let scaled = scaler.fit_transform(&x).unwrap();

    for j in [0, 2] {
        let col = scaled.column(j);
        assert!(col.mean().unwrap().abs() < 1e-10);
        assert!((col.std(0.0) - 1.0).abs() < 1e-10);
    }
    assert!(scaled.column(1).iter().all(|v| *v == 0.0));
}

#[test]
fn test_scaler_fitted_on_training_rows_only() {
    let table = table_with_gaps();
    let features = FeatureBuilder::new().build(&table).unwrap();
    let config = SplitConfig::default().with_test_size(0.25);
    let baseline = prepare(&features, &config).unwrap();

    let mut perturbed = features.clone();
    for &i in &baseline.split.test {
        perturbed.x.row_mut(i).mapv_inplace(|v| v * 1000.0 + 17.0);
    }
    let again = prepare(&perturbed, &config).unwrap();

    assert_eq!(baseline.split, again.split);
    assert_eq!(baseline.scaler.params(), again.scaler.params());
    assert_eq!(baseline.x_train, again.x_train);
    assert_ne!(baseline.x_test, again.x_test);
}

#[test]
fn test_training_only_imputation_ignores_test_rows() {
    let table = table_with_gaps();
    let features = FeatureBuilder::new()
        .with_scope(ImputationScope::TrainingOnly)
        .build(&table)
        .unwrap();
    assert!(!features.imputed);
    assert!(features.x.iter().any(|v| v.is_nan()));

    let data = prepare(&features, &SplitConfig::default().with_test_size(0.25)).unwrap();
    assert!(data.x_train.iter().all(|v| v.is_finite()));
    assert!(data.x_test.iter().all(|v| v.is_finite()));
}

#[test]
fn test_invalid_test_size() {
    let features = FeatureBuilder::new().build(&table_with_gaps()).unwrap();
    for bad in [0.0, 1.0, -0.5, 1.5] {
        let config = SplitConfig::default().with_test_size(bad);
        assert!(prepare(&features, &config).is_err());
    }
}
