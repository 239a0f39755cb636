//! Integration test: the `run` command over a file source

use falcon_landing::cli::{cmd_run, PipelineArgs, Source};
use std::fmt::Write as _;
use std::path::Path;
use tempfile::TempDir;

/// Launch table with only the classifier columns; no `Date`
fn write_feature_only_csv(path: &Path, n: usize) {
    let mut csv = String::from("FlightNumber,PayloadMass,GridFins,Legs,Class\n");
    for i in 0..n {
        let class = usize::from(i % 3 != 0);
        let payload = if class == 1 { 4000.0 + 50.0 * i as f64 } else { 9000.0 - 30.0 * i as f64 };
        let flags = if class == 1 { "True" } else { "False" };
        writeln!(csv, "{},{:.1},{},{},{}", i + 1, payload, flags, flags, class).unwrap();
    }
    std::fs::write(path, csv).unwrap();
}

fn write_knn_only_config(path: &Path) {
    std::fs::write(
        path,
        r#"{"algorithms": ["knn"], "grids": {"knn": {"n_neighbors": [3, 5]}}}"#,
    )
    .unwrap();
}

#[tokio::test]
async fn test_run_predicts_when_summary_columns_missing() {
    let dir = TempDir::new().unwrap();
    let csv = dir.path().join("launches.csv");
    let config = dir.path().join("config.json");
    let out_dir = dir.path().join("output");
    write_feature_only_csv(&csv, 40);
    write_knn_only_config(&config);

    let args = PipelineArgs {
        config: Some(config),
        cv_folds: Some(3),
        ..Default::default()
    };
    cmd_run(Source::File, Some(&csv), &out_dir, None, &args).await.unwrap();

    assert!(out_dir.join("prediction_report.txt").exists());
    assert!(!out_dir.join("summary_report.txt").exists());
    assert!(!out_dir.join("spacex_launches.csv").exists());
}

#[tokio::test]
async fn test_run_writes_both_reports_for_complete_table() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");
    let out_dir = dir.path().join("output");
    write_knn_only_config(&config);

    let args = PipelineArgs {
        config: Some(config),
        cv_folds: Some(3),
        ..Default::default()
    };
    cmd_run(Source::Generate, None, &out_dir, Some(80), &args).await.unwrap();

    assert!(out_dir.join("summary_report.txt").exists());
    assert!(out_dir.join("prediction_report.txt").exists());
    assert!(out_dir.join("spacex_launches.csv").exists());
}
