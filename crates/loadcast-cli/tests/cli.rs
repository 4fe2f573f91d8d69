use assert_cmd::Command;
use chrono::{Duration, TimeZone, Utc};
use predicates::prelude::*;
use std::fmt::Write as _;
use std::fs;
use tempfile::tempdir;

/// Write an hourly demand CSV covering `hours` consecutive hours.
fn write_raw_csv(path: &std::path::Path, hours: i64) {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut csv = String::from("datetime,target\n");
    for h in 0..hours {
        let ts = start + Duration::hours(h);
        let value = 20_000.0 + 3_000.0 * ((h % 24) as f64 / 24.0);
        writeln!(csv, "{},{}", ts.to_rfc3339(), value).unwrap();
    }
    fs::write(path, csv).unwrap();
}

#[test]
fn featurize_then_forecast_writes_pipeline_outputs() {
    let tmp = tempdir().unwrap();
    let data_dir = tmp.path().join("data");
    let raw_csv = tmp.path().join("demand.csv");
    write_raw_csv(&raw_csv, 400);

    Command::cargo_bin("loadcast")
        .unwrap()
        .args([
            "featurize",
            "--input",
            raw_csv.to_str().unwrap(),
            "--data-dir",
            data_dir.to_str().unwrap(),
        ])
        .assert()
        .success();

    let processed = data_dir.join("processed");
    assert!(processed.join("raw_demand.parquet").exists());
    assert!(processed.join("hourly_demand.parquet").exists());
    assert!(processed.join("features_demand.parquet").exists());

    Command::cargo_bin("loadcast")
        .unwrap()
        .args([
            "forecast",
            "--data-dir",
            data_dir.to_str().unwrap(),
            "--horizon",
            "3",
            "--val-hours",
            "24",
            "--trees",
            "5",
        ])
        .assert()
        .success();

    assert!(data_dir
        .join("predictions")
        .join("predictions_features_demand.parquet")
        .exists());
    assert!(data_dir.join("models").join("demand_forest.json").exists());
}

#[test]
fn featurize_rejects_unknown_fill_policy() {
    let tmp = tempdir().unwrap();
    let data_dir = tmp.path().join("data");
    let raw_csv = tmp.path().join("demand.csv");
    write_raw_csv(&raw_csv, 48);

    Command::cargo_bin("loadcast")
        .unwrap()
        .args([
            "featurize",
            "--input",
            raw_csv.to_str().unwrap(),
            "--fill",
            "sideways",
            "--data-dir",
            data_dir.to_str().unwrap(),
        ])
        .assert()
        .failure();
}

#[test]
fn forecast_without_processed_files_fails() {
    let tmp = tempdir().unwrap();
    Command::cargo_bin("loadcast")
        .unwrap()
        .args(["forecast", "--data-dir", tmp.path().to_str().unwrap()])
        .assert()
        .failure();
}

#[test]
fn help_lists_pipeline_stages() {
    Command::cargo_bin("loadcast")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("fetch")
                .and(predicate::str::contains("featurize"))
                .and(predicate::str::contains("forecast")),
        );
}
