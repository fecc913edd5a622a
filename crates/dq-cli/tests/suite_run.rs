//! Running suite files against datasets on disk.

use std::fs::{self, File};
use std::path::Path;

use polars::prelude::{Column, DataFrame, ParquetWriter};
use tempfile::TempDir;

use dq_cli::config::HarnessConfig;
use dq_cli::runner::{Outcome, RunResult, run_suite};
use dq_cli::suite::Suite;
use dq_validate::{CheckKind, FailureReport};

fn write_parquet(path: &Path, mut df: DataFrame) {
    fs::create_dir_all(path.parent().expect("parent")).expect("create dirs");
    let mut file = File::create(path).expect("create file");
    ParquetWriter::new(&mut file)
        .finish(&mut df)
        .expect("write parquet");
}

fn visits(facility: &[&str], cost: &[f64]) -> DataFrame {
    DataFrame::new(vec![
        Column::new("facility_type".into(), facility.to_vec()),
        Column::new("sum_treatment_cost".into(), cost.to_vec()),
    ])
    .expect("frame")
}

/// Parquet source partitioned by facility type, CSV target with display
/// headers.
fn fixture() -> (TempDir, HarnessConfig) {
    let dir = TempDir::new().expect("temp dir");
    let parquet_root = dir.path().join("parquet");
    let data_root = dir.path().join("csv");

    write_parquet(
        &parquet_root
            .join("costs")
            .join("facility_type_partition=Clinic")
            .join("part-0.parquet"),
        visits(&["Clinic"], &[120.5]),
    );
    write_parquet(
        &parquet_root
            .join("costs")
            .join("facility_type_partition=Lab")
            .join("part-0.parquet"),
        visits(&["Lab", "Lab"], &[80.0, -3.0]),
    );

    fs::create_dir_all(&data_root).expect("csv dir");
    fs::write(
        data_root.join("costs.csv"),
        " Facility Type ,Sum Treatment Cost\nClinic,120.5\nLab,80\n",
    )
    .expect("write csv");

    let config = HarnessConfig::new(None, parquet_root, data_root);
    (dir, config)
}

fn suite(json: &str) -> Suite {
    let suite: Suite = serde_json::from_str(json).expect("parse suite");
    suite.validate().expect("valid suite");
    suite
}

const SUITE: &str = r#"{
    "name": "patient_costs",
    "requirement": "TICKET-1234",
    "datasets": {
        "source": { "parquet": "costs", "drop_columns": ["facility_type_partition"] },
        "target": {
            "csv": "costs.csv",
            "normalize_columns": true,
            "rename": { "facility type": "facility_type", "sum treatment cost": "sum_treatment_cost" }
        }
    },
    "checks": [
        { "check": "not_empty", "dataset": "source", "tags": ["smoke"] },
        { "check": "duplicates", "dataset": "source", "columns": ["facility_type"], "tags": ["smoke"] },
        { "check": "not_null", "dataset": "source", "tags": ["smoke"] },
        { "check": "row_count", "source": "source", "target": "target", "tags": ["source_to_target"] },
        { "check": "full_match", "source": "source", "target": "target", "tags": ["source_to_target"] },
        { "check": "column_validity", "dataset": "source",
          "rules": { "sum_treatment_cost": { "min": 0 } }, "tags": ["validity"] },
        { "check": "schema", "dataset": "target",
          "expected_columns": ["facility_type", "sum_treatment_cost"] }
    ]
}"#;

#[test]
fn suite_reports_each_check_independently() {
    let (_dir, config) = fixture();
    let run = run_suite(&suite(SUITE), &config, &[]);

    let statuses: Vec<(CheckKind, &str)> = run
        .checks
        .iter()
        .map(|check| (check.check, check.outcome.label()))
        .collect();
    assert_eq!(
        statuses,
        vec![
            (CheckKind::NotEmpty, "PASS"),
            (CheckKind::Duplicates, "FAIL"),
            (CheckKind::NotNull, "PASS"),
            (CheckKind::RowCount, "FAIL"),
            (CheckKind::FullMatch, "FAIL"),
            (CheckKind::ColumnValidity, "FAIL"),
            (CheckKind::Schema, "PASS"),
        ]
    );

    let Outcome::Failed(FailureReport::RowCountMismatch { source, target }) = &run.checks[3].outcome
    else {
        panic!("expected row count mismatch");
    };
    assert_eq!((*source, *target), (3, 2));

    let Outcome::Failed(FailureReport::Mismatch {
        source_only,
        target_only,
        ..
    }) = &run.checks[4].outcome
    else {
        panic!("expected mismatch");
    };
    assert_eq!((*source_only, *target_only), (1, 0));
}

#[test]
fn tag_filter_selects_checks() {
    let (_dir, config) = fixture();
    let run = run_suite(&suite(SUITE), &config, &["validity".to_string()]);
    assert_eq!(run.checks.len(), 1);
    assert_eq!(run.checks[0].check, CheckKind::ColumnValidity);
}

#[test]
fn sql_dataset_without_credentials_errors_only_its_checks() {
    let (_dir, config) = fixture();
    let suite = suite(
        r#"{
            "name": "mixed",
            "datasets": {
                "source": { "parquet": "costs" },
                "target": { "sql": "SELECT 1 AS id" }
            },
            "checks": [
                { "check": "not_empty", "dataset": "source" },
                { "check": "row_count", "source": "source", "target": "target" }
            ]
        }"#,
    );

    let run = run_suite(&suite, &config, &[]);
    assert!(run.checks[0].outcome.is_pass());
    let Outcome::Error { message } = &run.checks[1].outcome else {
        panic!("expected error outcome");
    };
    assert!(message.contains("failed to load"));
    assert!(message.contains("--db-user"));

    let result = RunResult { suites: vec![run] };
    assert_eq!(result.counts(), (1, 0, 1));
    assert!(!result.all_passed());
}

#[test]
fn missing_parquet_folder_is_reported_per_check() {
    let (_dir, config) = fixture();
    let suite = suite(
        r#"{
            "name": "missing",
            "datasets": { "source": { "parquet": "no_such_folder" } },
            "checks": [ { "check": "not_empty", "dataset": "source" } ]
        }"#,
    );

    let run = run_suite(&suite, &config, &[]);
    assert_eq!(run.checks[0].outcome.label(), "ERROR");
}

#[test]
fn suite_file_round_trip_through_disk() {
    let (dir, config) = fixture();
    let path = dir.path().join("suite.json");
    fs::write(&path, SUITE).expect("write suite");

    let suite = Suite::load(&path).expect("load suite");
    let run = run_suite(&suite, &config, &["smoke".to_string()]);
    assert_eq!(run.checks.len(), 3);

    let json = serde_json::to_value(RunResult { suites: vec![run] }).expect("serialize");
    assert_eq!(json["suites"][0]["suite"], "patient_costs");
    assert_eq!(json["suites"][0]["checks"][1]["outcome"]["status"], "failed");
}

#[test]
fn bundled_demo_suite_is_valid() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/facility_visits.json");
    let suite = Suite::load(&path).expect("load demo suite");
    assert!(suite.needs_database(&[]));
    assert!(!suite.needs_database(&["smoke".to_string()]));
}
